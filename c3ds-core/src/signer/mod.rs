//! Payload signing: SHA-256 → ECDSA P-256 → DER → base64
//!
//! Every outgoing message carries a detached signature over the exact bytes
//! of its JSON body. The collector checks it against the public key in the
//! device certificate, so the signed bytes and the transmitted bytes must
//! be the same buffer.
//!
//! ```
//! use c3ds_core::signer::{PrivateKey, Signer};
//!
//! let key = PrivateKey::from_bytes(&[0x11; 32]).unwrap();
//! let signer = Signer::new(key);
//!
//! let payload = br#"{"device_id":"node-1"}"#;
//! let signature = signer.sign(payload).unwrap();
//!
//! signer.public_key().verify(payload, signature.as_str()).unwrap();
//! ```
//!
//! Signing is deterministic (RFC 6979) unless a random source is supplied
//! through [`Signer::sign_with_rng`]. Both forms verify identically.

pub mod der;

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use p256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier, RandomizedPrehashSigner};
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use p256::elliptic_curve::rand_core::CryptoRngCore;
use sha2::{Digest as _, Sha256};

use crate::constants::crypto::{DIGEST_LEN, PRIVATE_KEY_LEN, RAW_SIGNATURE_LEN, SCALAR_LEN};
use crate::errors::{SigningError, VerifyError};

pub use der::{DerSignature, RawSignature};

/// SHA-256 digest of a payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Digest([u8; DIGEST_LEN]);

impl Digest {
    /// Hash `payload` with SHA-256
    pub fn of(payload: &[u8]) -> Self {
        Self(Sha256::digest(payload).into())
    }

    /// Raw bytes
    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }
}

/// Device private key (32-byte P-256 scalar)
///
/// Provisioned per device and never logged. `Debug` is redacted.
#[derive(Clone)]
pub struct PrivateKey(SigningKey);

impl PrivateKey {
    /// Parse a big-endian scalar
    ///
    /// Fails unless the input is exactly 32 bytes, non-zero and below the
    /// curve order.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SigningError> {
        if bytes.len() != PRIVATE_KEY_LEN {
            return Err(SigningError::InvalidKey);
        }
        SigningKey::from_slice(bytes)
            .map(Self)
            .map_err(|_| SigningError::InvalidKey)
    }

    /// Matching verification key
    pub fn public_key(&self) -> PublicKey {
        PublicKey(VerifyingKey::from(&self.0))
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(<redacted>)")
    }
}

/// P-256 public key, as found in the device certificate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey(VerifyingKey);

impl PublicKey {
    /// Parse a SEC1 point (compressed or uncompressed)
    pub fn from_sec1_bytes(bytes: &[u8]) -> Result<Self, VerifyError> {
        VerifyingKey::from_sec1_bytes(bytes)
            .map(Self)
            .map_err(|_| VerifyError::InvalidPublicKey)
    }

    /// Uncompressed SEC1 encoding (65 bytes)
    pub fn to_sec1_bytes(&self) -> Vec<u8> {
        self.0.to_encoded_point(false).as_bytes().to_vec()
    }

    /// Check a base64 DER signature over `payload`
    ///
    /// This is what the collector does with the signature header.
    pub fn verify(&self, payload: &[u8], signature_b64: &str) -> Result<(), VerifyError> {
        let der_bytes = STANDARD
            .decode(signature_b64)
            .map_err(|_| VerifyError::InvalidBase64)?;
        let raw = der::decode(&der_bytes).map_err(VerifyError::Der)?;

        let signature = Signature::from_slice(&raw.to_bytes())
            .map_err(|_| VerifyError::BadSignature)?;
        let digest = Digest::of(payload);

        self.0
            .verify_prehash(digest.as_bytes(), &signature)
            .map_err(|_| VerifyError::BadSignature)
    }
}

/// Verify a captured message against a SEC1-encoded device public key
pub fn verify(public_key_sec1: &[u8], payload: &[u8], signature_b64: &str) -> Result<(), VerifyError> {
    PublicKey::from_sec1_bytes(public_key_sec1)?.verify(payload, signature_b64)
}

/// Base64 (standard alphabet, padded) of a DER signature
///
/// The value sent in the signature header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Base64Signature(String);

impl Base64Signature {
    /// String form
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Owned base64 text
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Base64Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Base64Signature {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// DER-encode and base64 a raw signature
pub fn encode_signature(raw: &RawSignature) -> Result<Base64Signature, SigningError> {
    let der = der::encode(raw)?;
    Ok(Base64Signature(STANDARD.encode(der.as_bytes())))
}

fn raw_from(signature: &Signature) -> RawSignature {
    let mut bytes = [0u8; RAW_SIGNATURE_LEN];
    bytes.copy_from_slice(signature.to_bytes().as_slice());
    debug_assert_eq!(bytes.len(), 2 * SCALAR_LEN);
    RawSignature::from_bytes(&bytes)
}

/// Signs payloads with the device key
#[derive(Debug, Clone)]
pub struct Signer {
    key: PrivateKey,
}

impl Signer {
    /// Signer owning `key`
    pub fn new(key: PrivateKey) -> Self {
        Self { key }
    }

    /// Key the collector verifies against
    pub fn public_key(&self) -> PublicKey {
        self.key.public_key()
    }

    /// Sign with an RFC 6979 deterministic nonce
    pub fn sign(&self, payload: &[u8]) -> Result<Base64Signature, SigningError> {
        let digest = Digest::of(payload);
        let signature: Signature = self
            .key
            .0
            .sign_prehash(digest.as_bytes())
            .map_err(|_| SigningError::Primitive)?;

        self.finish(&digest, &signature)
    }

    /// Sign with a nonce drawn from `rng`
    pub fn sign_with_rng(
        &self,
        rng: &mut impl CryptoRngCore,
        payload: &[u8],
    ) -> Result<Base64Signature, SigningError> {
        let digest = Digest::of(payload);
        let signature: Signature = self
            .key
            .0
            .sign_prehash_with_rng(rng, digest.as_bytes())
            .map_err(|_| SigningError::Primitive)?;

        self.finish(&digest, &signature)
    }

    fn finish(&self, digest: &Digest, signature: &Signature) -> Result<Base64Signature, SigningError> {
        let encoded = encode_signature(&raw_from(signature))?;
        log_debug!(
            "signed digest {:02x?}.. ({} base64 chars)",
            &digest.as_bytes()[..4],
            encoded.as_str().len()
        );
        Ok(encoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::crypto::MAX_BASE64_SIGNATURE_LEN;
    use p256::ecdsa::signature::Signer as _;
    use rand::rngs::OsRng;

    const PAYLOAD: &[u8] =
        br#"{"device_id":"node-1","timestamp":"2025-01-18T14:30:45Z","message_type":"heartbeat"}"#;

    fn test_key() -> PrivateKey {
        let mut bytes = [0u8; 32];
        for (i, b) in bytes.iter_mut().enumerate() {
            *b = i as u8 + 1;
        }
        PrivateKey::from_bytes(&bytes).unwrap()
    }

    #[test]
    fn digest_matches_known_vector() {
        // SHA-256("abc")
        let digest = Digest::of(b"abc");
        assert_eq!(
            &digest.as_bytes()[..8],
            &[0xba, 0x78, 0x16, 0xbf, 0x8f, 0x01, 0xcf, 0xea]
        );
    }

    #[test]
    fn rejects_invalid_keys() {
        assert_eq!(PrivateKey::from_bytes(&[0u8; 32]).unwrap_err(), SigningError::InvalidKey);
        assert_eq!(PrivateKey::from_bytes(&[0xff; 32]).unwrap_err(), SigningError::InvalidKey);
        assert_eq!(PrivateKey::from_bytes(&[1u8; 31]).unwrap_err(), SigningError::InvalidKey);
    }

    #[test]
    fn debug_does_not_leak_key() {
        let rendered = format!("{:?}", Signer::new(test_key()));
        assert!(rendered.contains("redacted"));
        assert!(!rendered.contains("0x01"));
    }

    #[test]
    fn signature_verifies_and_is_bounded() {
        let signer = Signer::new(test_key());
        let signature = signer.sign(PAYLOAD).unwrap();

        assert!(signature.as_str().len() <= MAX_BASE64_SIGNATURE_LEN);
        assert!(signature.as_str().len() % 4 == 0);
        signer.public_key().verify(PAYLOAD, signature.as_str()).unwrap();
    }

    #[test]
    fn deterministic_signature_matches_reference_der() {
        let key = test_key();
        let signer = Signer::new(key.clone());

        let reference: Signature = key.0.sign(PAYLOAD);
        let expected = STANDARD.encode(reference.to_der().as_bytes());

        assert_eq!(signer.sign(PAYLOAD).unwrap().as_str(), expected);
        assert_eq!(signer.sign(PAYLOAD).unwrap().as_str(), expected);
    }

    #[test]
    fn randomized_signatures_differ_but_verify() {
        let signer = Signer::new(test_key());
        let a = signer.sign_with_rng(&mut OsRng, PAYLOAD).unwrap();
        let b = signer.sign_with_rng(&mut OsRng, PAYLOAD).unwrap();

        assert_ne!(a, b);
        signer.public_key().verify(PAYLOAD, a.as_str()).unwrap();
        signer.public_key().verify(PAYLOAD, b.as_str()).unwrap();
    }

    #[test]
    fn tampered_payload_fails_verification() {
        let signer = Signer::new(test_key());
        let signature = signer.sign(PAYLOAD).unwrap();

        let mut tampered = PAYLOAD.to_vec();
        tampered[15] ^= 0x01;
        assert_eq!(
            signer.public_key().verify(&tampered, signature.as_str()),
            Err(VerifyError::BadSignature)
        );
    }

    #[test]
    fn malformed_signatures_are_classified() {
        let public = Signer::new(test_key()).public_key();

        assert_eq!(public.verify(PAYLOAD, "not base64!"), Err(VerifyError::InvalidBase64));
        assert!(matches!(public.verify(PAYLOAD, "MAA="), Err(VerifyError::Der(_))));
    }

    #[test]
    fn forged_33_byte_r_is_rejected() {
        let signer = Signer::new(test_key());
        let signature = signer.sign(PAYLOAD).unwrap();
        let der_bytes = STANDARD.decode(signature.as_str()).unwrap();
        let raw = der::decode(&der_bytes).unwrap();

        // keep s as encoded, replace r with 0x01 || r
        let r_len = der_bytes[3] as usize;
        let s_tlv = &der_bytes[4 + r_len..];
        let mut forged = vec![0x30, (2 + 33 + s_tlv.len()) as u8, 0x02, 33, 0x01];
        forged.extend_from_slice(raw.r());
        forged.extend_from_slice(s_tlv);

        assert_eq!(
            signer.public_key().verify(PAYLOAD, &STANDARD.encode(&forged)),
            Err(VerifyError::Der(crate::errors::DerError::IntegerTooLong { len: 33 }))
        );
    }

    #[test]
    fn public_key_roundtrips_through_sec1() {
        let public = Signer::new(test_key()).public_key();
        let sec1 = public.to_sec1_bytes();

        assert_eq!(sec1.len(), 65);
        assert_eq!(sec1[0], 0x04);
        assert_eq!(PublicKey::from_sec1_bytes(&sec1).unwrap(), public);
        assert_eq!(PublicKey::from_sec1_bytes(&[0x04; 10]), Err(VerifyError::InvalidPublicKey));
    }

    #[test]
    fn verify_accepts_sec1_key_bytes() {
        let signer = Signer::new(test_key());
        let signature = signer.sign(PAYLOAD).unwrap();
        let sec1 = signer.public_key().to_sec1_bytes();

        assert_eq!(verify(&sec1, PAYLOAD, signature.as_str()), Ok(()));
        assert_eq!(verify(&[], PAYLOAD, signature.as_str()), Err(VerifyError::InvalidPublicKey));
    }

    #[test]
    fn base64_padding_follows_input_length() {
        assert_eq!(STANDARD.encode(b""), "");
        assert_eq!(STANDARD.encode([0x30]), "MA==");
        assert_eq!(STANDARD.encode([0x30, 0x44]), "MEQ=");
        assert_eq!(STANDARD.encode([0x30, 0x44, 0x02]), "MEQC");
        assert_eq!(STANDARD.decode("MEQ=").unwrap(), vec![0x30, 0x44]);
    }
}
