//! ASN.1 DER encoding of ECDSA P-256 signatures
//!
//! The collector verifies signatures in the X.509/ASN.1 form:
//!
//! ```text
//! ECDSA-Sig-Value ::= SEQUENCE {
//!     r INTEGER,
//!     s INTEGER
//! }
//! ```
//!
//! ## INTEGER rules
//!
//! DER integers are two's complement and minimal:
//! - Leading `0x00` bytes are stripped, but never the last byte
//! - If the first remaining byte has its high bit set, one `0x00` is put
//!   back so the value reads as non-negative
//!
//! A 32-byte scalar therefore encodes to 1..=33 bytes, and the whole
//! signature to at most 72 bytes:
//!
//! ```text
//! 30 LL | 02 Lr [00] r... | 02 Ls [00] s...
//! └─┬─┘   └───── 2 + Lr ┘   └───── 2 + Ls ┘
//!  LL = 2 + Lr + 2 + Ls  (≤ 70, always short-form)
//! ```

use heapless::Vec;

use crate::constants::crypto::{
    DER_SHORT_FORM_MAX, DER_TAG_INTEGER, DER_TAG_SEQUENCE, MAX_DER_INTEGER_LEN,
    MAX_DER_SIGNATURE_LEN, RAW_SIGNATURE_LEN, SCALAR_LEN,
};
use crate::errors::DerError;

/// Raw `(r, s)`, each a big-endian unsigned 32-byte integer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawSignature {
    r: [u8; SCALAR_LEN],
    s: [u8; SCALAR_LEN],
}

impl RawSignature {
    /// Split the fixed 64-byte `r || s` form
    pub fn from_bytes(bytes: &[u8; RAW_SIGNATURE_LEN]) -> Self {
        let mut r = [0u8; SCALAR_LEN];
        let mut s = [0u8; SCALAR_LEN];
        r.copy_from_slice(&bytes[..SCALAR_LEN]);
        s.copy_from_slice(&bytes[SCALAR_LEN..]);
        Self { r, s }
    }

    /// Join two big-endian scalars
    pub const fn from_scalars(r: &[u8; SCALAR_LEN], s: &[u8; SCALAR_LEN]) -> Self {
        Self { r: *r, s: *s }
    }

    /// Big-endian `r` scalar
    pub fn r(&self) -> &[u8; SCALAR_LEN] {
        &self.r
    }

    /// Big-endian `s` scalar
    pub fn s(&self) -> &[u8; SCALAR_LEN] {
        &self.s
    }

    /// Fixed 64-byte `r || s` form
    pub fn to_bytes(&self) -> [u8; RAW_SIGNATURE_LEN] {
        let mut bytes = [0u8; RAW_SIGNATURE_LEN];
        bytes[..SCALAR_LEN].copy_from_slice(&self.r);
        bytes[SCALAR_LEN..].copy_from_slice(&self.s);
        bytes
    }
}

/// DER-encoded signature, at most 72 bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerSignature(Vec<u8, MAX_DER_SIGNATURE_LEN>);

impl DerSignature {
    /// Raw bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Length in bytes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no bytes
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for DerSignature {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Minimal big-endian body of one scalar: `(needs 0x00 pad, significant bytes)`
fn integer_body(scalar: &[u8; SCALAR_LEN]) -> Result<(bool, &[u8]), DerError> {
    // Strip at most 31 zeros so at least one byte always remains
    let start = scalar[..SCALAR_LEN - 1]
        .iter()
        .take_while(|&&b| b == 0)
        .count();
    let body = &scalar[start..];

    if body == [0] {
        return Err(DerError::ZeroInteger);
    }

    Ok((body[0] & 0x80 != 0, body))
}

fn put(out: &mut Vec<u8, MAX_DER_SIGNATURE_LEN>, bytes: &[u8]) -> Result<(), DerError> {
    out.extend_from_slice(bytes).map_err(|_| DerError::LengthMismatch)
}

fn put_integer(
    out: &mut Vec<u8, MAX_DER_SIGNATURE_LEN>,
    pad: bool,
    body: &[u8],
) -> Result<(), DerError> {
    let len = body.len() + usize::from(pad);
    put(out, &[DER_TAG_INTEGER, len as u8])?;
    if pad {
        put(out, &[0x00])?;
    }
    put(out, body)
}

/// DER-encode a raw `(r, s)` pair
///
/// Fails only if r or s is zero, which a correct ECDSA primitive never emits.
pub fn encode(raw: &RawSignature) -> Result<DerSignature, DerError> {
    let (r_pad, r) = integer_body(raw.r())?;
    let (s_pad, s) = integer_body(raw.s())?;

    let r_len = r.len() + usize::from(r_pad);
    let s_len = s.len() + usize::from(s_pad);
    let inner_len = 2 + r_len + 2 + s_len;
    debug_assert!(inner_len <= DER_SHORT_FORM_MAX);

    let mut out = Vec::new();
    put(&mut out, &[DER_TAG_SEQUENCE, inner_len as u8])?;
    put_integer(&mut out, r_pad, r)?;
    put_integer(&mut out, s_pad, s)?;

    Ok(DerSignature(out))
}

/// Parse one short-form TLV, returning `(body, rest)`
fn read_tlv(input: &[u8], tag: u8) -> Result<(&[u8], &[u8]), DerError> {
    let (&found, rest) = input.split_first().ok_or(DerError::Truncated)?;
    if found != tag {
        return Err(DerError::UnexpectedTag { expected: tag, found });
    }

    let (&len, rest) = rest.split_first().ok_or(DerError::Truncated)?;
    let len = usize::from(len);
    if len > DER_SHORT_FORM_MAX {
        return Err(DerError::LengthMismatch);
    }
    if rest.len() < len {
        return Err(DerError::Truncated);
    }

    Ok(rest.split_at(len))
}

/// Strictly decode one INTEGER body into a right-aligned 32-byte scalar
fn read_scalar(body: &[u8]) -> Result<[u8; SCALAR_LEN], DerError> {
    if body.is_empty() {
        return Err(DerError::LengthMismatch);
    }
    if body.len() > MAX_DER_INTEGER_LEN {
        return Err(DerError::IntegerTooLong { len: body.len() });
    }
    if body[0] & 0x80 != 0 {
        return Err(DerError::NegativeInteger);
    }
    if body.len() > 1 && body[0] == 0 && body[1] & 0x80 == 0 {
        return Err(DerError::NonMinimalInteger);
    }

    // a 33-byte integer is only valid as pad byte + 32-byte scalar
    let value = match body.split_first() {
        Some((&0, scalar)) if body.len() == MAX_DER_INTEGER_LEN => scalar,
        _ if body.len() >= MAX_DER_INTEGER_LEN => {
            return Err(DerError::IntegerTooLong { len: body.len() });
        }
        _ => body,
    };
    if value.iter().all(|&b| b == 0) {
        return Err(DerError::ZeroInteger);
    }

    let mut scalar = [0u8; SCALAR_LEN];
    scalar[SCALAR_LEN - value.len()..].copy_from_slice(value);
    Ok(scalar)
}

/// Decode a DER signature back to raw `(r, s)`
///
/// Rejects anything [`encode`] would not produce: long-form lengths,
/// redundant or missing pad bytes, negative or zero integers, trailing bytes.
pub fn decode(der: &[u8]) -> Result<RawSignature, DerError> {
    let (seq, trailing) = read_tlv(der, DER_TAG_SEQUENCE)?;
    if !trailing.is_empty() {
        return Err(DerError::LengthMismatch);
    }

    let (r_body, rest) = read_tlv(seq, DER_TAG_INTEGER)?;
    let (s_body, rest) = read_tlv(rest, DER_TAG_INTEGER)?;
    if !rest.is_empty() {
        return Err(DerError::LengthMismatch);
    }

    let r = read_scalar(r_body)?;
    let s = read_scalar(s_body)?;
    Ok(RawSignature::from_scalars(&r, &s))
}
