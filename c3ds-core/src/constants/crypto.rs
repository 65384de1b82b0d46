//! Cryptographic Sizes and ASN.1 Tags
//!
//! Fixed sizes for ECDSA over NIST P-256 with SHA-256. Every buffer in the
//! signer is bounded by one of these.

/// P-256 private scalar length (bytes).
pub const PRIVATE_KEY_LEN: usize = 32;

/// SHA-256 digest length (bytes).
pub const DIGEST_LEN: usize = 32;

/// Length of one big-endian signature component, r or s (bytes).
pub const SCALAR_LEN: usize = 32;

/// Raw `r || s` signature length (bytes).
pub const RAW_SIGNATURE_LEN: usize = 2 * SCALAR_LEN;

/// Longest DER INTEGER body for a P-256 scalar: 32 bytes plus one `0x00` pad.
pub const MAX_DER_INTEGER_LEN: usize = SCALAR_LEN + 1;

/// Longest DER signature: SEQUENCE header + two INTEGER headers + two padded scalars.
///
/// 2 + 2 + 33 + 2 + 33 = 72
pub const MAX_DER_SIGNATURE_LEN: usize = 6 + 2 * MAX_DER_INTEGER_LEN;

/// Longest base64 rendition of a DER signature: 4 * ceil(72 / 3).
pub const MAX_BASE64_SIGNATURE_LEN: usize = 96;

/// ASN.1 SEQUENCE tag (constructed).
pub const DER_TAG_SEQUENCE: u8 = 0x30;

/// ASN.1 INTEGER tag.
pub const DER_TAG_INTEGER: u8 = 0x02;

/// Largest length that fits the DER short form.
pub const DER_SHORT_FORM_MAX: usize = 0x7f;
