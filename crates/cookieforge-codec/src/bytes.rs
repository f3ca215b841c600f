//! Fixed-width big-endian integer packing.
//!
//! Every session record starts with a fixed header (`expiry` as a `u32`,
//! `flags` as a `u64`), so the encoder and decoder need a way to turn
//! integers into exactly-sized byte arrays and back.
//!
//! "Big-endian" means the most significant byte comes first:
//! `0x0102_0304_u32` becomes `[0x01, 0x02, 0x03, 0x04]`. It's the usual
//! choice for wire formats because the bytes read in the same order as
//! the hex literal.
//!
//! Encoding can't fail (an integer always fits its own width). Decoding
//! can: the caller may hand us a slice of the wrong length, which we
//! report as [`CodecError::LengthMismatch`] instead of panicking.

use crate::CodecError;

/// Packs a `u16` into 2 big-endian bytes.
pub fn u16_to_bytes(value: u16) -> [u8; 2] {
    value.to_be_bytes()
}

/// Packs a `u32` into 4 big-endian bytes.
pub fn u32_to_bytes(value: u32) -> [u8; 4] {
    value.to_be_bytes()
}

/// Packs a `u64` into 8 big-endian bytes.
pub fn u64_to_bytes(value: u64) -> [u8; 8] {
    value.to_be_bytes()
}

/// Unpacks a `u16` from exactly 2 big-endian bytes.
///
/// # Errors
/// Returns [`CodecError::LengthMismatch`] if `bytes.len() != 2`.
pub fn bytes_to_u16(bytes: &[u8]) -> Result<u16, CodecError> {
    Ok(u16::from_be_bytes(fixed(bytes)?))
}

/// Unpacks a `u32` from exactly 4 big-endian bytes.
///
/// # Errors
/// Returns [`CodecError::LengthMismatch`] if `bytes.len() != 4`.
pub fn bytes_to_u32(bytes: &[u8]) -> Result<u32, CodecError> {
    Ok(u32::from_be_bytes(fixed(bytes)?))
}

/// Unpacks a `u64` from exactly 8 big-endian bytes.
///
/// # Errors
/// Returns [`CodecError::LengthMismatch`] if `bytes.len() != 8`.
pub fn bytes_to_u64(bytes: &[u8]) -> Result<u64, CodecError> {
    Ok(u64::from_be_bytes(fixed(bytes)?))
}

/// Converts a slice into an `N`-byte array, or reports the size mismatch.
///
/// `<[u8; N]>::try_from(&[u8])` does the length check for us; we only
/// translate its error into ours.
fn fixed<const N: usize>(bytes: &[u8]) -> Result<[u8; N], CodecError> {
    bytes.try_into().map_err(|_| CodecError::LengthMismatch {
        expected: N,
        actual: bytes.len(),
    })
}
