//! Error types for the codec layer.
//!
//! Like every Cookieforge crate, this one owns its error enum. A
//! `CodecError` always means "these bytes could not be packed or unpacked",
//! never "the cookie was forged" — integrity lives one layer up.

/// Errors that can occur while packing integers or coding payloads.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// A fixed-width integer was decoded from a slice of the wrong size.
    ///
    /// For example, asking [`bytes_to_u32`](crate::bytes_to_u32) to decode
    /// three bytes. The record framing always slices exact widths, so
    /// seeing this in practice points to a framing bug.
    #[error("length mismatch: expected {expected} bytes, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// Serializing the session payload failed.
    #[cfg(feature = "json")]
    #[error("payload encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserializing the session payload failed.
    ///
    /// Common causes: the application changed the shape of its payload
    /// type while old cookies are still in circulation.
    #[cfg(feature = "json")]
    #[error("payload decode failed: {0}")]
    Decode(serde_json::Error),
}
