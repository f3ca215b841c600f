//! Unified error type for Cookieforge.

use std::time::SystemTimeError;

use cookieforge_codec::CodecError;
use cookieforge_session::SessionError;

/// Top-level error that wraps the sub-crate errors.
///
/// The `#[from]` attributes let `?` convert sub-crate errors
/// automatically.
#[derive(Debug, thiserror::Error)]
pub enum CookieforgeError {
    /// A session-level error (bad token, tampering, backend failure).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A codec-level error (byte packing, payload coding).
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The system clock reads earlier than the Unix epoch.
    #[error("system clock is before the Unix epoch: {0}")]
    Clock(#[from] SystemTimeError),

    /// A timestamp doesn't fit the record's 32-bit `expiry` field.
    #[error("timestamp {0} does not fit in a 32-bit expiry")]
    ExpiryOutOfRange(u64),
}

impl CookieforgeError {
    /// Returns `true` if the underlying session token was tampered with.
    pub fn is_tampered(&self) -> bool {
        matches!(self, Self::Session(e) if e.is_tampered())
    }
}
