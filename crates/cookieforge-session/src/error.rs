//! Error types for the session layer.

use crate::Session;

/// Errors that can occur while building a store or moving sessions in
/// and out of it.
///
/// The variants fall into five groups:
///
/// - **Configuration** (`InvalidCipherKey`, `IncompleteCoder`) — raised
///   once, when a store is built. Never worth retrying.
/// - **Input** (`LoginNameTooLong`, `Base64`, `TooShort`, `MissingCoder`)
///   — the session or token handed to us is unusable. Nothing is mutated.
/// - **Integrity** (`Tampered`) — the token decoded fine but its digest
///   doesn't match. Carries the `Expired` session the token turns into;
///   treat it exactly like "no session".
/// - **Payload** (`Payload`) — the application data couldn't be coded.
/// - **Backend** (`NotFound`, `Backend`) — raised by server-side stores.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The cipher key must be 0 (no encryption), 16 (AES-128), or 32
    /// (AES-256) bytes long.
    #[error("invalid cipher key length: {0} (expected 0, 16, or 32)")]
    InvalidCipherKey(usize),

    /// A payload coder was configured without a factory, or the other
    /// way around. They only make sense together.
    #[error("payload coder and payload factory must be configured together")]
    IncompleteCoder,

    /// The login name doesn't fit its one-byte length prefix.
    #[error("login name is {0} bytes long (max 255)")]
    LoginNameTooLong(usize),

    /// The token isn't valid URL-safe base64.
    #[error("malformed session token: {0}")]
    Base64(#[from] base64::DecodeError),

    /// The decoded token is shorter than the smallest possible record.
    #[error("session token too short: {len} bytes (min {min})")]
    TooShort { len: usize, min: usize },

    /// The session carries payload data (or the token carries payload
    /// bytes) but the store has no payload coder.
    #[error("session has payload data but no payload coder is configured")]
    MissingCoder,

    /// The token's digest doesn't match its contents.
    ///
    /// Either the token was modified, or it was signed with a different
    /// key. No field of the record may be trusted, so the carried session
    /// is `Expired` and holds nothing but the token.
    #[error("session token was tampered with")]
    Tampered(Box<Session>),

    /// Encoding or decoding the application payload failed.
    #[error(transparent)]
    Payload(#[from] cookieforge_codec::CodecError),

    /// A server-side store has no session for this token.
    #[error("no session stored for this token")]
    NotFound,

    /// A server-side store failed for its own reasons.
    #[error("session backend failed: {0}")]
    Backend(String),
}

impl SessionError {
    /// Builds the integrity error for `token`.
    pub fn tampered(token: impl Into<String>) -> Self {
        Self::Tampered(Box::new(Session::expired(token)))
    }

    /// Returns `true` for errors raised while building a store.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::InvalidCipherKey(_) | Self::IncompleteCoder)
    }

    /// Returns `true` if the token failed its integrity check.
    pub fn is_tampered(&self) -> bool {
        matches!(self, Self::Tampered(_))
    }
}
