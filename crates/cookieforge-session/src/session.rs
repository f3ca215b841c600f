//! Session types: the in-memory view of one visitor's session.
//!
//! A session is created fresh for every request: decoded from the inbound
//! cookie (or started empty), mutated by the application, and encoded back
//! into the outbound cookie. It tracks:
//! - WHETHER it can be trusted (`state`)
//! - WHEN it stops being valid (`expiry`)
//! - WHO the visitor is (`login_name`) and a few application bits (`flags`)
//! - WHAT else the application wants to remember (`data`)

use std::fmt;

/// Longest login name a session record can hold, in bytes.
///
/// The record stores the name's length in a single byte, so this is a hard
/// limit, not a recommendation.
pub const MAX_LOGIN_NAME_LEN: usize = u8::MAX as usize;

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// Where a session is in its lifecycle.
///
/// ```text
///   New ──(save)──→ Valid ──(expiry passes / bad digest)──→ Expired
/// ```
///
/// - **New**: no usable cookie was presented. `expiry` means nothing yet.
/// - **Valid**: the cookie verified and hasn't reached its expiry.
/// - **Expired**: the cookie is past its expiry, or failed verification.
///   Saving an expired session tells the browser to drop the cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    New,
    Valid,
    Expired,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::New => "NEW",
            Self::Valid => "VALID",
            Self::Expired => "EXPIRED",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// One visitor's session.
///
/// `D` is the application payload type. It defaults to `()` for
/// applications that only need `login_name` and `flags`. Each store is
/// bound to exactly one payload type, so decoding never has to guess what
/// shape the payload has.
#[derive(Debug, Clone, PartialEq)]
pub struct Session<D = ()> {
    /// Current lifecycle state.
    pub state: SessionState,

    /// Unix timestamp (seconds) after which the session is expired.
    /// Only meaningful when `state` isn't `New`.
    pub expiry: u32,

    /// The provider's handle for this session.
    ///
    /// For [`CookieStore`](crate::CookieStore) this is the encoded cookie
    /// value itself; server-side stores use a short random id.
    pub token: String,

    /// The visitor's identity. At most [`MAX_LOGIN_NAME_LEN`] bytes.
    pub login_name: String,

    /// Application-defined bitmask (roles, feature switches, ...).
    pub flags: u64,

    /// Application payload. `None` means "nothing to store".
    pub data: Option<D>,
}

impl<D> Session<D> {
    /// Creates an empty session in the `New` state.
    pub fn new() -> Self {
        Self::with_token(String::new())
    }

    /// Creates an empty `New` session that already carries a token.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            state: SessionState::New,
            expiry: 0,
            token: token.into(),
            login_name: String::new(),
            flags: 0,
            data: None,
        }
    }

    /// Creates an `Expired` session with nothing in it but its token.
    ///
    /// This is what a cookie that failed verification turns into: the
    /// caller learns that a cookie was presented, and nothing else.
    pub fn expired(token: impl Into<String>) -> Self {
        Self {
            state: SessionState::Expired,
            ..Self::with_token(token)
        }
    }

    /// Returns `true` if the session is `Valid`.
    pub fn is_valid(&self) -> bool {
        self.state == SessionState::Valid
    }
}

/// Hand-written because `#[derive(Default)]` would demand `D: Default`,
/// and an empty session never needs a payload value.
impl<D> Default for Session<D> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_new_and_empty() {
        let session: Session = Session::new();

        assert_eq!(session.state, SessionState::New);
        assert_eq!(session.expiry, 0);
        assert!(session.token.is_empty());
        assert!(session.login_name.is_empty());
        assert_eq!(session.flags, 0);
        assert!(session.data.is_none());
    }

    #[test]
    fn test_with_token_keeps_token() {
        let session: Session<String> = Session::with_token("abc");

        assert_eq!(session.state, SessionState::New);
        assert_eq!(session.token, "abc");
    }

    #[test]
    fn test_expired_carries_only_token() {
        let session: Session<Vec<u8>> = Session::expired("tok");

        assert_eq!(session.state, SessionState::Expired);
        assert_eq!(session.token, "tok");
        assert!(session.login_name.is_empty());
        assert!(session.data.is_none());
        assert!(!session.is_valid());
    }

    #[test]
    fn test_default_does_not_require_default_payload() {
        // `NoDefault` deliberately lacks a Default impl.
        #[derive(Debug)]
        struct NoDefault;

        let session: Session<NoDefault> = Session::default();
        assert_eq!(session.state, SessionState::New);
    }

    #[test]
    fn test_state_display_uses_upper_case_names() {
        assert_eq!(SessionState::New.to_string(), "NEW");
        assert_eq!(SessionState::Valid.to_string(), "VALID");
        assert_eq!(SessionState::Expired.to_string(), "EXPIRED");
    }
}
