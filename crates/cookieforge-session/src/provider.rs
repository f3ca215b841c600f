//! The storage capability every session backend implements.
//!
//! Cookieforge doesn't care WHERE a session lives. It could be packed into
//! the cookie itself ([`CookieStore`](crate::CookieStore)), kept in process
//! memory ([`MemoryStore`](crate::MemoryStore)), or stored in Redis or a
//! database by your own implementation. The lifecycle layer only ever talks
//! to a [`Provider`].

use crate::{Session, SessionError};

/// Stores and retrieves sessions by token.
///
/// The token is whatever ends up in the cookie. For a stateless backend it
/// IS the encoded session; for a server-side backend it's a lookup key.
///
/// # Trait bounds
///
/// - `Send + Sync` → one provider serves every request, possibly from
///   many threads at once. Server-side providers do their own locking.
/// - `'static` → the provider lives as long as the session manager.
///
/// # Example
///
/// ```rust
/// use cookieforge_session::{Provider, Session, SessionError};
///
/// /// Refuses to store anything. Handy for testing error paths.
/// struct ReadOnlyStore;
///
/// impl Provider for ReadOnlyStore {
///     fn put(&self, _session: &Session) -> Result<String, SessionError> {
///         Err(SessionError::Backend("store is read-only".into()))
///     }
///
///     fn get(&self, _token: &str) -> Result<Session, SessionError> {
///         Err(SessionError::NotFound)
///     }
///
///     fn delete(&self, _token: &str) -> Result<(), SessionError> {
///         Ok(())
///     }
/// }
/// ```
pub trait Provider<D = ()>: Send + Sync + 'static {
    /// Saves a session and returns the token to put in the cookie.
    ///
    /// # Errors
    /// Backend-specific. [`CookieStore`](crate::CookieStore) rejects
    /// over-long login names and payload coding failures.
    fn put(&self, session: &Session<D>) -> Result<String, SessionError>;

    /// Loads the session a token refers to.
    ///
    /// A session that passed the provider's checks comes back `Valid`.
    /// Comparing `expiry` against the clock is the lifecycle layer's job.
    ///
    /// # Errors
    /// - [`SessionError::Tampered`] — the token failed verification; the
    ///   error carries the `Expired` session it stands for
    /// - [`SessionError::NotFound`] — no such session (server-side stores)
    /// - any input or payload error raised while decoding
    fn get(&self, token: &str) -> Result<Session<D>, SessionError>;

    /// Forgets the session a token refers to.
    ///
    /// # Errors
    /// Backend-specific. Stateless stores always succeed.
    fn delete(&self, token: &str) -> Result<(), SessionError>;
}
