//! The session manager: turns cookies into sessions and back.
//!
//! This is the layer request handlers talk to. Per request:
//!
//! ```text
//! Cookie header ──→ start() ──→ Session ──(handler mutates)──→ save() ──→ SetCookie
//!                                   │
//!                                   └──→ destroy() ──→ SetCookie (removal)
//! ```
//!
//! # State transitions
//!
//! | Operation | From      | To        | Cookie written                    |
//! |-----------|-----------|-----------|-----------------------------------|
//! | `start`   | *(none)*  | `New`     | —                                 |
//! | `start`   | *(token)* | `Valid`   | —                                 |
//! | `start`   | *(token)* | `Expired` | — (past expiry or tampered)       |
//! | `save`    | `New`     | `Valid`   | new token, expiry = now + max age |
//! | `save`    | `Valid`   | `Valid`   | re-encoded token, same expiry     |
//! | `save`    | `Expired` | `Expired` | token expiring now, `Max-Age=0`   |
//! | `destroy` | any       | unchanged | empty value, `Max-Age=0`          |
//!
//! # Time
//!
//! `start` and `save` read the wall clock. `start_at` and `save_at` take
//! the current Unix time as an argument, which keeps tests deterministic.

use std::marker::PhantomData;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use cookieforge_session::{Provider, Session, SessionError, SessionState};

use crate::{CookieConfig, CookieforgeError, SetCookie, cookie_value};

/// Runs the session lifecycle on top of a [`Provider`].
///
/// Creating a manager is the one-time initialization step. It's immutable
/// afterwards, so wrap it in an `Arc` and share it between handlers.
///
/// `D` is the session payload type; it's usually inferred from the store.
pub struct SessionManager<P, D = ()> {
    store: P,
    config: CookieConfig,
    // `fn() -> D` keeps the manager Send + Sync regardless of `D`.
    _payload: PhantomData<fn() -> D>,
}

impl<P, D> SessionManager<P, D>
where
    P: Provider<D>,
{
    /// Creates a manager that stores sessions in `store` and writes
    /// cookies according to `config`.
    pub fn new(store: P, config: CookieConfig) -> Self {
        tracing::info!(
            cookie = %config.name,
            max_age_secs = config.max_age.as_secs(),
            "session manager initialized"
        );
        Self {
            store,
            config,
            _payload: PhantomData,
        }
    }

    /// The cookie configuration.
    pub fn config(&self) -> &CookieConfig {
        &self.config
    }

    /// The underlying provider.
    pub fn store(&self) -> &P {
        &self.store
    }

    // =====================================================================
    // start
    // =====================================================================

    /// Starts a session from the inbound cookie value, using the wall clock.
    ///
    /// See [`start_at`](Self::start_at).
    pub fn start(&self, cookie: Option<&str>) -> Result<Session<D>, CookieforgeError> {
        self.start_at(cookie, unix_now()?)
    }

    /// Starts a session from a raw `Cookie` request header.
    ///
    /// Looks up the configured cookie name in the header; a missing header
    /// or missing cookie both yield a `New` session.
    pub fn start_from_header(
        &self,
        header: Option<&str>,
    ) -> Result<Session<D>, CookieforgeError> {
        let value = header.and_then(|h| cookie_value(h, &self.config.name));
        self.start(value)
    }

    /// Starts a session from the inbound cookie value at time `now`.
    ///
    /// - no cookie or an empty value → `New` session
    /// - a token that fails verification → `Expired` session carrying only
    ///   the token, so the next `save` clears the cookie
    /// - a token whose expiry is before `now` → `Expired`, and the provider
    ///   is asked to delete it
    /// - otherwise → `Valid`
    ///
    /// # Errors
    /// Any provider error other than [`SessionError::Tampered`] is returned
    /// as-is: malformed base64, truncated tokens, payload decoding
    /// failures, backend failures.
    pub fn start_at(
        &self,
        cookie: Option<&str>,
        now: u32,
    ) -> Result<Session<D>, CookieforgeError> {
        let Some(token) = cookie.filter(|value| !value.is_empty()) else {
            tracing::debug!("no session cookie, starting new session");
            return Ok(Session::new());
        };

        let mut session = match self.store.get(token) {
            Ok(session) => session,
            Err(SessionError::Tampered(shell)) => {
                tracing::warn!(cookie = %self.config.name, "rejected tampered session cookie");
                return Ok(Session::expired(shell.token));
            }
            Err(e) => return Err(e.into()),
        };

        if session.token.is_empty() {
            session.token = token.to_string();
        }

        if session.expiry < now {
            session.state = SessionState::Expired;
            self.store.delete(&session.token)?;
            tracing::debug!(
                login = %session.login_name,
                expiry = session.expiry,
                "session expired"
            );
        } else {
            session.state = SessionState::Valid;
        }

        Ok(session)
    }

    // =====================================================================
    // save
    // =====================================================================

    /// Saves a session using the wall clock. See [`save_at`](Self::save_at).
    pub fn save(&self, session: &mut Session<D>) -> Result<SetCookie, CookieforgeError> {
        self.save_at(session, unix_now()?)
    }

    /// Saves a session at time `now` and returns the cookie to send back.
    ///
    /// - `New` → becomes `Valid` with `expiry = now + max_age`
    /// - `Valid` → re-encoded as is (the expiry doesn't slide)
    /// - `Expired` → `expiry = now`, the old token is deleted, and the
    ///   returned cookie tells the browser to drop it
    ///
    /// Every branch ends with `Provider::put`, and `session.token` is
    /// updated to the token it returns.
    ///
    /// # Errors
    /// Provider errors (for [`CookieStore`](crate::CookieStore): login name
    /// over 255 bytes, payload encoding failure), or
    /// [`CookieforgeError::ExpiryOutOfRange`] if `now + max_age` doesn't
    /// fit in 32 bits.
    pub fn save_at(
        &self,
        session: &mut Session<D>,
        now: u32,
    ) -> Result<SetCookie, CookieforgeError> {
        let max_age = match session.state {
            SessionState::New => {
                session.expiry = expiry_after(now, self.config.max_age)?;
                session.state = SessionState::Valid;
                0
            }
            SessionState::Valid => 0,
            SessionState::Expired => {
                session.expiry = now;
                self.store.delete(&session.token)?;
                -1
            }
        };

        let token = self.store.put(session)?;
        session.token.clone_from(&token);

        tracing::info!(
            state = %session.state,
            login = %session.login_name,
            expiry = session.expiry,
            "session saved"
        );

        Ok(self.cookie(token, max_age))
    }

    // =====================================================================
    // destroy
    // =====================================================================

    /// Deletes a session and returns a cookie that removes it from the
    /// browser.
    ///
    /// The session value itself is left alone; callers normally drop it.
    ///
    /// # Errors
    /// Whatever `Provider::delete` returns. No cookie is produced then.
    pub fn destroy(&self, session: &Session<D>) -> Result<SetCookie, CookieforgeError> {
        self.store.delete(&session.token)?;
        tracing::info!(login = %session.login_name, "session destroyed");
        Ok(self.cookie(String::new(), -1))
    }

    fn cookie(&self, value: String, max_age: i64) -> SetCookie {
        SetCookie {
            name: self.config.name.clone(),
            value,
            domain: self.config.domain.clone(),
            path: self.config.path.clone(),
            secure: self.config.secure,
            http_only: true,
            max_age,
        }
    }
}

/// Current Unix time in seconds, as stored in a session's `expiry`.
fn unix_now() -> Result<u32, CookieforgeError> {
    let secs = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
    u32::try_from(secs).map_err(|_| CookieforgeError::ExpiryOutOfRange(secs))
}

fn expiry_after(now: u32, max_age: Duration) -> Result<u32, CookieforgeError> {
    let expiry = u64::from(now).saturating_add(max_age.as_secs());
    u32::try_from(expiry).map_err(|_| CookieforgeError::ExpiryOutOfRange(expiry))
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! Unit tests for `SessionManager`.
    //!
    //! Time-dependent behavior goes through `start_at` / `save_at` with a
    //! fixed `NOW`, never `sleep`.

    use std::sync::Mutex;

    use cookieforge_session::{CookieStore, MemoryStore};

    use super::*;

    const NOW: u32 = 1_700_000_000;

    // -- Helpers ----------------------------------------------------------

    fn cookie_manager() -> SessionManager<CookieStore> {
        let store = CookieStore::builder(b"1234")
            .cipher_key(b"1234567890abcdef")
            .build()
            .unwrap();
        SessionManager::new(
            store,
            CookieConfig::default()
                .with_name("mysession")
                .with_domain("localhost")
                .with_max_age(Duration::from_secs(60)),
        )
    }

    fn memory_manager() -> SessionManager<MemoryStore> {
        SessionManager::new(MemoryStore::with_clock(|| NOW), CookieConfig::default())
    }

    /// Wraps a provider and records every `delete` call.
    struct RecordingStore<P> {
        inner: P,
        deleted: Mutex<Vec<String>>,
    }

    impl<P: Provider> Provider for RecordingStore<P> {
        fn put(&self, session: &Session) -> Result<String, SessionError> {
            self.inner.put(session)
        }

        fn get(&self, token: &str) -> Result<Session, SessionError> {
            self.inner.get(token)
        }

        fn delete(&self, token: &str) -> Result<(), SessionError> {
            self.deleted.lock().unwrap().push(token.to_string());
            self.inner.delete(token)
        }
    }

    /// A provider whose every operation fails.
    struct BrokenStore;

    impl Provider for BrokenStore {
        fn put(&self, _: &Session) -> Result<String, SessionError> {
            Err(SessionError::Backend("put failed".into()))
        }

        fn get(&self, _: &str) -> Result<Session, SessionError> {
            Err(SessionError::Backend("get failed".into()))
        }

        fn delete(&self, _: &str) -> Result<(), SessionError> {
            Err(SessionError::Backend("delete failed".into()))
        }
    }

    fn recording_manager() -> SessionManager<RecordingStore<CookieStore>> {
        let inner = CookieStore::builder(b"1234").build().unwrap();
        SessionManager::new(
            RecordingStore {
                inner,
                deleted: Mutex::new(Vec::new()),
            },
            CookieConfig::default(),
        )
    }

    // =====================================================================
    // start()
    // =====================================================================

    #[test]
    fn test_start_without_cookie_returns_new() {
        let mgr = cookie_manager();

        let session = mgr.start_at(None, NOW).unwrap();

        assert_eq!(session.state, SessionState::New);
    }

    #[test]
    fn test_start_with_empty_cookie_returns_new() {
        let mgr = cookie_manager();

        let session = mgr.start_at(Some(""), NOW).unwrap();

        assert_eq!(session.state, SessionState::New);
    }

    #[test]
    fn test_start_unexpired_token_returns_valid() {
        let mgr = cookie_manager();
        let mut session = Session::new();
        session.login_name = "alice".into();
        let cookie = mgr.save_at(&mut session, NOW).unwrap();

        let restored = mgr.start_at(Some(&cookie.value), NOW + 30).unwrap();

        assert_eq!(restored.state, SessionState::Valid);
        assert_eq!(restored.login_name, "alice");
        assert_eq!(restored.token, cookie.value);
    }

    #[test]
    fn test_start_at_exact_expiry_is_still_valid() {
        // Expired means strictly before `now`.
        let mgr = cookie_manager();
        let mut session = Session::new();
        let cookie = mgr.save_at(&mut session, NOW).unwrap();

        let restored = mgr.start_at(Some(&cookie.value), NOW + 60).unwrap();

        assert_eq!(restored.state, SessionState::Valid);
    }

    #[test]
    fn test_start_past_expiry_returns_expired_and_deletes() {
        let mgr = recording_manager();
        let mut session = Session::new();
        let cookie = mgr.save_at(&mut session, NOW).unwrap();

        let restored = mgr.start_at(Some(&cookie.value), NOW + 3601).unwrap();

        assert_eq!(restored.state, SessionState::Expired);
        let deleted = mgr.store().deleted.lock().unwrap();
        assert_eq!(*deleted, vec![cookie.value.clone()]);
    }

    #[test]
    fn test_start_expiry_one_second_ago_is_expired() {
        let mgr = cookie_manager();
        let session = Session {
            state: SessionState::Valid,
            expiry: NOW - 1,
            ..Session::new()
        };
        let token = mgr.store().put(&session).unwrap();

        let restored = mgr.start_at(Some(&token), NOW).unwrap();

        assert_eq!(restored.state, SessionState::Expired);
    }

    #[test]
    fn test_start_tampered_token_returns_expired_shell() {
        let mgr = cookie_manager();
        let mut session = Session::new();
        session.login_name = "mallory".into();
        session.flags = u64::MAX;
        let cookie = mgr.save_at(&mut session, NOW).unwrap();

        // Swap the first character for a different base64 digit.
        let mut forged = cookie.value.clone();
        let replacement = if forged.starts_with('A') { "B" } else { "A" };
        forged.replace_range(0..1, replacement);

        let restored = mgr.start_at(Some(&forged), NOW).unwrap();

        assert_eq!(restored.state, SessionState::Expired);
        assert!(restored.login_name.is_empty(), "no field may leak");
        assert_eq!(restored.flags, 0);
        assert_eq!(restored.token, forged);
    }

    #[test]
    fn test_start_malformed_token_returns_error() {
        let mgr = cookie_manager();

        let result = mgr.start_at(Some("%%%"), NOW);

        assert!(matches!(
            result,
            Err(CookieforgeError::Session(SessionError::Base64(_)))
        ));
    }

    #[test]
    fn test_start_backend_error_propagates() {
        let mgr = SessionManager::new(BrokenStore, CookieConfig::default());

        let result = mgr.start_at(Some("token"), NOW);

        assert!(matches!(
            result,
            Err(CookieforgeError::Session(SessionError::Backend(_)))
        ));
    }

    #[test]
    fn test_start_from_header_picks_configured_cookie() {
        let mgr = cookie_manager();
        let mut session = Session::new();
        session.login_name = "carol".into();
        let cookie = mgr.save_at(&mut session, NOW).unwrap();
        let header = format!("theme=dark; mysession={}; lang=en", cookie.value);

        // `start_from_header` uses the wall clock; the cookie was issued
        // in 2023 with a 60 s lifetime, so it reads as expired.
        let restored = mgr.start_from_header(Some(&header)).unwrap();

        assert_eq!(restored.state, SessionState::Expired);
        assert_eq!(restored.login_name, "carol");
    }

    #[test]
    fn test_start_from_header_without_cookie_returns_new() {
        let mgr = cookie_manager();

        assert_eq!(
            mgr.start_from_header(None).unwrap().state,
            SessionState::New
        );
        assert_eq!(
            mgr.start_from_header(Some("other=1")).unwrap().state,
            SessionState::New
        );
    }

    // =====================================================================
    // save()
    // =====================================================================

    #[test]
    fn test_save_new_session_becomes_valid_with_expiry() {
        let mgr = cookie_manager();
        let mut session = Session::new();

        let cookie = mgr.save_at(&mut session, NOW).unwrap();

        assert_eq!(session.state, SessionState::Valid);
        assert_eq!(session.expiry, NOW + 60);
        assert_eq!(session.token, cookie.value);
        assert_eq!(cookie.name, "mysession");
        assert_eq!(cookie.domain, "localhost");
        assert_eq!(cookie.path, "/");
        assert!(cookie.http_only);
        assert_eq!(cookie.max_age, 0);
    }

    #[test]
    fn test_save_valid_session_keeps_expiry() {
        let mgr = cookie_manager();
        let mut session = Session::new();
        mgr.save_at(&mut session, NOW).unwrap();

        mgr.save_at(&mut session, NOW + 30).unwrap();

        assert_eq!(session.expiry, NOW + 60, "expiry must not slide");
        assert_eq!(session.state, SessionState::Valid);
    }

    #[test]
    fn test_save_expired_session_issues_removal_cookie() {
        let mgr = recording_manager();
        let mut session = Session::new();
        let first = mgr.save_at(&mut session, NOW).unwrap();
        session.state = SessionState::Expired;

        let cookie = mgr.save_at(&mut session, NOW + 10).unwrap();

        assert!(cookie.is_removal());
        assert!(!cookie.value.is_empty(), "a replacement token is still written");
        assert_eq!(session.expiry, NOW + 10);
        assert_eq!(session.state, SessionState::Expired);
        assert_eq!(*mgr.store().deleted.lock().unwrap(), vec![first.value]);
    }

    #[test]
    fn test_save_login_name_too_long_returns_error() {
        let mgr = cookie_manager();
        let mut session = Session::new();
        session.login_name = "x".repeat(256);

        let result = mgr.save_at(&mut session, NOW);

        assert!(matches!(
            result,
            Err(CookieforgeError::Session(SessionError::LoginNameTooLong(256)))
        ));
    }

    #[test]
    fn test_save_expiry_past_u32_returns_out_of_range() {
        let mgr = cookie_manager();
        let mut session = Session::new();

        let result = mgr.save_at(&mut session, u32::MAX - 10);

        assert!(matches!(result, Err(CookieforgeError::ExpiryOutOfRange(_))));
    }

    #[test]
    fn test_save_backend_error_propagates() {
        let mgr = SessionManager::new(BrokenStore, CookieConfig::default());
        let mut session = Session::new();

        let result = mgr.save_at(&mut session, NOW);

        assert!(matches!(
            result,
            Err(CookieforgeError::Session(SessionError::Backend(_)))
        ));
    }

    // =====================================================================
    // destroy()
    // =====================================================================

    #[test]
    fn test_destroy_returns_empty_removal_cookie() {
        let mgr = cookie_manager();
        let mut session = Session::new();
        mgr.save_at(&mut session, NOW).unwrap();

        let cookie = mgr.destroy(&session).unwrap();

        assert!(cookie.value.is_empty());
        assert!(cookie.is_removal());
        assert!(cookie.http_only);
        assert_eq!(session.state, SessionState::Valid, "state is untouched");
    }

    #[test]
    fn test_destroy_backend_error_propagates() {
        let mgr = SessionManager::new(BrokenStore, CookieConfig::default());

        let result = mgr.destroy(&Session::new());

        assert!(result.is_err());
    }

    // =====================================================================
    // Server-side provider
    // =====================================================================

    #[test]
    fn test_memory_store_lifecycle() {
        let mgr = memory_manager();

        let mut session = mgr.start_at(None, NOW).unwrap();
        session.login_name = "dave".into();
        let cookie = mgr.save_at(&mut session, NOW).unwrap();
        assert_eq!(cookie.value.len(), 32, "server-side token is a short id");

        let restored = mgr.start_at(Some(&cookie.value), NOW + 1).unwrap();
        assert_eq!(restored.state, SessionState::Valid);
        assert_eq!(restored.login_name, "dave");

        mgr.destroy(&restored).unwrap();
        let gone = mgr.start_at(Some(&cookie.value), NOW + 2);
        assert!(matches!(
            gone,
            Err(CookieforgeError::Session(SessionError::NotFound))
        ));
    }

    #[test]
    fn test_memory_store_expired_session_is_evicted() {
        let mgr = memory_manager();
        let mut session = Session::new();
        let cookie = mgr.save_at(&mut session, NOW).unwrap();

        let restored = mgr.start_at(Some(&cookie.value), NOW + 3601).unwrap();

        assert_eq!(restored.state, SessionState::Expired);
        assert!(mgr.store().is_empty());
    }

    #[test]
    fn test_memory_store_expire_then_save_leaves_nothing_behind() {
        let mgr = memory_manager();

        for round in 0..5 {
            let mut session = mgr.start_at(None, NOW).unwrap();
            let cookie = mgr.save_at(&mut session, NOW).unwrap();

            let mut expired = mgr.start_at(Some(&cookie.value), NOW + 3601).unwrap();
            assert_eq!(expired.state, SessionState::Expired);
            let removal = mgr.save_at(&mut expired, NOW + 3601).unwrap();

            assert!(removal.is_removal());
            assert!(mgr.store().is_empty(), "record left behind in round {round}");
        }
    }
}
