//! A server-side [`Provider`]: sessions live in process memory.
//!
//! Where [`CookieStore`](crate::CookieStore) puts the whole session in the
//! cookie, `MemoryStore` puts only a random token there and keeps the
//! session in a map. Useful when sessions are large, or when you need to
//! revoke a session from the server side (delete the entry and the
//! cookie becomes worthless).
//!
//! # Concurrency note
//!
//! Unlike the stateless store, this one has shared mutable state. The map
//! sits behind a `RwLock` so many requests can read at once while writes
//! take turns. Sessions are cloned in and out; nothing hands out references
//! into the map.
//!
//! # Eviction
//!
//! Browsers don't tell the server when they drop a cookie, so records are
//! evicted on the server's own schedule:
//! - `Expired` sessions are never stored. `put` still returns a token so
//!   the caller can write its removal cookie.
//! - Every `put` first drops records whose `expiry` is before the store's
//!   clock. [`purge_expired`](MemoryStore::purge_expired) does the same on
//!   demand.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;

use crate::{Provider, Session, SessionError, SessionState};

type SessionMap<D> = HashMap<String, Session<D>>;

/// In-memory session store keyed by random tokens.
#[derive(Debug)]
pub struct MemoryStore<D = ()> {
    sessions: RwLock<SessionMap<D>>,
    clock: fn() -> u32,
}

impl<D> MemoryStore<D> {
    /// Creates an empty store that reads the wall clock.
    pub fn new() -> Self {
        Self::with_clock(unix_now)
    }

    /// Creates an empty store that reads the current Unix time (seconds)
    /// from `clock`.
    pub fn with_clock(clock: fn() -> u32) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// Returns the number of stored sessions.
    ///
    /// Counts the map even if a writer panicked while holding the lock.
    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if no sessions are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every record whose expiry is before the store's clock and
    /// returns how many were dropped.
    ///
    /// # Errors
    /// [`SessionError::Backend`] if the lock is poisoned.
    pub fn purge_expired(&self) -> Result<usize, SessionError> {
        let mut sessions = self.write()?;
        Ok(evict_expired(&mut sessions, (self.clock)()))
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, SessionMap<D>>, SessionError> {
        self.sessions.read().map_err(|_| poisoned())
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, SessionMap<D>>, SessionError> {
        self.sessions.write().map_err(|_| poisoned())
    }
}

impl<D> Default for MemoryStore<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D> Provider<D> for MemoryStore<D>
where
    D: Clone + Send + Sync + 'static,
{
    /// Stores a copy of the session.
    ///
    /// A session whose token is already in the map is overwritten in place
    /// and keeps its token. Anything else (new sessions, deleted ones) gets
    /// a freshly generated token. `Expired` sessions get a fresh token and
    /// nothing is stored.
    fn put(&self, session: &Session<D>) -> Result<String, SessionError> {
        let mut sessions = self.write()?;
        evict_expired(&mut sessions, (self.clock)());

        if session.state == SessionState::Expired {
            sessions.remove(&session.token);
            return Ok(generate_token());
        }

        let token = if sessions.contains_key(&session.token) {
            session.token.clone()
        } else {
            generate_token()
        };

        let mut stored = session.clone();
        stored.token = token.clone();
        sessions.insert(token.clone(), stored);

        tracing::debug!(login = %session.login_name, "session stored");
        Ok(token)
    }

    fn get(&self, token: &str) -> Result<Session<D>, SessionError> {
        let mut session = self
            .read()?
            .get(token)
            .cloned()
            .ok_or(SessionError::NotFound)?;
        session.state = SessionState::Valid;
        Ok(session)
    }

    /// Removes the session. Deleting an unknown token is not an error.
    fn delete(&self, token: &str) -> Result<(), SessionError> {
        if self.write()?.remove(token).is_some() {
            tracing::debug!("session removed");
        }
        Ok(())
    }
}

fn evict_expired<D>(sessions: &mut SessionMap<D>, now: u32) -> usize {
    let before = sessions.len();
    sessions.retain(|_, session| session.expiry >= now);
    let evicted = before - sessions.len();
    if evicted > 0 {
        tracing::debug!(evicted, "expired sessions evicted");
    }
    evicted
}

fn poisoned() -> SessionError {
    SessionError::Backend("session map lock poisoned".into())
}

/// Current Unix time in seconds. A clock before 1970 reads as 0, which
/// evicts nothing; one past 2106 saturates.
fn unix_now() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| u32::try_from(elapsed.as_secs()).unwrap_or(u32::MAX))
        .unwrap_or(0)
}

/// Generates a random 32-character hex string (128 bits of entropy).
///
/// Guessing a live token is as hard as guessing a 128-bit key.
fn generate_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 16] = rng.random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

// =========================================================================
// Tests
// =========================================================================
