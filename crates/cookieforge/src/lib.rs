//! # Cookieforge
//!
//! Stateless, tamper-evident sessions carried in HTTP cookies.
//!
//! Cookieforge packs a session (login name, flags, expiry, and an
//! application payload) into a signed, optionally encrypted cookie value,
//! and refuses to trust any cookie whose signature doesn't check out. A
//! small lifecycle layer ([`SessionManager`]) turns inbound cookies into
//! [`Session`]s and sessions back into outbound [`SetCookie`] headers.
//!
//! ## Quick Start
//!
//! ```rust
//! use cookieforge::prelude::*;
//!
//! let store: CookieStore = CookieStore::builder(b"digest secret")
//!     .cipher_key(b"1234567890abcdef")
//!     .build()?;
//! let sessions: SessionManager<_> = SessionManager::new(store, CookieConfig::default());
//!
//! // First request: no cookie yet.
//! let mut session = sessions.start(None)?;
//! assert_eq!(session.state, SessionState::New);
//!
//! session.login_name = "johndoe".into();
//! let cookie = sessions.save(&mut session)?;
//!
//! // Next request presents the cookie.
//! let session = sessions.start(Some(&cookie.value))?;
//! assert_eq!(session.state, SessionState::Valid);
//! assert_eq!(session.login_name, "johndoe");
//! # Ok::<(), CookieforgeError>(())
//! ```
//!
//! ## Crates
//!
//! - `cookieforge-codec` — byte packing and payload coders
//! - `cookieforge-session` — sessions, providers, the cookie codec
//! - `cookieforge` (this crate) — lifecycle, cookie headers, configuration

mod config;
mod cookie;
mod error;
mod manager;

pub use config::CookieConfig;
pub use cookie::{SetCookie, cookie_value};
pub use error::CookieforgeError;
pub use manager::SessionManager;

pub use cookieforge_codec as codec;
pub use cookieforge_session::{
    CookieStore, CookieStoreBuilder, MemoryStore, Provider, Session,
    SessionError, SessionState,
};

/// Everything needed to wire sessions into a request handler.
pub mod prelude {
    pub use crate::{
        CookieConfig, CookieStore, CookieforgeError, MemoryStore, Provider,
        Session, SessionError, SessionManager, SessionState, SetCookie,
        cookie_value,
    };
    pub use cookieforge_codec::{CodecError, JsonCoder, PayloadCoder};
}
