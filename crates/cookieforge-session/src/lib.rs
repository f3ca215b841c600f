//! Session records and storage providers for Cookieforge.
//!
//! This crate handles everything between "here is a cookie value" and
//! "here is a [`Session`]":
//!
//! 1. **Session model** — [`Session`] and its [`SessionState`] machine
//!    (`New → Valid → Expired`)
//! 2. **Storage capability** — the [`Provider`] trait: put, get, delete
//! 3. **Stateless backend** — [`CookieStore`], which packs the whole
//!    session into a signed (and optionally encrypted) token
//! 4. **Server-side backend** — [`MemoryStore`], which keeps sessions in
//!    process memory and hands out short random tokens
//!
//! # How it fits in the stack
//!
//! ```text
//! Lifecycle layer (above)  ← start / save / destroy, cookie headers
//!     ↕
//! Session layer (this crate)  ← session records and providers
//!     ↕
//! Codec layer (below)  ← byte packing, payload coders
//! ```

mod cookie_store;
mod error;
mod memory_store;
mod provider;
mod session;

pub use cookie_store::{CookieStore, CookieStoreBuilder, DIGEST_SIZE, MIN_RECORD_LEN};
pub use error::SessionError;
pub use memory_store::MemoryStore;
pub use provider::Provider;
pub use session::{MAX_LOGIN_NAME_LEN, Session, SessionState};
