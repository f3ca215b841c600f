//! Low-level encoding helpers for Cookieforge session records.
//!
//! This crate knows nothing about cookies, keys, or sessions. It provides
//! the two building blocks the session codec is assembled from:
//!
//! - **Byte packing** ([`u32_to_bytes`], [`bytes_to_u64`], ...) — fixed-width
//!   big-endian integers, the framing of every session record.
//! - **Payload coders** ([`PayloadCoder`] trait, [`JsonCoder`]) — how the
//!   application's opaque session data is turned into bytes and back.
//! - **Errors** ([`CodecError`]) — what can go wrong in either of them.
//!
//! # Architecture
//!
//! ```text
//! Session layer (record framing, MAC, cipher)
//!     ↕
//! Codec layer (this crate)  ← integers and payload bytes
//! ```

// ---------------------------------------------------------------------------
// Module declarations
// ---------------------------------------------------------------------------

mod bytes;
mod coder;
mod error;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use bytes::{
    bytes_to_u16, bytes_to_u32, bytes_to_u64, u16_to_bytes, u32_to_bytes,
    u64_to_bytes,
};
pub use coder::PayloadCoder;
#[cfg(feature = "json")]
pub use coder::JsonCoder;
pub use error::CodecError;
