//! Payload coder trait and implementations for session data.
//!
//! A session carries an opaque application payload (a user profile, a
//! shopping cart, ...). The session codec doesn't know its shape; it just
//! needs *something* that can turn it into bytes and back. That something
//! is a [`PayloadCoder`].
//!
//! Decoding writes into a target that the caller already allocated (the
//! session codec gets it from a factory function). This keeps the coder
//! free of any knowledge about how a fresh payload is constructed.
//!
//! Currently we provide [`JsonCoder`]. A compact binary coder can be added
//! later without touching the session layer.

#[cfg(feature = "json")]
use serde::{Serialize, de::DeserializeOwned};

use crate::CodecError;

/// Encodes a payload of type `T` to bytes and decodes bytes into a `T`.
///
/// ## Why a type parameter on the trait (not on the methods)?
///
/// The session codec stores its coder as `Box<dyn PayloadCoder<T>>`.
/// Trait objects can't have generic methods, so the payload type is fixed
/// per coder instance instead. One coder implementation (like
/// [`JsonCoder`]) can still serve every serde-compatible type through a
/// blanket `impl<T> PayloadCoder<T>`.
///
/// ## Trait bounds
///
/// - `Send + Sync` → the codec is shared by every request handler.
/// - `'static` → it lives as long as the session store that owns it.
pub trait PayloadCoder<T>: Send + Sync + 'static {
    /// Serializes a payload into bytes.
    ///
    /// # Errors
    /// Returns a [`CodecError`] if the value can't be represented in
    /// this format.
    fn encode(&self, value: &T) -> Result<Vec<u8>, CodecError>;

    /// Deserializes `data` into `target`, replacing its contents.
    ///
    /// # Errors
    /// Returns a [`CodecError`] if the bytes are malformed or don't
    /// match the shape of `T`. `target` is left in an unspecified
    /// (but valid) state on error.
    fn decode(&self, target: &mut T, data: &[u8]) -> Result<(), CodecError>;
}

// ---------------------------------------------------------------------------
// JsonCoder
// ---------------------------------------------------------------------------

/// A [`PayloadCoder`] that uses JSON (via `serde_json`).
///
/// JSON is the default because it is forgiving: adding an optional field to
/// the payload type doesn't invalidate cookies that are already out there.
///
/// This is behind the `json` feature flag (enabled by default).
///
/// ## Example
///
/// ```rust
/// use cookieforge_codec::{JsonCoder, PayloadCoder};
///
/// let coder = JsonCoder;
///
/// let bytes = PayloadCoder::<Vec<u32>>::encode(&coder, &vec![1, 2, 3]).unwrap();
///
/// let mut decoded: Vec<u32> = Vec::new();
/// coder.decode(&mut decoded, &bytes).unwrap();
/// assert_eq!(decoded, vec![1, 2, 3]);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCoder;

#[cfg(feature = "json")]
impl<T> PayloadCoder<T> for JsonCoder
where
    T: Serialize + DeserializeOwned,
{
    fn encode(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(value).map_err(CodecError::Encode)
    }

    fn decode(&self, target: &mut T, data: &[u8]) -> Result<(), CodecError> {
        *target = serde_json::from_slice(data).map_err(CodecError::Decode)?;
        Ok(())
    }
}
