//! The stateless session codec: the whole session lives in the cookie.
//!
//! [`CookieStore`] is a [`Provider`] that keeps nothing on the server.
//! `put` packs a [`Session`] into a token; `get` unpacks and verifies it.
//!
//! # Record layout
//!
//! Before encryption, a token is this byte sequence:
//!
//! ```text
//! offset  size          field
//! 0       4             expiry       (u32, big-endian)
//! 4       8             flags        (u64, big-endian)
//! 12      1             login name length
//! 13      name_len      login name   (UTF-8)
//! 13+n    variable      payload      (PayloadCoder output, may be empty)
//! end     20            HMAC-SHA1 over everything before it
//! ```
//!
//! If a cipher key is configured, the whole thing (digest included) is
//! encrypted with AES in CFB mode. The result is URL-safe base64.
//!
//! # The fixed IV
//!
//! Every token is encrypted with the same initialization vector, so two
//! sessions with identical contents produce identical tokens, and the
//! keystream is shared by all tokens under one key. This keeps tokens
//! compatible with cookies issued by earlier deployments of this format.
//! The digest still catches every modification; the cipher only hides
//! the contents.

use std::fmt;

use aes::{Aes128, Aes256};
use base64::{Engine as _, engine::general_purpose::URL_SAFE};
use cfb_mode::cipher::{AsyncStreamCipher, KeyIvInit};
use cookieforge_codec::{
    PayloadCoder, bytes_to_u32, bytes_to_u64, u32_to_bytes, u64_to_bytes,
};
use hmac::{Hmac, Mac};
use sha1::Sha1;

use crate::{Provider, Session, SessionError, SessionState};

type HmacSha1 = Hmac<Sha1>;

/// Size of the keyed digest appended to every record, in bytes.
pub const DIGEST_SIZE: usize = 20;

/// `expiry` (4) + `flags` (8) + login name length (1).
const HEADER_LEN: usize = 13;

/// Smallest possible decoded token: a header with an empty login name,
/// no payload, and the digest.
pub const MIN_RECORD_LEN: usize = HEADER_LEN + DIGEST_SIZE;

const FIXED_IV: [u8; 16] = [
    0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b,
    0x0c, 0x0d, 0x0e, 0x0f,
];

// ---------------------------------------------------------------------------
// Cipher
// ---------------------------------------------------------------------------

/// AES key, with the key size picked from its length at build time.
#[derive(Clone)]
enum Cipher {
    Aes128(Vec<u8>),
    Aes256(Vec<u8>),
}

impl Cipher {
    /// Picks the AES variant for a key. An empty key means "don't encrypt".
    fn from_key(key: &[u8]) -> Result<Option<Self>, SessionError> {
        match key.len() {
            0 => Ok(None),
            16 => Ok(Some(Self::Aes128(key.to_vec()))),
            32 => Ok(Some(Self::Aes256(key.to_vec()))),
            other => Err(SessionError::InvalidCipherKey(other)),
        }
    }

    fn encrypt(&self, buf: &mut [u8]) -> Result<(), SessionError> {
        match self {
            Self::Aes128(key) => {
                cfb_mode::Encryptor::<Aes128>::new_from_slices(key, &FIXED_IV)
                    .map_err(|_| SessionError::InvalidCipherKey(key.len()))?
                    .encrypt(buf);
            }
            Self::Aes256(key) => {
                cfb_mode::Encryptor::<Aes256>::new_from_slices(key, &FIXED_IV)
                    .map_err(|_| SessionError::InvalidCipherKey(key.len()))?
                    .encrypt(buf);
            }
        }
        Ok(())
    }

    fn decrypt(&self, buf: &mut [u8]) -> Result<(), SessionError> {
        match self {
            Self::Aes128(key) => {
                cfb_mode::Decryptor::<Aes128>::new_from_slices(key, &FIXED_IV)
                    .map_err(|_| SessionError::InvalidCipherKey(key.len()))?
                    .decrypt(buf);
            }
            Self::Aes256(key) => {
                cfb_mode::Decryptor::<Aes256>::new_from_slices(key, &FIXED_IV)
                    .map_err(|_| SessionError::InvalidCipherKey(key.len()))?
                    .decrypt(buf);
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Payload slot
// ---------------------------------------------------------------------------

type Factory<D> = Box<dyn Fn() -> D + Send + Sync>;

/// A payload coder together with the factory that makes fresh targets
/// for it. Holding both in one struct means a built store can never have
/// one without the other.
struct PayloadSlot<D> {
    coder: Box<dyn PayloadCoder<D>>,
    factory: Factory<D>,
}

// ---------------------------------------------------------------------------
// CookieStoreBuilder
// ---------------------------------------------------------------------------

/// Builder for [`CookieStore`].
///
/// Created by [`CookieStore::builder`]. Only the digest key is required.
///
/// ```rust
/// use cookieforge_session::CookieStore;
///
/// let store: CookieStore = CookieStore::builder(b"digest secret")
///     .cipher_key(b"1234567890abcdef")
///     .build()
///     .expect("16-byte key is valid");
/// ```
pub struct CookieStoreBuilder<D> {
    digest_key: Vec<u8>,
    cipher_key: Vec<u8>,
    coder: Option<Box<dyn PayloadCoder<D>>>,
    factory: Option<Factory<D>>,
}

impl<D: 'static> CookieStoreBuilder<D> {
    /// Sets the AES key. Must be 16 or 32 bytes; an empty key (the
    /// default) disables encryption.
    pub fn cipher_key(mut self, key: impl AsRef<[u8]>) -> Self {
        self.cipher_key = key.as_ref().to_vec();
        self
    }

    /// Sets the coder used for `Session::data`.
    pub fn coder(mut self, coder: impl PayloadCoder<D>) -> Self {
        self.coder = Some(Box::new(coder));
        self
    }

    /// Sets the function that produces an empty payload to decode into.
    pub fn factory(
        mut self,
        factory: impl Fn() -> D + Send + Sync + 'static,
    ) -> Self {
        self.factory = Some(Box::new(factory));
        self
    }

    /// Builds the store.
    ///
    /// # Errors
    /// - [`SessionError::InvalidCipherKey`] — key isn't 0, 16, or 32 bytes
    /// - [`SessionError::IncompleteCoder`] — only one of coder/factory set
    pub fn build(self) -> Result<CookieStore<D>, SessionError> {
        let cipher = Cipher::from_key(&self.cipher_key)?;

        let payload = match (self.coder, self.factory) {
            (Some(coder), Some(factory)) => Some(PayloadSlot { coder, factory }),
            (None, None) => None,
            _ => return Err(SessionError::IncompleteCoder),
        };

        // HMAC accepts keys of any length; this only fails if that ever
        // stops being true.
        let mac = <HmacSha1 as Mac>::new_from_slice(&self.digest_key)
            .map_err(|_| SessionError::Backend("HMAC rejected digest key".into()))?;

        tracing::debug!(
            encrypted = cipher.is_some(),
            payload = payload.is_some(),
            "cookie store built"
        );

        Ok(CookieStore {
            mac,
            cipher,
            payload,
        })
    }
}

#[cfg(feature = "json")]
impl<D> CookieStoreBuilder<D>
where
    D: serde::Serialize + serde::de::DeserializeOwned + Default + 'static,
{
    /// Uses [`JsonCoder`](cookieforge_codec::JsonCoder) for the payload and
    /// `D::default()` as the factory.
    pub fn json_payload(self) -> Self {
        self.coder(cookieforge_codec::JsonCoder).factory(D::default)
    }
}

// ---------------------------------------------------------------------------
// CookieStore
// ---------------------------------------------------------------------------

/// A [`Provider`] that stores the entire session inside the token.
///
/// There is no server-side state: `delete` is a no-op, and any number of
/// servers sharing the same keys can read each other's cookies. The store
/// itself is immutable after [`build`](CookieStoreBuilder::build), so it's
/// safe to share across threads without locking.
pub struct CookieStore<D = ()> {
    /// HMAC keyed with the digest key, cloned for every record.
    mac: HmacSha1,
    cipher: Option<Cipher>,
    payload: Option<PayloadSlot<D>>,
}

impl<D: 'static> CookieStore<D> {
    /// Starts building a store that signs tokens with `digest_key`.
    pub fn builder(digest_key: impl AsRef<[u8]>) -> CookieStoreBuilder<D> {
        CookieStoreBuilder {
            digest_key: digest_key.as_ref().to_vec(),
            cipher_key: Vec::new(),
            coder: None,
            factory: None,
        }
    }

    /// Returns `true` if tokens are encrypted, not just signed.
    pub fn is_encrypted(&self) -> bool {
        self.cipher.is_some()
    }

    /// Packs a session into a token.
    fn encode(&self, session: &Session<D>) -> Result<String, SessionError> {
        let name = session.login_name.as_bytes();
        let name_len = u8::try_from(name.len())
            .map_err(|_| SessionError::LoginNameTooLong(name.len()))?;

        let payload = match (&session.data, &self.payload) {
            (None, _) => Vec::new(),
            (Some(data), Some(slot)) => slot.coder.encode(data)?,
            (Some(_), None) => return Err(SessionError::MissingCoder),
        };

        let mut record = Vec::with_capacity(
            HEADER_LEN + name.len() + payload.len() + DIGEST_SIZE,
        );
        record.extend_from_slice(&u32_to_bytes(session.expiry));
        record.extend_from_slice(&u64_to_bytes(session.flags));
        record.push(name_len);
        record.extend_from_slice(name);
        record.extend_from_slice(&payload);

        let mut mac = self.mac.clone();
        mac.update(&record);
        record.extend_from_slice(&mac.finalize().into_bytes());

        if let Some(cipher) = &self.cipher {
            cipher.encrypt(&mut record)?;
        }

        Ok(URL_SAFE.encode(&record))
    }

    /// Unpacks and verifies a token.
    fn decode(&self, token: &str) -> Result<Session<D>, SessionError> {
        let mut record = URL_SAFE.decode(token)?;

        if record.len() < MIN_RECORD_LEN {
            return Err(SessionError::TooShort {
                len: record.len(),
                min: MIN_RECORD_LEN,
            });
        }

        if let Some(cipher) = &self.cipher {
            cipher.decrypt(&mut record)?;
        }

        let (body, digest) = record.split_at(record.len() - DIGEST_SIZE);

        // Constant-time comparison.
        let mut mac = self.mac.clone();
        mac.update(body);
        if mac.verify_slice(digest).is_err() {
            tracing::warn!(len = record.len(), "session token failed verification");
            return Err(SessionError::tampered(token));
        }

        let expiry = bytes_to_u32(&body[0..4])?;
        let flags = bytes_to_u64(&body[4..12])?;
        let name_len = usize::from(body[12]);

        let rest = &body[HEADER_LEN..];
        if rest.len() < name_len {
            return Err(SessionError::TooShort {
                len: record.len(),
                min: MIN_RECORD_LEN + name_len,
            });
        }
        let (name, payload) = rest.split_at(name_len);

        let data = if payload.is_empty() {
            None
        } else {
            let slot = self.payload.as_ref().ok_or(SessionError::MissingCoder)?;
            let mut target = (slot.factory)();
            slot.coder.decode(&mut target, payload)?;
            Some(target)
        };

        Ok(Session {
            state: SessionState::Valid,
            expiry,
            token: token.to_string(),
            login_name: String::from_utf8_lossy(name).into_owned(),
            flags,
            data,
        })
    }
}

impl<D: 'static> Provider<D> for CookieStore<D> {
    fn put(&self, session: &Session<D>) -> Result<String, SessionError> {
        self.encode(session)
    }

    /// Decodes a token. A verified session comes back `Valid`; checking
    /// `expiry` is left to the caller.
    fn get(&self, token: &str) -> Result<Session<D>, SessionError> {
        self.decode(token)
    }

    fn delete(&self, _token: &str) -> Result<(), SessionError> {
        // Nothing is stored server-side, so there's nothing to remove.
        Ok(())
    }
}

/// Keys stay out of debug output.
impl<D> fmt::Debug for CookieStore<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CookieStore")
            .field("encrypted", &self.cipher.is_some())
            .field("payload", &self.payload.is_some())
            .finish_non_exhaustive()
    }
}

// =========================================================================
// Tests
// =========================================================================
