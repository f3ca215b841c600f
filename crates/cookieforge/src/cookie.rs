//! Cookie headers: reading the inbound `Cookie` header and rendering the
//! outbound `Set-Cookie` header.
//!
//! Cookieforge doesn't own an HTTP stack. The manager hands back a
//! [`SetCookie`] value and your framework writes it out, either field by
//! field or as the rendered header string from its `Display` impl.

use std::fmt;

/// An outbound session cookie.
///
/// `max_age` follows the usual server convention:
///
/// | `max_age` | Meaning                                   | Rendered         |
/// |-----------|-------------------------------------------|------------------|
/// | `0`       | no explicit lifetime (browser-session)    | *(omitted)*      |
/// | `> 0`     | keep for this many seconds                | `Max-Age=<n>`    |
/// | `< 0`     | delete the cookie now                     | `Max-Age=0`      |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    pub secure: bool,
    /// Always `true` for session cookies: scripts have no business
    /// reading them.
    pub http_only: bool,
    pub max_age: i64,
}

impl SetCookie {
    /// Returns `true` if this cookie tells the browser to delete itself.
    pub fn is_removal(&self) -> bool {
        self.max_age < 0
    }
}

/// Renders the `Set-Cookie` header value.
///
/// ```rust
/// use cookieforge::SetCookie;
///
/// let cookie = SetCookie {
///     name: "sid".into(),
///     value: "abc".into(),
///     domain: String::new(),
///     path: "/".into(),
///     secure: true,
///     http_only: true,
///     max_age: -1,
/// };
/// assert_eq!(cookie.to_string(), "sid=abc; Path=/; Max-Age=0; HttpOnly; Secure");
/// ```
impl fmt::Display for SetCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)?;
        if !self.path.is_empty() {
            write!(f, "; Path={}", self.path)?;
        }
        if !self.domain.is_empty() {
            write!(f, "; Domain={}", self.domain)?;
        }
        if self.max_age > 0 {
            write!(f, "; Max-Age={}", self.max_age)?;
        } else if self.max_age < 0 {
            f.write_str("; Max-Age=0")?;
        }
        if self.http_only {
            f.write_str("; HttpOnly")?;
        }
        if self.secure {
            f.write_str("; Secure")?;
        }
        Ok(())
    }
}

/// Finds a cookie's value in a `Cookie` request header.
///
/// The header is a `;`-separated list of `name=value` pairs. Returns the
/// first value whose name matches exactly, with surrounding double quotes
/// removed. Pairs without `=` are skipped.
///
/// ```rust
/// use cookieforge::cookie_value;
///
/// let header = "theme=dark; session=abc123; lang=en";
/// assert_eq!(cookie_value(header, "session"), Some("abc123"));
/// assert_eq!(cookie_value(header, "missing"), None);
/// ```
pub fn cookie_value<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| {
            let value = value.trim();
            value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(value)
        })
}
