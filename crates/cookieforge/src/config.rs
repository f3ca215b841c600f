//! Cookie configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Where and how the session cookie is written.
///
/// Built once at startup and handed to
/// [`SessionManager::new`](crate::SessionManager::new). The manager never
/// changes it afterwards, so there's no global state to initialize in the
/// right order.
///
/// Deserializable so it can come straight out of an application's config
/// file; `max_age` uses serde's `{ secs, nanos }` form for `Duration`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CookieConfig {
    /// Cookie name.
    pub name: String,

    /// `Domain` attribute. Empty means "host-only".
    pub domain: String,

    /// `Path` attribute.
    pub path: String,

    /// Only send the cookie over HTTPS.
    pub secure: bool,

    /// How long a newly saved session stays valid.
    pub max_age: Duration,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            name: "session".to_string(),
            domain: String::new(),
            path: "/".to_string(),
            secure: false,
            max_age: Duration::from_secs(3600),
        }
    }
}

impl CookieConfig {
    /// Sets the cookie name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the `Domain` attribute.
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    /// Sets the `Path` attribute.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Sets the `Secure` attribute.
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Sets how long new sessions stay valid.
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = CookieConfig::default();

        assert_eq!(config.name, "session");
        assert_eq!(config.path, "/");
        assert!(config.domain.is_empty());
        assert!(!config.secure);
        assert_eq!(config.max_age, Duration::from_secs(3600));
    }

    #[test]
    fn test_builders_override_fields() {
        let config = CookieConfig::default()
            .with_name("mysession")
            .with_domain("localhost")
            .with_path("/app")
            .with_secure(true)
            .with_max_age(Duration::from_secs(2));

        assert_eq!(config.name, "mysession");
        assert_eq!(config.domain, "localhost");
        assert_eq!(config.path, "/app");
        assert!(config.secure);
        assert_eq!(config.max_age, Duration::from_secs(2));
    }

    #[test]
    fn test_deserialize_partial_config_fills_defaults() {
        let config: CookieConfig =
            serde_json::from_str(r#"{ "name": "sid", "secure": true }"#).unwrap();

        assert_eq!(config.name, "sid");
        assert!(config.secure);
        assert_eq!(config.path, "/");
        assert_eq!(config.max_age, Duration::from_secs(3600));
    }
}
