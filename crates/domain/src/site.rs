//! Site: a cloud-managed collection of devices sharing one crypto key.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::id::SiteId;

/// A site as listed by the cloud API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Site {
    pub id: SiteId,
    pub title: String,
}

impl Site {
    /// Whether this site is the one designated by `selector`.
    ///
    /// The selector matches either the site id or its title (case-insensitive).
    #[must_use]
    pub fn matches(&self, selector: &str) -> bool {
        let selector = selector.trim();
        self.title.eq_ignore_ascii_case(selector) || self.id.to_string() == selector
    }
}

/// Opaque key material used by the mesh transport.
///
/// The bridge never interprets the content; it is only handed over to the
/// mesh transport. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct CryptoKey(String);

impl CryptoKey {
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Expose the secret to the mesh transport.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for CryptoKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CryptoKey(***)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn home() -> Site {
        Site {
            id: SiteId::new(),
            title: "Home".to_string(),
        }
    }

    #[test]
    fn should_match_site_by_title_ignoring_case() {
        assert!(home().matches("home"));
        assert!(home().matches(" HOME "));
    }

    #[test]
    fn should_match_site_by_id() {
        let site = home();
        assert!(site.matches(&site.id.to_string()));
    }

    #[test]
    fn should_not_match_other_site() {
        assert!(!home().matches("Cabin"));
    }

    #[test]
    fn should_redact_crypto_key_in_debug_output() {
        let key = CryptoKey::new("00112233445566778899aabbccddeeff");
        assert_eq!(format!("{key:?}"), "CryptoKey(***)");
        assert_eq!(key.expose(), "00112233445566778899aabbccddeeff");
    }
}
