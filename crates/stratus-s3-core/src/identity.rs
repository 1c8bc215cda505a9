//! Caller identity resolution.
//!
//! Stratus does not verify request signatures. It extracts the access key a
//! client presents and maps it to a canonical user id through a static
//! credential table. Unknown or absent access keys resolve to the anonymous
//! identity, which ACL evaluation treats as a member of the AllUsers group
//! only.

use std::collections::HashMap;

use crate::config::GatewayConfig;

/// The resolved caller of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Access key presented by the client, if any.
    pub access_key: Option<String>,
    /// Canonical user id. `None` for anonymous callers.
    pub canonical_id: Option<String>,
}

impl Identity {
    /// An anonymous caller (no credentials presented, or unknown access key).
    #[must_use]
    pub fn anonymous() -> Self {
        Self {
            access_key: None,
            canonical_id: None,
        }
    }

    /// An authenticated caller with the given canonical id.
    #[must_use]
    pub fn user(access_key: impl Into<String>, canonical_id: impl Into<String>) -> Self {
        Self {
            access_key: Some(access_key.into()),
            canonical_id: Some(canonical_id.into()),
        }
    }

    /// Whether the caller presented no resolvable credentials.
    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        self.canonical_id.is_none()
    }

    /// Canonical id as an `Option<&str>` for ACL and ownership checks.
    #[must_use]
    pub fn canonical_id(&self) -> Option<&str> {
        self.canonical_id.as_deref()
    }

    /// Whether this caller owns a resource held by `owner_id`.
    ///
    /// Anonymous callers never own anything.
    #[must_use]
    pub fn owns(&self, owner_id: &str) -> bool {
        self.canonical_id.as_deref() == Some(owner_id)
    }
}

/// Maps access keys to canonical user ids.
#[derive(Debug, Clone, Default)]
pub struct IdentityResolver {
    table: HashMap<String, String>,
}

impl IdentityResolver {
    /// Build a resolver from a configuration's credential table.
    #[must_use]
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self {
            table: config.credential_pairs().into_iter().collect(),
        }
    }

    /// Build a resolver from explicit `(access_key, canonical_id)` pairs.
    #[must_use]
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            table: pairs.into_iter().collect(),
        }
    }

    /// Resolve a presented access key to an identity.
    ///
    /// `None` or an unknown key yields the anonymous identity.
    #[must_use]
    pub fn resolve(&self, access_key: Option<&str>) -> Identity {
        match access_key {
            Some(key) => match self.table.get(key) {
                Some(id) => Identity::user(key, id.clone()),
                None => Identity::anonymous(),
            },
            None => Identity::anonymous(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> IdentityResolver {
        IdentityResolver::from_pairs([
            ("alice-key".to_owned(), "alice".to_owned()),
            ("bob-key".to_owned(), "bob".to_owned()),
        ])
    }

    #[test]
    fn test_should_resolve_known_access_key() {
        let identity = resolver().resolve(Some("alice-key"));
        assert_eq!(identity.canonical_id(), Some("alice"));
        assert!(!identity.is_anonymous());
    }

    #[test]
    fn test_should_resolve_unknown_key_as_anonymous() {
        let identity = resolver().resolve(Some("mallory-key"));
        assert!(identity.is_anonymous());
    }

    #[test]
    fn test_should_resolve_missing_key_as_anonymous() {
        let identity = resolver().resolve(None);
        assert!(identity.is_anonymous());
        assert!(!identity.owns("alice"));
    }

    #[test]
    fn test_should_check_ownership() {
        let identity = Identity::user("alice-key", "alice");
        assert!(identity.owns("alice"));
        assert!(!identity.owns("bob"));
    }

    #[test]
    fn test_should_build_from_config() {
        let config = GatewayConfig::builder()
            .credentials("dev-key=dev".into())
            .build();
        let resolver = IdentityResolver::from_config(&config);
        assert_eq!(resolver.resolve(Some("dev-key")).canonical_id(), Some("dev"));
    }
}
