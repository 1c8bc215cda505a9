//! Gateway configuration.
//!
//! [`GatewayConfig`] collects every tunable the server binary needs, loaded
//! from environment variables with sane defaults so the gateway runs with no
//! configuration at all.

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// Stratus gateway configuration.
///
/// # Examples
///
/// ```
/// use stratus_s3_core::config::GatewayConfig;
///
/// let config = GatewayConfig::default();
/// assert_eq!(config.listen, "0.0.0.0:4583");
/// assert!(config.virtual_hosting);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    /// Bind address (e.g. `"0.0.0.0:4583"`).
    #[builder(default = String::from("0.0.0.0:4583"))]
    pub listen: String,

    /// Domain for virtual-hosted-style bucket resolution.
    #[builder(default = String::from("s3.localhost"))]
    pub domain: String,

    /// Whether virtual-hosted-style addressing is enabled.
    #[builder(default = true)]
    pub virtual_hosting: bool,

    /// Region reported by GetBucketLocation and bucket records.
    #[builder(default = String::from("us-east-1"))]
    pub region: String,

    /// Maximum object size (bytes) held in memory before the engine spills
    /// to a temporary file.
    #[builder(default = 524_288)]
    pub max_memory_object_size: usize,

    /// Static credential table, `accessKey=canonicalId` pairs separated by
    /// commas. Access keys not listed here resolve to the anonymous
    /// identity.
    #[builder(default = String::from("STRATUSEXAMPLEKEY=stratus-dev"))]
    pub credentials: String,

    /// Log level filter used when `RUST_LOG` is unset.
    #[builder(default = String::from("info"))]
    pub log_level: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen: String::from("0.0.0.0:4583"),
            domain: String::from("s3.localhost"),
            virtual_hosting: true,
            region: String::from("us-east-1"),
            max_memory_object_size: 524_288,
            credentials: String::from("STRATUSEXAMPLEKEY=stratus-dev"),
            log_level: String::from("info"),
        }
    }
}

impl GatewayConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `STRATUS_LISTEN` | `0.0.0.0:4583` |
    /// | `STRATUS_DOMAIN` | `s3.localhost` |
    /// | `STRATUS_VIRTUAL_HOSTING` | `true` |
    /// | `STRATUS_REGION` | `us-east-1` |
    /// | `STRATUS_MAX_MEMORY_OBJECT_SIZE` | `524288` |
    /// | `STRATUS_CREDENTIALS` | `STRATUSEXAMPLEKEY=stratus-dev` |
    /// | `LOG_LEVEL` | `info` |
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("STRATUS_LISTEN") {
            config.listen = v;
        }
        if let Ok(v) = std::env::var("STRATUS_DOMAIN") {
            config.domain = v;
        }
        if let Ok(v) = std::env::var("STRATUS_VIRTUAL_HOSTING") {
            config.virtual_hosting = parse_bool(&v);
        }
        if let Ok(v) = std::env::var("STRATUS_REGION") {
            config.region = v;
        }
        if let Ok(v) = std::env::var("STRATUS_MAX_MEMORY_OBJECT_SIZE") {
            if let Ok(n) = v.parse::<usize>() {
                config.max_memory_object_size = n;
            }
        }
        if let Ok(v) = std::env::var("STRATUS_CREDENTIALS") {
            config.credentials = v;
        }
        if let Ok(v) = std::env::var("LOG_LEVEL") {
            config.log_level = v;
        }

        config
    }

    /// Parse the credential table into `(access_key, canonical_id)` pairs.
    ///
    /// Malformed entries (no `=`, empty halves) are skipped.
    #[must_use]
    pub fn credential_pairs(&self) -> Vec<(String, String)> {
        self.credentials
            .split(',')
            .filter_map(|entry| {
                let (key, id) = entry.trim().split_once('=')?;
                if key.is_empty() || id.is_empty() {
                    return None;
                }
                Some((key.to_owned(), id.to_owned()))
            })
            .collect()
    }
}

/// Parse a string as a boolean, accepting `"1"` and `"true"` (case-insensitive).
fn parse_bool(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_create_default_config() {
        let config = GatewayConfig::default();
        assert_eq!(config.listen, "0.0.0.0:4583");
        assert_eq!(config.domain, "s3.localhost");
        assert!(config.virtual_hosting);
        assert_eq!(config.region, "us-east-1");
        assert_eq!(config.max_memory_object_size, 524_288);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_should_build_with_typed_builder() {
        let config = GatewayConfig::builder()
            .listen("127.0.0.1:9999".into())
            .domain("objects.example".into())
            .virtual_hosting(false)
            .region("eu-west-1".into())
            .max_memory_object_size(1024)
            .credentials("alice-key=alice,bob-key=bob".into())
            .log_level("debug".into())
            .build();

        assert_eq!(config.listen, "127.0.0.1:9999");
        assert!(!config.virtual_hosting);
        assert_eq!(config.region, "eu-west-1");
        assert_eq!(config.max_memory_object_size, 1024);
    }

    #[test]
    fn test_should_parse_credential_pairs() {
        let config = GatewayConfig::builder()
            .credentials("alice-key=alice, bob-key=bob,broken,=empty".into())
            .build();
        let pairs = config.credential_pairs();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0], ("alice-key".to_owned(), "alice".to_owned()));
        assert_eq!(pairs[1], ("bob-key".to_owned(), "bob".to_owned()));
    }

    #[test]
    fn test_should_serialize_to_camel_case_json() {
        let config = GatewayConfig::default();
        let json = serde_json::to_string(&config).expect("test serialization");
        assert!(json.contains("virtualHosting"));
        assert!(json.contains("maxMemoryObjectSize"));
    }

    #[test]
    fn test_should_parse_bool_values() {
        assert!(parse_bool("1"));
        assert!(parse_bool("true"));
        assert!(parse_bool("TRUE"));
        assert!(!parse_bool("0"));
        assert!(!parse_bool(""));
    }
}
