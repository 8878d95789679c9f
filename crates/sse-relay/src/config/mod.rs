//! Configuration types for the SSE relay.

mod listen;
mod upstream;

use std::path::Path;

use serde::{Deserialize, Serialize};

pub use listen::ListenConfig;
pub use upstream::{ConnectionPoolConfig, TimeoutConfig, UpstreamConfig, UpstreamTarget};

/// Root configuration, immutable once loaded.
///
/// Constructed either from a YAML file or from CLI/environment values,
/// validated once at startup, then shared read-only across all request
/// handlers.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub listen: ListenConfig,

    /// The single upstream origin all non-health traffic is forwarded to.
    pub upstream: UpstreamConfig,

    #[serde(default)]
    pub connection_pool: ConnectionPoolConfig,

    #[serde(default)]
    pub timeouts: TimeoutConfig,
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Build a config from a port and upstream URL, the minimal surface
    /// exposed through CLI flags and environment variables.
    pub fn from_target(port: u16, upstream_url: String) -> Result<Self, anyhow::Error> {
        let config = Config {
            listen: ListenConfig {
                port,
                ..ListenConfig::default()
            },
            upstream: UpstreamConfig { url: upstream_url },
            connection_pool: ConnectionPoolConfig::default(),
            timeouts: TimeoutConfig::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration. Malformed upstream URLs are a fatal
    /// startup error, never a per-request one.
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.upstream
            .target()
            .map_err(|e| anyhow::anyhow!("Invalid upstream configuration: {e}"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let yaml = r#"
listen:
  port: 10000
upstream:
  url: "https://example-project.firebaseio.com"
connection_pool:
  max_idle_per_host: 10
timeouts:
  response_headers_secs: 30
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.listen.port, 10000);
        assert_eq!(
            config.upstream.url,
            "https://example-project.firebaseio.com"
        );
        assert_eq!(config.connection_pool.max_idle_per_host, 10);
        assert_eq!(config.timeouts.response_headers_secs, Some(30));
        config.validate().unwrap();
    }

    #[test]
    fn test_minimal_config_defaults() {
        let yaml = r#"
upstream:
  url: "http://127.0.0.1:8000"
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.listen.port, 10000);
        assert_eq!(config.listen.shutdown_grace_secs, 10);
        // Absent timeout means unbounded, required for long-lived SSE.
        assert_eq!(config.timeouts.response_headers_secs, None);
        config.validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_missing_scheme() {
        let config = Config::from_target(10000, "example.com".to_string());
        assert!(config.is_err());
    }

    #[test]
    fn test_validate_rejects_unsupported_scheme() {
        let config = Config::from_target(10000, "ftp://example.com".to_string());
        assert!(config.is_err());
    }

    #[test]
    fn test_validate_rejects_empty_url() {
        let config = Config::from_target(10000, String::new());
        assert!(config.is_err());
    }

    #[test]
    fn test_from_target_valid() {
        let config = Config::from_target(9000, "https://example.com".to_string()).unwrap();
        assert_eq!(config.listen.port, 9000);
        let target = config.upstream.target().unwrap();
        assert_eq!(target.scheme.as_str(), "https");
        assert_eq!(target.authority.as_str(), "example.com");
    }
}
