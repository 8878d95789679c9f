//! Tests for the proxy module.

#[cfg(test)]
mod server_tests {
    use crate::config::Config;
    use crate::proxy::ProxyServer;

    #[tokio::test]
    async fn test_server_new_with_valid_config() {
        let config = Config::from_target(0, "https://origin.example.com".to_string()).unwrap();
        let server = ProxyServer::new(config).unwrap();
        assert_eq!(server.config().upstream.url, "https://origin.example.com");
    }

    #[tokio::test]
    async fn test_server_new_rejects_malformed_upstream() {
        let config: Config = serde_yaml::from_str(
            r#"
upstream:
  url: "not a url"
"#,
        )
        .unwrap();
        assert!(ProxyServer::new(config).is_err());
    }
}

#[cfg(test)]
mod context_tests {
    use crate::config::Config;
    use crate::proxy::{create_http_client, ProxyContext};
    use std::time::Duration;

    #[tokio::test]
    async fn test_context_carries_optional_timeout() {
        let config: Config = serde_yaml::from_str(
            r#"
upstream:
  url: "http://127.0.0.1:8000"
timeouts:
  response_headers_secs: 45
"#,
        )
        .unwrap();

        let ctx = ProxyContext {
            http_client: create_http_client(&config),
            target: config.upstream.target().unwrap(),
            upstream_url: config.upstream.url.clone(),
            response_headers_timeout: config.timeouts.response_headers_secs.map(Duration::from_secs),
        };

        assert_eq!(ctx.response_headers_timeout, Some(Duration::from_secs(45)));
        assert_eq!(ctx.target.authority.as_str(), "127.0.0.1:8000");
    }
}
