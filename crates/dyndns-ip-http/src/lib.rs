// # HTTP IP Resolver
//
// This crate determines the current public IP by asking external echo
// services over HTTP.
//
// ## Endpoint Order
//
// 1. The custom endpoint from `MonitorConfig`, when configured
// 2. The first two public services
// 3. The proxy-backed fallback (JSON response)
// 4. The remaining public services
//
// Each endpoint gets a single GET. A transport error, a non-2xx status or
// an unparsable body moves on to the next endpoint immediately.
//
// ## Response Formats
//
// - JSON object with a string `ip` field: `{"ip":"203.0.113.5"}`
// - Plain text containing a dotted-quad: `your ip is 198.51.100.7`

use async_trait::async_trait;
use dyndns_core::config::ResolverConfig;
use dyndns_core::{Error, IpResolver, MonitorConfig, PublicIp, ResolutionError, Result};

/// HTTP-based public IP resolver
pub struct HttpIpResolver {
    config: ResolverConfig,
    client: reqwest::Client,
}

impl HttpIpResolver {
    /// Create a resolver with the default endpoint list
    pub fn new() -> Result<Self> {
        Self::with_config(ResolverConfig::default())
    }

    /// Create a resolver from an explicit configuration
    pub fn with_config(config: ResolverConfig) -> Result<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// The resolver configuration
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Fetch one endpoint, `None` on any failure
    async fn try_endpoint(&self, url: &str) -> Option<PublicIp> {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(endpoint = url, "IP detection request failed: {}", e);
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(
                endpoint = url,
                %status,
                "IP detection endpoint returned an error status"
            );
            return None;
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(endpoint = url, "Failed to read IP detection response: {}", e);
                return None;
            }
        };

        let ip = extract_ip(&body);
        if ip.is_none() {
            tracing::warn!(endpoint = url, "No IPv4 address found in response");
        }
        ip
    }
}

/// Extract an address from a detection response body
///
/// A body that looks like a JSON object is parsed for a string `ip` field
/// first. Anything else, or a JSON body without a usable `ip`, falls back
/// to the first dotted-quad in the raw text.
pub fn extract_ip(body: &str) -> Option<PublicIp> {
    let trimmed = body.trim();

    if trimmed.starts_with('{') {
        let from_json = serde_json::from_str::<serde_json::Value>(trimmed)
            .ok()
            .and_then(|value| value.get("ip")?.as_str().and_then(PublicIp::parse));
        if from_json.is_some() {
            return from_json;
        }
    }

    PublicIp::find_in(trimmed)
}

#[async_trait]
impl IpResolver for HttpIpResolver {
    async fn resolve(
        &self,
        config: &MonitorConfig,
    ) -> std::result::Result<PublicIp, ResolutionError> {
        let endpoints = self.config.candidate_endpoints(config.custom_endpoint());

        for url in &endpoints {
            tracing::debug!(endpoint = %url, "Querying IP detection endpoint");
            if let Some(ip) = self.try_endpoint(url).await {
                tracing::debug!(endpoint = %url, %ip, "Public IP resolved");
                return Ok(ip);
            }
        }

        Err(ResolutionError::AllEndpointsFailed {
            attempts: endpoints.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dyndns_core::{Credentials, ProviderKind};

    fn monitor_config() -> MonitorConfig {
        MonitorConfig::new(ProviderKind::Ovh, "h.example.com", Credentials::new("u", "p"))
    }

    fn resolver(services: Vec<String>) -> HttpIpResolver {
        HttpIpResolver::with_config(ResolverConfig {
            services,
            proxy_endpoint: None,
            request_timeout_secs: 2,
        })
        .unwrap()
    }

    #[test]
    fn test_extract_ip_formats() {
        assert_eq!(extract_ip(r#"{"ip":"203.0.113.5"}"#).unwrap().as_str(), "203.0.113.5");
        assert_eq!(
            extract_ip("your ip is 198.51.100.7\n").unwrap().as_str(),
            "198.51.100.7"
        );
        // JSON without `ip` still gets the pattern fallback
        assert_eq!(
            extract_ip(r#"{"address":"192.0.2.1"}"#).unwrap().as_str(),
            "192.0.2.1"
        );
        // Broken JSON falls back too
        assert_eq!(extract_ip("{ 192.0.2.9").unwrap().as_str(), "192.0.2.9");
        assert!(extract_ip("<html>rate limited</html>").is_none());
        assert!(extract_ip("").is_none());
    }

    #[test]
    fn test_rejects_invalid_config() {
        let result = HttpIpResolver::with_config(ResolverConfig {
            services: Vec::new(),
            proxy_endpoint: None,
            request_timeout_secs: 10,
        });
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_json_response() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"ip":"203.0.113.5"}"#)
            .create_async()
            .await;

        let resolver = resolver(vec![format!("{}/json", server.url())]);
        let ip = resolver.resolve(&monitor_config()).await.unwrap();
        assert_eq!(ip.as_str(), "203.0.113.5");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_plain_text_response() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/text")
            .with_status(200)
            .with_body("your ip is 198.51.100.7\n")
            .create_async()
            .await;

        let resolver = resolver(vec![format!("{}/text", server.url())]);
        let ip = resolver.resolve(&monitor_config()).await.unwrap();
        assert_eq!(ip.as_str(), "198.51.100.7");
    }

    #[tokio::test]
    async fn test_falls_back_in_order() {
        let mut server = mockito::Server::new_async().await;
        let failing = server
            .mock("GET", "/down")
            .with_status(500)
            .expect(1)
            .create_async()
            .await;
        let garbage = server
            .mock("GET", "/garbage")
            .with_status(200)
            .with_body("<html>no address here</html>")
            .expect(1)
            .create_async()
            .await;
        let good = server
            .mock("GET", "/good")
            .with_status(200)
            .with_body("192.0.2.44")
            .expect(1)
            .create_async()
            .await;
        let unused = server
            .mock("GET", "/unused")
            .with_status(200)
            .with_body("192.0.2.99")
            .expect(0)
            .create_async()
            .await;

        let base = server.url();
        let resolver = resolver(vec![
            format!("{}/down", base),
            format!("{}/garbage", base),
            format!("{}/good", base),
            format!("{}/unused", base),
        ]);

        let ip = resolver.resolve(&monitor_config()).await.unwrap();
        assert_eq!(ip.as_str(), "192.0.2.44");

        failing.assert_async().await;
        garbage.assert_async().await;
        good.assert_async().await;
        unused.assert_async().await;
    }

    #[tokio::test]
    async fn test_custom_endpoint_goes_first() {
        let mut server = mockito::Server::new_async().await;
        let custom = server
            .mock("GET", "/custom")
            .with_status(200)
            .with_body("203.0.113.200")
            .expect(1)
            .create_async()
            .await;
        let public = server
            .mock("GET", "/public")
            .with_status(200)
            .with_body("203.0.113.1")
            .expect(0)
            .create_async()
            .await;

        let resolver = resolver(vec![format!("{}/public", server.url())]);
        let config = monitor_config().with_custom_ip_endpoint(format!("{}/custom", server.url()));

        let ip = resolver.resolve(&config).await.unwrap();
        assert_eq!(ip.as_str(), "203.0.113.200");
        custom.assert_async().await;
        public.assert_async().await;
    }

    #[tokio::test]
    async fn test_all_endpoints_failed() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/a")
            .with_status(503)
            .create_async()
            .await;

        // Second endpoint refuses connections
        let resolver = resolver(vec![
            format!("{}/a", server.url()),
            "http://127.0.0.1:9/".to_string(),
        ]);

        let err = resolver.resolve(&monitor_config()).await.unwrap_err();
        assert_eq!(err, ResolutionError::AllEndpointsFailed { attempts: 2 });
    }
}
