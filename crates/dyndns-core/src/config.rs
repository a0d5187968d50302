//! Configuration types for the dynamic DNS monitor
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Smallest accepted reconciliation interval (in seconds)
pub const MIN_INTERVAL_SECS: u64 = 60;

/// Largest accepted reconciliation interval (in seconds)
pub const MAX_INTERVAL_SECS: u64 = 3600;

/// Default reconciliation interval (5 minutes)
pub const DEFAULT_INTERVAL_SECS: u64 = 300;

/// Number of log entries retained by the default log sink
pub const DEFAULT_LOG_CAPACITY: usize = 100;

/// Public IP echo services, tried in order after the custom endpoint
pub const DEFAULT_IP_SERVICES: &[&str] = &[
    "https://api.ipify.org",
    "https://ifconfig.me/ip",
    "https://icanhazip.com",
    "https://ident.me",
];

/// Proxy-backed fallback (JSON `{"ip": ...}` response)
pub const DEFAULT_PROXY_ENDPOINT: &str = "https://api.ipify.org?format=json";

/// Position of the proxy fallback within the service list
const PROXY_FALLBACK_POSITION: usize = 2;

/// Supported dynamic DNS providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// OVH DynHost
    Ovh,
    /// No-IP
    NoIp,
}

impl ProviderKind {
    /// Identifier used in configuration
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Ovh => "ovh",
            ProviderKind::NoIp => "noip",
        }
    }

    /// Upper-case label used in log messages
    pub fn label(&self) -> &'static str {
        match self {
            ProviderKind::Ovh => "OVH",
            ProviderKind::NoIp => "NOIP",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ovh" => Ok(ProviderKind::Ovh),
            "noip" | "no-ip" => Ok(ProviderKind::NoIp),
            other => Err(crate::Error::config(format!(
                "Unsupported provider '{}'. Supported providers: ovh, noip",
                other
            ))),
        }
    }
}

/// Provider account credentials
///
/// The Debug implementation intentionally does NOT expose the secret.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Account identifier (user name or DynHost login)
    pub identifier: String,
    /// Account secret
    /// ⚠️ NEVER log this value
    pub secret: String,
}

impl Credentials {
    /// Create new credentials
    pub fn new(identifier: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            secret: secret.into(),
        }
    }

    /// Both fields are non-empty
    pub fn is_complete(&self) -> bool {
        !self.identifier.is_empty() && !self.secret.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("identifier", &self.identifier)
            .field("secret", &"<REDACTED>")
            .finish()
    }
}

/// Configuration of the monitored hostname
///
/// Owned by the caller and snapshotted by the monitor at the start of every
/// reconciliation cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// DNS provider to update
    pub provider: ProviderKind,

    /// Hostname to keep in sync (e.g., "home.example.com")
    pub domain: String,

    /// Provider credentials
    pub credentials: Credentials,

    /// Seconds between reconciliation cycles
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Highest-priority IP detection endpoint
    #[serde(default)]
    pub custom_ip_endpoint: Option<String>,
}

impl MonitorConfig {
    /// Create a new configuration with the default interval
    pub fn new(
        provider: ProviderKind,
        domain: impl Into<String>,
        credentials: Credentials,
    ) -> Self {
        Self {
            provider,
            domain: domain.into(),
            credentials,
            interval_secs: DEFAULT_INTERVAL_SECS,
            custom_ip_endpoint: None,
        }
    }

    /// Set the reconciliation interval
    pub fn with_interval_secs(mut self, interval_secs: u64) -> Self {
        self.interval_secs = interval_secs;
        self
    }

    /// Set the custom IP detection endpoint
    pub fn with_custom_ip_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.custom_ip_endpoint = Some(endpoint.into());
        self
    }

    /// Reconciliation interval as a duration
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// The custom endpoint, ignoring blank values
    pub fn custom_endpoint(&self) -> Option<&str> {
        self.custom_ip_endpoint
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    /// Validate the configuration
    ///
    /// Empty domain or credentials are accepted here: the provider adapter
    /// reports them on every cycle as missing parameters.
    pub fn validate(&self) -> Result<(), crate::Error> {
        if !(MIN_INTERVAL_SECS..=MAX_INTERVAL_SECS).contains(&self.interval_secs) {
            return Err(crate::Error::config(format!(
                "Interval must be between {} and {} seconds, got {}",
                MIN_INTERVAL_SECS, MAX_INTERVAL_SECS, self.interval_secs
            )));
        }

        if let Some(url) = self.custom_endpoint() {
            if !url.starts_with("https://") && !url.starts_with("http://") {
                return Err(crate::Error::config(format!(
                    "Custom IP endpoint must use HTTP or HTTPS scheme. Got: {}",
                    url
                )));
            }
        }

        Ok(())
    }
}

/// IP resolver configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Public IP echo services, in priority order
    #[serde(default = "default_ip_services")]
    pub services: Vec<String>,

    /// Proxy-backed fallback endpoint (None disables it)
    #[serde(default = "default_proxy_endpoint")]
    pub proxy_endpoint: Option<String>,

    /// Per-request timeout (in seconds)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl ResolverConfig {
    /// Per-request timeout as a duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Ordered endpoint list for one resolution
    ///
    /// Custom endpoint first, then the public services with the proxy
    /// fallback interposed after the first two of them.
    pub fn candidate_endpoints(&self, custom: Option<&str>) -> Vec<String> {
        let mut endpoints = Vec::with_capacity(self.services.len() + 2);
        endpoints.extend(custom.map(str::to_string));

        let split = PROXY_FALLBACK_POSITION.min(self.services.len());
        endpoints.extend(self.services[..split].iter().cloned());
        endpoints.extend(self.proxy_endpoint.iter().cloned());
        endpoints.extend(self.services[split..].iter().cloned());
        endpoints
    }

    /// Validate the resolver configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.services.is_empty() && self.proxy_endpoint.is_none() {
            return Err(crate::Error::config("At least one IP detection endpoint is required"));
        }
        if self.request_timeout_secs == 0 {
            return Err(crate::Error::config("Request timeout must be > 0"));
        }
        Ok(())
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            services: default_ip_services(),
            proxy_endpoint: default_proxy_endpoint(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_interval_secs() -> u64 {
    DEFAULT_INTERVAL_SECS
}

fn default_ip_services() -> Vec<String> {
    DEFAULT_IP_SERVICES.iter().map(|s| s.to_string()).collect()
}

fn default_proxy_endpoint() -> Option<String> {
    Some(DEFAULT_PROXY_ENDPOINT.to_string())
}

fn default_request_timeout_secs() -> u64 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> MonitorConfig {
        MonitorConfig::new(
            ProviderKind::Ovh,
            "h.example.com",
            Credentials::new("u", "p"),
        )
    }

    #[test]
    fn test_interval_bounds() {
        assert!(config().validate().is_ok());
        assert!(config().with_interval_secs(59).validate().is_err());
        assert!(config().with_interval_secs(60).validate().is_ok());
        assert!(config().with_interval_secs(3600).validate().is_ok());
        assert!(config().with_interval_secs(3601).validate().is_err());
    }

    #[test]
    fn test_custom_endpoint_scheme() {
        assert!(config().with_custom_ip_endpoint("ftp://ip.example").validate().is_err());
        assert!(config().with_custom_ip_endpoint("https://ip.example").validate().is_ok());
        // Blank is treated as "not configured"
        let blank = config().with_custom_ip_endpoint("   ");
        assert!(blank.validate().is_ok());
        assert_eq!(blank.custom_endpoint(), None);
    }

    #[test]
    fn test_incomplete_credentials_pass_validation() {
        let mut cfg = config();
        cfg.credentials = Credentials::default();
        cfg.domain.clear();
        assert!(cfg.validate().is_ok());
        assert!(!cfg.credentials.is_complete());
    }

    #[test]
    fn test_secret_not_exposed_in_debug() {
        let cfg = MonitorConfig::new(
            ProviderKind::NoIp,
            "h.example.com",
            Credentials::new("user", "hunter2-secret"),
        );
        let debug_str = format!("{:?}", cfg);
        assert!(!debug_str.contains("hunter2-secret"));
        assert!(debug_str.contains("user"));
    }

    #[test]
    fn test_provider_kind_serde() {
        let json = serde_json::json!({
            "provider": "noip",
            "domain": "h.example.com",
            "credentials": { "identifier": "u", "secret": "p" }
        });
        let cfg: MonitorConfig = serde_json::from_value(json).unwrap();
        assert_eq!(cfg.provider, ProviderKind::NoIp);
        assert_eq!(cfg.interval_secs, DEFAULT_INTERVAL_SECS);

        let bad = serde_json::json!({
            "provider": "cloudflare",
            "domain": "h.example.com",
            "credentials": { "identifier": "u", "secret": "p" }
        });
        assert!(serde_json::from_value::<MonitorConfig>(bad).is_err());
    }

    #[test]
    fn test_provider_kind_from_str() {
        assert_eq!("OVH".parse::<ProviderKind>().unwrap(), ProviderKind::Ovh);
        assert_eq!("no-ip".parse::<ProviderKind>().unwrap(), ProviderKind::NoIp);
        assert!("route53".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn test_candidate_endpoint_order() {
        let resolver = ResolverConfig::default();

        let endpoints = resolver.candidate_endpoints(Some("https://ip.example.org"));
        assert_eq!(
            endpoints,
            vec![
                "https://ip.example.org",
                "https://api.ipify.org",
                "https://ifconfig.me/ip",
                DEFAULT_PROXY_ENDPOINT,
                "https://icanhazip.com",
                "https://ident.me",
            ]
        );

        let without_custom = resolver.candidate_endpoints(None);
        assert_eq!(without_custom.len(), 5);
        assert_eq!(without_custom[0], "https://api.ipify.org");
    }

    #[test]
    fn test_candidate_endpoints_with_short_service_list() {
        let resolver = ResolverConfig {
            services: vec!["http://one".to_string()],
            proxy_endpoint: Some("http://proxy".to_string()),
            request_timeout_secs: 1,
        };
        assert_eq!(resolver.candidate_endpoints(None), vec!["http://one", "http://proxy"]);
    }
}
