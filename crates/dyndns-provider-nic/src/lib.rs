// # /nic/update DNS Provider
//
// This crate implements the DnsProvider trait for the two supported dynamic
// DNS services. Both speak the dyndns2 `/nic/update` protocol:
//
// | Provider | Request |
// |---|---|
// | OVH | `GET https://www.ovh.com/nic/update?system=dyndns&hostname=<domain>&myip=<ip>` |
// | No-IP | `GET https://dynupdate.no-ip.com/nic/update?hostname=<domain>&myip=<ip>` |
//
// Both authenticate with HTTP Basic (`identifier:secret`). No-IP additionally
// rejects requests without a client-identifying `User-Agent`.
//
// ## Constraints
//
// - Exactly one HTTP request per `update()` call
// - Empty domain or credential fields fail before any network call
// - No retry, backoff or caching (owned by the monitor)
// - Credentials never appear in logs or Debug output
//
// ## Response Mapping
//
// - 2xx: `ProviderOutcome::Success(body)`
// - other status: `UpdateError::ProviderRejected { status, body }`
// - no response: `UpdateError::NetworkFailure`

use async_trait::async_trait;
use dyndns_core::traits::check_update_parameters;
use dyndns_core::{
    Credentials, DnsProvider, Error, ProviderKind, ProviderOutcome, PublicIp, Result, UpdateError,
};
use reqwest::header::USER_AGENT;
use std::time::Duration;

/// OVH DynHost update endpoint
pub const OVH_UPDATE_URL: &str = "https://www.ovh.com/nic/update";

/// No-IP update endpoint
pub const NOIP_UPDATE_URL: &str = "https://dynupdate.no-ip.com/nic/update";

/// Client identification sent to No-IP
pub const DEFAULT_USER_AGENT: &str = "DroidDynDNS/1.0 grafics63@gmail.com";

/// Default HTTP timeout for update requests
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// OVH / No-IP provider adapter
///
/// Stateless apart from the HTTP client: credentials arrive with each call.
pub struct NicUpdateProvider {
    ovh_url: String,
    noip_url: String,
    user_agent: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for NicUpdateProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NicUpdateProvider")
            .field("ovh_url", &self.ovh_url)
            .field("noip_url", &self.noip_url)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl NicUpdateProvider {
    /// Create a provider with the default endpoints and timeout
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_HTTP_TIMEOUT)
    }

    /// Create a provider with a custom request timeout
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            ovh_url: OVH_UPDATE_URL.to_string(),
            noip_url: NOIP_UPDATE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            client,
        })
    }

    /// Override the update endpoints (test servers, mirrors)
    pub fn with_endpoints(
        mut self,
        ovh_url: impl Into<String>,
        noip_url: impl Into<String>,
    ) -> Self {
        self.ovh_url = ovh_url.into();
        self.noip_url = noip_url.into();
        self
    }

    /// Override the User-Agent sent to No-IP
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Build the update request without sending it
    ///
    /// # Errors
    ///
    /// `UpdateError::MissingParameters` if the domain or a credential field
    /// is empty.
    pub fn build_request(
        &self,
        provider: ProviderKind,
        domain: &str,
        credentials: &Credentials,
        ip: &PublicIp,
    ) -> std::result::Result<reqwest::Request, UpdateError> {
        check_update_parameters(domain, credentials)?;

        let builder = match provider {
            ProviderKind::Ovh => self.client.get(&self.ovh_url).query(&[
                ("system", "dyndns"),
                ("hostname", domain),
                ("myip", ip.as_str()),
            ]),
            ProviderKind::NoIp => self
                .client
                .get(&self.noip_url)
                .query(&[("hostname", domain), ("myip", ip.as_str())])
                .header(USER_AGENT, &self.user_agent),
        };

        builder
            .basic_auth(&credentials.identifier, Some(&credentials.secret))
            .build()
            .map_err(|e| UpdateError::missing(format!("invalid update request: {}", e)))
    }
}

#[async_trait]
impl DnsProvider for NicUpdateProvider {
    async fn update(
        &self,
        provider: ProviderKind,
        domain: &str,
        credentials: &Credentials,
        ip: &PublicIp,
    ) -> std::result::Result<ProviderOutcome, UpdateError> {
        let request = self.build_request(provider, domain, credentials, ip)?;

        tracing::debug!(provider = %provider, domain, %ip, "Sending DNS update");

        let response = self.client.execute(request).await.map_err(|e| {
            tracing::warn!(provider = %provider, "DNS update request failed: {}", e);
            UpdateError::network(e.to_string())
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read response body".to_string());

        if status.is_success() {
            tracing::debug!(provider = %provider, %status, "DNS update accepted");
            Ok(ProviderOutcome::Success(body))
        } else {
            tracing::warn!(provider = %provider, %status, "DNS update rejected");
            Err(UpdateError::ProviderRejected {
                status: status.as_u16(),
                body,
            })
        }
    }
}
