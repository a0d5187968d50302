// # DNS Provider Trait
//
// Defines the interface for pushing a new address to a dynamic DNS provider.
//
// ## Implementations
//
// - OVH and No-IP (`/nic/update` protocol): `dyndns-provider-nic` crate
//
// ## Usage
//
// ```rust,ignore
// use dyndns_core::{DnsProvider, ProviderKind, Credentials};
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let provider = /* DnsProvider implementation */;
//
//     let outcome = provider.update(
//         ProviderKind::Ovh,
//         "home.example.com",
//         &Credentials::new("user", "secret"),
//         &"203.0.113.5".parse()?,
//     ).await?;
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

use crate::config::{Credentials, ProviderKind};
use crate::error::UpdateError;
use crate::ip::PublicIp;

/// Result of a successful DNS update
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderOutcome {
    /// The provider answered with a 2xx status; carries the response body
    Success(String),
}

impl ProviderOutcome {
    /// Response body returned by the provider
    pub fn body(&self) -> &str {
        match self {
            ProviderOutcome::Success(body) => body,
        }
    }
}

/// Trait for DNS provider adapters
///
/// # Responsibilities
///
/// - Fail fast with [`UpdateError::MissingParameters`] when the domain or a
///   credential field is empty, before any network call
/// - Issue exactly one HTTP request per call
/// - Map a 2xx answer to [`ProviderOutcome::Success`], any other status to
///   [`UpdateError::ProviderRejected`] and a transport failure to
///   [`UpdateError::NetworkFailure`]
///
/// # Forbidden
///
/// - Retry logic or backoff (owned by the monitor)
/// - Deciding whether an update is needed (owned by the monitor)
/// - Logging credentials
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Point `domain` at `ip` on the given provider
    ///
    /// # Parameters
    ///
    /// - `provider`: Which provider protocol to speak
    /// - `domain`: Hostname to update
    /// - `credentials`: Account identifier and secret
    /// - `ip`: The new address
    async fn update(
        &self,
        provider: ProviderKind,
        domain: &str,
        credentials: &Credentials,
        ip: &PublicIp,
    ) -> Result<ProviderOutcome, UpdateError>;
}

/// Check the parameters every provider requires
///
/// Shared by adapter implementations so the fail-fast rule is applied
/// identically everywhere.
pub fn check_update_parameters(domain: &str, credentials: &Credentials) -> Result<(), UpdateError> {
    let mut missing = Vec::new();
    if domain.trim().is_empty() {
        missing.push("domain");
    }
    if credentials.identifier.is_empty() {
        missing.push("identifier");
    }
    if credentials.secret.is_empty() {
        missing.push("secret");
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(UpdateError::missing(missing.join(", ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_update_parameters() {
        let creds = Credentials::new("u", "p");
        assert!(check_update_parameters("h.example.com", &creds).is_ok());

        let err = check_update_parameters("", &Credentials::new("u", "")).unwrap_err();
        assert_eq!(err, UpdateError::missing("domain, secret"));
    }
}
