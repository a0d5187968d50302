// # IP Resolver Trait
//
// Defines the interface for determining the current public IP address.
//
// ## Implementations
//
// - HTTP echo services with ordered fallback: `dyndns-ip-http` crate
//
// ## Usage
//
// ```rust,ignore
// use dyndns_core::IpResolver;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let resolver = /* IpResolver implementation */;
//
//     let ip = resolver.resolve(&config).await?;
//     println!("Public IP: {}", ip);
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

use crate::config::MonitorConfig;
use crate::error::ResolutionError;
use crate::ip::PublicIp;

/// Trait for public IP resolver implementations
///
/// Implementations must be thread-safe and usable across async tasks.
///
/// # Responsibilities
///
/// - Try the candidate endpoints strictly in order, one request each
/// - Advance immediately on a non-success status, a transport error or an
///   unparsable body (no backoff between endpoints)
/// - Return the first dotted-quad found
///
/// # Forbidden
///
/// - Retrying an endpoint within one resolution
/// - Caching a previous answer (the monitor owns the last known IP)
/// - Mutating any monitor state
#[async_trait]
pub trait IpResolver: Send + Sync {
    /// Resolve the current public IP
    ///
    /// # Parameters
    ///
    /// - `config`: The configuration snapshot of the running cycle; its custom
    ///   endpoint, when present, is tried first
    ///
    /// # Returns
    ///
    /// - `Ok(PublicIp)`: The address reported by the first working endpoint
    /// - `Err(ResolutionError::AllEndpointsFailed)`: Every endpoint failed
    async fn resolve(&self, config: &MonitorConfig) -> Result<PublicIp, ResolutionError>;
}
