//! Domain Ports
//!
//! Abstractions over the effects the configuration core needs, so the pure
//! logic can be exercised without a cluster.

use std::net::Ipv4Addr;

use async_trait::async_trait;

use crate::error::Result;

/// Port for name resolution.
///
/// Implementations return IPv4 records in the order the resolver produced
/// them. Callers that need a single address take the first one.
///
/// # Example
///
/// ```ignore
/// #[async_trait]
/// impl HostResolver for MyResolver {
///     async fn lookup_ipv4(&self, host: &str) -> Result<Vec<Ipv4Addr>> {
///         // query a resolver
///     }
/// }
/// ```
#[async_trait]
pub trait HostResolver: Send + Sync {
    /// Resolve `host` to its IPv4 addresses.
    async fn lookup_ipv4(&self, host: &str) -> Result<Vec<Ipv4Addr>>;
}
