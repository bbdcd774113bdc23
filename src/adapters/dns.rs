//! DNS Resolver Adapters
//!
//! Implements the `HostResolver` port with the system resolver and with a
//! static table for tests and dry runs.

use std::collections::BTreeMap;
use std::net::{IpAddr, Ipv4Addr};

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::domain::ports::HostResolver;
use crate::error::{Error, Result};

/// Resolver backed by the operating system (`getaddrinfo` through tokio).
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

impl SystemResolver {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl HostResolver for SystemResolver {
    #[instrument(skip(self))]
    async fn lookup_ipv4(&self, host: &str) -> Result<Vec<Ipv4Addr>> {
        let addrs = tokio::net::lookup_host((host, 0))
            .await
            .map_err(|e| Error::DnsResolution {
                host: host.to_string(),
                reason: e.to_string(),
            })?;

        let ips: Vec<Ipv4Addr> = addrs
            .filter_map(|addr| match addr.ip() {
                IpAddr::V4(ip) => Some(ip),
                IpAddr::V6(_) => None,
            })
            .collect();

        debug!(host = %host, count = ips.len(), "Resolved host");
        Ok(ips)
    }
}

/// Resolver answering from a fixed table.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    records: BTreeMap<String, Vec<Ipv4Addr>>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record for `host`
    pub fn with_record(mut self, host: impl Into<String>, ip: Ipv4Addr) -> Self {
        self.records.entry(host.into()).or_default().push(ip);
        self
    }
}

#[async_trait]
impl HostResolver for StaticResolver {
    async fn lookup_ipv4(&self, host: &str) -> Result<Vec<Ipv4Addr>> {
        self.records
            .get(host)
            .cloned()
            .ok_or_else(|| Error::DnsResolution {
                host: host.to_string(),
                reason: "no such host".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_resolver_keeps_record_order() {
        let resolver = StaticResolver::new()
            .with_record("mariadb-0", Ipv4Addr::new(10, 0, 0, 2))
            .with_record("mariadb-0", Ipv4Addr::new(10, 0, 0, 1));

        let ips = resolver.lookup_ipv4("mariadb-0").await.unwrap();
        assert_eq!(
            ips,
            vec![Ipv4Addr::new(10, 0, 0, 2), Ipv4Addr::new(10, 0, 0, 1)]
        );
    }

    #[tokio::test]
    async fn test_static_resolver_unknown_host() {
        let resolver = StaticResolver::new();
        let err = resolver.lookup_ipv4("missing").await.unwrap_err();
        assert!(matches!(err, Error::DnsResolution { host, .. } if host == "missing"));
    }

    #[tokio::test]
    async fn test_system_resolver_ip_literal() {
        // IP literals are answered without consulting DNS.
        let ips = SystemResolver::new().lookup_ipv4("127.0.0.1").await.unwrap();
        assert_eq!(ips, vec![Ipv4Addr::LOCALHOST]);
    }
}
