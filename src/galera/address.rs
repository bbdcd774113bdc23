//! Cluster membership addressing
//!
//! The cluster address always lists every declared ordinal, healthy or not,
//! so all members agree on membership regardless of which ones are running.

use std::net::Ipv4Addr;

use tracing::{debug, instrument, warn};

use super::cluster::ClusterSpec;
use crate::domain::ports::HostResolver;
use crate::error::{Error, Result};
use crate::statefulset;

/// Scheme prefix of a Galera cluster address
pub const GCOMM_SCHEME: &str = "gcomm://";

/// Build `gcomm://<member-0>,<member-1>,...` for ordinals `0..replicas`.
pub fn cluster_address(spec: &ClusterSpec) -> Result<String> {
    if spec.replicas == 0 {
        return Err(Error::Config("at least one replica required".to_string()));
    }

    let members: Vec<String> = (0..spec.replicas).map(|i| spec.member_fqdn(i)).collect();
    Ok(format!("{}{}", GCOMM_SCHEME, members.join(",")))
}

/// Resolve the reachable IPv4 address of the member running as `pod_name`.
///
/// When DNS returns several records only the first is used.
#[instrument(skip(spec, resolver))]
pub async fn node_address<R>(pod_name: &str, spec: &ClusterSpec, resolver: &R) -> Result<Ipv4Addr>
where
    R: HostResolver + ?Sized,
{
    let ordinal = statefulset::pod_index(pod_name)?;
    let host = spec.member_fqdn(ordinal);

    let ips = resolver.lookup_ipv4(&host).await?;
    if ips.len() > 1 {
        warn!(host = %host, records = ips.len(), "Multiple IPv4 records, using the first");
    }

    let ip = ips
        .first()
        .copied()
        .ok_or_else(|| Error::NoIpv4Address { host: host.clone() })?;

    debug!(host = %host, ip = %ip, "Resolved node address");
    Ok(ip)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::StaticResolver;

    #[test]
    fn test_cluster_address_ordering() {
        let spec = ClusterSpec::new("x", "svc", 3);
        assert_eq!(
            cluster_address(&spec).unwrap(),
            "gcomm://x-0.svc,x-1.svc,x-2.svc"
        );
    }

    #[test]
    fn test_cluster_address_single_replica() {
        let spec = ClusterSpec::new(
            "mariadb",
            "mariadb-internal.default.svc.cluster.local",
            1,
        );
        assert_eq!(
            cluster_address(&spec).unwrap(),
            "gcomm://mariadb-0.mariadb-internal.default.svc.cluster.local"
        );
    }

    #[test]
    fn test_cluster_address_zero_replicas() {
        let spec = ClusterSpec::new("x", "svc", 0);
        assert!(matches!(
            cluster_address(&spec),
            Err(Error::Config(m)) if m == "at least one replica required"
        ));
    }

    #[test]
    fn test_node_address() {
        let spec = ClusterSpec::new("x", "svc", 3);
        let resolver = StaticResolver::new().with_record("x-1.svc", Ipv4Addr::new(10, 0, 0, 11));

        let ip = tokio_test::block_on(node_address("x-1", &spec, &resolver)).unwrap();
        assert_eq!(ip, Ipv4Addr::new(10, 0, 0, 11));
    }

    #[tokio::test]
    async fn test_node_address_first_record_wins() {
        let spec = ClusterSpec::new("x", "svc", 3);
        let resolver = StaticResolver::new()
            .with_record("x-2.svc", Ipv4Addr::new(10, 0, 0, 9))
            .with_record("x-2.svc", Ipv4Addr::new(10, 0, 0, 3));

        let ip = node_address("x-2", &spec, &resolver).await.unwrap();
        assert_eq!(ip, Ipv4Addr::new(10, 0, 0, 9));
    }

    #[tokio::test]
    async fn test_node_address_invalid_pod_name() {
        let spec = ClusterSpec::new("x", "svc", 3);
        let resolver = StaticResolver::new();

        let err = node_address("x-abc", &spec, &resolver).await.unwrap_err();
        assert!(matches!(err, Error::PodIndex { .. }));
    }

    #[tokio::test]
    async fn test_node_address_resolution_failure() {
        let spec = ClusterSpec::new("x", "svc", 3);
        let resolver = StaticResolver::new();

        let err = node_address("x-0", &spec, &resolver).await.unwrap_err();
        assert!(matches!(err, Error::DnsResolution { .. }));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_node_address_no_records() {
        struct EmptyResolver;

        #[async_trait::async_trait]
        impl HostResolver for EmptyResolver {
            async fn lookup_ipv4(&self, _host: &str) -> Result<Vec<Ipv4Addr>> {
                Ok(Vec::new())
            }
        }

        let spec = ClusterSpec::new("x", "svc", 3);
        let err = node_address("x-0", &spec, &EmptyResolver).await.unwrap_err();
        assert!(matches!(err, Error::NoIpv4Address { host } if host == "x-0.svc"));
    }
}
