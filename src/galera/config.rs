//! Galera Config Renderer
//!
//! Produces the per-member `[mariadb]` option file and the bootstrap marker.
//! Output is byte-for-byte deterministic for identical inputs; callers hash
//! it to decide whether a member needs a restart.

use std::net::Ipv4Addr;

use tracing::{debug, instrument};

use super::address::{cluster_address, node_address};
use super::cluster::ClusterSpec;
use super::kv_option::marshal;
use super::provider_options::ProviderOptions;
use crate::domain::ports::HostResolver;
use crate::error::{Error, Result};
use crate::statefulset;

/// File name of the rendered member configuration
pub const CONFIG_FILE_NAME: &str = "1-galera.cnf";

/// File name of the bootstrap marker
pub const BOOTSTRAP_FILE_NAME: &str = "2-bootstrap.cnf";

/// Group communication port
pub const GALERA_CLUSTER_PORT: u16 = 4567;

/// Incremental State Transfer port
pub const GALERA_IST_PORT: u16 = 4568;

/// State Snapshot Transfer port
pub const GALERA_SST_PORT: u16 = 4444;

const CLUSTER_NAME: &str = "mariadb-operator";
const BIND_ADDRESS: &str = "0.0.0.0";
const BOOTSTRAP_MARKER: &[u8] = b"wsrep_new_cluster=ON\n";

/// Provider options the operator always sets. User options are layered on top.
pub fn default_provider_options(node_address: Ipv4Addr) -> ProviderOptions {
    [
        (
            "gmcast.listen_addr",
            format!("tcp://{}:{}", BIND_ADDRESS, GALERA_CLUSTER_PORT),
        ),
        (
            "ist.recv_addr",
            format!("{}:{}", node_address, GALERA_IST_PORT),
        ),
    ]
    .into_iter()
    .collect()
}

/// Render the configuration of the member running as `pod_name`, resolving
/// its address through `resolver`.
#[instrument(skip(spec, root_password, resolver), fields(statefulset = %spec.statefulset_name))]
pub async fn render<R>(
    spec: &ClusterSpec,
    pod_name: &str,
    root_password: &str,
    resolver: &R,
) -> Result<Vec<u8>>
where
    R: HostResolver + ?Sized,
{
    check_preconditions(spec)?;
    let address = node_address(pod_name, spec, resolver).await?;
    render_with_address(spec, pod_name, address, root_password)
}

/// Render the configuration for a member whose address is already known.
pub fn render_with_address(
    spec: &ClusterSpec,
    pod_name: &str,
    node_address: Ipv4Addr,
    root_password: &str,
) -> Result<Vec<u8>> {
    check_preconditions(spec)?;
    let cluster_address = cluster_address(spec)?;
    statefulset::pod_index(pod_name)?;
    check_single_line("galeraLibPath", &spec.galera_lib_path)?;
    check_single_line("root password", root_password)?;

    let mut provider_options = default_provider_options(node_address);
    provider_options.update(spec.provider_options.iter());

    let mut lines = vec![
        "[mariadb]".to_string(),
        marshal("bind-address", BIND_ADDRESS, false),
        marshal("default_storage_engine", "InnoDB", false),
        marshal("binlog_format", "row", false),
        marshal("innodb_autoinc_lock_mode", "2", false),
        String::new(),
        "# Cluster configuration".to_string(),
        marshal("wsrep_on", "ON", false),
        marshal("wsrep_provider", &spec.galera_lib_path, false),
        marshal("wsrep_cluster_address", &cluster_address, true),
        marshal("wsrep_cluster_name", CLUSTER_NAME, false),
        marshal("wsrep_slave_threads", &spec.replica_threads.to_string(), false),
        marshal("wsrep_provider_options", &provider_options.marshal(), true),
        String::new(),
        "# Node configuration".to_string(),
        marshal("wsrep_node_address", &node_address.to_string(), true),
        marshal("wsrep_node_name", pod_name, true),
        marshal("wsrep_sst_method", spec.sst.as_str(), true),
    ];

    if spec.sst.requires_auth() {
        lines.push(marshal(
            "wsrep_sst_auth",
            &format!("root:{}", root_password),
            true,
        ));
    }

    let mut config = lines.join("\n");
    config.push('\n');

    debug!(pod = %pod_name, sst = %spec.sst, bytes = config.len(), "Rendered Galera config");
    Ok(config.into_bytes())
}

/// Marker instructing a single member to seed a new cluster.
///
/// Written only when [`needs_bootstrap`] says so.
pub fn bootstrap_marker() -> &'static [u8] {
    BOOTSTRAP_MARKER
}

/// Whether `pod_name` must seed a new cluster.
///
/// An explicit request always wins. Otherwise only the first member seeds,
/// and only when it has no saved state yet.
pub fn needs_bootstrap(spec: &ClusterSpec, pod_name: &str, has_saved_state: bool) -> Result<bool> {
    if spec.bootstrap_requested {
        return Ok(true);
    }
    let ordinal = statefulset::pod_index(pod_name)?;
    Ok(ordinal == 0 && !has_saved_state)
}

/// Values are written one per line; a line break would start a new directive.
fn check_single_line(what: &str, value: &str) -> Result<()> {
    if value.contains(['\n', '\r']) {
        return Err(Error::Config(format!("{} must not contain line breaks", what)));
    }
    Ok(())
}

fn check_preconditions(spec: &ClusterSpec) -> Result<()> {
    if !spec.galera_enabled {
        return Err(Error::Config("Galera is not enabled".to_string()));
    }
    if spec.replicas == 0 {
        return Err(Error::Config("at least one replica required".to_string()));
    }
    Ok(())
}
