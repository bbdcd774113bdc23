//! Cluster Specification
//!
//! Flattened, validated view of a Galera-enabled MariaDB that the address
//! resolver and the config renderer operate on.

use crate::crd::{MariaDB, Sst};
use crate::error::{Error, Result};
use crate::statefulset;

use super::provider_options::{ProviderOptions, DELIMITER};
use super::DEFAULT_GALERA_LIB_PATH;

/// Everything needed to render a member's Galera configuration.
///
/// Built explicitly by the caller; no field is implied by another.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterSpec {
    /// Name of the StatefulSet, which prefixes every member name
    pub statefulset_name: String,

    /// FQDN of the governing headless Service
    pub service_fqdn: String,

    /// Declared number of members
    pub replicas: u32,

    /// Cluster mode switch
    pub galera_enabled: bool,

    pub sst: Sst,

    /// `wsrep_slave_threads`
    pub replica_threads: u32,

    /// Provider shared library path
    pub galera_lib_path: String,

    /// User-supplied provider options, layered over the operator defaults
    pub provider_options: ProviderOptions,

    /// Whether the caller asked this member to seed a new cluster
    pub bootstrap_requested: bool,
}

impl ClusterSpec {
    /// Create a Galera-enabled spec with default tunables
    pub fn new(
        statefulset_name: impl Into<String>,
        service_fqdn: impl Into<String>,
        replicas: u32,
    ) -> Self {
        Self {
            statefulset_name: statefulset_name.into(),
            service_fqdn: service_fqdn.into(),
            replicas,
            galera_enabled: true,
            sst: Sst::default(),
            replica_threads: 1,
            galera_lib_path: DEFAULT_GALERA_LIB_PATH.to_string(),
            provider_options: ProviderOptions::new(),
            bootstrap_requested: false,
        }
    }

    /// Build the cluster description of a MariaDB resource.
    ///
    /// Members are addressed through `<name>-internal.<namespace>.svc.<cluster_domain>`.
    pub fn from_mariadb(mariadb: &MariaDB, cluster_domain: &str) -> Result<Self> {
        let name = mariadb
            .metadata
            .name
            .as_deref()
            .ok_or_else(|| Error::Config("MariaDB has no name".to_string()))?;
        let namespace = mariadb
            .metadata
            .namespace
            .as_deref()
            .ok_or_else(|| Error::Config(format!("MariaDB {} has no namespace", name)))?;

        let replicas = u32::try_from(mariadb.spec.replicas).map_err(|_| {
            Error::Config(format!(
                "replicas must not be negative, got {}",
                mariadb.spec.replicas
            ))
        })?;

        let service_fqdn = statefulset::service_fqdn(
            &mariadb.internal_service_name()?,
            namespace,
            cluster_domain,
        );
        let mut spec = Self::new(name, service_fqdn, replicas);

        match &mariadb.spec.galera {
            Some(galera) => {
                spec.galera_enabled = galera.enabled;
                spec.sst = galera.sst;
                spec.replica_threads = u32::try_from(galera.replica_threads)
                    .ok()
                    .filter(|t| *t >= 1)
                    .ok_or_else(|| {
                        Error::Config(format!(
                            "replicaThreads must be at least 1, got {}",
                            galera.replica_threads
                        ))
                    })?;
                spec.galera_lib_path = galera.galera_lib_path.clone();

                for (key, value) in &galera.provider_options {
                    validate_provider_option(key, value)?;
                }
                spec.provider_options = galera.provider_options.iter().collect();
            }
            None => spec.galera_enabled = false,
        }

        Ok(spec)
    }

    /// FQDN of the member holding `ordinal`
    pub fn member_fqdn(&self, ordinal: u32) -> String {
        statefulset::pod_fqdn(&self.statefulset_name, ordinal, &self.service_fqdn)
    }
}

/// Characters that would end the quoted `wsrep_provider_options` value or
/// the option file line carrying it
const FORBIDDEN_CHARS: [char; 3] = ['"', '\n', '\r'];

/// Reject options that cannot round-trip through the `;`-joined format.
fn validate_provider_option(key: &str, value: &str) -> Result<()> {
    if key.is_empty()
        || key.contains('=')
        || key.contains(DELIMITER)
        || key.contains(FORBIDDEN_CHARS)
    {
        return Err(Error::Parse(format!("invalid provider option key {:?}", key)));
    }
    if value.contains(DELIMITER) || value.contains(FORBIDDEN_CHARS) {
        return Err(Error::Parse(format!(
            "provider option '{}' value must not contain '{}', quotes or line breaks",
            key, DELIMITER
        )));
    }
    Ok(())
}
