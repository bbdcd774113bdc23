//! MariaDB Custom Resource Definition
//!
//! Defines the schema for MariaDB resources, including the Galera
//! multi-master replication settings consumed by the configuration core.

use chrono::{DateTime, Utc};
use k8s_openapi::api::apps::v1::RollingUpdateStatefulSetStrategy;
use k8s_openapi::api::core::v1::SecretKeySelector;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::error::Error;
use crate::galera::state::{GaleraState, RecoveredPosition};
use crate::galera::DEFAULT_GALERA_LIB_PATH;

// =============================================================================
// MariaDB CRD
// =============================================================================

/// MariaDB declares a database server, optionally clustered with Galera.
///
/// Each replica is a StatefulSet member addressed through the governing
/// `<name>-internal` headless Service.
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "k8s.mariadb.com",
    version = "v1alpha1",
    kind = "MariaDB",
    plural = "mariadbs",
    shortname = "mdb",
    status = "MariaDBStatus",
    namespaced,
    printcolumn = r#"{"name": "Replicas", "type": "integer", "jsonPath": ".spec.replicas"}"#,
    printcolumn = r#"{"name": "Primary", "type": "integer", "jsonPath": ".status.currentPrimaryPodIndex"}"#,
    printcolumn = r#"{"name": "Update", "type": "string", "jsonPath": ".spec.updateStrategy.type"}"#,
    printcolumn = r#"{"name": "Age", "type": "date", "jsonPath": ".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct MariaDBSpec {
    /// Container image used by every member and by recovery Jobs.
    #[serde(default = "default_image")]
    pub image: String,

    /// Number of declared members.
    #[serde(default = "default_replicas")]
    pub replicas: i32,

    /// Secret key holding the root password.
    #[serde(default)]
    pub root_password_secret_key_ref: Option<SecretKeySelector>,

    /// Persistent storage for each member.
    #[serde(default)]
    pub storage: Storage,

    /// Galera cluster settings. Absent means a standalone server.
    #[serde(default)]
    pub galera: Option<Galera>,

    /// How changes to the member Pods are rolled out.
    #[serde(default)]
    pub update_strategy: UpdateStrategy,

    /// Metadata propagated to every child object.
    #[serde(default)]
    pub inherit_metadata: Option<Metadata>,
}

/// Persistent storage settings
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Storage {
    /// Requested size of the data volume
    #[serde(default = "default_storage_size")]
    pub size: String,

    /// StorageClass used for the volume claims
    #[serde(default)]
    pub storage_class_name: Option<String>,
}

impl Default for Storage {
    fn default() -> Self {
        Self {
            size: default_storage_size(),
            storage_class_name: None,
        }
    }
}

/// Labels and annotations inherited by child objects
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    #[serde(default)]
    pub labels: BTreeMap<String, String>,

    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
}

// =============================================================================
// Galera
// =============================================================================

/// Galera multi-master replication settings
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Galera {
    /// Enables cluster mode
    #[serde(default)]
    pub enabled: bool,

    /// State Snapshot Transfer method
    #[serde(default)]
    pub sst: Sst,

    /// Number of applier threads (`wsrep_slave_threads`)
    #[serde(default = "default_replica_threads")]
    pub replica_threads: i32,

    /// Extra `wsrep_provider_options`. These override the operator defaults.
    /// Values must not contain `;`, double quotes or line breaks.
    #[serde(default)]
    pub provider_options: BTreeMap<String, String>,

    /// Path of the provider shared library inside the image
    #[serde(default = "default_galera_lib_path")]
    pub galera_lib_path: String,

    /// Cluster recovery settings
    #[serde(default)]
    pub recovery: GaleraRecovery,

    /// Where the Galera configuration lives
    #[serde(default)]
    pub config: GaleraConfig,
}

impl Default for Galera {
    fn default() -> Self {
        Self {
            enabled: false,
            sst: Sst::default(),
            replica_threads: default_replica_threads(),
            provider_options: BTreeMap::new(),
            galera_lib_path: default_galera_lib_path(),
            recovery: GaleraRecovery::default(),
            config: GaleraConfig::default(),
        }
    }
}

/// Galera recovery settings
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GaleraRecovery {
    /// Enables automatic cluster recovery
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Schedule recovery Jobs on the node hosting the member, so node-local
    /// volumes can be reattached.
    #[serde(default = "default_true")]
    pub pin_to_node: bool,
}

impl Default for GaleraRecovery {
    fn default() -> Self {
        Self {
            enabled: true,
            pin_to_node: true,
        }
    }
}

/// Galera configuration volume settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GaleraConfig {
    /// Keep the Galera configuration on the data volume instead of a
    /// dedicated `galera` volume claim.
    #[serde(default)]
    pub reuse_storage_volume: bool,
}

/// State Snapshot Transfer method
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Sst {
    /// Plain file copy, no credentials required
    Rsync,
    /// Hot backup through mariabackup
    #[default]
    Mariabackup,
    /// Logical dump through mysqldump
    Mysqldump,
}

impl Sst {
    /// Form used in `wsrep_sst_method`
    pub fn as_str(&self) -> &'static str {
        match self {
            Sst::Rsync => "rsync",
            Sst::Mariabackup => "mariabackup",
            Sst::Mysqldump => "mysqldump",
        }
    }

    /// Whether the donor needs `wsrep_sst_auth` to run the transfer
    pub fn requires_auth(&self) -> bool {
        match self {
            Sst::Rsync => false,
            Sst::Mariabackup | Sst::Mysqldump => true,
        }
    }
}

impl std::fmt::Display for Sst {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Sst {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rsync" => Ok(Sst::Rsync),
            "mariabackup" => Ok(Sst::Mariabackup),
            "mysqldump" => Ok(Sst::Mysqldump),
            other => Err(Error::UnsupportedSst(other.to_string())),
        }
    }
}

// =============================================================================
// Update Strategy
// =============================================================================

/// Declared rollout policy for the member Pods
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStrategy {
    /// One of `ReplicasFirstPrimaryLast`, `RollingUpdate` or `OnDelete`.
    /// There is no default: an empty type is rejected.
    #[serde(default, rename = "type")]
    pub update_type: String,

    /// Parameters passed through to the StatefulSet rolling update
    #[serde(default)]
    pub rolling_update: Option<RollingUpdateStatefulSetStrategy>,
}

// =============================================================================
// Status
// =============================================================================

/// Observed state of the MariaDB
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MariaDBStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,

    /// Ordinal of the member currently acting as primary
    #[serde(default)]
    pub current_primary_pod_index: Option<i32>,

    /// Progress of an ongoing cluster recovery
    #[serde(default)]
    pub galera_recovery: Option<GaleraRecoveryStatus>,
}

/// Status condition
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub condition_type: String,

    pub status: String,

    #[serde(default)]
    pub reason: Option<String>,

    #[serde(default)]
    pub message: Option<String>,

    #[serde(default)]
    pub last_transition_time: Option<DateTime<Utc>>,
}

/// Per-pod data gathered during a cluster recovery
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GaleraRecoveryStatus {
    /// Saved state read from each member's `grastate.dat`, keyed by pod name
    #[serde(default)]
    pub state: BTreeMap<String, GaleraState>,

    /// Position recovered with `--wsrep-recover`, keyed by pod name
    #[serde(default)]
    pub recovered: BTreeMap<String, RecoveredPosition>,

    /// Pod chosen to bootstrap the new cluster
    #[serde(default)]
    pub bootstrap_pod: Option<String>,

    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Default Values
// =============================================================================

fn default_image() -> String {
    "mariadb:11.4".to_string()
}

fn default_replicas() -> i32 {
    1
}

fn default_storage_size() -> String {
    "1Gi".to_string()
}

fn default_replica_threads() -> i32 {
    1
}

fn default_galera_lib_path() -> String {
    DEFAULT_GALERA_LIB_PATH.to_string()
}

fn default_true() -> bool {
    true
}

// =============================================================================
// Implementations
// =============================================================================

impl MariaDB {
    /// Whether Galera cluster mode is enabled
    pub fn galera_enabled(&self) -> bool {
        self.spec.galera.as_ref().map(|g| g.enabled).unwrap_or(false)
    }

    /// Name of the governing headless Service
    pub fn internal_service_name(&self) -> Result<String, Error> {
        Ok(format!("{}-internal", self.require_name()?))
    }

    /// Whether the Galera configuration shares the data volume
    pub fn reuses_storage_volume(&self) -> bool {
        self.spec
            .galera
            .as_ref()
            .map(|g| g.config.reuse_storage_volume)
            .unwrap_or(false)
    }

    /// Name of the resource; child object names derive from it.
    pub fn require_name(&self) -> Result<&str, Error> {
        self.metadata
            .name
            .as_deref()
            .filter(|n| !n.is_empty())
            .ok_or_else(|| Error::Config("MariaDB has no name".to_string()))
    }
}

// =============================================================================
// Tests
// =============================================================================
