//! Galera Cluster Configuration and Lifecycle
//!
//! Pure computations that turn a declared MariaDB cluster into the artifacts
//! needed to run and heal it:
//!
//! - [`kv_option`] / [`provider_options`] - option text codecs
//! - [`address`] - cluster membership URI and a member's own address
//! - [`config`] - per-member option file and bootstrap marker
//! - [`update_strategy`] - quorum-safe StatefulSet rollout selection
//! - [`recovery`] - node pinning and volumes for recovery Jobs
//! - [`state`] - saved state codecs and bootstrap source selection
//!
//! # Example
//!
//! ```no_run
//! use galera_operator::adapters::SystemResolver;
//! use galera_operator::galera::{config, ClusterSpec};
//!
//! # async fn example() -> galera_operator::Result<()> {
//! let spec = ClusterSpec::new(
//!     "mariadb-galera",
//!     "mariadb-galera-internal.default.svc.cluster.local",
//!     3,
//! );
//! let bytes = config::render(&spec, "mariadb-galera-1", "secret", &SystemResolver).await?;
//! println!("{}", String::from_utf8_lossy(&bytes));
//! # Ok(())
//! # }
//! ```
//!
//! Nothing in this module keeps state between calls.

pub mod address;
pub mod cluster;
pub mod config;
pub mod kv_option;
pub mod provider_options;
pub mod recovery;
pub mod state;
pub mod update_strategy;

#[cfg(test)]
mod proptest;

/// Provider library shipped in the official MariaDB images
pub const DEFAULT_GALERA_LIB_PATH: &str = "/usr/lib/galera/libgalera_smm.so";

pub use address::{cluster_address, node_address};
pub use cluster::ClusterSpec;
pub use config::{bootstrap_marker, needs_bootstrap, render, render_with_address};
pub use kv_option::KvOption;
pub use provider_options::ProviderOptions;
pub use recovery::{MemberIdentity, RecoveryPlan, RecoveryTarget, VolumeLayout, VolumePlan};
pub use state::{select_bootstrap_source, BootstrapSource, GaleraState, RecoveredPosition};
pub use update_strategy::{UpdateStrategyDecision, UpdateType};
