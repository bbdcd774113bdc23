//! Galera Operator - Galera cluster configuration and lifecycle core
//!
//! Turns a declared MariaDB Galera cluster into what each member needs to
//! join, and what the operator needs to roll it out and heal it.
//!
//! # Architecture
//!
//! ```text
//! MariaDB (CRD) → ClusterSpec → rendered config / update strategy / recovery Job
//! ```
//!
//! # Modules
//!
//! - [`adapters`] - Infrastructure adapters implementing domain ports
//! - [`builder`] - Kubernetes object builders (metadata, recovery Job)
//! - [`crd`] - Custom Resource Definitions for Kubernetes
//! - [`domain`] - Domain ports
//! - [`error`] - Error types
//! - [`galera`] - Galera configuration, rollout and recovery logic
//! - [`statefulset`] - StatefulSet naming conventions

pub mod adapters;
pub mod builder;
pub mod crd;
pub mod domain;
pub mod error;
pub mod galera;
pub mod statefulset;

// Re-export commonly used types
pub use crd::{MariaDB, MariaDBSpec, Sst};
pub use error::{Error, ErrorKind, Result};
pub use galera::ClusterSpec;
