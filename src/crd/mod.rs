//! Custom Resource Definitions
//!
//! This module contains the CRD definitions used by the operator.

mod mariadb;

pub use mariadb::{
    Condition, Galera, GaleraConfig, GaleraRecovery, GaleraRecoveryStatus, MariaDB, MariaDBSpec,
    MariaDBStatus, Metadata, Sst, Storage, UpdateStrategy,
};
