//! Builders for Kubernetes objects owned by a MariaDB

pub mod job;
pub mod metadata;

pub use job::{build_recovery_job, recovery_job_name, RECOVERY_POD_LABEL};
pub use metadata::MetadataBuilder;
