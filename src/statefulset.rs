//! StatefulSet Naming Conventions
//!
//! Every member is addressed as `<workload>-<ordinal>` and resolved through
//! the governing Service as
//! `<workload>-<ordinal>.<service>.<namespace>.svc.<cluster-domain>`.
//! Per-member volume claims follow `<template>-<workload>-<ordinal>`.

use crate::error::{Error, Result};

/// Default Kubernetes cluster domain
pub const DEFAULT_CLUSTER_DOMAIN: &str = "cluster.local";

/// Name of the Pod holding `ordinal`
pub fn pod_name(statefulset_name: &str, ordinal: u32) -> String {
    format!("{}-{}", statefulset_name, ordinal)
}

/// Recover the ordinal from the trailing numeric suffix of a Pod name.
pub fn pod_index(pod_name: &str) -> Result<u32> {
    let (_, suffix) = pod_name.rsplit_once('-').ok_or_else(|| Error::PodIndex {
        pod_name: pod_name.to_string(),
        reason: "missing ordinal suffix".to_string(),
    })?;

    if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::PodIndex {
            pod_name: pod_name.to_string(),
            reason: format!("non-numeric ordinal suffix '{}'", suffix),
        });
    }

    suffix.parse::<u32>().map_err(|e| Error::PodIndex {
        pod_name: pod_name.to_string(),
        reason: e.to_string(),
    })
}

/// Fully qualified name of a Service
pub fn service_fqdn(service_name: &str, namespace: &str, cluster_domain: &str) -> String {
    format!("{}.{}.svc.{}", service_name, namespace, cluster_domain)
}

/// Fully qualified name of a member behind its governing Service
pub fn pod_fqdn(statefulset_name: &str, ordinal: u32, governing_service_fqdn: &str) -> String {
    format!(
        "{}.{}",
        pod_name(statefulset_name, ordinal),
        governing_service_fqdn
    )
}

/// Name of the PersistentVolumeClaim created from `template` for `ordinal`
pub fn pvc_name(template: &str, statefulset_name: &str, ordinal: u32) -> String {
    format!("{}-{}-{}", template, statefulset_name, ordinal)
}
