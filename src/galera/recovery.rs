//! Recovery Job Planner
//!
//! Computes where a one-shot recovery container must run and which
//! per-member volumes it mounts, so it reads and writes the exact state of
//! the member being recovered.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::Pod;
use tracing::{debug, instrument};

use crate::crd::MariaDB;
use crate::error::{Error, Result};
use crate::statefulset;

/// Node label used to pin the recovery Pod
pub const NODE_SELECTOR_KEY: &str = "kubernetes.io/hostname";

/// Volume claim template holding the data directory
pub const STORAGE_VOLUME: &str = "storage";

/// Volume claim template holding the Galera configuration
pub const GALERA_CONFIG_VOLUME: &str = "galera";

pub const STORAGE_MOUNT_PATH: &str = "/var/lib/mysql";
pub const CONFIG_MOUNT_PATH: &str = "/etc/mysql/mariadb.conf.d";

/// A cluster member as seen by the scheduler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberIdentity {
    pub ordinal: u32,
    pub pod_name: String,
    /// Only known once the Pod has been scheduled
    pub node_name: Option<String>,
}

impl MemberIdentity {
    /// Build an identity, deriving the ordinal from the Pod name
    pub fn new(pod_name: impl Into<String>, node_name: Option<String>) -> Result<Self> {
        let pod_name = pod_name.into();
        let ordinal = statefulset::pod_index(&pod_name)?;
        Ok(Self {
            ordinal,
            pod_name,
            node_name: node_name.filter(|n| !n.is_empty()),
        })
    }

    /// Build an identity from a live Pod
    pub fn from_pod(pod: &Pod) -> Result<Self> {
        let pod_name = pod
            .metadata
            .name
            .clone()
            .ok_or_else(|| Error::Config("Pod has no name".to_string()))?;
        let node_name = pod.spec.as_ref().and_then(|s| s.node_name.clone());
        Self::new(pod_name, node_name)
    }
}

/// Member to recover, constructed fresh for each failure event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryTarget {
    pub member: MemberIdentity,
    /// Schedule the recovery on the member's node
    pub pin_to_node: bool,
}

/// Volume layout of the running members
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeLayout {
    pub statefulset_name: String,
    /// Galera configuration lives on the data volume
    pub reuse_storage_volume: bool,
}

impl VolumeLayout {
    pub fn from_mariadb(mariadb: &MariaDB) -> Result<Self> {
        Ok(Self {
            statefulset_name: mariadb.require_name()?.to_string(),
            reuse_storage_volume: mariadb.reuses_storage_volume(),
        })
    }
}

/// A per-member claim mounted into the recovery container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumePlan {
    pub name: String,
    pub claim_name: String,
    pub mount_path: String,
}

/// Placement and volumes of a recovery Job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryPlan {
    pub node_selector: Option<BTreeMap<String, String>>,
    pub volumes: Vec<VolumePlan>,
}

/// Plan the recovery of `target`.
///
/// Pinning an unscheduled member fails with [`Error::NoAssignedNode`], which
/// is retryable.
#[instrument(skip(target, layout), fields(pod = %target.member.pod_name))]
pub fn plan(target: &RecoveryTarget, layout: &VolumeLayout) -> Result<RecoveryPlan> {
    let member = &target.member;

    let node_selector = if target.pin_to_node {
        let node = member
            .node_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .ok_or_else(|| Error::NoAssignedNode {
                pod_name: member.pod_name.clone(),
            })?;
        Some(BTreeMap::from([(
            NODE_SELECTOR_KEY.to_string(),
            node.to_string(),
        )]))
    } else {
        None
    };

    let ordinal = statefulset::pod_index(&member.pod_name)?;
    if ordinal != member.ordinal {
        return Err(Error::PodIndex {
            pod_name: member.pod_name.clone(),
            reason: format!("ordinal {} does not match pod name", member.ordinal),
        });
    }

    let mut volumes = vec![VolumePlan {
        name: STORAGE_VOLUME.to_string(),
        claim_name: statefulset::pvc_name(STORAGE_VOLUME, &layout.statefulset_name, ordinal),
        mount_path: STORAGE_MOUNT_PATH.to_string(),
    }];
    if !layout.reuse_storage_volume {
        volumes.push(VolumePlan {
            name: GALERA_CONFIG_VOLUME.to_string(),
            claim_name: statefulset::pvc_name(
                GALERA_CONFIG_VOLUME,
                &layout.statefulset_name,
                ordinal,
            ),
            mount_path: CONFIG_MOUNT_PATH.to_string(),
        });
    }

    debug!(
        ordinal = ordinal,
        pinned = node_selector.is_some(),
        volumes = volumes.len(),
        "Planned recovery"
    );
    Ok(RecoveryPlan {
        node_selector,
        volumes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::PodSpec;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    fn layout(reuse: bool) -> VolumeLayout {
        VolumeLayout {
            statefulset_name: "mariadb-galera".to_string(),
            reuse_storage_volume: reuse,
        }
    }

    fn target(node: Option<&str>, pin: bool) -> RecoveryTarget {
        RecoveryTarget {
            member: MemberIdentity::new("mariadb-galera-1", node.map(String::from)).unwrap(),
            pin_to_node: pin,
        }
    }

    #[test]
    fn test_pinned_plan() {
        let plan = plan(&target(Some("worker-2"), true), &layout(false)).unwrap();
        assert_eq!(
            plan.node_selector,
            Some(BTreeMap::from([(
                "kubernetes.io/hostname".to_string(),
                "worker-2".to_string()
            )]))
        );
    }

    #[test]
    fn test_unscheduled_member_cannot_be_pinned() {
        let err = plan(&target(None, true), &layout(false)).unwrap_err();
        assert!(matches!(err, Error::NoAssignedNode { ref pod_name } if pod_name == "mariadb-galera-1"));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_unscheduled_member_without_pinning() {
        let plan = plan(&target(None, false), &layout(false)).unwrap();
        assert!(plan.node_selector.is_none());
    }

    #[test]
    fn test_scheduled_member_without_pinning() {
        let plan = plan(&target(Some("worker-2"), false), &layout(false)).unwrap();
        assert!(plan.node_selector.is_none());
    }

    #[test]
    fn test_separate_config_volume() {
        let plan = plan(&target(Some("worker-2"), true), &layout(false)).unwrap();
        assert_eq!(
            plan.volumes,
            vec![
                VolumePlan {
                    name: "storage".to_string(),
                    claim_name: "storage-mariadb-galera-1".to_string(),
                    mount_path: "/var/lib/mysql".to_string(),
                },
                VolumePlan {
                    name: "galera".to_string(),
                    claim_name: "galera-mariadb-galera-1".to_string(),
                    mount_path: "/etc/mysql/mariadb.conf.d".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_reused_storage_volume() {
        let plan = plan(&target(Some("worker-2"), true), &layout(true)).unwrap();
        assert_eq!(plan.volumes.len(), 1);
        assert_eq!(plan.volumes[0].claim_name, "storage-mariadb-galera-1");
    }

    #[test]
    fn test_ordinal_mismatch() {
        let mut t = target(Some("worker-2"), false);
        t.member.ordinal = 5;
        assert!(matches!(
            plan(&t, &layout(false)),
            Err(Error::PodIndex { .. })
        ));
    }

    #[test]
    fn test_member_identity_requires_ordinal() {
        assert!(matches!(
            MemberIdentity::new("mariadb-galera", None),
            Err(Error::PodIndex { .. })
        ));
    }

    #[test]
    fn test_member_identity_from_pod() {
        let pod = Pod {
            metadata: ObjectMeta {
                name: Some("mariadb-galera-2".to_string()),
                ..Default::default()
            },
            spec: Some(PodSpec {
                node_name: Some("worker-1".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let member = MemberIdentity::from_pod(&pod).unwrap();
        assert_eq!(member.ordinal, 2);
        assert_eq!(member.node_name.as_deref(), Some("worker-1"));
    }

    #[test]
    fn test_member_identity_empty_node_is_unscheduled() {
        let member = MemberIdentity::new("mariadb-galera-0", Some(String::new())).unwrap();
        assert!(member.node_name.is_none());
    }

    #[test]
    fn test_volume_layout_requires_name() {
        let spec: crate::crd::MariaDBSpec = serde_json::from_value(serde_json::json!({})).unwrap();
        let mut mariadb = MariaDB::new("mariadb-galera", spec);
        assert_eq!(
            VolumeLayout::from_mariadb(&mariadb).unwrap().statefulset_name,
            "mariadb-galera"
        );

        mariadb.metadata.name = None;
        assert!(matches!(
            VolumeLayout::from_mariadb(&mariadb),
            Err(Error::Config(_))
        ));
    }
}
