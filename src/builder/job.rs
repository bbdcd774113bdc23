//! Recovery Job
//!
//! Wraps a [`RecoveryPlan`] into a one-shot Job that runs `--wsrep-recover`
//! against the member's own volumes and prints the recovered position.

use k8s_openapi::api::batch::v1::{Job, JobSpec};
use k8s_openapi::api::core::v1::{
    Container, PersistentVolumeClaimVolumeSource, PodSpec, PodTemplateSpec, Volume, VolumeMount,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use tracing::debug;

use super::metadata::MetadataBuilder;
use crate::crd::MariaDB;
use crate::error::{Error, Result};
use crate::galera::recovery::{MemberIdentity, RecoveryPlan, STORAGE_MOUNT_PATH};

/// Label carrying the Pod a recovery Job targets
pub const RECOVERY_POD_LABEL: &str = "k8s.mariadb.com/recovery-pod";

const RECOVERY_COMPONENT: &str = "galera-recovery";
const CONTAINER_NAME: &str = "mariadb";

/// Name of the recovery Job for `pod_name`
pub fn recovery_job_name(pod_name: &str) -> String {
    format!("{}-{}", pod_name, RECOVERY_COMPONENT)
}

fn recovery_command() -> String {
    let log_file = format!("{}/mariadb.err", STORAGE_MOUNT_PATH);
    format!(
        "mariadbd --wsrep-recover --log-error={log} && grep 'WSREP: Recovered position' {log}",
        log = log_file
    )
}

/// Build the recovery Job for `member` following `plan`.
pub fn build_recovery_job(
    mariadb: &MariaDB,
    member: &MemberIdentity,
    plan: &RecoveryPlan,
) -> Result<Job> {
    let name = mariadb.require_name()?;
    if mariadb.metadata.namespace.is_none() {
        return Err(Error::Config(format!("MariaDB {} has no namespace", name)));
    }

    let builder = MetadataBuilder::new(recovery_job_name(&member.pod_name))
        .with_mariadb(mariadb)?
        .with_component(RECOVERY_COMPONENT)
        .with_label(RECOVERY_POD_LABEL, member.pod_name.clone());
    let pod_labels = builder.labels().clone();
    let metadata = builder.build();

    let volumes: Vec<Volume> = plan
        .volumes
        .iter()
        .map(|v| Volume {
            name: v.name.clone(),
            persistent_volume_claim: Some(PersistentVolumeClaimVolumeSource {
                claim_name: v.claim_name.clone(),
                read_only: None,
            }),
            ..Default::default()
        })
        .collect();

    let volume_mounts: Vec<VolumeMount> = plan
        .volumes
        .iter()
        .map(|v| VolumeMount {
            name: v.name.clone(),
            mount_path: v.mount_path.clone(),
            ..Default::default()
        })
        .collect();

    let container = Container {
        name: CONTAINER_NAME.to_string(),
        image: Some(mariadb.spec.image.clone()),
        command: Some(vec!["bash".to_string(), "-c".to_string()]),
        args: Some(vec![recovery_command()]),
        volume_mounts: Some(volume_mounts),
        ..Default::default()
    };

    let job = Job {
        metadata,
        spec: Some(JobSpec {
            backoff_limit: Some(0),
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(pod_labels),
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    restart_policy: Some("Never".to_string()),
                    node_selector: plan.node_selector.clone(),
                    containers: vec![container],
                    volumes: Some(volumes),
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        ..Default::default()
    };

    debug!(
        job = %recovery_job_name(&member.pod_name),
        pinned = plan.node_selector.is_some(),
        "Built recovery Job"
    );
    Ok(job)
}
