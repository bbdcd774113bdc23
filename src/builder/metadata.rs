//! Object metadata accumulation
//!
//! Labels and annotations are layered in a fixed order: operator defaults,
//! then metadata inherited from the MariaDB, then component-specific
//! metadata, then explicit per-call overrides. Each layer replaces keys set
//! by the layers before it.

use std::collections::BTreeMap;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::Resource;

use crate::crd::{MariaDB, Metadata};
use crate::error::Result;

pub const NAME_LABEL: &str = "app.kubernetes.io/name";
pub const INSTANCE_LABEL: &str = "app.kubernetes.io/instance";
pub const COMPONENT_LABEL: &str = "app.kubernetes.io/component";
pub const MANAGED_BY_LABEL: &str = "app.kubernetes.io/managed-by";

const APP_NAME: &str = "mariadb";
const MANAGER_NAME: &str = "galera-operator";

/// Builder for child object metadata
#[derive(Debug, Clone)]
pub struct MetadataBuilder {
    name: String,
    namespace: Option<String>,
    labels: BTreeMap<String, String>,
    annotations: BTreeMap<String, String>,
    owner: Option<MariaDB>,
}

impl MetadataBuilder {
    /// Start with the operator defaults
    pub fn new(name: impl Into<String>) -> Self {
        let labels = BTreeMap::from([
            (NAME_LABEL.to_string(), APP_NAME.to_string()),
            (MANAGED_BY_LABEL.to_string(), MANAGER_NAME.to_string()),
        ]);
        Self {
            name: name.into(),
            namespace: None,
            labels,
            annotations: BTreeMap::new(),
            owner: None,
        }
    }

    /// Apply the namespace, instance label and inherited metadata of `mariadb`,
    /// and make it the controlling owner.
    pub fn with_mariadb(mut self, mariadb: &MariaDB) -> Result<Self> {
        self.namespace = mariadb.metadata.namespace.clone();
        self.labels.insert(
            INSTANCE_LABEL.to_string(),
            mariadb.require_name()?.to_string(),
        );
        if let Some(inherited) = &mariadb.spec.inherit_metadata {
            self = self.with_metadata(inherited);
        }
        self.owner = Some(mariadb.clone());
        Ok(self)
    }

    /// Apply a component label
    pub fn with_component(self, component: &str) -> Self {
        self.with_label(COMPONENT_LABEL, component)
    }

    /// Apply a full metadata layer
    pub fn with_metadata(self, metadata: &Metadata) -> Self {
        self.with_labels(&metadata.labels)
            .with_annotations(&metadata.annotations)
    }

    pub fn with_labels(mut self, labels: &BTreeMap<String, String>) -> Self {
        self.labels
            .extend(labels.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub fn with_annotations(mut self, annotations: &BTreeMap<String, String>) -> Self {
        self.annotations
            .extend(annotations.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    /// Labels accumulated so far
    pub fn labels(&self) -> &BTreeMap<String, String> {
        &self.labels
    }

    pub fn build(self) -> ObjectMeta {
        let owner_references = self
            .owner
            .as_ref()
            .and_then(|owner| owner.controller_owner_ref(&()))
            .map(|owner| vec![owner]);

        ObjectMeta {
            name: Some(self.name),
            namespace: self.namespace,
            labels: Some(self.labels),
            annotations: (!self.annotations.is_empty()).then_some(self.annotations),
            owner_references,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::MariaDBSpec;

    fn mariadb() -> MariaDB {
        let spec: MariaDBSpec = serde_json::from_value(serde_json::json!({
            "inheritMetadata": {
                "labels": { "team": "db", "app.kubernetes.io/name": "inherited" },
                "annotations": { "owner": "dba" }
            }
        }))
        .unwrap();
        let mut mariadb = MariaDB::new("mariadb-galera", spec);
        mariadb.metadata.namespace = Some("default".to_string());
        mariadb.metadata.uid = Some("0d8e7c2a-1111-2222-3333-444455556666".to_string());
        mariadb
    }

    #[test]
    fn test_defaults() {
        let meta = MetadataBuilder::new("job").build();
        let labels = meta.labels.unwrap();
        assert_eq!(labels[NAME_LABEL], "mariadb");
        assert_eq!(labels[MANAGED_BY_LABEL], "galera-operator");
        assert!(meta.annotations.is_none());
        assert!(meta.owner_references.is_none());
    }

    #[test]
    fn test_layering_order() {
        let meta = MetadataBuilder::new("job")
            .with_mariadb(&mariadb())
            .unwrap()
            .with_component("recovery")
            .with_label("team", "override")
            .build();

        let labels = meta.labels.unwrap();
        assert_eq!(labels[NAME_LABEL], "inherited");
        assert_eq!(labels[INSTANCE_LABEL], "mariadb-galera");
        assert_eq!(labels[COMPONENT_LABEL], "recovery");
        assert_eq!(labels["team"], "override");
        assert_eq!(meta.annotations.unwrap()["owner"], "dba");
        assert_eq!(meta.namespace.as_deref(), Some("default"));
    }

    #[test]
    fn test_owner_reference() {
        let meta = MetadataBuilder::new("job")
            .with_mariadb(&mariadb())
            .unwrap()
            .build();
        let owners = meta.owner_references.unwrap();
        assert_eq!(owners.len(), 1);
        assert_eq!(owners[0].kind, "MariaDB");
        assert_eq!(owners[0].name, "mariadb-galera");
        assert_eq!(owners[0].controller, Some(true));
    }

    #[test]
    fn test_unnamed_mariadb_rejected() {
        let mut mdb = mariadb();
        mdb.metadata.name = None;
        assert!(matches!(
            MetadataBuilder::new("job").with_mariadb(&mdb),
            Err(crate::error::Error::Config(_))
        ));
    }
}
