//! Update Strategy Selector
//!
//! Maps the declared rollout policy of a MariaDB to a StatefulSet update
//! strategy that cannot race ahead of the operator's own member ordering.

use std::fmt;
use std::str::FromStr;

use k8s_openapi::api::apps::v1::{RollingUpdateStatefulSetStrategy, StatefulSetUpdateStrategy};
use tracing::debug;

use crate::crd::UpdateStrategy;
use crate::error::{Error, Result};

/// Declared update policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateType {
    /// Operator deletes replicas first and the primary last
    ReplicasFirstPrimaryLast,
    /// Native partitioned rolling update
    RollingUpdate,
    /// Members are only updated when deleted by hand
    OnDelete,
}

impl UpdateType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateType::ReplicasFirstPrimaryLast => "ReplicasFirstPrimaryLast",
            UpdateType::RollingUpdate => "RollingUpdate",
            UpdateType::OnDelete => "OnDelete",
        }
    }
}

impl fmt::Display for UpdateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UpdateType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ReplicasFirstPrimaryLast" => Ok(UpdateType::ReplicasFirstPrimaryLast),
            "RollingUpdate" => Ok(UpdateType::RollingUpdate),
            "OnDelete" => Ok(UpdateType::OnDelete),
            other => Err(Error::UnsupportedUpdateStrategy(other.to_string())),
        }
    }
}

/// Rollout strategy chosen for the member StatefulSet
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateStrategyDecision {
    /// The StatefulSet controller never replaces Pods on its own
    OnDelete,
    /// Native rolling update with the caller's parameters, untouched
    RollingUpdate(Option<RollingUpdateStatefulSetStrategy>),
}

impl UpdateStrategyDecision {
    /// Convert into the StatefulSet API representation
    pub fn to_statefulset_strategy(&self) -> StatefulSetUpdateStrategy {
        match self {
            UpdateStrategyDecision::OnDelete => StatefulSetUpdateStrategy {
                type_: Some("OnDelete".to_string()),
                rolling_update: None,
            },
            UpdateStrategyDecision::RollingUpdate(params) => StatefulSetUpdateStrategy {
                type_: Some("RollingUpdate".to_string()),
                rolling_update: params.clone(),
            },
        }
    }
}

/// Select the StatefulSet rollout for a declared update strategy.
///
/// An unset or unrecognized type is an error; no default is assumed.
pub fn select(strategy: &UpdateStrategy) -> Result<UpdateStrategyDecision> {
    let update_type: UpdateType = strategy.update_type.parse()?;

    let decision = match update_type {
        // Ordering is enforced by the reconcile loop, so the StatefulSet
        // controller must not roll members by itself.
        UpdateType::ReplicasFirstPrimaryLast => UpdateStrategyDecision::OnDelete,
        UpdateType::RollingUpdate => {
            UpdateStrategyDecision::RollingUpdate(strategy.rolling_update.clone())
        }
        UpdateType::OnDelete => UpdateStrategyDecision::OnDelete,
    };

    debug!(update_type = %update_type, decision = ?decision, "Selected update strategy");
    Ok(decision)
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;

    fn strategy(update_type: &str) -> UpdateStrategy {
        UpdateStrategy {
            update_type: update_type.to_string(),
            rolling_update: None,
        }
    }

    #[test]
    fn test_replicas_first_primary_last_is_on_delete() {
        assert_eq!(
            select(&strategy("ReplicasFirstPrimaryLast")).unwrap(),
            UpdateStrategyDecision::OnDelete
        );
    }

    #[test]
    fn test_on_delete() {
        assert_eq!(
            select(&strategy("OnDelete")).unwrap(),
            UpdateStrategyDecision::OnDelete
        );
    }

    #[test]
    fn test_rolling_update_passes_parameters_through() {
        let params = RollingUpdateStatefulSetStrategy {
            partition: Some(2),
            max_unavailable: Some(IntOrString::String("50%".to_string())),
        };
        let declared = UpdateStrategy {
            update_type: "RollingUpdate".to_string(),
            rolling_update: Some(params.clone()),
        };

        let decision = select(&declared).unwrap();
        assert_eq!(
            decision,
            UpdateStrategyDecision::RollingUpdate(Some(params.clone()))
        );

        let sts = decision.to_statefulset_strategy();
        assert_eq!(sts.type_.as_deref(), Some("RollingUpdate"));
        assert_eq!(sts.rolling_update, Some(params));
    }

    #[test]
    fn test_rolling_update_without_parameters() {
        assert_eq!(
            select(&strategy("RollingUpdate")).unwrap(),
            UpdateStrategyDecision::RollingUpdate(None)
        );
    }

    #[test]
    fn test_unsupported_types() {
        for t in ["", "Never", "rollingupdate", "on-delete", "Recreate"] {
            assert!(
                matches!(select(&strategy(t)), Err(Error::UnsupportedUpdateStrategy(m)) if m == t),
                "expected {:?} to be rejected",
                t
            );
        }
    }

    #[test]
    fn test_on_delete_to_statefulset_strategy() {
        let sts = UpdateStrategyDecision::OnDelete.to_statefulset_strategy();
        assert_eq!(sts.type_.as_deref(), Some("OnDelete"));
        assert!(sts.rolling_update.is_none());
    }

    #[test]
    fn test_update_type_display_roundtrip() {
        for t in [
            UpdateType::ReplicasFirstPrimaryLast,
            UpdateType::RollingUpdate,
            UpdateType::OnDelete,
        ] {
            assert_eq!(t.to_string().parse::<UpdateType>().unwrap(), t);
        }
    }
}
