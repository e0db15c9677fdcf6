//! Deployment readiness from live status
//!
//! A Deployment is ready when:
//! - the controller has observed its latest generation
//! - no replicas are unavailable
//! - it is `Available` because minimum replicas are available
//! - it is `Progressing` because the new ReplicaSet is available

use k8s_openapi::api::apps::v1::{Deployment, DeploymentCondition};

/// `Available` condition type
pub const DEPLOYMENT_AVAILABLE: &str = "Available";

/// `Progressing` condition type
pub const DEPLOYMENT_PROGRESSING: &str = "Progressing";

/// `ReplicaFailure` condition type
pub const DEPLOYMENT_REPLICA_FAILURE: &str = "ReplicaFailure";

/// Reason of `Available` once enough replicas are up
pub const MINIMUM_REPLICAS_AVAILABLE: &str = "MinimumReplicasAvailable";

/// Reason of `Progressing` once the rollout finished
pub const NEW_REPLICA_SET_AVAILABLE: &str = "NewReplicaSetAvailable";

fn conditions(deployment: &Deployment) -> &[DeploymentCondition] {
    deployment
        .status
        .as_ref()
        .and_then(|s| s.conditions.as_deref())
        .unwrap_or_default()
}

/// Condition of the given type, if reported
pub fn deployment_condition<'a>(
    deployment: &'a Deployment,
    type_: &str,
) -> Option<&'a DeploymentCondition> {
    conditions(deployment).iter().find(|c| c.type_ == type_)
}

/// Whether the condition of the given type is `True`
pub fn has_condition_true(deployment: &Deployment, type_: &str) -> bool {
    deployment_condition(deployment, type_).is_some_and(|c| c.status == "True")
}

/// Whether the condition of the given type is `True` with the given reason
pub fn has_condition_true_with_reason(deployment: &Deployment, type_: &str, reason: &str) -> bool {
    deployment_condition(deployment, type_)
        .is_some_and(|c| c.status == "True" && c.reason.as_deref() == Some(reason))
}

/// Message of a `True` `ReplicaFailure` condition
pub fn replica_failure(deployment: &Deployment) -> Option<&str> {
    deployment_condition(deployment, DEPLOYMENT_REPLICA_FAILURE)
        .filter(|c| c.status == "True")
        .map(|c| c.message.as_deref().unwrap_or_default())
}

/// Whether a Deployment has finished rolling out
pub fn is_deployment_ready(deployment: &Deployment) -> bool {
    let status = deployment.status.as_ref();
    let generation = deployment.metadata.generation.unwrap_or(0);
    let observed = status.and_then(|s| s.observed_generation).unwrap_or(0);
    let unavailable = status.and_then(|s| s.unavailable_replicas).unwrap_or(0);

    generation == observed
        && unavailable == 0
        && has_condition_true_with_reason(
            deployment,
            DEPLOYMENT_AVAILABLE,
            MINIMUM_REPLICAS_AVAILABLE,
        )
        && has_condition_true_with_reason(
            deployment,
            DEPLOYMENT_PROGRESSING,
            NEW_REPLICA_SET_AVAILABLE,
        )
}

#[cfg(test)]
pub(crate) mod fixtures {
    use k8s_openapi::api::apps::v1::{Deployment, DeploymentCondition, DeploymentStatus};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    pub fn condition(type_: &str, status: &str, reason: &str) -> DeploymentCondition {
        DeploymentCondition {
            type_: type_.to_string(),
            status: status.to_string(),
            reason: Some(reason.to_string()),
            ..Default::default()
        }
    }

    pub fn deployment(
        namespace: &str,
        name: &str,
        generation: i64,
        observed: i64,
        conditions: Vec<DeploymentCondition>,
    ) -> Deployment {
        Deployment {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some(namespace.to_string()),
                generation: Some(generation),
                ..Default::default()
            },
            status: Some(DeploymentStatus {
                observed_generation: Some(observed),
                conditions: Some(conditions),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    pub fn ready_deployment(namespace: &str, name: &str) -> Deployment {
        deployment(
            namespace,
            name,
            2,
            2,
            vec![
                condition("Available", "True", "MinimumReplicasAvailable"),
                condition("Progressing", "True", "NewReplicaSetAvailable"),
            ],
        )
    }
}
