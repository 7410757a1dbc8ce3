//! Pod health classification
//!
//! Maps a pod snapshot to a healthy/unhealthy verdict with a reason. The
//! checks run in a fixed order and the first one that fires wins: terminal
//! and scheduling failures outrank container wait failures, which outrank
//! plain readiness.

use crate::models::{Phase, WorkloadInstance};
use serde::{Deserialize, Serialize};

/// Health status of a pod
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// Classifier output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthVerdict {
    pub status: HealthStatus,
    pub reason: String,
}

impl HealthVerdict {
    pub fn healthy() -> Self {
        Self {
            status: HealthStatus::Healthy,
            reason: "Healthy".to_string(),
        }
    }

    pub fn unhealthy(reason: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Unhealthy,
            reason: reason.into(),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }
}

/// Classify a pod snapshot
pub fn classify(instance: &WorkloadInstance) -> HealthVerdict {
    match instance.phase {
        Phase::Failed | Phase::Unknown => {
            return HealthVerdict::unhealthy(format!(
                "Pod is in a non-running phase: {}",
                instance.phase
            ));
        }
        Phase::Pending => return HealthVerdict::unhealthy("Pod is stuck in Pending phase."),
        Phase::Running | Phase::Succeeded => {}
    }

    if instance.containers.is_empty() {
        return HealthVerdict::unhealthy("Pod has no container statuses, may still be initializing.");
    }

    for container in &instance.containers {
        let Some(wait) = container.wait_reason() else {
            continue;
        };
        if !wait.is_failure() {
            continue;
        }

        let mut reason = format!(
            "Container '{}' is in a waiting state with reason: {}",
            container.name, wait
        );
        // Surface the previous termination cause (e.g. OOMKilled) for the rule table
        if let Some(last) = container
            .last_termination
            .as_ref()
            .and_then(|t| t.reason.as_deref())
        {
            reason.push_str(&format!(" (last terminated: {})", last));
        }
        return HealthVerdict::unhealthy(reason);
    }

    if container_not_ready(instance) {
        return HealthVerdict::unhealthy("Not all containers in the pod are ready.");
    }

    HealthVerdict::healthy()
}

fn container_not_ready(instance: &WorkloadInstance) -> bool {
    instance.containers.iter().any(|c| !c.ready)
}
