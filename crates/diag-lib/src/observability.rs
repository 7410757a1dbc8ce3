//! Structured logging for diagnostic runs
//!
//! Emits one `tracing` event per significant step so runs can be followed
//! in JSON logs alongside the human-readable report.

use crate::cluster::ClusterIdentity;
use crate::health::HealthVerdict;
use crate::models::{DiagnosisResult, WorkloadInstance};
use tracing::{error, info, warn};

/// Structured logger for driver events
#[derive(Debug, Clone)]
pub struct DiagnosticLogger {
    namespace: String,
}

impl DiagnosticLogger {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    /// Log run start
    pub fn log_run_start(&self, selector: &str, rule_mode: &str) {
        info!(
            event = "run_started",
            namespace = %self.namespace,
            selector = %selector,
            rule_mode = %rule_mode,
            "Diagnostic run started"
        );
    }

    /// Log cluster identity validation
    pub fn log_identity(&self, identity: &ClusterIdentity, accepted: bool) {
        if accepted {
            info!(
                event = "identity_validated",
                context = %identity.context,
                cluster = %identity.cluster,
                "Cluster identity validated"
            );
        } else {
            warn!(
                event = "identity_rejected",
                context = %identity.context,
                cluster = %identity.cluster,
                "Cluster identity rejected"
            );
        }
    }

    /// Log discovery result
    pub fn log_discovery(&self, selector: &str, count: usize) {
        info!(
            event = "pods_discovered",
            namespace = %self.namespace,
            selector = %selector,
            count = count,
            "Pod discovery complete"
        );
    }

    pub fn log_discovery_failure(&self, selector: &str, err: &dyn std::fmt::Display) {
        error!(
            event = "discovery_failed",
            namespace = %self.namespace,
            selector = %selector,
            error = %err,
            "Error discovering pods"
        );
    }

    /// Log a health verdict
    pub fn log_verdict(&self, instance: &WorkloadInstance, verdict: &HealthVerdict) {
        info!(
            event = "pod_classified",
            namespace = %self.namespace,
            pod = %instance.name,
            phase = %instance.phase,
            healthy = verdict.is_healthy(),
            reason = %verdict.reason,
            "Pod classified"
        );
    }

    /// Log a finished diagnosis
    pub fn log_diagnosis(&self, instance: &WorkloadInstance, result: &DiagnosisResult) {
        info!(
            event = "pod_diagnosed",
            namespace = %self.namespace,
            pod = %instance.name,
            provenance = %result.provenance,
            diagnosis = %result.diagnosis,
            "Pod diagnosed"
        );
    }

    /// Log run completion
    pub fn log_run_complete(&self, discovered: usize, unhealthy: usize) {
        info!(
            event = "run_completed",
            namespace = %self.namespace,
            discovered = discovered,
            unhealthy = unhealthy,
            "Diagnostic run completed"
        );
    }
}
