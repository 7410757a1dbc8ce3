//! Core data models for cluster diagnostics
//!
//! These are read-only snapshots of orchestrator objects, reduced to the
//! fields the classifier, collector and diagnosis stages look at.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Pod lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Pending,
    Running,
    Succeeded,
    Failed,
    Unknown,
}

impl Phase {
    /// Map the API's phase string; anything unrecognised is `Unknown`
    pub fn from_api(phase: Option<&str>) -> Self {
        match phase {
            Some("Pending") => Phase::Pending,
            Some("Running") => Phase::Running,
            Some("Succeeded") => Phase::Succeeded,
            Some("Failed") => Phase::Failed,
            _ => Phase::Unknown,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Pending => "Pending",
            Phase::Running => "Running",
            Phase::Succeeded => "Succeeded",
            Phase::Failed => "Failed",
            Phase::Unknown => "Unknown",
        };
        f.write_str(s)
    }
}

/// Why a container is waiting instead of running
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WaitReason {
    CrashLoopBackOff,
    ImagePullBackOff,
    Error,
    Other(String),
}

impl WaitReason {
    pub fn from_api(reason: &str) -> Self {
        match reason {
            "CrashLoopBackOff" => WaitReason::CrashLoopBackOff,
            "ImagePullBackOff" => WaitReason::ImagePullBackOff,
            "Error" => WaitReason::Error,
            other => WaitReason::Other(other.to_string()),
        }
    }

    /// Wait reasons that mark a pod unhealthy regardless of readiness
    pub fn is_failure(&self) -> bool {
        !matches!(self, WaitReason::Other(_))
    }
}

impl fmt::Display for WaitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaitReason::CrashLoopBackOff => f.write_str("CrashLoopBackOff"),
            WaitReason::ImagePullBackOff => f.write_str("ImagePullBackOff"),
            WaitReason::Error => f.write_str("Error"),
            WaitReason::Other(reason) => f.write_str(reason),
        }
    }
}

/// Details of a container's previous termination
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminationInfo {
    pub exit_code: i32,
    pub reason: Option<String>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// Current state of a container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum ContainerState {
    Running,
    Waiting { reason: Option<WaitReason> },
    Terminated { exit_code: i32, reason: Option<String> },
    Unknown,
}

impl fmt::Display for ContainerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerState::Running => f.write_str("running"),
            ContainerState::Waiting { reason: Some(r) } => write!(f, "waiting ({})", r),
            ContainerState::Waiting { reason: None } => f.write_str("waiting"),
            ContainerState::Terminated { exit_code, reason } => match reason {
                Some(r) => write!(f, "terminated ({}, exit code {})", r, exit_code),
                None => write!(f, "terminated (exit code {})", exit_code),
            },
            ContainerState::Unknown => f.write_str("unknown"),
        }
    }
}

/// Status snapshot of one container in a pod
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerStatus {
    pub name: String,
    pub ready: bool,
    pub restart_count: i32,
    pub state: ContainerState,
    pub last_termination: Option<TerminationInfo>,
}

impl ContainerStatus {
    pub fn wait_reason(&self) -> Option<&WaitReason> {
        match &self.state {
            ContainerState::Waiting { reason } => reason.as_ref(),
            _ => None,
        }
    }
}

/// A discovered pod
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadInstance {
    pub name: String,
    pub namespace: String,
    pub phase: Phase,
    pub containers: Vec<ContainerStatus>,
}

/// An orchestrator event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticEvent {
    pub timestamp: Option<DateTime<Utc>>,
    pub event_type: String,
    pub reason: String,
    pub message: String,
    pub object_kind: String,
    pub object_name: String,
}

/// Reduced view of a cluster node
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub name: String,
    /// condition type -> status ("True"/"False"/"Unknown")
    pub conditions: BTreeMap<String, String>,
    /// `key:value` (or bare `key`) per taint, as listed on the node
    pub taints: Vec<String>,
    pub allocatable: BTreeMap<String, String>,
    pub capacity: BTreeMap<String, String>,
}

impl NodeSnapshot {
    /// Status of the Ready condition, `Unknown` when not reported
    pub fn ready_status(&self) -> &str {
        self.conditions
            .get("Ready")
            .map(String::as_str)
            .unwrap_or("Unknown")
    }
}

/// Where a diagnosis came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// A rule table predicate matched
    RuleBased,
    /// Produced by the text-generation service after a rule miss
    GenerativeFallback,
    /// Generic catch-all, nothing matched
    None,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Provenance::RuleBased => "rule-based",
            Provenance::GenerativeFallback => "generative",
            Provenance::None => "none",
        };
        f.write_str(s)
    }
}

/// Final diagnosis for one unhealthy pod
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosisResult {
    pub diagnosis: String,
    pub recommendation: String,
    pub provenance: Provenance,
}

impl DiagnosisResult {
    pub fn new(
        diagnosis: impl Into<String>,
        recommendation: impl Into<String>,
        provenance: Provenance,
    ) -> Self {
        Self {
            diagnosis: diagnosis.into(),
            recommendation: recommendation.into(),
            provenance,
        }
    }
}

/// Exact-match label selector over `app`, `country` and optional `fleet`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelSelector {
    pub app: String,
    pub country: String,
    pub fleet: Option<String>,
}

impl LabelSelector {
    pub fn new(app: impl Into<String>, country: impl Into<String>, fleet: Option<String>) -> Self {
        Self {
            app: app.into(),
            country: country.into(),
            fleet,
        }
    }
}

impl fmt::Display for LabelSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "app={},country={}", self.app, self.country)?;
        if let Some(fleet) = &self.fleet {
            write!(f, ",fleet={}", fleet)?;
        }
        Ok(())
    }
}
