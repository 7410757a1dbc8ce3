//! Rule-based diagnosis
//!
//! An ordered table of symptom predicates over the unhealthy reason, the
//! formatted pod events and the previous-run logs. The first matching rule
//! wins and later rules are never consulted, so table order matters: the
//! specific log signatures must stay ahead of the CrashLoopBackOff
//! catch-all.

use crate::models::{DiagnosisResult, Provenance};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const GENERIC_DIAGNOSIS: &str = "The pod is in an unhealthy state.";
pub const GENERIC_RECOMMENDATION: &str =
    "Please review the pod events and container statuses for more specific clues.";

/// What the engine does when no rule matches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleMode {
    /// Fall through to a generic diagnosis; never escalates
    #[default]
    Terminal,
    /// Report no match so the caller can escalate to text generation
    Escalating,
}

impl fmt::Display for RuleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleMode::Terminal => f.write_str("terminal"),
            RuleMode::Escalating => f.write_str("escalating"),
        }
    }
}

impl FromStr for RuleMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "terminal" => Ok(RuleMode::Terminal),
            "escalating" => Ok(RuleMode::Escalating),
            other => Err(format!(
                "unknown rule mode '{}', expected 'terminal' or 'escalating'",
                other
            )),
        }
    }
}

/// Symptoms a rule can inspect
#[derive(Debug, Clone, Copy)]
pub struct Symptoms<'a> {
    pub reason: &'a str,
    pub events: &'a str,
    pub logs: &'a str,
}

/// Outcome of evaluating the table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleOutcome {
    Matched(DiagnosisResult),
    NoMatch,
}

#[derive(Debug, Clone, Copy)]
enum Field {
    Reason,
    Events,
    /// Case-insensitive
    Logs,
}

struct Rule {
    name: &'static str,
    field: Field,
    needles: &'static [&'static str],
    diagnosis: &'static str,
    recommendation: &'static str,
}

impl Rule {
    /// `logs_lower` is `symptoms.logs` lowercased once per evaluation
    fn matches(&self, symptoms: &Symptoms<'_>, logs_lower: &str) -> bool {
        let haystack = match self.field {
            Field::Reason => symptoms.reason,
            Field::Events => symptoms.events,
            Field::Logs => logs_lower,
        };
        self.needles.iter().any(|n| haystack.contains(n))
    }
}

const RULES: &[Rule] = &[
    Rule {
        name: "oom_killed",
        field: Field::Reason,
        needles: &["OOMKilled"],
        diagnosis: "The container was terminated because it exceeded its memory limit.",
        recommendation: "Increase the memory limit for this pod in your deployment's resource requests/limits.",
    },
    Rule {
        name: "image_pull",
        field: Field::Reason,
        needles: &["ImagePullBackOff"],
        diagnosis: "Kubernetes failed to pull the container image.",
        recommendation: "Check that the image name and tag are correct and that the cluster has credentials to pull from the registry.",
    },
    Rule {
        name: "failed_scheduling",
        field: Field::Events,
        needles: &["FailedScheduling"],
        diagnosis: "The pod could not be scheduled onto a node.",
        recommendation: "This is often due to insufficient resources (CPU, memory) or node taints. Check `kubectl describe node`.",
    },
    Rule {
        name: "failed_mount",
        field: Field::Events,
        needles: &["FailedMount"],
        diagnosis: "The pod failed to mount a required volume.",
        recommendation: "Verify that the volume exists in the namespace and is correctly named in the pod definition.",
    },
    Rule {
        name: "connection_refused",
        field: Field::Logs,
        needles: &["connection refused"],
        diagnosis: "The application is crashing because it cannot connect to another service.",
        recommendation: "Verify that the upstream service (e.g., database, API) is running and accessible.",
    },
    Rule {
        name: "missing_file",
        field: Field::Logs,
        needles: &["file not found", "no such file or directory"],
        diagnosis: "The application is crashing because a required file is missing.",
        recommendation: "Check that all necessary configuration files or scripts are correctly mounted.",
    },
    Rule {
        name: "permission_denied",
        field: Field::Logs,
        needles: &["permission denied"],
        diagnosis: "The application is crashing due to a file system permission error.",
        recommendation: "Check the user/group the container is running as and ensure it has correct permissions.",
    },
    Rule {
        name: "crash_loop",
        field: Field::Reason,
        needles: &["CrashLoopBackOff"],
        diagnosis: "The container is crashing with an un-recognized application error.",
        recommendation: "Please examine the container logs closely to identify the root cause of the stack trace or error message.",
    },
];

/// Ordered symptom matcher
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleEngine {
    mode: RuleMode,
}

impl RuleEngine {
    pub fn new(mode: RuleMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> RuleMode {
        self.mode
    }

    /// Evaluate the table; `NoMatch` only in escalating mode
    pub fn evaluate(&self, symptoms: &Symptoms<'_>) -> RuleOutcome {
        let logs_lower = symptoms.logs.to_lowercase();
        if let Some(rule) = RULES
            .iter()
            .find(|rule| rule.matches(symptoms, &logs_lower))
        {
            tracing::debug!(rule = rule.name, "Diagnosis rule matched");
            return RuleOutcome::Matched(DiagnosisResult::new(
                rule.diagnosis,
                rule.recommendation,
                Provenance::RuleBased,
            ));
        }

        match self.mode {
            RuleMode::Terminal => RuleOutcome::Matched(DiagnosisResult::new(
                GENERIC_DIAGNOSIS,
                GENERIC_RECOMMENDATION,
                Provenance::None,
            )),
            RuleMode::Escalating => RuleOutcome::NoMatch,
        }
    }
}
