//! Diagnostic library for Kubernetes workloads
//!
//! This crate provides the core functionality for:
//! - Cluster identity checks and pod discovery
//! - Health classification of pods
//! - Event, log and node context collection
//! - Rule-based and generative diagnosis
//! - Run orchestration and structured logging

pub mod cluster;
pub mod collector;
pub mod config;
pub mod driver;
pub mod error;
pub mod generative;
pub mod health;
pub mod models;
pub mod observability;
pub mod rules;

#[cfg(test)]
mod testing;

pub use cluster::{ClusterConnector, ClusterIdentity, KubeconfigConnector, Orchestrator};
pub use config::DiagnosticConfig;
pub use driver::{Driver, DriverState, InstanceReport, NullReporter, Reporter, RunSummary};
pub use error::{Error, Result};
pub use generative::{GenerativeConfig, TextGenerator};
pub use health::{HealthStatus, HealthVerdict};
pub use models::*;
pub use observability::DiagnosticLogger;
pub use rules::RuleMode;
