//! Best-effort diagnostics collection
//!
//! Gathers pod events, previous-run container logs and node state for the
//! diagnosis stage. Every fetch failure is folded into the returned text
//! so collection itself never fails.

use crate::cluster::Orchestrator;
use crate::models::{DiagnosticEvent, NodeSnapshot, WorkloadInstance};
use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Default number of previous-run log lines fetched per container
pub const DEFAULT_LOG_TAIL_LINES: i64 = 50;

pub const NO_EVENTS: &str = "No recent events found.";
pub const NO_TERMINATED_CONTAINERS: &str = "No logs from previously terminated containers found.";
pub const NO_NODE_EVENTS: &str = "No recent node events found.";

/// Formatted diagnostics for one pod
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceDiagnostics {
    pub events: String,
    pub logs: String,
}

/// Node state and node-scoped events
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NodeDiagnostics {
    pub nodes: Vec<NodeSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nodes_error: Option<String>,
    pub events: String,
}

/// Collects diagnostics through the orchestrator capabilities
pub struct DiagnosticsCollector<'a> {
    orchestrator: &'a dyn Orchestrator,
    log_tail_lines: i64,
}

impl<'a> DiagnosticsCollector<'a> {
    pub fn new(orchestrator: &'a dyn Orchestrator, log_tail_lines: i64) -> Self {
        Self {
            orchestrator,
            log_tail_lines,
        }
    }

    /// Events and previous-run logs for an unhealthy pod
    pub async fn collect_instance_diagnostics(
        &self,
        instance: &WorkloadInstance,
    ) -> InstanceDiagnostics {
        let events = match self
            .orchestrator
            .list_instance_events(&instance.namespace, &instance.name)
            .await
        {
            Ok(events) => format_events(&events),
            Err(e) => {
                warn!(pod = %instance.name, error = %e, "Failed to list pod events");
                format!("Could not retrieve events: {}", e)
            }
        };

        let mut blocks = Vec::new();
        for container in instance
            .containers
            .iter()
            .filter(|c| c.last_termination.is_some())
        {
            match self
                .orchestrator
                .previous_logs(
                    &instance.namespace,
                    &instance.name,
                    &container.name,
                    self.log_tail_lines,
                )
                .await
            {
                Ok(logs) => {
                    debug!(pod = %instance.name, container = %container.name, bytes = logs.len(), "Fetched previous logs");
                    blocks.push(format!(
                        "--- Logs for container '{}' ---\n{}",
                        container.name,
                        logs.trim_end()
                    ));
                }
                Err(e) => {
                    warn!(pod = %instance.name, container = %container.name, error = %e, "Failed to read previous logs");
                    // Error text stays out of the log body matched by the rules
                    blocks.push(format!(
                        "Could not retrieve logs for previous instance of container '{}'.",
                        container.name
                    ));
                }
            }
        }

        let logs = if blocks.is_empty() {
            NO_TERMINATED_CONTAINERS.to_string()
        } else {
            blocks.join("\n")
        };

        InstanceDiagnostics { events, logs }
    }

    /// Node snapshots and cluster-wide node events
    pub async fn collect_node_diagnostics(&self) -> NodeDiagnostics {
        let (nodes, nodes_error) = match self.orchestrator.list_nodes().await {
            Ok(nodes) => (nodes, None),
            Err(e) => {
                warn!(error = %e, "Failed to list nodes");
                (Vec::new(), Some(format!("Could not retrieve nodes: {}", e)))
            }
        };

        let events = match self.orchestrator.list_node_events().await {
            Ok(events) if events.is_empty() => NO_NODE_EVENTS.to_string(),
            Ok(events) => events
                .iter()
                .map(format_node_event_line)
                .collect::<Vec<_>>()
                .join("\n"),
            Err(e) => {
                warn!(error = %e, "Failed to list node events");
                format!("Could not retrieve node events: {}", e)
            }
        };

        NodeDiagnostics {
            nodes,
            nodes_error,
            events,
        }
    }
}

/// `timestamp [type] reason: message`
pub fn format_event_line(event: &DiagnosticEvent) -> String {
    let timestamp = event
        .timestamp
        .map(|ts| ts.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_else(|| "unknown".to_string());
    format!(
        "{} [{}] {}: {}",
        timestamp, event.event_type, event.reason, event.message
    )
}

pub fn format_node_event_line(event: &DiagnosticEvent) -> String {
    format!("{} (node: {})", format_event_line(event), event.object_name)
}

/// One line per event in source order, or the no-events sentinel
pub fn format_events(events: &[DiagnosticEvent]) -> String {
    if events.is_empty() {
        return NO_EVENTS.to_string();
    }
    events
        .iter()
        .map(format_event_line)
        .collect::<Vec<_>>()
        .join("\n")
}
