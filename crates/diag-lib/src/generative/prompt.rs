//! Prompt rendering for the generative fallback

use crate::collector::{InstanceDiagnostics, NodeDiagnostics};
use crate::models::WorkloadInstance;
use std::fmt::Write;

const INSTRUCTIONS: &str = "You are an expert Kubernetes site reliability engineer. \
A pod has been classified as unhealthy and none of the known failure signatures matched. \
Using the pod status, its events, the logs of previously terminated containers, and the \
state of the cluster nodes below, identify the most likely root cause.

Answer with exactly two labeled fields and nothing else:
Diagnosis: <one paragraph explaining the root cause>
Recommendation: <one sentence describing the fix>";

/// Everything known about an unhealthy pod at escalation time
#[derive(Debug, Clone, Copy)]
pub struct PromptContext<'a> {
    pub instance: &'a WorkloadInstance,
    pub reason: &'a str,
    pub diagnostics: &'a InstanceDiagnostics,
    pub nodes: &'a NodeDiagnostics,
}

/// Render the instruction template followed by the diagnostic context
pub fn build_prompt(ctx: &PromptContext<'_>) -> String {
    let mut out = String::with_capacity(4096);
    out.push_str(INSTRUCTIONS);
    out.push_str("\n\n");

    // Writing into a String cannot fail
    let _ = writeln!(out, "## Pod");
    let _ = writeln!(out, "Name: {}", ctx.instance.name);
    let _ = writeln!(out, "Namespace: {}", ctx.instance.namespace);
    let _ = writeln!(out, "Phase: {}", ctx.instance.phase);
    let _ = writeln!(out, "Unhealthy reason: {}", ctx.reason);

    let _ = writeln!(out, "\n## Containers");
    if ctx.instance.containers.is_empty() {
        let _ = writeln!(out, "No container statuses reported.");
    }
    for c in &ctx.instance.containers {
        let _ = write!(
            out,
            "- {}: ready={}, restarts={}, state={}",
            c.name, c.ready, c.restart_count, c.state
        );
        if let Some(last) = &c.last_termination {
            let _ = write!(
                out,
                ", last terminated: {} (exit code {})",
                last.reason.as_deref().unwrap_or("unknown"),
                last.exit_code
            );
        }
        out.push('\n');
    }

    let _ = writeln!(out, "\n## Pod Events\n{}", ctx.diagnostics.events);
    let _ = writeln!(out, "\n## Previous Container Logs\n{}", ctx.diagnostics.logs);

    let _ = writeln!(out, "\n## Nodes");
    if let Some(err) = &ctx.nodes.nodes_error {
        let _ = writeln!(out, "{}", err);
    } else if ctx.nodes.nodes.is_empty() {
        let _ = writeln!(out, "No nodes reported.");
    }
    for node in &ctx.nodes.nodes {
        let conditions = node
            .conditions
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(", ");
        let taints = if node.taints.is_empty() {
            "none".to_string()
        } else {
            node.taints.join(", ")
        };
        let _ = writeln!(
            out,
            "- {}: status={}, conditions=[{}], taints=[{}]",
            node.name,
            node.ready_status(),
            conditions,
            taints
        );
    }

    let _ = writeln!(out, "\n## Node Events\n{}", ctx.nodes.events);
    out
}
