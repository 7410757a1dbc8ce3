//! Kubernetes-backed orchestrator adapter
//!
//! Thin wrappers over the core/v1 API plus pure conversions from
//! k8s-openapi objects into the crate's snapshot models.

use super::{EventLister, InstanceLister, LogReader, NodeLister};
use crate::error::Result;
use crate::models::{
    ContainerState, ContainerStatus, DiagnosticEvent, LabelSelector, NodeSnapshot, Phase,
    TerminationInfo, WaitReason, WorkloadInstance,
};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{self as corev1, Event, Node, Pod};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use kube::api::{Api, ListParams, LogParams};
use kube::Client;
use std::collections::BTreeMap;
use tracing::debug;

/// Orchestrator backed by a live Kubernetes client
#[derive(Clone)]
pub struct KubeOrchestrator {
    client: Client,
}

impl KubeOrchestrator {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl InstanceLister for KubeOrchestrator {
    async fn list_instances(
        &self,
        namespace: &str,
        selector: &LabelSelector,
    ) -> Result<Vec<WorkloadInstance>> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let params = ListParams::default().labels(&selector.to_string());

        let list = pods.list(&params).await?;
        debug!(namespace = %namespace, count = list.items.len(), "Listed pods");
        Ok(list.items.iter().map(instance_from_api).collect())
    }
}

#[async_trait]
impl EventLister for KubeOrchestrator {
    async fn list_instance_events(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Vec<DiagnosticEvent>> {
        let events: Api<Event> = Api::namespaced(self.client.clone(), namespace);
        let params = ListParams::default().fields(&format!("involvedObject.name={}", name));

        let list = events.list(&params).await?;
        Ok(list.items.iter().map(event_from_api).collect())
    }

    async fn list_node_events(&self) -> Result<Vec<DiagnosticEvent>> {
        let events: Api<Event> = Api::all(self.client.clone());
        let params = ListParams::default().fields("involvedObject.kind=Node");

        let list = events.list(&params).await?;
        Ok(list.items.iter().map(event_from_api).collect())
    }
}

#[async_trait]
impl NodeLister for KubeOrchestrator {
    async fn list_nodes(&self) -> Result<Vec<NodeSnapshot>> {
        let nodes: Api<Node> = Api::all(self.client.clone());
        let list = nodes.list(&ListParams::default()).await?;
        Ok(list.items.iter().map(node_from_api).collect())
    }
}

#[async_trait]
impl LogReader for KubeOrchestrator {
    async fn previous_logs(
        &self,
        namespace: &str,
        pod: &str,
        container: &str,
        tail_lines: i64,
    ) -> Result<String> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let params = LogParams {
            container: Some(container.to_string()),
            previous: true,
            tail_lines: Some(tail_lines),
            ..Default::default()
        };

        Ok(pods.logs(pod, &params).await?)
    }
}

/// Reduce a Pod to a `WorkloadInstance`
pub fn instance_from_api(pod: &Pod) -> WorkloadInstance {
    let status = pod.status.as_ref();
    let containers = status
        .and_then(|s| s.container_statuses.as_ref())
        .map(|statuses| statuses.iter().map(container_from_api).collect())
        .unwrap_or_default();

    WorkloadInstance {
        name: pod.metadata.name.clone().unwrap_or_default(),
        namespace: pod.metadata.namespace.clone().unwrap_or_default(),
        phase: Phase::from_api(status.and_then(|s| s.phase.as_deref())),
        containers,
    }
}

fn container_from_api(status: &corev1::ContainerStatus) -> ContainerStatus {
    let last_termination = status
        .last_state
        .as_ref()
        .and_then(|s| s.terminated.as_ref())
        .map(|t| TerminationInfo {
            exit_code: t.exit_code,
            reason: t.reason.clone(),
            finished_at: t.finished_at.as_ref().map(|time| time.0),
        });

    ContainerStatus {
        name: status.name.clone(),
        ready: status.ready,
        restart_count: status.restart_count,
        state: status
            .state
            .as_ref()
            .map(state_from_api)
            .unwrap_or(ContainerState::Unknown),
        last_termination,
    }
}

fn state_from_api(state: &corev1::ContainerState) -> ContainerState {
    if let Some(waiting) = &state.waiting {
        return ContainerState::Waiting {
            reason: waiting.reason.as_deref().map(WaitReason::from_api),
        };
    }
    if let Some(terminated) = &state.terminated {
        return ContainerState::Terminated {
            exit_code: terminated.exit_code,
            reason: terminated.reason.clone(),
        };
    }
    if state.running.is_some() {
        return ContainerState::Running;
    }
    ContainerState::Unknown
}

/// Reduce an Event; timestamp prefers last, then event time, then first
pub fn event_from_api(event: &Event) -> DiagnosticEvent {
    let timestamp = event
        .last_timestamp
        .as_ref()
        .map(|ts| ts.0)
        .or_else(|| event.event_time.as_ref().map(|ts| ts.0))
        .or_else(|| event.first_timestamp.as_ref().map(|ts| ts.0));

    DiagnosticEvent {
        timestamp,
        event_type: event.type_.clone().unwrap_or_default(),
        reason: event.reason.clone().unwrap_or_default(),
        message: event.message.clone().unwrap_or_default(),
        object_kind: event.involved_object.kind.clone().unwrap_or_default(),
        object_name: event.involved_object.name.clone().unwrap_or_default(),
    }
}

/// Reduce a Node to a `NodeSnapshot`
pub fn node_from_api(node: &Node) -> NodeSnapshot {
    let status = node.status.as_ref();

    let conditions = status
        .and_then(|s| s.conditions.as_ref())
        .map(|conds| {
            conds
                .iter()
                .map(|c| (c.type_.clone(), c.status.clone()))
                .collect()
        })
        .unwrap_or_default();

    let taints = node
        .spec
        .as_ref()
        .and_then(|s| s.taints.as_ref())
        .map(|taints| {
            taints
                .iter()
                .map(|t| match &t.value {
                    Some(value) => format!("{}:{}", t.key, value),
                    None => t.key.clone(),
                })
                .collect()
        })
        .unwrap_or_default();

    NodeSnapshot {
        name: node.metadata.name.clone().unwrap_or_default(),
        conditions,
        taints,
        allocatable: quantities(status.and_then(|s| s.allocatable.as_ref())),
        capacity: quantities(status.and_then(|s| s.capacity.as_ref())),
    }
}

fn quantities(resources: Option<&BTreeMap<String, Quantity>>) -> BTreeMap<String, String> {
    resources
        .map(|m| m.iter().map(|(k, v)| (k.clone(), v.0.clone())).collect())
        .unwrap_or_default()
}
