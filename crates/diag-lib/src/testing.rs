//! In-memory fakes for unit tests

use crate::cluster::{
    ClusterConnector, ClusterIdentity, EventLister, InstanceLister, LogReader, NodeLister,
    Orchestrator,
};
use crate::error::{Error, Result};
use crate::generative::TextGenerator;
use crate::models::{
    ContainerState, ContainerStatus, DiagnosticEvent, LabelSelector, NodeSnapshot, Phase,
    TerminationInfo, WaitReason, WorkloadInstance,
};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub fn event(event_type: &str, reason: &str, message: &str) -> DiagnosticEvent {
    DiagnosticEvent {
        timestamp: Some(Utc.with_ymd_and_hms(2026, 10, 1, 12, 0, 0).unwrap()),
        event_type: event_type.to_string(),
        reason: reason.to_string(),
        message: message.to_string(),
        object_kind: "Pod".to_string(),
        object_name: "checkout-1".to_string(),
    }
}

pub fn healthy_instance(name: &str) -> WorkloadInstance {
    WorkloadInstance {
        name: name.to_string(),
        namespace: "default".to_string(),
        phase: Phase::Running,
        containers: vec![ContainerStatus {
            name: "app".to_string(),
            ready: true,
            restart_count: 0,
            state: ContainerState::Running,
            last_termination: None,
        }],
    }
}

pub fn crashing_instance(name: &str) -> WorkloadInstance {
    WorkloadInstance {
        name: name.to_string(),
        namespace: "default".to_string(),
        phase: Phase::Running,
        containers: vec![ContainerStatus {
            name: "app".to_string(),
            ready: false,
            restart_count: 5,
            state: ContainerState::Waiting {
                reason: Some(WaitReason::CrashLoopBackOff),
            },
            last_termination: Some(TerminationInfo {
                exit_code: 1,
                reason: Some("Error".to_string()),
                finished_at: None,
            }),
        }],
    }
}

#[derive(Default)]
pub struct FakeOrchestrator {
    instances: Vec<WorkloadInstance>,
    instances_error: Option<String>,
    events: Vec<DiagnosticEvent>,
    events_error: Option<String>,
    node_events: Vec<DiagnosticEvent>,
    nodes: Vec<NodeSnapshot>,
    nodes_error: Option<String>,
    logs: HashMap<String, String>,
    logs_error: Option<String>,
    log_requests: Mutex<Vec<(String, i64)>>,
    list_calls: AtomicUsize,
}

impl FakeOrchestrator {
    pub fn with_instances(mut self, instances: Vec<WorkloadInstance>) -> Self {
        self.instances = instances;
        self
    }

    pub fn failing_instances(mut self, message: &str) -> Self {
        self.instances_error = Some(message.to_string());
        self
    }

    pub fn with_events(mut self, events: Vec<DiagnosticEvent>) -> Self {
        self.events = events;
        self
    }

    pub fn failing_events(mut self, message: &str) -> Self {
        self.events_error = Some(message.to_string());
        self
    }

    pub fn with_node_events(mut self, events: Vec<DiagnosticEvent>) -> Self {
        self.node_events = events;
        self
    }

    pub fn with_nodes(mut self, nodes: Vec<NodeSnapshot>) -> Self {
        self.nodes = nodes;
        self
    }

    pub fn failing_nodes(mut self, message: &str) -> Self {
        self.nodes_error = Some(message.to_string());
        self
    }

    pub fn with_logs(mut self, container: &str, logs: &str) -> Self {
        self.logs.insert(container.to_string(), logs.to_string());
        self
    }

    pub fn failing_logs(mut self, message: &str) -> Self {
        self.logs_error = Some(message.to_string());
        self
    }

    pub fn log_requests(&self) -> Vec<(String, i64)> {
        self.log_requests.lock().unwrap().clone()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InstanceLister for FakeOrchestrator {
    async fn list_instances(
        &self,
        _namespace: &str,
        _selector: &LabelSelector,
    ) -> Result<Vec<WorkloadInstance>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        match &self.instances_error {
            Some(message) => Err(Error::Api(message.clone())),
            None => Ok(self.instances.clone()),
        }
    }
}

#[async_trait]
impl EventLister for FakeOrchestrator {
    async fn list_instance_events(
        &self,
        _namespace: &str,
        _name: &str,
    ) -> Result<Vec<DiagnosticEvent>> {
        match &self.events_error {
            Some(message) => Err(Error::Api(message.clone())),
            None => Ok(self.events.clone()),
        }
    }

    async fn list_node_events(&self) -> Result<Vec<DiagnosticEvent>> {
        Ok(self.node_events.clone())
    }
}

#[async_trait]
impl NodeLister for FakeOrchestrator {
    async fn list_nodes(&self) -> Result<Vec<NodeSnapshot>> {
        match &self.nodes_error {
            Some(message) => Err(Error::Api(message.clone())),
            None => Ok(self.nodes.clone()),
        }
    }
}

#[async_trait]
impl LogReader for FakeOrchestrator {
    async fn previous_logs(
        &self,
        _namespace: &str,
        _pod: &str,
        container: &str,
        tail_lines: i64,
    ) -> Result<String> {
        self.log_requests
            .lock()
            .unwrap()
            .push((container.to_string(), tail_lines));
        if let Some(message) = &self.logs_error {
            return Err(Error::Api(message.clone()));
        }
        self.logs
            .get(container)
            .cloned()
            .ok_or_else(|| Error::Api(format!("previous terminated container \"{}\" not found", container)))
    }
}

/// Returns a canned response (or error) and records prompts
#[derive(Default)]
pub struct FakeGenerator {
    response: Option<String>,
    error: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl FakeGenerator {
    pub fn responding(response: &str) -> Self {
        Self {
            response: Some(response.to_string()),
            ..Default::default()
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            error: Some(message.to_string()),
            ..Default::default()
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for FakeGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match &self.error {
            Some(message) => Err(Error::Generation(message.clone())),
            None => Ok(self.response.clone().unwrap_or_default()),
        }
    }
}

/// Hands out a shared `FakeOrchestrator` for a fixed identity
pub struct FakeConnector {
    pub identity: ClusterIdentity,
    pub orchestrator: Arc<FakeOrchestrator>,
    connect_error: Option<String>,
    connects: AtomicUsize,
}

impl FakeConnector {
    pub fn new(cluster: &str, orchestrator: FakeOrchestrator) -> Self {
        Self {
            identity: ClusterIdentity {
                context: format!("{}-ctx", cluster),
                cluster: cluster.to_string(),
            },
            orchestrator: Arc::new(orchestrator),
            connect_error: None,
            connects: AtomicUsize::new(0),
        }
    }

    /// Identity resolves but the API server is unreachable
    pub fn failing_connect(mut self, message: &str) -> Self {
        self.connect_error = Some(message.to_string());
        self
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ClusterConnector for FakeConnector {
    fn active_identity(&self) -> Result<ClusterIdentity> {
        Ok(self.identity.clone())
    }

    async fn connect(&self, _identity: &ClusterIdentity) -> Result<Arc<dyn Orchestrator>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.connect_error {
            return Err(Error::Connection(message.clone()));
        }
        let orchestrator: Arc<dyn Orchestrator> = self.orchestrator.clone();
        Ok(orchestrator)
    }
}
