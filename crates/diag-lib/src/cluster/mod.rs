//! Orchestrator access
//!
//! The diagnosis pipeline only sees the cluster through the narrow
//! capability traits below. `KubeOrchestrator` backs them with the
//! Kubernetes API; tests substitute in-memory fakes.

mod identity;
mod kubernetes;

pub use self::identity::{ClusterIdentity, KubeconfigConnector};
pub use self::kubernetes::{event_from_api, instance_from_api, node_from_api, KubeOrchestrator};

use crate::error::Result;
use crate::models::{DiagnosticEvent, LabelSelector, NodeSnapshot, WorkloadInstance};
use async_trait::async_trait;
use std::sync::Arc;

/// Lists pods by label selector
#[async_trait]
pub trait InstanceLister: Send + Sync {
    async fn list_instances(
        &self,
        namespace: &str,
        selector: &LabelSelector,
    ) -> Result<Vec<WorkloadInstance>>;
}

/// Lists events for a pod or for nodes
#[async_trait]
pub trait EventLister: Send + Sync {
    /// Events whose involved object is `name` within `namespace`
    async fn list_instance_events(&self, namespace: &str, name: &str)
        -> Result<Vec<DiagnosticEvent>>;

    /// Cluster-wide events whose involved object kind is Node
    async fn list_node_events(&self) -> Result<Vec<DiagnosticEvent>>;
}

/// Lists cluster nodes
#[async_trait]
pub trait NodeLister: Send + Sync {
    async fn list_nodes(&self) -> Result<Vec<NodeSnapshot>>;
}

/// Reads logs of a container's previous run
#[async_trait]
pub trait LogReader: Send + Sync {
    async fn previous_logs(
        &self,
        namespace: &str,
        pod: &str,
        container: &str,
        tail_lines: i64,
    ) -> Result<String>;
}

/// Everything the driver needs from a connected cluster
pub trait Orchestrator: InstanceLister + EventLister + NodeLister + LogReader {}

impl<T> Orchestrator for T where T: InstanceLister + EventLister + NodeLister + LogReader {}

/// Resolves the active cluster identity and opens a connection to it
#[async_trait]
pub trait ClusterConnector: Send + Sync {
    /// Identity of the active context, read without contacting the cluster
    fn active_identity(&self) -> Result<ClusterIdentity>;

    /// Build a client for a previously validated identity
    async fn connect(&self, identity: &ClusterIdentity) -> Result<Arc<dyn Orchestrator>>;
}
