//! Kubeconfig-based cluster identity and connection bootstrap

use super::{ClusterConnector, KubeOrchestrator, Orchestrator};
use crate::error::{Error, Result};
use async_trait::async_trait;
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Active context and the cluster it points at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterIdentity {
    pub context: String,
    pub cluster: String,
}

impl ClusterIdentity {
    /// Fail unless the identity points at `expected_cluster`
    pub fn validate(&self, expected_cluster: &str) -> Result<()> {
        if self.cluster != expected_cluster {
            return Err(Error::ClusterMismatch {
                expected: expected_cluster.to_string(),
                actual: self.cluster.clone(),
            });
        }
        Ok(())
    }

    /// Resolve the current context of a parsed kubeconfig
    pub fn from_kubeconfig(kubeconfig: &Kubeconfig) -> Result<Self> {
        let current = kubeconfig
            .current_context
            .as_deref()
            .filter(|name| !name.is_empty())
            .ok_or_else(|| Error::ContextNotFound("No active context found in kubeconfig.".into()))?;

        let context = kubeconfig
            .contexts
            .iter()
            .find(|named| named.name == current)
            .and_then(|named| named.context.as_ref())
            .ok_or_else(|| {
                Error::ContextNotFound(format!(
                    "Active context '{}' is not defined in kubeconfig.",
                    current
                ))
            })?;

        Ok(Self {
            context: current.to_string(),
            cluster: context.cluster.clone(),
        })
    }
}

/// Connects through a kubeconfig file on disk
#[derive(Debug, Clone)]
pub struct KubeconfigConnector {
    path: PathBuf,
}

impl KubeconfigConnector {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Kubeconfig> {
        if !self.path.exists() {
            return Err(Error::Kubeconfig(format!(
                "Kubeconfig file not found at '{}'",
                self.path.display()
            )));
        }
        Kubeconfig::read_from(&self.path).map_err(|e| {
            Error::Kubeconfig(format!(
                "Failed to read kubeconfig '{}': {}",
                self.path.display(),
                e
            ))
        })
    }
}

#[async_trait]
impl ClusterConnector for KubeconfigConnector {
    fn active_identity(&self) -> Result<ClusterIdentity> {
        let kubeconfig = self.read()?;
        ClusterIdentity::from_kubeconfig(&kubeconfig)
    }

    async fn connect(&self, identity: &ClusterIdentity) -> Result<Arc<dyn Orchestrator>> {
        let kubeconfig = self.read()?;
        let options = KubeConfigOptions {
            context: Some(identity.context.clone()),
            cluster: None,
            user: None,
        };

        let config = Config::from_custom_kubeconfig(kubeconfig, &options)
            .await
            .map_err(|e| Error::Connection(format!("Failed to load kubeconfig context: {}", e)))?;
        debug!(cluster_url = %config.cluster_url, context = %identity.context, "Kubernetes client configured");

        let client = Client::try_from(config)
            .map_err(|e| Error::Connection(format!("Failed to create Kubernetes client: {}", e)))?;

        // Building a client does not touch the network; check the API server answers
        let version = client.apiserver_version().await.map_err(|e| {
            Error::Connection(format!(
                "Could not reach the API server of cluster '{}': {}",
                identity.cluster, e
            ))
        })?;
        debug!(git_version = %version.git_version, "API server reachable");

        Ok(Arc::new(KubeOrchestrator::new(client)))
    }
}
