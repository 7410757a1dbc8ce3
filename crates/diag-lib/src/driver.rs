//! Orchestration driver
//!
//! Sequences a diagnostic run:
//! Disconnected -> Connected -> Discovered -> Reported, or Aborted when the
//! configuration or cluster identity is rejected. Only the connection step
//! can fail the run; discovery failure degrades to an empty result and all
//! per-pod failures are folded into the report.

use crate::cluster::{ClusterConnector, ClusterIdentity, Orchestrator};
use crate::collector::{DiagnosticsCollector, InstanceDiagnostics};
use crate::config::DiagnosticConfig;
use crate::error::{Error, Result};
use crate::generative::{GenerativeClassifier, OpenAiCompatibleGenerator, PromptContext, TextGenerator};
use crate::health::{classify, HealthVerdict};
use crate::models::{DiagnosisResult, Phase, Provenance, WorkloadInstance};
use crate::observability::DiagnosticLogger;
use crate::rules::{RuleEngine, RuleMode, RuleOutcome, Symptoms, GENERIC_DIAGNOSIS, GENERIC_RECOMMENDATION};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Driver lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DriverState {
    Disconnected,
    Connected,
    Discovered,
    Reported,
    Aborted,
}

/// Result for one discovered pod
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceReport {
    pub name: String,
    pub namespace: String,
    pub phase: Phase,
    pub verdict: HealthVerdict,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<InstanceDiagnostics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnosis: Option<DiagnosisResult>,
}

/// Outcome of a completed run, reports in discovery order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub cluster: ClusterIdentity,
    pub namespace: String,
    pub selector: String,
    pub discovered: usize,
    pub healthy: usize,
    pub unhealthy: usize,
    pub reports: Vec<InstanceReport>,
}

/// Receives run progress as it happens
pub trait Reporter {
    fn on_connected(&mut self, _identity: &ClusterIdentity) {}

    fn on_discovery_started(&mut self, _namespace: &str, _selector: &str) {}

    fn on_discovered(&mut self, _count: usize) {}

    fn on_instance(&mut self, report: &InstanceReport);

    fn on_finished(&mut self, _summary: &RunSummary) {}
}

/// Discards all progress
#[derive(Debug, Default)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn on_instance(&mut self, _report: &InstanceReport) {}
}

pub struct Driver<'a> {
    config: &'a DiagnosticConfig,
    rules: RuleEngine,
    generative: Option<GenerativeClassifier>,
    logger: DiagnosticLogger,
    state: DriverState,
}

impl<'a> Driver<'a> {
    /// Driver without a generative backend
    pub fn new(config: &'a DiagnosticConfig) -> Self {
        Self {
            config,
            rules: RuleEngine::new(config.rule_mode),
            generative: None,
            logger: DiagnosticLogger::new(&config.namespace),
            state: DriverState::Disconnected,
        }
    }

    /// Driver wired to the configured text-generation service, if any
    pub fn from_config(config: &'a DiagnosticConfig) -> Result<Self> {
        let driver = Self::new(config);
        match &config.generative {
            Some(generative) => {
                let generator = OpenAiCompatibleGenerator::new(generative)?;
                Ok(driver.with_generator(Arc::new(generator)))
            }
            None => Ok(driver),
        }
    }

    pub fn with_generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.generative = Some(GenerativeClassifier::new(generator));
        self
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Run the full pipeline; errors are always fatal
    pub async fn run(
        &mut self,
        connector: &dyn ClusterConnector,
        reporter: &mut dyn Reporter,
    ) -> Result<RunSummary> {
        let selector = self.config.selector.to_string();
        self.logger
            .log_run_start(&selector, &self.config.rule_mode.to_string());

        let (identity, orchestrator) = match self.connect(connector).await {
            Ok(connected) => connected,
            Err(e) => {
                self.state = DriverState::Aborted;
                return Err(e);
            }
        };
        self.state = DriverState::Connected;
        reporter.on_connected(&identity);

        reporter.on_discovery_started(&self.config.namespace, &selector);
        let instances = self.discover(orchestrator.as_ref(), &selector).await;
        self.state = DriverState::Discovered;
        reporter.on_discovered(instances.len());

        let mut reports = Vec::with_capacity(instances.len());
        for instance in &instances {
            let report = self.report(orchestrator.as_ref(), instance).await;
            reporter.on_instance(&report);
            reports.push(report);
        }

        let unhealthy = reports.iter().filter(|r| !r.verdict.is_healthy()).count();
        let summary = RunSummary {
            cluster: identity,
            namespace: self.config.namespace.clone(),
            selector,
            discovered: reports.len(),
            healthy: reports.len() - unhealthy,
            unhealthy,
            reports,
        };
        self.state = DriverState::Reported;
        self.logger.log_run_complete(summary.discovered, summary.unhealthy);
        reporter.on_finished(&summary);

        Ok(summary)
    }

    async fn connect(
        &self,
        connector: &dyn ClusterConnector,
    ) -> Result<(ClusterIdentity, Arc<dyn Orchestrator>)> {
        self.config.validate()?;
        if self.config.rule_mode == RuleMode::Escalating && self.generative.is_none() {
            return Err(Error::Config(
                "escalating rule mode requires a generative backend".into(),
            ));
        }

        let identity = connector.active_identity()?;
        if let Err(e) = identity.validate(&self.config.expected_cluster) {
            self.logger.log_identity(&identity, false);
            return Err(e);
        }
        self.logger.log_identity(&identity, true);

        let orchestrator = connector.connect(&identity).await?;
        Ok((identity, orchestrator))
    }

    async fn discover(&self, orchestrator: &dyn Orchestrator, selector: &str) -> Vec<WorkloadInstance> {
        match orchestrator
            .list_instances(&self.config.namespace, &self.config.selector)
            .await
        {
            Ok(instances) => {
                self.logger.log_discovery(selector, instances.len());
                instances
            }
            Err(e) => {
                self.logger.log_discovery_failure(selector, &e);
                Vec::new()
            }
        }
    }

    async fn report(&self, orchestrator: &dyn Orchestrator, instance: &WorkloadInstance) -> InstanceReport {
        let verdict = classify(instance);
        self.logger.log_verdict(instance, &verdict);

        let (diagnostics, diagnosis) = if verdict.is_healthy() {
            (None, None)
        } else {
            let (diagnostics, diagnosis) = self.diagnose(orchestrator, instance, &verdict).await;
            self.logger.log_diagnosis(instance, &diagnosis);
            (Some(diagnostics), Some(diagnosis))
        };

        InstanceReport {
            name: instance.name.clone(),
            namespace: instance.namespace.clone(),
            phase: instance.phase,
            verdict,
            diagnostics,
            diagnosis,
        }
    }

    /// Collect diagnostics for an unhealthy pod and produce its diagnosis
    pub async fn diagnose(
        &self,
        orchestrator: &dyn Orchestrator,
        instance: &WorkloadInstance,
        verdict: &HealthVerdict,
    ) -> (InstanceDiagnostics, DiagnosisResult) {
        let collector = DiagnosticsCollector::new(orchestrator, self.config.log_tail_lines);
        let diagnostics = collector.collect_instance_diagnostics(instance).await;

        let symptoms = Symptoms {
            reason: &verdict.reason,
            events: &diagnostics.events,
            logs: &diagnostics.logs,
        };

        let diagnosis = match self.rules.evaluate(&symptoms) {
            RuleOutcome::Matched(result) => result,
            RuleOutcome::NoMatch => match &self.generative {
                Some(classifier) => {
                    debug!(pod = %instance.name, "No rule matched, escalating");
                    let nodes = collector.collect_node_diagnostics().await;
                    classifier
                        .classify(&PromptContext {
                            instance,
                            reason: &verdict.reason,
                            diagnostics: &diagnostics,
                            nodes: &nodes,
                        })
                        .await
                }
                None => DiagnosisResult::new(
                    GENERIC_DIAGNOSIS,
                    GENERIC_RECOMMENDATION,
                    Provenance::None,
                ),
            },
        };

        (diagnostics, diagnosis)
    }
}
