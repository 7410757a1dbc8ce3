//! Run configuration
//!
//! Built once at startup, validated once, then handed to the driver by
//! reference. Nothing downstream reads environment or global state.

use crate::collector::DEFAULT_LOG_TAIL_LINES;
use crate::error::{Error, Result};
use crate::generative::GenerativeConfig;
use crate::models::LabelSelector;
use crate::rules::RuleMode;
use std::path::PathBuf;

pub const DEFAULT_NAMESPACE: &str = "default";
pub const DEFAULT_EXPECTED_CLUSTER: &str = "staging";

#[derive(Debug, Clone)]
pub struct DiagnosticConfig {
    /// Cluster the active kubeconfig context must point at
    pub expected_cluster: String,
    pub kubeconfig: PathBuf,
    pub namespace: String,
    pub selector: LabelSelector,
    pub rule_mode: RuleMode,
    /// Previous-run log lines fetched per terminated container
    pub log_tail_lines: i64,
    /// Text-generation backend, required for escalating mode
    pub generative: Option<GenerativeConfig>,
}

impl DiagnosticConfig {
    pub fn new(kubeconfig: impl Into<PathBuf>, selector: LabelSelector) -> Self {
        Self {
            expected_cluster: DEFAULT_EXPECTED_CLUSTER.to_string(),
            kubeconfig: kubeconfig.into(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            selector,
            rule_mode: RuleMode::default(),
            log_tail_lines: DEFAULT_LOG_TAIL_LINES,
            generative: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.expected_cluster.trim().is_empty() {
            return Err(Error::Config("expected cluster name must not be empty".into()));
        }
        if self.namespace.trim().is_empty() {
            return Err(Error::Config("namespace must not be empty".into()));
        }
        if self.selector.app.trim().is_empty() || self.selector.country.trim().is_empty() {
            return Err(Error::Config("'app' and 'country' labels are required".into()));
        }
        if matches!(&self.selector.fleet, Some(fleet) if fleet.trim().is_empty()) {
            return Err(Error::Config("'fleet' label must not be empty when given".into()));
        }
        if self.log_tail_lines <= 0 {
            return Err(Error::Config(format!(
                "log tail lines must be positive, got {}",
                self.log_tail_lines
            )));
        }

        match (&self.rule_mode, &self.generative) {
            (RuleMode::Escalating, None) => {
                return Err(Error::Config(
                    "escalating rule mode requires a generative backend (set an LLM API key)".into(),
                ));
            }
            (_, Some(generative)) if generative.api_key.trim().is_empty() => {
                return Err(Error::Config("LLM API key must not be empty".into()));
            }
            _ => {}
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> DiagnosticConfig {
        DiagnosticConfig::new("/tmp/kubeconfig", LabelSelector::new("checkout", "de", None))
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = config();
        assert_eq!(config.namespace, "default");
        assert_eq!(config.expected_cluster, "staging");
        assert_eq!(config.rule_mode, RuleMode::Terminal);
        assert_eq!(config.log_tail_lines, 50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_escalating_requires_generator() {
        let mut config = config();
        config.rule_mode = RuleMode::Escalating;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        config.generative = Some(GenerativeConfig::new("sk-test-0123456789"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_missing_labels() {
        let mut config = config();
        config.selector.country = " ".into();
        assert!(config.validate().is_err());

        let mut config = self::config();
        config.selector.fleet = Some(String::new());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_non_positive_tail() {
        let mut config = config();
        config.log_tail_lines = 0;
        assert!(config.validate().is_err());
    }
}
