//! Configuration management for the CLI
//!
//! Precedence, lowest first: built-in defaults, settings file, `KUBEDIAG_`
//! environment variables, command-line flags.

use crate::Cli;
use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use diag_lib::config::{DEFAULT_EXPECTED_CLUSTER, DEFAULT_NAMESPACE};
use diag_lib::collector::DEFAULT_LOG_TAIL_LINES;
use diag_lib::generative::GenerativeConfig;
use diag_lib::{DiagnosticConfig, LabelSelector, RuleMode};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Settings from file and environment
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default = "default_namespace")]
    pub namespace: String,

    #[serde(default = "default_expected_cluster")]
    pub expected_cluster: String,

    pub kubeconfig: Option<PathBuf>,

    #[serde(default)]
    pub rule_mode: RuleMode,

    #[serde(default = "default_log_tail_lines")]
    pub log_tail_lines: i64,

    #[serde(default)]
    pub llm: LlmSettings,
}

/// `[llm]` table of the settings file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LlmSettings {
    pub endpoint: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub timeout_secs: Option<u64>,
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

fn default_expected_cluster() -> String {
    DEFAULT_EXPECTED_CLUSTER.to_string()
}

fn default_log_tail_lines() -> i64 {
    DEFAULT_LOG_TAIL_LINES
}

impl Settings {
    /// Load settings; an explicitly given file must exist
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let file = match explicit {
            Some(path) => Some((path.to_path_buf(), true)),
            None => default_settings_path().map(|path| (path, false)),
        };

        let mut builder = Config::builder();
        if let Some((path, required)) = file {
            let name = path
                .to_str()
                .with_context(|| format!("Settings path is not valid UTF-8: {}", path.display()))?
                .to_string();
            builder = builder.add_source(File::new(&name, FileFormat::Toml).required(required));
        }

        let config = builder
            .add_source(
                Environment::with_prefix("KUBEDIAG")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to load settings")?;

        config
            .try_deserialize()
            .context("Failed to parse settings")
    }
}

/// `~/.config/kubediag/config.toml`
fn default_settings_path() -> Option<PathBuf> {
    dirs_next::home_dir().map(|home| home.join(".config").join("kubediag").join("config.toml"))
}

/// Get kubeconfig path
///
/// The flag already carries `KUBECONFIG` when set; only its first entry is
/// used.
pub fn kubeconfig_path(flag: Option<&Path>, settings: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = flag.and_then(first_path) {
        return Ok(path);
    }

    if let Some(path) = settings {
        return Ok(path.to_path_buf());
    }

    let home = dirs_next::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".kube").join("config"))
}

fn first_path(value: &Path) -> Option<PathBuf> {
    std::env::split_paths(value.as_os_str()).find(|p| !p.as_os_str().is_empty())
}

/// Merge flags over settings into the run configuration
pub fn resolve(cli: &Cli, settings: Settings) -> Result<DiagnosticConfig> {
    let kubeconfig = kubeconfig_path(cli.kubeconfig.as_deref(), settings.kubeconfig.as_deref())?;
    let selector = LabelSelector::new(cli.app.clone(), cli.country.clone(), cli.fleet.clone());

    let mut config = DiagnosticConfig::new(kubeconfig, selector);
    config.namespace = cli.namespace.clone().unwrap_or(settings.namespace);
    config.expected_cluster = cli
        .expected_cluster
        .clone()
        .unwrap_or(settings.expected_cluster);
    config.rule_mode = cli.rule_mode.unwrap_or(settings.rule_mode);
    config.log_tail_lines = cli.log_tail_lines.unwrap_or(settings.log_tail_lines);

    let llm = settings.llm;
    if let Some(api_key) = cli.llm_api_key.clone().or(llm.api_key) {
        let mut generative = GenerativeConfig::new(api_key);
        if let Some(endpoint) = cli.llm_endpoint.clone().or(llm.endpoint) {
            generative.endpoint = endpoint;
        }
        if let Some(model) = cli.llm_model.clone().or(llm.model) {
            generative.model = model;
        }
        if let Some(secs) = llm.timeout_secs {
            generative.timeout = Duration::from_secs(secs);
        }
        config.generative = Some(generative);
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    fn settings_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["kubediag", "--app", "checkout", "--country", "de"];
        argv.extend_from_slice(args);
        Cli::parse_from(argv)
    }

    #[test]
    fn test_settings_defaults() {
        let file = settings_file("");
        let settings = Settings::load(Some(file.path())).unwrap();

        assert_eq!(settings.namespace, "default");
        assert_eq!(settings.expected_cluster, "staging");
        assert_eq!(settings.rule_mode, RuleMode::Terminal);
        assert_eq!(settings.log_tail_lines, 50);
        assert!(settings.llm.api_key.is_none());
    }

    #[test]
    fn test_settings_file_values() {
        let file = settings_file(
            r#"
namespace = "shop"
expected_cluster = "qa"
rule_mode = "escalating"
log_tail_lines = 200

[llm]
model = "local-model"
api_key = "sk-file-0123456789"
timeout_secs = 5
"#,
        );
        let settings = Settings::load(Some(file.path())).unwrap();

        assert_eq!(settings.namespace, "shop");
        assert_eq!(settings.expected_cluster, "qa");
        assert_eq!(settings.rule_mode, RuleMode::Escalating);
        assert_eq!(settings.log_tail_lines, 200);
        assert_eq!(settings.llm.model.as_deref(), Some("local-model"));
        assert_eq!(settings.llm.timeout_secs, Some(5));
    }

    #[test]
    fn test_missing_explicit_settings_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        assert!(Settings::load(Some(missing.as_path())).is_err());
    }

    #[test]
    fn test_flags_override_settings() {
        let file = settings_file(
            r#"
namespace = "shop"
kubeconfig = "/etc/kube/settings-config"

[llm]
model = "local-model"
api_key = "sk-file-0123456789"
"#,
        );
        let settings = Settings::load(Some(file.path())).unwrap();
        let cli = parse(&[
            "--namespace",
            "payments",
            "--kubeconfig",
            "/tmp/flag-config",
            "--fleet",
            "blue",
            "--llm-model",
            "flag-model",
        ]);

        let config = resolve(&cli, settings).unwrap();

        assert_eq!(config.namespace, "payments");
        assert_eq!(config.kubeconfig, PathBuf::from("/tmp/flag-config"));
        assert_eq!(config.selector.to_string(), "app=checkout,country=de,fleet=blue");
        let generative = config.generative.unwrap();
        assert_eq!(generative.model, "flag-model");
        assert_eq!(generative.api_key, "sk-file-0123456789");
    }

    #[test]
    fn test_no_api_key_means_no_generative_backend() {
        let file = settings_file("");
        let settings = Settings::load(Some(file.path())).unwrap();
        let cli = parse(&["--kubeconfig", "/tmp/config", "--rule-mode", "escalating"]);

        let config = resolve(&cli, settings).unwrap();

        assert_eq!(config.rule_mode, RuleMode::Escalating);
        assert!(config.generative.is_none());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_kubeconfig_path_precedence() {
        let settings = PathBuf::from("/etc/kube/settings-config");

        let path = kubeconfig_path(Some(Path::new("/tmp/flag")), Some(settings.as_path())).unwrap();
        assert_eq!(path, PathBuf::from("/tmp/flag"));

        let path = kubeconfig_path(None, Some(settings.as_path())).unwrap();
        assert_eq!(path, settings);
    }

    #[cfg(unix)]
    #[test]
    fn test_kubeconfig_path_uses_first_entry() {
        let path = kubeconfig_path(Some(Path::new("/tmp/a:/tmp/b")), None).unwrap();
        assert_eq!(path, PathBuf::from("/tmp/a"));
    }
}
