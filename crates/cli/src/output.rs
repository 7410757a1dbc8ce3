//! Output formatting utilities

use anyhow::{Context, Result};
use clap::ValueEnum;
use colored::Colorize;
use diag_lib::{ClusterIdentity, InstanceReport, Provenance, Reporter, RunSummary};
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

/// Output format for the report
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

const DIAGNOSIS_COLUMN_WIDTH: usize = 60;

/// Row for the closing summary table
#[derive(Debug, Tabled)]
struct SummaryRow {
    #[tabled(rename = "Pod")]
    pod: String,
    #[tabled(rename = "Phase")]
    phase: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Source")]
    source: String,
    #[tabled(rename = "Diagnosis")]
    diagnosis: String,
}

/// Human-readable progress and report on stdout
pub struct TableReporter {
    show_details: bool,
}

impl TableReporter {
    pub fn new(show_details: bool) -> Self {
        Self { show_details }
    }
}

impl Reporter for TableReporter {
    fn on_connected(&mut self, identity: &ClusterIdentity) {
        print_success(&format!(
            "Connected to cluster '{}' (context '{}')",
            identity.cluster, identity.context
        ));
    }

    fn on_discovery_started(&mut self, namespace: &str, selector: &str) {
        print_info(&format!(
            "Searching for pods in namespace '{}' with label selector '{}'",
            namespace, selector
        ));
    }

    fn on_discovered(&mut self, count: usize) {
        if count == 0 {
            print_warning("No pods found matching the selector.");
        } else {
            print_info(&format!("Found {} pod(s)", count));
        }
    }

    fn on_instance(&mut self, report: &InstanceReport) {
        if report.verdict.is_healthy() {
            print_success(&format!("Pod '{}' is healthy", report.name));
            return;
        }

        println!();
        print!("{}", render_unhealthy(report, self.show_details));
    }

    fn on_finished(&mut self, summary: &RunSummary) {
        println!();
        if !summary.reports.is_empty() {
            let table = Table::new(summary_rows(summary))
                .with(Style::rounded())
                .to_string();
            println!("{}", table);
        }
        println!(
            "\nTotal: {} pods, {} healthy, {} unhealthy",
            summary.discovered,
            summary.healthy.to_string().green(),
            summary.unhealthy.to_string().red()
        );
    }
}

/// Block printed under an unhealthy pod
fn render_unhealthy(report: &InstanceReport, show_details: bool) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{} {}\n",
        "✗".red().bold(),
        format!("Pod '{}' is unhealthy", report.name).bold()
    ));
    out.push_str(&format!("{}\n", "=".repeat(60)));
    out.push_str(&format!("Phase:           {}\n", color_status(&report.phase.to_string())));
    out.push_str(&format!("Reason:          {}\n", report.verdict.reason));

    if let Some(diagnosis) = &report.diagnosis {
        out.push_str(&format!("Source:          {}\n", color_provenance(diagnosis.provenance)));
        out.push_str(&format!("Diagnosis:       {}\n", diagnosis.diagnosis.cyan()));
        out.push_str(&format!("Recommendation:  {}\n", diagnosis.recommendation));
    }

    if show_details {
        if let Some(diagnostics) = &report.diagnostics {
            out.push_str(&format!("\n  {}\n", "Recent Events:".bold()));
            out.push_str(&indent(&diagnostics.events, 4));
            out.push_str(&format!("\n  {}\n", "Logs from Crashed Containers:".bold()));
            out.push_str(&indent(&diagnostics.logs, 4));
        }
    }

    out
}

fn indent(text: &str, width: usize) -> String {
    let pad = " ".repeat(width);
    text.lines()
        .map(|line| format!("{}{}\n", pad, line))
        .collect()
}

fn summary_rows(summary: &RunSummary) -> Vec<SummaryRow> {
    summary
        .reports
        .iter()
        .map(|report| {
            let (source, diagnosis) = match &report.diagnosis {
                Some(d) => (
                    d.provenance.to_string(),
                    truncate(&d.diagnosis, DIAGNOSIS_COLUMN_WIDTH),
                ),
                None => ("-".to_string(), "-".to_string()),
            };
            SummaryRow {
                pod: report.name.clone(),
                phase: report.phase.to_string(),
                status: if report.verdict.is_healthy() {
                    color_status("healthy")
                } else {
                    color_status("unhealthy")
                },
                source,
                diagnosis,
            }
        })
        .collect()
}

/// Shorten to at most `max` characters
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let head: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", head)
}

/// Print a value as pretty JSON on stdout
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize report")?;
    println!("{}", json);
    Ok(())
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Color status based on value
pub fn color_status(status: &str) -> String {
    match status.to_lowercase().as_str() {
        "healthy" | "running" | "succeeded" => status.green().to_string(),
        "pending" => status.yellow().to_string(),
        "unhealthy" | "failed" => status.red().to_string(),
        _ => status.to_string(),
    }
}

fn color_provenance(provenance: Provenance) -> String {
    let label = provenance.to_string();
    match provenance {
        Provenance::RuleBased => label.green().to_string(),
        Provenance::GenerativeFallback => label.magenta().to_string(),
        Provenance::None => label.yellow().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diag_lib::collector::InstanceDiagnostics;
    use diag_lib::{DiagnosisResult, HealthVerdict, Phase};

    fn report(name: &str, diagnosis: Option<DiagnosisResult>) -> InstanceReport {
        InstanceReport {
            name: name.to_string(),
            namespace: "default".to_string(),
            phase: Phase::Running,
            verdict: if diagnosis.is_some() {
                HealthVerdict::unhealthy("Not all containers in the pod are ready.")
            } else {
                HealthVerdict::healthy()
            },
            diagnostics: None,
            diagnosis,
        }
    }

    fn summary(reports: Vec<InstanceReport>) -> RunSummary {
        RunSummary {
            cluster: ClusterIdentity {
                context: "staging-eu".to_string(),
                cluster: "staging".to_string(),
            },
            namespace: "default".to_string(),
            selector: "app=checkout,country=de".to_string(),
            discovered: reports.len(),
            healthy: 0,
            unhealthy: 0,
            reports,
        }
    }

    fn unhealthy_with_diagnostics() -> InstanceReport {
        let mut report = report(
            "checkout-b",
            Some(DiagnosisResult::new(
                "The container is crashing with an un-recognized application error.",
                "Please examine the container logs closely.",
                Provenance::RuleBased,
            )),
        );
        report.diagnostics = Some(InstanceDiagnostics {
            events: "2026-10-01T12:00:00Z [Warning] BackOff: Back-off restarting".to_string(),
            logs: "--- Logs for container 'app' ---\npanic: nil map".to_string(),
        });
        report
    }

    #[test]
    fn test_unhealthy_block_shows_evidence_by_default() {
        colored::control::set_override(false);
        let text = render_unhealthy(&unhealthy_with_diagnostics(), true);

        assert!(text.contains("Pod 'checkout-b' is unhealthy"));
        assert!(text.contains("Recent Events:"));
        assert!(text.contains("    2026-10-01T12:00:00Z [Warning] BackOff: Back-off restarting\n"));
        assert!(text.contains("Logs from Crashed Containers:"));
        assert!(text.contains("    --- Logs for container 'app' ---\n    panic: nil map\n"));
    }

    #[test]
    fn test_unhealthy_block_summary_only() {
        colored::control::set_override(false);
        let text = render_unhealthy(&unhealthy_with_diagnostics(), false);

        assert!(text.contains("Diagnosis:"));
        assert!(!text.contains("Recent Events:"));
        assert!(!text.contains("panic: nil map"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghijkl", 8), "abcde...");
        assert_eq!(truncate("ééééééé", 5), "éé...");
    }

    #[test]
    fn test_summary_rows_follow_report_order() {
        colored::control::set_override(false);
        let summary = summary(vec![
            report("checkout-a", None),
            report(
                "checkout-b",
                Some(DiagnosisResult::new(
                    "The pod is in an unhealthy state.",
                    "Please review the pod events and container statuses for more specific clues.",
                    Provenance::None,
                )),
            ),
        ]);

        let rows = summary_rows(&summary);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].pod, "checkout-a");
        assert_eq!(rows[0].status, "healthy");
        assert_eq!(rows[0].source, "-");
        assert_eq!(rows[1].status, "unhealthy");
        assert_eq!(rows[1].source, "none");
        assert_eq!(rows[1].diagnosis, "The pod is in an unhealthy state.");
    }

    #[test]
    fn test_summary_serializes_as_json() {
        let summary = summary(vec![report("checkout-a", None)]);
        let value = serde_json::to_value(&summary).unwrap();

        assert_eq!(value["cluster"]["cluster"], "staging");
        assert_eq!(value["reports"][0]["name"], "checkout-a");
        assert!(value["reports"][0].get("diagnosis").is_none());
    }
}
