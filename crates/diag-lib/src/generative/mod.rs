//! Generative fallback diagnosis
//!
//! Used only after the rule table misses. The full diagnostic context is
//! rendered into a prompt, sent to a text-generation service, and the
//! two-field answer is parsed back. Service failures are converted into a
//! degraded diagnosis and never propagate.

mod openai;
mod prompt;

pub use openai::{GenerativeConfig, OpenAiCompatibleGenerator};
pub use prompt::{build_prompt, PromptContext};

use crate::error::Result;
use crate::models::{DiagnosisResult, Provenance};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

pub const NO_RECOMMENDATION: &str = "No specific recommendation provided.";
pub const FAILED_RECOMMENDATION: &str = "Review the collected events and logs manually.";

const DIAGNOSIS_MARKER: &str = "diagnosis:";
const RECOMMENDATION_MARKER: &str = "recommendation:";

/// Submits a prompt and returns the generated text
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Rule-miss classifier backed by a `TextGenerator`
#[derive(Clone)]
pub struct GenerativeClassifier {
    generator: Arc<dyn TextGenerator>,
}

impl GenerativeClassifier {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Always returns a diagnosis; failures become "analysis failed"
    pub async fn classify(&self, context: &PromptContext<'_>) -> DiagnosisResult {
        let prompt = build_prompt(context);
        debug!(pod = %context.instance.name, prompt_bytes = prompt.len(), "Requesting generative diagnosis");

        match self.generator.generate(&prompt).await {
            Ok(text) => {
                let (diagnosis, recommendation) = parse_response(&text);
                DiagnosisResult::new(diagnosis, recommendation, Provenance::GenerativeFallback)
            }
            Err(e) => {
                warn!(pod = %context.instance.name, error = %e, "Generative diagnosis failed");
                DiagnosisResult::new(
                    format!("analysis failed: {}", e),
                    FAILED_RECOMMENDATION,
                    Provenance::GenerativeFallback,
                )
            }
        }
    }
}

/// Split a `Diagnosis: ... Recommendation: ...` answer into its fields
pub fn parse_response(text: &str) -> (String, String) {
    // ASCII lowercasing keeps byte offsets aligned with `text`
    let lower = text.to_ascii_lowercase();

    let diagnosis_start = lower
        .find(DIAGNOSIS_MARKER)
        .map(|i| i + DIAGNOSIS_MARKER.len())
        .unwrap_or(0);

    match lower[diagnosis_start..].find(RECOMMENDATION_MARKER) {
        Some(offset) => {
            let marker = diagnosis_start + offset;
            let diagnosis = clean(&text[diagnosis_start..marker]);
            let recommendation = clean(&text[marker + RECOMMENDATION_MARKER.len()..]);
            let recommendation = if recommendation.is_empty() {
                NO_RECOMMENDATION.to_string()
            } else {
                recommendation
            };
            (diagnosis, recommendation)
        }
        None => (clean(&text[diagnosis_start..]), NO_RECOMMENDATION.to_string()),
    }
}

/// Trim whitespace and stray markdown emphasis around a field
fn clean(field: &str) -> String {
    field
        .trim_matches(|c: char| c.is_whitespace() || c == '*')
        .to_string()
}
