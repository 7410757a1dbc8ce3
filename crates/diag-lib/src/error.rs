//! Error types for diag-lib

use thiserror::Error;

/// Diagnostic error type
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid or incomplete configuration
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Kubeconfig file missing or unreadable
    #[error("kubeconfig error: {0}")]
    Kubeconfig(String),

    /// Kubeconfig has no usable active context
    #[error("{0}")]
    ContextNotFound(String),

    /// Active context points at a different cluster than expected
    #[error(
        "This tool is configured to run only against the '{expected}' cluster, \
         but the current context is '{actual}'. Aborting."
    )]
    ClusterMismatch { expected: String, actual: String },

    /// Client could not be built for the validated context
    #[error("connection error: {0}")]
    Connection(String),

    /// Orchestrator API call failed
    #[error("api error: {0}")]
    Api(String),

    /// Text generation service call failed
    #[error("generation error: {0}")]
    Generation(String),
}

impl Error {
    /// Returns true for errors that must abort the run
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::Config(_)
                | Error::Kubeconfig(_)
                | Error::ContextNotFound(_)
                | Error::ClusterMismatch { .. }
                | Error::Connection(_)
        )
    }
}

impl From<kube::Error> for Error {
    fn from(err: kube::Error) -> Self {
        Error::Api(err.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::Generation("request timed out".to_string())
        } else {
            Error::Generation(err.to_string())
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(Error::ClusterMismatch {
            expected: "staging".into(),
            actual: "prod".into()
        }
        .is_fatal());
        assert!(Error::Kubeconfig("missing".into()).is_fatal());
        assert!(!Error::Api("forbidden".into()).is_fatal());
        assert!(!Error::Generation("quota".into()).is_fatal());
    }

    #[test]
    fn test_mismatch_message_names_both_clusters() {
        let err = Error::ClusterMismatch {
            expected: "staging".into(),
            actual: "prod-eu".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("'staging'"));
        assert!(msg.contains("'prod-eu'"));
    }
}
