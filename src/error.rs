//! Domain-specific error types for testwright

use crate::framework::FrameworkType;
use thiserror::Error;

/// Main error type for the framework expert pipeline
#[derive(Error, Debug)]
pub enum TestwrightError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Unknown framework type: {name}")]
    UnknownFramework { name: String },

    /// Single-flight conflict. Retryable signal, not a hard failure: another
    /// analysis currently holds the flight for this framework type.
    #[error("Analysis already in progress for {framework}")]
    AnalysisInProgress { framework: FrameworkType },

    #[error("Analysis failed: {reason}")]
    AnalysisFailed { reason: String },

    #[error("Generation failed: {reason}")]
    GenerationFailed { reason: String },

    /// Never surfaced to callers: retrieval converts this into the
    /// demo-corpus fallback before anything leaves the crate.
    #[error("No knowledge artifact for {framework}")]
    KnowledgeNotFound { framework: FrameworkType },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("I/O error: {message}")]
    Io { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl From<anyhow::Error> for TestwrightError {
    fn from(err: anyhow::Error) -> Self {
        TestwrightError::Internal {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for TestwrightError {
    fn from(err: serde_json::Error) -> Self {
        TestwrightError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for TestwrightError {
    fn from(err: std::io::Error) -> Self {
        TestwrightError::Io {
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for TestwrightError {
    fn from(err: reqwest::Error) -> Self {
        TestwrightError::GenerationFailed {
            reason: format!("HTTP request failed: {}", err),
        }
    }
}

/// Result type alias for testwright operations
pub type Result<T> = std::result::Result<T, TestwrightError>;
