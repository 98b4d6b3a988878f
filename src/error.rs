//! Error types for dealflow
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// All error types that can occur in dealflow
#[derive(Debug, Error)]
pub enum DealflowError {
    /// Record invariant violated (e.g. persona assigned twice)
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Caller-supplied input rejected
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// LLM API error
    #[error("LLM error: {0}")]
    Llm(String),

    /// Web search error
    #[error("Search error: {0}")]
    Search(String),

    /// Structured output from a collaborator could not be interpreted
    #[error("Parse error: {0}")]
    Parse(String),

    /// The sequencer hit its hard ceiling on stage invocations
    #[error("Step limit exceeded: more than {limit} workflow steps")]
    StepLimitExceeded { limit: u32 },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type alias for dealflow operations
pub type Result<T> = std::result::Result<T, DealflowError>;
