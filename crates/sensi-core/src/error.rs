//! Error types for the Sensi core.

use thiserror::Error;

/// Result type alias for core operations.
pub type SensiResult<T> = Result<T, SensiError>;

/// Errors raised by the document store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("sled: {0}")]
    Sled(#[from] sled::Error),

    #[error("document {path} is not valid JSON: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("document {0} is not a JSON object")]
    NotAnObject(String),

    #[error("encode: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Errors raised by the generative-AI bridge.
#[derive(Error, Debug)]
pub enum GenAiError {
    #[error("request: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success status. 429 and 5xx are retried, everything else fails fast.
    #[error("status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("response parse: {0}")]
    Json(String),

    #[error("response has no {0}")]
    MissingField(&'static str),

    #[error("audio: {0}")]
    Audio(String),
}

impl GenAiError {
    /// True for rate limiting, server-side failures and transport errors.
    pub fn is_retryable(&self) -> bool {
        match self {
            GenAiError::Transport(_) => true,
            GenAiError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<serde_json::Error> for GenAiError {
    fn from(err: serde_json::Error) -> Self {
        GenAiError::Json(err.to_string())
    }
}

/// Errors surfaced by the sensitivity and storefront flows.
#[derive(Error, Debug)]
pub enum SensiError {
    #[error("no preset for RAM {0}")]
    NoPreset(String),

    #[error("validation: {0}")]
    Validation(String),

    #[error("unknown product {0}")]
    UnknownProduct(String),

    #[error("invalid step: expected {expected}, in {actual}")]
    InvalidStep {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("access denied")]
    AccessDenied,

    #[error("store: {0}")]
    Store(#[from] StoreError),

    #[error("generative AI: {0}")]
    GenAi(#[from] GenAiError),
}

impl From<sled::Error> for SensiError {
    fn from(err: sled::Error) -> Self {
        SensiError::Store(StoreError::Sled(err))
    }
}
