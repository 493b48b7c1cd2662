use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the picker library.
#[derive(Debug, Error)]
pub enum PickerError {
    /// The key file does not hold a well-formed provider key.
    #[error("API key found in {} is invalid", path.display())]
    InvalidCredentialFormat { path: PathBuf },

    /// The key file could not be read.
    #[error("could not read API key file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Transport failure or non-2xx status from either web service.
    #[error("HTTP error: {0}")]
    Network(#[from] reqwest::Error),

    /// The body was not JSON or lacked a required field.
    #[error("malformed response for {context}: {source}")]
    MalformedResponse {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The provider answered, but with an error status in the envelope.
    #[error("provider returned {status}: {}", .message.as_deref().unwrap_or("no message"))]
    ProviderStatus {
        status: String,
        message: Option<String>,
    },

    /// An endpoint override was not a valid URL.
    #[error("invalid endpoint URL '{url}': {reason}")]
    InvalidEndpoint { url: String, reason: String },

    /// Standard input reached end-of-file while waiting for an answer.
    #[error("console input closed")]
    InputClosed,

    #[error("console I/O error: {0}")]
    Prompt(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PickerError>;
