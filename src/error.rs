//! Error taxonomy for an analysis run.
//!
//! Only whole-stage failures are errors here. Per-chunk and per-batch
//! completion failures are turned into inline text by
//! [`CompletionClient`](crate::completion::CompletionClient) and never
//! reach these types.

use thiserror::Error;

/// The repository URL did not have the accepted shape.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Invalid GitHub URL '{url}'. Must be of the form https://github.com/username/projectname")]
pub struct ValidationError {
    pub url: String,
}

/// The repository (or a subtree of it) could not be listed or read.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("{path}: HTTP {status}: {message}")]
    Status {
        path: String,
        status: u16,
        message: String,
    },
    #[error("{path}: {message}")]
    Transport { path: String, message: String },
    #[error("{path}: unexpected listing payload: {message}")]
    Payload { path: String, message: String },
}

/// A single completion call failed.
///
/// `rate_limited` is set by the provider layer and drives the fallback
/// decision in [`CompletionClient`](crate::completion::CompletionClient).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ProviderError {
    pub message: String,
    pub rate_limited: bool,
}

impl ProviderError {
    /// Build an error and classify it from its message text.
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        let rate_limited = is_rate_limit_message(&message);
        Self {
            message,
            rate_limited,
        }
    }

    /// Build an error that is known to be a rate-limit response.
    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            rate_limited: true,
        }
    }
}

/// "quota" (any case) or the token "429" marks a quota/rate-limit failure.
pub fn is_rate_limit_message(message: &str) -> bool {
    message.to_lowercase().contains("quota") || message.contains("429")
}

/// The project report could not be assembled.
#[derive(Debug, Error)]
pub enum AggregationError {
    #[error("failed to write report to {path}: {source}")]
    Persist {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Failure of a whole analysis run.
#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Error fetching files: {0}")]
    Fetch(#[from] FetchError),
    #[error("No readable files found.")]
    NoReadableFiles,
    #[error("Error generating project summary: {0}")]
    Aggregation(#[from] AggregationError),
    /// The streaming consumer went away; the run stopped early.
    #[error("progress consumer disconnected")]
    Disconnected,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_quota_and_429() {
        assert!(ProviderError::new("Resource has been exhausted (e.g. check QUOTA).").rate_limited);
        assert!(ProviderError::new("HTTP 429 Too Many Requests").rate_limited);
        assert!(!ProviderError::new("HTTP 401 Unauthorized").rate_limited);
        assert!(!ProviderError::new("connection reset").rate_limited);
    }

    #[test]
    fn validation_message_names_expected_shape() {
        let err = ValidationError {
            url: "ftp://x".to_string(),
        };
        assert!(err.to_string().contains("https://github.com/username/projectname"));
    }
}
