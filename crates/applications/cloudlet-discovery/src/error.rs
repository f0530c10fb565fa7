//! Error types for cloudlet discovery

use thiserror::Error;

/// Discovery result type
pub type Result<T> = std::result::Result<T, DiscoveryError>;

/// Errors that abort a discovery call
///
/// Per-candidate probe failures never show up here; they are absorbed by
/// the prober. A selection that filters out every candidate is not an
/// error either, see [`cloudlet_core::SelectionOutcome::NoneAvailable`].
#[derive(Error, Debug)]
pub enum DiscoveryError {
    /// Transport-level failure (connect, timeout, reset) talking to the directory
    #[error("Directory {endpoint} unreachable: {source}")]
    DirectoryUnreachable {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// Directory answered with a non-success status
    #[error("Directory rejected the query with status {status}")]
    DirectoryRejected { status: u16 },

    /// Directory body is not the expected `{"cloudlet": [...]}` document
    #[error("Invalid directory response: {0}")]
    InvalidDirectoryResponse(String),

    /// Directory returned no usable entry, or selection got an empty list
    #[error("No candidate cloudlets")]
    NoCandidates,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP client construction error
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DiscoveryError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid directory response error
    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidDirectoryResponse(msg.into())
    }

    /// True for failures of the directory phase
    pub fn is_directory_failure(&self) -> bool {
        matches!(
            self,
            Self::DirectoryUnreachable { .. }
                | Self::DirectoryRejected { .. }
                | Self::InvalidDirectoryResponse(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(DiscoveryError::DirectoryRejected { status: 503 }.is_directory_failure());
        assert!(DiscoveryError::invalid_response("no list").is_directory_failure());
        assert!(!DiscoveryError::NoCandidates.is_directory_failure());
        assert!(!DiscoveryError::config("bad").is_directory_failure());
    }

    #[test]
    fn test_display() {
        assert_eq!(DiscoveryError::NoCandidates.to_string(), "No candidate cloudlets");
        assert_eq!(
            DiscoveryError::DirectoryRejected { status: 404 }.to_string(),
            "Directory rejected the query with status 404"
        );
    }
}
