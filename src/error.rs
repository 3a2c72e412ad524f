//! Error types for scholarpage.
//!
//! Every failure the pipeline can meet is represented here. Most of them are
//! absorbed before they reach the page: the fetcher turns transport, status and
//! body errors into an empty feed, and missing optional targets are skipped.

use thiserror::Error;

/// Main error type for scholarpage operations.
#[derive(Debug, Error)]
pub enum ScholarPageError {
    /// Network/HTTP transport error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Feed endpoint answered with a non-success status
    #[error("API error: {code} - {message}")]
    Api {
        /// HTTP status code
        code: u16,
        /// Human readable description
        message: String,
    },

    /// Malformed feed body or host page
    #[error("Parse error: {0}")]
    Parse(String),

    /// A required element of the host page is missing
    #[error("Missing page target: #{0}")]
    MissingTarget(String),

    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV export error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias using `ScholarPageError`
pub type Result<T> = std::result::Result<T, ScholarPageError>;

/// Extension trait for adding context to Option types
pub trait OptionExt<T> {
    /// Convert Option to Result with a parse error message
    fn ok_or_parse(self, msg: &str) -> Result<T>;

    /// Convert Option to Result naming the missing page target
    fn ok_or_target(self, id: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_parse(self, msg: &str) -> Result<T> {
        self.ok_or_else(|| ScholarPageError::Parse(msg.to_string()))
    }

    fn ok_or_target(self, id: &str) -> Result<T> {
        self.ok_or_else(|| ScholarPageError::MissingTarget(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_target_message() {
        let err = None::<()>.ok_or_target("pub-list").expect_err("should be missing");
        assert_eq!(err.to_string(), "Missing page target: #pub-list");
    }

    #[test]
    fn test_api_error_message() {
        let err = ScholarPageError::Api {
            code: 404,
            message: "Not Found".to_string(),
        };
        assert_eq!(err.to_string(), "API error: 404 - Not Found");
    }
}
