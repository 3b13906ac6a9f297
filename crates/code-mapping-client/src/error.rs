//! Error types for the concept map client.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Concept map client errors
#[derive(Error, Debug)]
pub enum Error {
    #[error("Concept map {name} request failed with status {status}")]
    Status { name: String, status: u16 },

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid client configuration: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_status() {
        let err = Error::Status {
            name: "DiseaseA".to_string(),
            status: 404,
        };
        assert_eq!(
            err.to_string(),
            "Concept map DiseaseA request failed with status 404"
        );
    }
}
