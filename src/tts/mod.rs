//! Speech synthesis client.

pub mod openai;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TtsError {
    #[error("Synthesis request failed: {0}")]
    Request(String),

    #[error("API error{}: {message}", status_code.map(|c| format!(" (HTTP {})", c)).unwrap_or_default())]
    Api {
        message: String,
        status_code: Option<u16>,
    },
}

pub type Result<T> = std::result::Result<T, TtsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display_with_status() {
        let err = TtsError::Api {
            message: "bad request".to_string(),
            status_code: Some(400),
        };
        assert_eq!(err.to_string(), "API error (HTTP 400): bad request");
    }

    #[test]
    fn test_api_error_display_without_status() {
        let err = TtsError::Api {
            message: "timed out".to_string(),
            status_code: None,
        };
        assert_eq!(err.to_string(), "API error: timed out");
    }
}
