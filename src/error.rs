//! Error type shared by the pipeline stages.
//!
//! Most of these never escape a run: per-site and per-container failures are
//! logged where they happen and degrade to empty results. Only an unusable
//! output directory reaches the scheduler.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TenderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid selector `{selector}`: {message}")]
    Selector { selector: String, message: String },

    #[error("Cannot resolve link `{href}` against `{base}`: {source}")]
    Link {
        href: String,
        base: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Notification delivery failed: {0}")]
    Delivery(String),
}

pub type Result<T> = std::result::Result<T, TenderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: TenderError = io_err.into();
        assert!(matches!(err, TenderError::Io(_)));
    }

    #[test]
    fn test_selector_error_message() {
        let err = TenderError::Selector {
            selector: "..bad".to_string(),
            message: "unexpected token".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid selector `..bad`: unexpected token");
    }

    #[test]
    fn test_link_error_message() {
        let err = TenderError::Link {
            href: "/a.pdf".to_string(),
            base: "not a url".to_string(),
            source: url::ParseError::RelativeUrlWithoutBase,
        };
        assert!(err.to_string().starts_with("Cannot resolve link `/a.pdf` against `not a url`"));
    }
}
