//! Structured error types for the Folio invoice engine.
//!
//! Asset failures, malformed orders and the pagination self-check are kept as
//! separate variants so callers can tell "retry later" apart from "fix the
//! order data".

use std::path::PathBuf;

use thiserror::Error;

/// The unified error type returned by all public Folio API functions.
#[derive(Debug, Error)]
pub enum FolioError {
    /// The logo image or the localized font could not be retrieved.
    #[error("Failed to fetch {asset}: {reason}")]
    AssetFetch { asset: String, reason: String },

    /// A field the active data policy requires is absent from the order.
    #[error("Malformed order data: missing {field}")]
    MalformedOrder { field: String },

    /// The pagination plan skipped or duplicated line items.
    #[error("Pagination overflow: {0}")]
    PaginationOverflow(String),

    /// A font could not be parsed or embedded.
    #[error("Font error: {0}")]
    Font(String),

    /// An image could not be decoded.
    #[error("Image error: {0}")]
    Image(String),

    /// JSON input (order, Saleor payload or configuration) failed to parse.
    #[error("Failed to parse input: {source}{}", format_hint(.hint))]
    Parse {
        #[source]
        source: serde_json::Error,
        hint: String,
    },

    /// The configuration is inconsistent.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn format_hint(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {}", hint)
    }
}

impl FolioError {
    pub fn missing(field: impl Into<String>) -> Self {
        FolioError::MalformedOrder {
            field: field.into(),
        }
    }

    /// Whether the failure came from a remote or local asset lookup.
    pub fn is_asset_failure(&self) -> bool {
        matches!(self, FolioError::AssetFetch { .. })
    }
}

impl From<serde_json::Error> for FolioError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but doesn't match the expected schema. Check field names and types.".to_string()
            }
            serde_json::error::Category::Eof => {
                "Unexpected end of input, is the JSON truncated?".to_string()
            }
            serde_json::error::Category::Io => String::new(),
        };
        FolioError::Parse { source: e, hint }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_carries_hint() {
        let err: FolioError = serde_json::from_str::<serde_json::Value>("{\"a\": }")
            .unwrap_err()
            .into();
        let message = err.to_string();
        assert!(message.starts_with("Failed to parse input"));
        assert!(message.contains("Hint: Check for trailing commas"));
    }

    #[test]
    fn test_missing_field_message() {
        let err = FolioError::missing("totals");
        assert_eq!(err.to_string(), "Malformed order data: missing totals");
        assert!(!err.is_asset_failure());
    }
}
