//! Error types for the ProductCompare core library.
//!
//! Uses `thiserror` for public API error types with structured variants
//! covering the catalog, persisted stores, sessions, export, and configuration.
//! Spec extraction failures are not errors: the normalizer reports them as
//! `None` and the rank engine degrades the row to neutral.

use std::path::PathBuf;

/// Top-level error type for the ProductCompare core library.
#[derive(Debug, thiserror::Error)]
pub enum CompareError {
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors from product records, catalog loading, and admin product creation.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Product not found: {id}")]
    ProductNotFound { id: String },

    #[error("Duplicate product id: {id}")]
    DuplicateProduct { id: String },

    #[error("Invalid product '{id}': {reason}")]
    InvalidProduct { id: String, reason: String },

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid price: {value}")]
    InvalidPrice { value: String },

    #[error("Comparison holds at most {max} products, got {actual}")]
    TooManyProducts { max: usize, actual: usize },
}

/// Errors from the key-value storage backends.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Failed to read key '{key}': {message}")]
    ReadFailed { key: String, message: String },

    #[error("Failed to write key '{key}': {message}")]
    WriteFailed { key: String, message: String },

    #[error("Invalid storage key: {key}")]
    InvalidKey { key: String },

    #[error("Store lock poisoned")]
    Poisoned,

    #[error("Invalid comment: {reason}")]
    InvalidComment { reason: String },
}

/// Errors from the mock session service and user repositories.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("User not found: {email}")]
    UserNotFound { email: String },

    #[error("Invalid password")]
    InvalidPassword,

    #[error("User already exists: {email}")]
    UserExists { email: String },

    #[error("Not signed in")]
    NotAuthenticated,

    #[error("Admin role required")]
    AdminRequired,

    #[error("User repository error: {message}")]
    Repository { message: String },
}

/// Errors from the export adapter and its delivery sink.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Unsupported export format: {format}")]
    UnsupportedFormat { format: String },

    #[error("Failed to encode export: {message}")]
    Encode { message: String },

    #[error("Failed to deliver {file_name}: {message}")]
    Delivery { file_name: String, message: String },
}

/// Errors from the configuration system.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Configuration parse error: {message}")]
    ParseError { message: String },
}

/// A type alias for results using the top-level `CompareError`.
pub type Result<T> = std::result::Result<T, CompareError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_catalog() {
        let err = CompareError::Catalog(CatalogError::ProductNotFound {
            id: "p-42".into(),
        });
        assert_eq!(err.to_string(), "Catalog error: Product not found: p-42");
    }

    #[test]
    fn test_error_display_too_many_products() {
        let err = CatalogError::TooManyProducts { max: 4, actual: 6 };
        assert_eq!(
            err.to_string(),
            "Comparison holds at most 4 products, got 6"
        );
    }

    #[test]
    fn test_error_display_session() {
        let err = CompareError::Session(SessionError::UserExists {
            email: "buyer@example.com".into(),
        });
        assert_eq!(
            err.to_string(),
            "Session error: User already exists: buyer@example.com"
        );
    }

    #[test]
    fn test_error_display_export() {
        let err = ExportError::Delivery {
            file_name: "comparison-2024-05-01.csv".into(),
            message: "disk full".into(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to deliver comparison-2024-05-01.csv: disk full"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: CompareError = io_err.into();
        assert!(matches!(err, CompareError::Io(_)));
    }

    #[test]
    fn test_error_from_serde() {
        let serde_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: CompareError = serde_err.into();
        assert!(matches!(err, CompareError::Serialization(_)));
    }
}
