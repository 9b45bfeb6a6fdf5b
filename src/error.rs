//! Error types for the storefront search service.
//!
//! Provides structured error handling with:
//! - Machine-readable error codes (`ErrorCode`)
//! - Category-based exit codes (2=db, 3=not_found, 4=validation, etc.)
//! - Retryability flags for callers deciding whether to try again
//! - Context-aware recovery hints
//! - Structured JSON output for piped / non-TTY consumers

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for search operations.
pub type Result<T> = std::result::Result<T, Error>;

// ── Error Code ────────────────────────────────────────────────

/// Machine-readable error codes grouped by category.
///
/// Each code maps to a SCREAMING_SNAKE string and a category-based
/// exit code. Scripts match on the string or on the exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Database (exit 2)
    NotInitialized,
    AlreadyInitialized,
    DatabaseError,

    // Not Found (exit 3)
    ProductNotFound,

    // Validation (exit 4)
    InvalidArgument,
    DimensionMismatch,

    // Sync (exit 6)
    SyncError,

    // Config (exit 7)
    ConfigError,

    // I/O (exit 8)
    IoError,
    JsonError,

    // Embedding (exit 9)
    EmbeddingError,
    EmbeddingTimeout,

    // Internal (exit 1)
    InternalError,
}

impl ErrorCode {
    /// Machine-readable SCREAMING_SNAKE code string.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::NotInitialized => "NOT_INITIALIZED",
            Self::AlreadyInitialized => "ALREADY_INITIALIZED",
            Self::DatabaseError => "DATABASE_ERROR",
            Self::ProductNotFound => "PRODUCT_NOT_FOUND",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::DimensionMismatch => "DIMENSION_MISMATCH",
            Self::SyncError => "SYNC_ERROR",
            Self::ConfigError => "CONFIG_ERROR",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::EmbeddingError => "EMBEDDING_ERROR",
            Self::EmbeddingTimeout => "EMBEDDING_TIMEOUT",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Category-based exit code (1-9).
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::InternalError => 1,
            Self::NotInitialized | Self::AlreadyInitialized | Self::DatabaseError => 2,
            Self::ProductNotFound => 3,
            Self::InvalidArgument | Self::DimensionMismatch => 4,
            Self::SyncError => 6,
            Self::ConfigError => 7,
            Self::IoError | Self::JsonError => 8,
            Self::EmbeddingError | Self::EmbeddingTimeout => 9,
        }
    }

    /// Whether the caller may reasonably retry.
    ///
    /// True for transient backend conditions (busy database, provider
    /// timeouts and rate limits) and for input the caller can correct.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::InvalidArgument
                | Self::DatabaseError
                | Self::EmbeddingError
                | Self::EmbeddingTimeout
        )
    }
}

// ── Error Enum ────────────────────────────────────────────────

/// Errors that can occur in search, import and provider operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Not initialized: run `sfs init` first")]
    NotInitialized,

    #[error("Already initialized at {path}")]
    AlreadyInitialized { path: PathBuf },

    #[error("Product not found: {id}")]
    ProductNotFound { id: String },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Embedding provider timed out after {timeout_ms}ms")]
    EmbeddingTimeout { timeout_ms: u64 },

    #[error("Sync error: {0}")]
    Sync(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Map this error to its structured `ErrorCode`.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::NotInitialized => ErrorCode::NotInitialized,
            Self::AlreadyInitialized { .. } => ErrorCode::AlreadyInitialized,
            Self::Database(_) => ErrorCode::DatabaseError,
            Self::ProductNotFound { .. } => ErrorCode::ProductNotFound,
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::DimensionMismatch { .. } => ErrorCode::DimensionMismatch,
            Self::Config(_) => ErrorCode::ConfigError,
            Self::Embedding(_) => ErrorCode::EmbeddingError,
            Self::EmbeddingTimeout { .. } => ErrorCode::EmbeddingTimeout,
            Self::Sync(_) => ErrorCode::SyncError,
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::JsonError,
            Self::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Category-based exit code, delegating to the `ErrorCode`.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.error_code().exit_code()
    }

    /// Context-aware recovery hint.
    ///
    /// Returns `None` if no actionable suggestion exists.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::NotInitialized => Some("Run `sfs init` to create the catalog database".to_string()),

            Self::AlreadyInitialized { path } => Some(format!(
                "Database already exists at {}. Use `--force` to reinitialize.",
                path.display()
            )),

            Self::ProductNotFound { id } => Some(format!(
                "No product with ID '{id}'. Use `sfs catalog import` to load products."
            )),

            Self::InvalidArgument(msg) => {
                if msg.contains("sort") {
                    Some(
                        "Sort format is <field>.<direction>. Fields: createdAt, title, price, \
                         rating, stock, similarity. Directions: asc, desc"
                            .to_string(),
                    )
                } else if msg.contains("rating") {
                    Some("Rating must be between 0 and 5".to_string())
                } else if msg.contains("status") {
                    Some(
                        "Valid statuses: active, draft, archived. \
                         Synonyms: published→active, live→active, hidden→draft"
                            .to_string(),
                    )
                } else {
                    None
                }
            }

            Self::DimensionMismatch { .. } => Some(
                "The embedding model changed. Run `sfs catalog embed --force` to re-embed the catalog."
                    .to_string(),
            ),

            Self::Embedding(_) | Self::EmbeddingTimeout { .. } => Some(
                "Check provider connectivity with `sfs embeddings status`".to_string(),
            ),

            Self::Database(_) | Self::Io(_) | Self::Json(_) | Self::Config(_) | Self::Sync(_)
            | Self::Other(_) => None,
        }
    }

    /// Structured JSON representation for machine consumption.
    ///
    /// Includes error code, message, retryability, exit code, and
    /// optional recovery hint.
    #[must_use]
    pub fn to_structured_json(&self) -> serde_json::Value {
        let code = self.error_code();
        let mut obj = serde_json::json!({
            "error": {
                "code": code.as_str(),
                "message": self.to_string(),
                "retryable": code.is_retryable(),
                "exit_code": code.exit_code(),
            }
        });

        if let Some(hint) = self.hint() {
            obj["error"]["hint"] = serde_json::Value::String(hint);
        }

        obj
    }
}

impl From<crate::sync::SyncError> for Error {
    fn from(err: crate::sync::SyncError) -> Self {
        Self::Sync(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_by_category() {
        assert_eq!(Error::NotInitialized.exit_code(), 2);
        assert_eq!(Error::ProductNotFound { id: "p1".into() }.exit_code(), 3);
        assert_eq!(Error::InvalidArgument("page".into()).exit_code(), 4);
        assert_eq!(Error::Embedding("boom".into()).exit_code(), 9);
        assert_eq!(Error::EmbeddingTimeout { timeout_ms: 10 }.exit_code(), 9);
        assert_eq!(Error::Other("x".into()).exit_code(), 1);
    }

    #[test]
    fn test_structured_json_includes_hint() {
        let err = Error::InvalidArgument("invalid sort 'nope'".into());
        let json = err.to_structured_json();
        assert_eq!(json["error"]["code"], "INVALID_ARGUMENT");
        assert_eq!(json["error"]["retryable"], true);
        assert!(json["error"]["hint"].as_str().unwrap().contains("createdAt"));
    }

    #[test]
    fn test_structured_json_without_hint() {
        let json = Error::Other("internal".into()).to_structured_json();
        assert!(json["error"].get("hint").is_none());
        assert_eq!(json["error"]["retryable"], false);
    }
}
