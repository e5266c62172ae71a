use thiserror::Error;
use uuid::Uuid;

/// Central error type for everything outside the stage taxonomy
///
/// Stage failures are reported through the closed per-stage enums in
/// [`crate::pipeline::errors`]; this type covers session input, configuration,
/// builders and checkpoint storage.
#[derive(Error, Debug)]
pub enum PackingError {
    // ============================================================================
    // Session Errors
    // ============================================================================
    #[error("Invalid packing session: {0}")]
    InvalidSession(String),

    #[error("Invalid checkpoint: {0}")]
    InvalidCheckpoint(String),

    // ============================================================================
    // Checkpoint Storage Errors
    // ============================================================================
    #[error("Checkpoint not found for session {0}")]
    CheckpointNotFound(Uuid),

    #[error("Failed to save checkpoint: {0}")]
    CheckpointSaveFailed(String),

    #[error("Failed to load checkpoint: {0}")]
    CheckpointLoadFailed(String),

    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Builder pattern validation error
    #[error("Builder error: {0}")]
    BuilderError(String),

    // ============================================================================
    // Generic/System Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// Helper type alias for Results
pub type PackingResult<T> = Result<T, PackingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PackingError::InvalidSession("order id is empty".to_string());
        assert_eq!(err.to_string(), "Invalid packing session: order id is empty");
    }

    #[test]
    fn test_checkpoint_not_found_mentions_session() {
        let id = Uuid::new_v4();
        let err = PackingError::CheckpointNotFound(id);
        assert!(err.to_string().contains(&id.to_string()));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: PackingError = io_err.into();
        assert!(matches!(err, PackingError::Io(_)));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: PackingError = json_err.into();
        assert!(matches!(err, PackingError::Json(_)));
    }
}
