//! Error types for the palm-bridge frontend

use thiserror::Error;

/// Main error type for the bridge
///
/// Failures originating inside the engine are absorbed and logged at the
/// bridge boundary; only I/O failures during user-initiated operations
/// (save, install) and a native crash are ever surfaced. Calling into an
/// inactive session is a logged no-op, not an error.
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Install failed for {path}: code {code}")]
    Install { path: String, code: i32 },

    #[error("Audio error: {0}")]
    Audio(String),

    #[error("Operation cancelled")]
    Cancelled,
}

/// Result type alias for bridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BridgeError::Install {
            path: "apps/memo.prc".into(),
            code: -2,
        };
        assert_eq!(format!("{}", err), "Install failed for apps/memo.prc: code -2");

        let err = BridgeError::Config("missing base dir".into());
        assert_eq!(format!("{}", err), "Config error: missing base dir");
    }

    #[test]
    fn test_io_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: BridgeError = io_err.into();
        assert!(matches!(err, BridgeError::Io(_)));
    }
}
