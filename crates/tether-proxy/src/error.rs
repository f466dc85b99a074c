//! Error types for accessor calls and configuration loading

/// Result type for accessor and method stub calls
pub type NativeResult<T> = Result<T, NativeError>;

/// Errors raised by operation stubs at call time
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NativeError {
    /// Type mismatch during conversion
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch {
        /// Expected type name
        expected: String,
        /// Actual type name
        got: String,
    },

    /// Invalid argument
    #[error("Argument error: {0}")]
    ArgumentError(String),

    /// No implementation registered for the operation
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// Host function panicked
    #[error("Function panicked: {0}")]
    Panic(String),

    /// Any other failure reported by the host
    #[error("{0}")]
    CallFailed(String),
}

impl From<String> for NativeError {
    fn from(s: String) -> Self {
        NativeError::CallFailed(s)
    }
}

impl From<&str> for NativeError {
    fn from(s: &str) -> Self {
        NativeError::CallFailed(s.to_string())
    }
}

/// Errors raised while loading [`ConfigOptions`](crate::config::ConfigOptions)
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The document is not valid TOML or has unexpected keys
    #[error("Invalid proxy options: {0}")]
    Parse(#[from] toml::de::Error),

    /// The tag key is empty
    #[error("Invalid proxy options: tag_key must not be empty")]
    EmptyTagKey,
}
