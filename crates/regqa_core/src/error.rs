use serde::{Deserialize, Serialize};
use std::fmt;

/// Error codes shared by every crate in the workspace.
///
/// The prefix determines the [`ErrorCategory`]: `CONFIG_*` is fatal, `REMOTE_*` is
/// retryable by the caller, `INPUT_*` is a bad request, everything else is a local
/// storage/data failure.
pub mod codes {
    pub const CONFIG_INVALID: &str = "CONFIG_INVALID";
    pub const CONFIG_INVALID_CHUNKING: &str = "CONFIG_INVALID_CHUNKING";
    pub const CONFIG_MISSING_CREDENTIAL: &str = "CONFIG_MISSING_CREDENTIAL";
    pub const CONFIG_MISSING_ARTIFACT: &str = "CONFIG_MISSING_ARTIFACT";
    pub const CONFIG_INDEX_DESYNC: &str = "CONFIG_INDEX_DESYNC";
    pub const CONFIG_DIMENSION_MISMATCH: &str = "CONFIG_DIMENSION_MISMATCH";
    pub const CONFIG_REMOTE_NOT_ALLOWED: &str = "CONFIG_REMOTE_NOT_ALLOWED";

    pub const REMOTE_UNAVAILABLE: &str = "REMOTE_UNAVAILABLE";
    pub const REMOTE_BAD_RESPONSE: &str = "REMOTE_BAD_RESPONSE";

    pub const IO_FAILED: &str = "IO_FAILED";
    pub const DATA_DECODE_FAILED: &str = "DATA_DECODE_FAILED";
    pub const DATA_ENCODE_FAILED: &str = "DATA_ENCODE_FAILED";
    pub const DATA_INVALID_PAGE: &str = "DATA_INVALID_PAGE";
    pub const DATA_DUPLICATE_CHUNK: &str = "DATA_DUPLICATE_CHUNK";
    pub const DATA_NON_FINITE_VECTOR: &str = "DATA_NON_FINITE_VECTOR";

    pub const INPUT_EMPTY_QUERY: &str = "INPUT_EMPTY_QUERY";
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Fatal; the operation aborts before partial work is committed.
    Configuration,
    /// The embedding or generation backend failed or timed out.
    RemoteUnavailable,
    Input,
    Storage,
}

/// Single structured error shape used across the build and query layers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppError {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
    pub retryable: bool,
}

impl AppError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            retryable: false,
        }
    }

    /// Transport failure or timeout talking to an external model.
    pub fn remote(message: impl Into<String>) -> Self {
        Self::new(codes::REMOTE_UNAVAILABLE, message).with_retryable(true)
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }

    pub fn category(&self) -> ErrorCategory {
        if self.code.starts_with("CONFIG_") {
            ErrorCategory::Configuration
        } else if self.code.starts_with("REMOTE_") {
            ErrorCategory::RemoteUnavailable
        } else if self.code.starts_with("INPUT_") {
            ErrorCategory::Input
        } else {
            ErrorCategory::Storage
        }
    }

    pub fn is_configuration(&self) -> bool {
        self.category() == ErrorCategory::Configuration
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(d) = self.details.as_deref() {
            write!(f, " ({d})")?;
        }
        Ok(())
    }
}

impl std::error::Error for AppError {}
