pub mod config;
pub mod corpus;
pub mod domain;
pub mod error;
pub mod io;
pub mod telemetry;

use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use error::{codes, AppError};

pub fn now_rfc3339_utc() -> Result<String, AppError> {
    OffsetDateTime::now_utc().format(&Rfc3339).map_err(|e| {
        AppError::new(codes::DATA_ENCODE_FAILED, "Failed to format timestamp")
            .with_details(e.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::error::{codes, AppError, ErrorCategory};

    #[test]
    fn app_error_is_structured() {
        let err = AppError::new("IO_TEST", "io failed").with_retryable(false);
        assert_eq!(err.code, "IO_TEST");
        assert_eq!(err.message, "io failed");
        assert_eq!(err.retryable, false);
        assert_eq!(err.category(), ErrorCategory::Storage);
    }

    #[test]
    fn categories_follow_code_prefix() {
        assert_eq!(
            AppError::new(codes::CONFIG_MISSING_ARTIFACT, "x").category(),
            ErrorCategory::Configuration
        );
        let remote = AppError::remote("timed out");
        assert_eq!(remote.category(), ErrorCategory::RemoteUnavailable);
        assert!(remote.retryable);
    }

    #[test]
    fn display_includes_details() {
        let err = AppError::new("X", "boom").with_details("path=/tmp/a");
        assert_eq!(err.to_string(), "[X] boom (path=/tmp/a)");
    }

    #[test]
    fn timestamp_is_rfc3339() {
        let ts = super::now_rfc3339_utc().unwrap();
        assert!(ts.contains('T'));
    }
}
