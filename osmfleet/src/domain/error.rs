//! Domain error taxonomy.
//!
//! Keep this module free of adapter concerns so the same error shape can be
//! raised by any port implementation. The variants mirror the failure
//! taxonomy in the error-handling design: callers branch on the variant
//! alone to decide retry vs. fatal-abort behaviour.

use thiserror::Error;

use crate::domain::ports::{
    DatabaseAdminError, DatabaseInventoryError, ExtraDataLoaderError, ImporterProcessError,
};

/// Stable machine-readable error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorCode {
    /// Missing or invalid configuration, fatal at startup.
    Configuration,
    /// A transient failure in an external collaborator; safe to retry.
    Transient,
    /// A provisioning step failed; caller should roll status back to INIT.
    Provisioning,
    /// An import or rotate phase failed.
    Import,
    /// An unexpected internal error.
    Internal,
}

/// Domain error raised by components and ports.
///
/// # Examples
/// ```
/// use osmfleet::domain::error::{Error, ErrorCode};
///
/// let err = Error::transient("orchestrator unreachable");
/// assert_eq!(err.code(), ErrorCode::Transient);
/// ```
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct Error {
    code: ErrorCode,
    message: String,
}

impl Error {
    /// Create a new error of the given classification.
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// The error's stable classification.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        self.code
    }

    /// Human-readable message, intended for logs rather than API clients.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Whether this error represents a transient condition safe to retry on
    /// a later cycle.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self.code, ErrorCode::Transient)
    }

    /// Convenience constructor for [`ErrorCode::Configuration`].
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Configuration, message)
    }

    /// Convenience constructor for [`ErrorCode::Transient`].
    #[must_use]
    pub fn transient(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Transient, message)
    }

    /// Convenience constructor for [`ErrorCode::Provisioning`].
    #[must_use]
    pub fn provisioning(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Provisioning, message)
    }

    /// Convenience constructor for [`ErrorCode::Import`].
    #[must_use]
    pub fn import(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Import, message)
    }

    /// Convenience constructor for [`ErrorCode::Internal`].
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, message)
    }
}

// Port errors are classified into the domain taxonomy at the boundary
// where components decide whether a failure is worth retrying. A
// connection-level failure is transient; a rejected write or a malformed
// input is not.

impl From<DatabaseAdminError> for Error {
    fn from(error: DatabaseAdminError) -> Self {
        match &error {
            DatabaseAdminError::Connection { .. } => Self::transient(error.to_string()),
            DatabaseAdminError::Ddl { .. } | DatabaseAdminError::Io { .. } => {
                Self::provisioning(error.to_string())
            }
        }
    }
}

impl From<DatabaseInventoryError> for Error {
    fn from(error: DatabaseInventoryError) -> Self {
        match &error {
            DatabaseInventoryError::Transport { .. } => Self::transient(error.to_string()),
            DatabaseInventoryError::NotFound { .. } => Self::internal(error.to_string()),
        }
    }
}

impl From<ImporterProcessError> for Error {
    fn from(error: ImporterProcessError) -> Self {
        Self::import(error.to_string())
    }
}

impl From<ExtraDataLoaderError> for Error {
    fn from(error: ExtraDataLoaderError) -> Self {
        match &error {
            ExtraDataLoaderError::Io { .. } => Self::transient(error.to_string()),
            ExtraDataLoaderError::Load { .. } => Self::import(error.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_errors_report_transient() {
        let err = Error::transient("timeout");
        assert!(err.is_transient());
        assert_eq!(err.message(), "timeout");
    }

    #[test]
    fn provisioning_errors_are_not_transient() {
        let err = Error::provisioning("duplicate database");
        assert!(!err.is_transient());
        assert_eq!(err.code(), ErrorCode::Provisioning);
    }

    #[test]
    fn connection_failures_classify_as_transient() {
        let err = Error::from(DatabaseAdminError::connection("refused".to_string()));
        assert!(err.is_transient());
    }

    #[test]
    fn ddl_failures_do_not_classify_as_transient() {
        let err = Error::from(DatabaseAdminError::ddl("syntax error".to_string()));
        assert!(!err.is_transient());
        assert_eq!(err.code(), ErrorCode::Provisioning);
    }
}
