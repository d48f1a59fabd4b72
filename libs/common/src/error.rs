//! Request-level error taxonomy shared by the platform services
//!
//! Every service maps these kinds onto its own transport boundary; none of
//! them is allowed to crash the process.

use thiserror::Error;

/// Failure kinds a request can surface to its caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlatformError {
    /// Email or username already taken, or a role already assigned
    #[error("Duplicate value: {0}")]
    DuplicateValue(String),

    /// Failed login. Constant shape so callers cannot probe whether the
    /// account exists or the password was wrong
    #[error("Invalid username/email or password")]
    InvalidCredentials,

    /// Login attempted before the email address was confirmed
    #[error("Email address is not confirmed")]
    EmailNotConfirmed,

    /// Target record missing or soft-deleted
    #[error("{0} not found")]
    NotFound(String),

    /// Bad, expired, or replayed token material (refresh token, one-time
    /// code, or backing token)
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// Role-hierarchy denial; carries the evaluator's reason
    #[error("Forbidden: {0}")]
    ForbiddenAccess(String),

    /// Malformed or rejected input field
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Optimistic-concurrency failure: the record changed under the writer
    #[error("Record was modified concurrently")]
    Conflict,

    /// Unclassified storage failure, fatal to the request only
    #[error("Storage error: {0}")]
    Storage(String),

    /// Any other internal failure; details stay out of caller responses
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PlatformError {
    /// Stable tag for logs and transport status mapping.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DuplicateValue(_) => "duplicate_value",
            Self::InvalidCredentials => "invalid_credentials",
            Self::EmailNotConfirmed => "email_not_confirmed",
            Self::NotFound(_) => "not_found",
            Self::InvalidToken(_) => "invalid_token",
            Self::ForbiddenAccess(_) => "forbidden_access",
            Self::InvalidInput(_) => "invalid_input",
            Self::Conflict => "conflict",
            Self::Storage(_) => "storage",
            Self::Internal(_) => "internal",
        }
    }
}

/// Type alias for Result with PlatformError
pub type PlatformResult<T> = Result<T, PlatformError>;
