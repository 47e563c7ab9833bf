//! # AppError
//!
//! Centralized error handling for kkojil. Storage failures never surface
//! here; the store logs them and degrades. What remains are failures the
//! caller has to act on.

use std::fmt;

use thiserror::Error;

/// The primary error type for all kj-core operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (e.g., Question, User)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Validation failure (e.g., empty title, password mismatch)
    #[error("validation error: {0}")]
    ValidationError(String),

    /// No session, or wrong credentials
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Infrastructure failure (e.g., the question generator gave up)
    #[error("internal service error: {0}")]
    Internal(String),

    /// Registration collided with an existing account
    #[error("conflict: {0} is already registered")]
    Conflict(DuplicateField),
}

/// The unique user field a registration collided on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateField {
    Email,
    Username,
}

impl fmt::Display for DuplicateField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DuplicateField::Email => "email",
            DuplicateField::Username => "username",
        })
    }
}

/// A specialized Result type for kkojil logic.
pub type Result<T> = std::result::Result<T, AppError>;
