//! The module contains the error the engine can throw.
//!
//! Every rule violation is a variant carrying the user facing message, the
//! caller decides how to surface it. The variants are:
//!
//! - [`Unauthorized`] the caller has no valid identity.
//! - [`PermissionDenied`] the caller is known but lacks the required role or
//!   membership.
//! - [`NotFound`] a referenced group, account, payment or user is missing.
//! - [`ValidationFailed`] a field is missing or out of range.
//! - [`AlreadyExists`] duplicate membership or email.
//! - [`CapacityExceeded`] the group is full.
//! - [`LimitExceeded`] the per-user creation quota is used up.
//! - [`InvalidTransition`] a status change the state machine forbids.
//!
//!  [`Unauthorized`]: EngineError::Unauthorized
//!  [`PermissionDenied`]: EngineError::PermissionDenied
//!  [`NotFound`]: EngineError::NotFound
//!  [`ValidationFailed`]: EngineError::ValidationFailed
//!  [`AlreadyExists`]: EngineError::AlreadyExists
//!  [`CapacityExceeded`]: EngineError::CapacityExceeded
//!  [`LimitExceeded`]: EngineError::LimitExceeded
//!  [`InvalidTransition`]: EngineError::InvalidTransition
//!
//! [`Database`] and [`Internal`] are not rule violations; callers should log
//! them and show a generic failure.
//!
//!  [`Database`]: EngineError::Database
//!  [`Internal`]: EngineError::Internal
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    ValidationFailed(String),
    #[error("{0}")]
    AlreadyExists(String),
    #[error("{0}")]
    CapacityExceeded(String),
    #[error("{0}")]
    LimitExceeded(String),
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
    #[error("Internal error: {0}")]
    Internal(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Unauthorized(a), Self::Unauthorized(b)) => a == b,
            (Self::PermissionDenied(a), Self::PermissionDenied(b)) => a == b,
            (Self::NotFound(a), Self::NotFound(b)) => a == b,
            (Self::ValidationFailed(a), Self::ValidationFailed(b)) => a == b,
            (Self::AlreadyExists(a), Self::AlreadyExists(b)) => a == b,
            (Self::CapacityExceeded(a), Self::CapacityExceeded(b)) => a == b,
            (Self::LimitExceeded(a), Self::LimitExceeded(b)) => a == b,
            (Self::InvalidTransition(a), Self::InvalidTransition(b)) => a == b,
            (Self::Internal(a), Self::Internal(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_violations_display_the_bare_message() {
        assert_eq!(
            EngineError::CapacityExceeded("Group is full".to_string()).to_string(),
            "Group is full"
        );
        assert_eq!(
            EngineError::AlreadyExists("Already a member".to_string()).to_string(),
            "Already a member"
        );
    }

    #[test]
    fn database_errors_compare_by_message() {
        let a = EngineError::Database(DbErr::Custom("boom".to_string()));
        let b = EngineError::Database(DbErr::Custom("boom".to_string()));
        assert_eq!(a, b);
        assert_ne!(a, EngineError::NotFound("boom".to_string()));
    }
}
