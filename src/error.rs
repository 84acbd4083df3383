//! Error types for the RLS verification harness.
//!
//! One enum per concern, matching how failures are handled: configuration
//! problems are fatal, fixture problems are non-fatal by default, and
//! identity-claim problems are reported per suite. Statement failures are
//! deliberately not represented here — the executor captures them into
//! `ExecutionOutcome` so the classifier can reconcile them against the
//! declared expectation.

use std::path::PathBuf;

use thiserror::Error;

/// Fatal configuration problems. The process exits non-zero before any
/// suite runs.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("required environment variable {name} is not set")]
    MissingVar { name: &'static str },

    #[error("invalid value '{value}' for {name}")]
    InvalidVar { name: &'static str, value: String },
}

/// Migration or seed SQL failed to apply.
#[derive(Error, Debug)]
pub enum FixtureError {
    #[error("failed to read fixture file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to apply {label}: {message}")]
    Apply { label: String, message: String },
}

/// One of the privileged claim procedures failed.
#[derive(Error, Debug, Clone)]
pub enum IdentityError {
    #[error("failed to set session claims for role {role}: {message}")]
    Set { role: String, message: String },

    #[error("failed to clear session claims: {message}")]
    Clear { message: String },
}

/// A role string outside the closed catalog.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown role '{0}' (expected one of: auditor, clerk, manager, admin, member)")]
pub struct UnknownRoleError(pub String);

/// Result type aliases for convenience
pub type ConfigResult<T> = Result<T, ConfigError>;
pub type FixtureResult<T> = Result<T, FixtureError>;
pub type IdentityResult<T> = Result<T, IdentityError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::MissingVar {
            name: "DATABASE_URL",
        };
        assert_eq!(
            err.to_string(),
            "required environment variable DATABASE_URL is not set"
        );
    }

    #[test]
    fn test_identity_error_carries_role() {
        let err = IdentityError::Set {
            role: "CLERK".to_string(),
            message: "function does not exist".to_string(),
        };
        assert!(err.to_string().contains("CLERK"));
    }
}
