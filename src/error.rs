//! Defines the application's primary error type `AppError` and a convenience `Result` alias.
//!
//! Database failures are classified when they are converted from `sqlx::Error`, so callers
//! can tell a lost connection apart from a rejected write without inspecting message text.
//! Errors that do not implement `Clone` are wrapped in `Arc` to allow `AppError` to be cloneable.

use std::sync::Arc;
use thiserror::Error;

/// SQLSTATE class for integrity constraint violations (unique, foreign key, not-null, check).
const INTEGRITY_CONSTRAINT_CLASS: &str = "23";

/// The primary error enumeration for all application-specific errors.
#[derive(Error, Debug, Clone)]
pub enum AppError {
    /// The pool could not reach the database (I/O, TLS, timeout, closed pool, bad URL).
    #[error("Connection Failure: {0}")]
    ConnectionFailure(Arc<sqlx::Error>),

    /// The database rejected a write because it breaks a table constraint.
    #[error("Constraint Violation{}: {message}", constraint_suffix(.constraint))]
    ConstraintViolation {
        constraint: Option<String>,
        message: String,
    },

    /// A record the caller asked for does not exist.
    #[error("Not Found: {0}")]
    NotFound(String),

    /// Input was rejected before any SQL was sent.
    #[error("Malformed Input: {0}")]
    MalformedInput(String),

    /// Any other error originating from database operations (`sqlx`).
    #[error("Database Error: {0}")]
    Db(Arc<sqlx::Error>),

    /// Error during JSON parsing (`serde_json`).
    #[error("JSON Parsing Error: {0}")]
    JsonParse(Arc<serde_json::Error>),

    /// Error related to accessing environment variables.
    #[error("Environment Error: {0}")]
    Env(#[from] std::env::VarError),

    /// Error related to standard I/O operations.
    #[error("I/O Error: {0}")]
    Io(Arc<std::io::Error>),

    /// Error specific to CLI logic, argument handling or configuration values.
    #[error("CLI Error: {0}")]
    Cli(String),

    /// Error originating from user interaction prompts (`dialoguer`).
    #[error("Dialoguer Error: {0}")]
    Dialoguer(Arc<dialoguer::Error>),

    /// Error related to progress bar style templating (`indicatif`).
    #[error("Progress Style Template Error: {0}")]
    Template(Arc<indicatif::style::TemplateError>),
}

/// A specialized `Result` type using the application's `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

fn constraint_suffix(constraint: &Option<String>) -> String {
    constraint
        .as_deref()
        .map(|name| format!(" ({name})"))
        .unwrap_or_default()
}

/// Returns true when a SQLSTATE code belongs to the integrity constraint class.
fn is_constraint_code(code: &str) -> bool {
    code.starts_with(INTEGRITY_CONSTRAINT_CLASS)
}

/// Returns true for errors raised while acquiring or talking to a connection.
fn is_connection_error(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Configuration(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
    )
}

// --- From implementations ---

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().map_or(false, |code| is_constraint_code(&code)) {
                return AppError::ConstraintViolation {
                    constraint: db_err.constraint().map(str::to_owned),
                    message: db_err.message().to_owned(),
                };
            }
        }

        if is_connection_error(&err) {
            AppError::ConnectionFailure(Arc::new(err))
        } else {
            AppError::Db(Arc::new(err))
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(Arc::new(err))
    }
}

impl From<dialoguer::Error> for AppError {
    fn from(err: dialoguer::Error) -> Self {
        AppError::Dialoguer(Arc::new(err))
    }
}

impl From<indicatif::style::TemplateError> for AppError {
    fn from(err: indicatif::style::TemplateError) -> Self {
        AppError::Template(Arc::new(err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::JsonParse(Arc::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constraint_codes() {
        assert!(is_constraint_code("23505")); // unique_violation
        assert!(is_constraint_code("23503")); // foreign_key_violation
        assert!(is_constraint_code("23502")); // not_null_violation
        assert!(!is_constraint_code("42P01")); // undefined_table
        assert!(!is_constraint_code("08006")); // connection_failure
    }

    #[test]
    fn test_pool_errors_are_connection_failures() {
        assert!(matches!(
            AppError::from(sqlx::Error::PoolTimedOut),
            AppError::ConnectionFailure(_)
        ));
        assert!(matches!(
            AppError::from(sqlx::Error::PoolClosed),
            AppError::ConnectionFailure(_)
        ));
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        assert!(matches!(
            AppError::from(sqlx::Error::Io(io)),
            AppError::ConnectionFailure(_)
        ));
    }

    #[test]
    fn test_other_sqlx_errors_stay_generic() {
        assert!(matches!(
            AppError::from(sqlx::Error::RowNotFound),
            AppError::Db(_)
        ));
        assert!(matches!(
            AppError::from(sqlx::Error::ColumnNotFound("average_rating".into())),
            AppError::Db(_)
        ));
    }

    #[test]
    fn test_constraint_violation_display() {
        let err = AppError::ConstraintViolation {
            constraint: Some("users_email_key".to_string()),
            message: "duplicate key value violates unique constraint".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Constraint Violation (users_email_key): duplicate key value violates unique constraint"
        );

        let bare = AppError::ConstraintViolation {
            constraint: None,
            message: "null value".to_string(),
        };
        assert_eq!(bare.to_string(), "Constraint Violation: null value");
    }
}
