//! Custom error types for the common library
//!
//! This module defines application-specific error types that can be used
//! throughout the application.

use sqlx::Error as SqlxError;
use thiserror::Error;

/// Custom error type for database operations
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error occurred during database connection
    #[error("Database connection error: {0}")]
    Connection(#[source] SqlxError),

    /// Error occurred during database query execution
    #[error("Database query error: {0}")]
    Query(#[source] SqlxError),

    /// Error occurred during database migration
    #[error("Database migration error: {0}")]
    Migration(String),

    /// Configuration error
    #[error("Database configuration error: {0}")]
    Configuration(String),
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Errors surfaced by the gallery repositories, whatever the backing store
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// A uniqueness constraint was violated (e.g. a duplicate email)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The backing store failed
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<SqlxError> for RepositoryError {
    fn from(err: SqlxError) -> Self {
        match &err {
            SqlxError::Database(db) if db.is_unique_violation() => {
                RepositoryError::Conflict(db.message().to_string())
            }
            _ => RepositoryError::Database(DatabaseError::Query(err)),
        }
    }
}

/// Type alias for Result with RepositoryError
pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_not_found_maps_to_database_error() {
        let err = RepositoryError::from(SqlxError::RowNotFound);
        assert!(matches!(
            err,
            RepositoryError::Database(DatabaseError::Query(SqlxError::RowNotFound))
        ));
    }

    #[test]
    fn test_conflict_message() {
        let err = RepositoryError::Conflict("email already exists".to_string());
        assert_eq!(err.to_string(), "Conflict: email already exists");
    }
}
