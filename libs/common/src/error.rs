//! Error types shared by the services

use sqlx::migrate::MigrateError;
use thiserror::Error;

/// Failure while setting up or preparing the database
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// The pool could not reach PostgreSQL
    #[error("Database connection error: {0}")]
    Connection(#[source] sqlx::Error),

    /// The embedded schema could not be applied
    #[error("Database migration error: {0}")]
    Migration(#[from] MigrateError),

    /// Missing or malformed settings
    #[error("Database configuration error: {0}")]
    Configuration(String),
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;
