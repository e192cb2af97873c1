//! # Database Error Types
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)        CoreError (validation, plan,        │
//! │       │                            data integrity)                      │
//! │       ▼                                  │                              │
//! │  DbError (this module) ◄─────────────────┘                              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Route handler maps to an HTTP response (external)                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use clinicstock_core::{CoreError, DataIntegrityError, PlanError, ValidationError};
use thiserror::Error;

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found (or not visible to this organization).
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation (duplicate SKU, e-mail, name).
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    ///
    /// ## When This Occurs
    /// - Item references a category or location that doesn't exist
    /// - Deleting a location that still holds items
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Business rule failure raised while handling a request.
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }
}

impl From<ValidationError> for DbError {
    fn from(err: ValidationError) -> Self {
        DbError::Core(err.into())
    }
}

impl From<PlanError> for DbError {
    fn from(err: PlanError) -> Self {
        DbError::Core(err.into())
    }
}

impl From<DataIntegrityError> for DbError {
    fn from(err: DataIntegrityError) -> Self {
        DbError::Core(err.into())
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → Analyze message for constraint type
/// sqlx::Error::ColumnDecode   → DataIntegrityError::Malformed (bad stored value)
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // "UNIQUE constraint failed: <table>.<column>"
                if msg.contains("UNIQUE constraint failed") {
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation {
                        field,
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            // A stored value the column type can't hold, e.g. a
            // hand-edited expiration_date of 'not-a-date'.
            sqlx::Error::ColumnDecode { index, source } => {
                DataIntegrityError::malformed("row", index.trim_matches('"'), source.to_string())
                    .into()
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl DbError {
    /// Names the entity on a decode failure raised while loading `entity` rows.
    pub(crate) fn loading(entity: &'static str) -> impl Fn(sqlx::Error) -> DbError {
        move |err| match DbError::from(err) {
            DbError::Core(CoreError::DataIntegrity(DataIntegrityError::Malformed {
                field,
                reason,
                ..
            })) => DataIntegrityError::malformed(entity, field, reason).into(),
            other => other,
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;
