use thiserror::Error;

/// Errors that can occur when interacting with the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A stored row could not be turned back into a domain value.
    #[error("Corrupt record in {table}: {reason}")]
    Corrupt { table: &'static str, reason: String },

    /// A write violated a uniqueness or reference constraint.
    #[error("Constraint violation: {0}")]
    Conflict(String),

    /// A write was refused by a configured fault (in-memory store only).
    #[error("Write rejected: {0}")]
    Rejected(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
