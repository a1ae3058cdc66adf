use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Storage failures, worded for the person at the terminal.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Another instance of the application has locked the database
    #[error("Another instance of explorer appears to be running. Please close it and try again.")]
    InstanceLocked,

    /// Migration failed
    #[error("Database migration failed: {0}")]
    Migration(String),

    /// Generic database error
    #[error("Database error: {0}")]
    Other(#[from] sqlx::Error),
}

/// Primary SQLite result codes that mean another process holds the file.
const SQLITE_BUSY: i64 = 5;
const SQLITE_LOCKED: i64 = 6;
const SQLITE_CANTOPEN: i64 = 14;

impl DatabaseError {
    /// Classify a sqlx error. Lock and open failures become `InstanceLocked`.
    pub(crate) fn from_sqlx(err: sqlx::Error) -> Self {
        let locked = match &err {
            sqlx::Error::Database(db) => db
                .code()
                .and_then(|code| code.parse::<i64>().ok())
                // Extended codes carry the primary code in the low byte
                .is_some_and(|code| {
                    matches!(code & 0xff, SQLITE_BUSY | SQLITE_LOCKED | SQLITE_CANTOPEN)
                }),
            other => other.to_string().contains("database is locked"),
        };
        if locked {
            DatabaseError::InstanceLocked
        } else {
            DatabaseError::Other(err)
        }
    }
}

// ============================================================================
// Storage Keys
// ============================================================================

/// Key holding the JSON array of favorite character IDs.
pub const FAVORITES_KEY: &str = "favoriteCharacters";

/// Key holding the dark mode flag (`"true"` / `"false"`).
pub const DARK_MODE_KEY: &str = "darkMode";
