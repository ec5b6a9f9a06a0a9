use sea_orm::{DbErr, SqlErr};

/// Names used in `StoreError::NotFound` and mapped back by the service layer.
pub mod entity {
    pub const USER: &str = "user";
    pub const POST: &str = "post";
    pub const COMMENT: &str = "comment";
    pub const LIKE: &str = "like";
    pub const FOLLOW: &str = "follow";
    pub const STORY: &str = "story";
    pub const MESSAGE: &str = "message";
    pub const NOTIFICATION: &str = "notification";
    pub const HASHTAG: &str = "hashtag";
}

/// Domain rules rejected inside a write transaction.
pub mod invariant {
    pub const COMMENT_PARENT: &str = "comment_parent";
    pub const STORY_EXPIRED: &str = "story_expired";
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Row absent or tombstoned.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Unique, check or foreign-key constraint rejected the write.
    #[error("constraint violated on {field}")]
    ConstraintViolation { field: &'static str },

    #[error("invariant violated: {0}")]
    Invariant(&'static str),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// A named constraint and the two ways backends report it:
/// Postgres quotes the index name, SQLite lists `table.column` pairs.
#[derive(Debug, Clone, Copy)]
pub struct ConstraintKey {
    pub field: &'static str,
    pub index: &'static str,
    pub columns: &'static str,
}

impl StoreError {
    pub fn classify(err: DbErr, keys: &[ConstraintKey]) -> Self {
        let (violation, msg) = match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(m)) => (true, m),
            Some(SqlErr::ForeignKeyConstraintViolation(m)) => (true, m),
            _ => (false, err.to_string()),
        };
        let msg = msg.to_lowercase();

        let violation = violation
            || msg.contains("23505")
            || msg.contains("duplicate key")
            || msg.contains("unique constraint")
            || msg.contains("check constraint")
            || msg.contains("foreign key constraint");

        if !violation {
            return StoreError::DatabaseError(err.to_string());
        }

        let field = keys
            .iter()
            .find(|k| msg.contains(k.index) || msg.contains(k.columns))
            .map(|k| k.field)
            .unwrap_or("unknown");

        StoreError::ConstraintViolation { field }
    }
}

impl From<DbErr> for StoreError {
    fn from(err: DbErr) -> Self {
        StoreError::classify(err, &[])
    }
}
