use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Series {0} not found")]
    SeriesNotFound(i64),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;

impl StorageError {
    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            StorageError::Database(sqlx::Error::Database(e))
                if e.code().as_deref() == Some("23505")
        )
    }

    /// Rejects ids that can never name a series before any lookup happens.
    pub fn check_series_id(series_id: i64) -> Result<()> {
        if series_id <= 0 {
            return Err(StorageError::InvalidInput(format!(
                "series id must be positive, got {}",
                series_id
            )));
        }
        Ok(())
    }
}
