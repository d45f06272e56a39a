use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Invalid value for {field}: {message}")]
    InvalidInput {
        field: &'static str,
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, StoreError>;
