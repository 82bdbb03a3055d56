use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResurfError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(String),
}

/// Store-level errors for owner-scoped Save operations.
///
/// `NotFound` covers both "no such row" and "owned by someone else" — the two
/// are indistinguishable to the caller by design.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Save not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}
