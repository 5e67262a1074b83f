//! Error taxonomy shared across the workflows and the REST boundary.
//!
//! Validation and authorization failures stop before any store call; remote
//! failures carry the underlying cause. A missing document is not an error
//! in itself (lookups return `Option`), `NotFound` is for operations that
//! were asked to act on a record that is not there.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("authentication required")]
    Unauthenticated,

    #[error("admin role required")]
    Unauthorized,

    #[error("{0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("store operation failed: {0}")]
    Store(#[from] sled::Error),

    #[error("document codec failure: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("token failure: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("file storage failure: {0}")]
    Files(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;
