use thiserror::Error;

pub type Result<T> = std::result::Result<T, PeekError>;

#[derive(Error, Debug)]
pub enum PeekError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Collection '{0}' not found")]
    CollectionNotFound(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub mod backend;
pub mod commands;
pub mod config;
pub mod embeddings;
pub mod peek;
pub mod table;
