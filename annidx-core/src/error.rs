use thiserror::Error;

/// Failure modes surfaced by the index.
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("expected record not found")]
    NotFound,

    #[error("corrupt record: {0}")]
    Corrupt(String),

    #[error("posting store error: {0}")]
    Store(#[from] annidx_store::StoreError),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("operation cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, IndexError>;
