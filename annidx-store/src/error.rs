use thiserror::Error;

/// Failure modes surfaced by the posting-list store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("key not found")]
    NotFound,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;
