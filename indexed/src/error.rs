use thiserror::Error;

#[derive(Error, Debug)]
pub enum IndexedError {
    #[error("indexed: {0}")]
    Io(#[from] std::io::Error),

    #[error("indexed: encode record: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    #[error("indexed: decode record: {0}")]
    Decode(#[from] rmp_serde::decode::Error),

    #[error("indexed: invalid format: {0}")]
    InvalidFormat(String),

    #[error("indexed: index {index} out of range ({len} records)")]
    OutOfRange { index: usize, len: usize },
}
