use thiserror::Error;

#[derive(Error, Debug)]
pub enum LagmonError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Cluster metadata unavailable: {0}")]
    MetadataUnavailable(String),

    #[error("Offset source unavailable: {0}")]
    OffsetSourceUnavailable(String),

    #[error("Notification failure: {0}")]
    NotificationFailure(String),

    #[error("Persistence failure: {0}")]
    PersistenceFailure(String),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LagmonError>;
