use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("not connected to a database")]
    NotConnected,

    #[error("unsupported connection URI: {0}")]
    UnsupportedUri(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Snapshot error: {0}")]
    Snapshot(String),

    #[error("Decode error: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    #[error("Encode error: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("Serde JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("duplicate key: {field}={value}")]
    DuplicateKey { field: String, value: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error("no document matched in collection '{0}'")]
    NotFound(String),
}

impl DbError {
    /// True for failures caused by the store being unreachable rather than the request itself.
    #[must_use]
    pub const fn is_connection_error(&self) -> bool {
        matches!(self, Self::NotConnected | Self::UnsupportedUri(_) | Self::Io(_) | Self::Snapshot(_))
    }
}
