use thiserror::Error;

/// Coarse classification used by the top-level handler to pick a log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transport,
    HttpStatus,
    Decode,
    Normalize,
    Database,
    Config,
}

impl ErrorKind {
    pub fn label(&self) -> &'static str {
        match self {
            ErrorKind::Transport => "transport",
            ErrorKind::HttpStatus => "http_status",
            ErrorKind::Decode => "decode",
            ErrorKind::Normalize => "normalize",
            ErrorKind::Database => "database",
            ErrorKind::Config => "config",
        }
    }

    /// Everything that can go wrong before the first row is written.
    pub fn is_fetch_class(&self) -> bool {
        matches!(
            self,
            ErrorKind::Transport | ErrorKind::HttpStatus | ErrorKind::Decode
        )
    }
}

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("network: {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("http {status}: {url}")]
    HttpStatus { url: String, status: u16 },
    #[error("json: {url}: {message}")]
    Decode { url: String, message: String },
    #[error("collection {0:?} is not listed by the API root")]
    UnknownCollection(String),
    #[error("column {column}: cannot coerce {value} to a number")]
    Normalize { column: String, value: String },
    #[error("database: {0}")]
    Database(#[from] sqlx::Error),
    #[error("database: {0}")]
    Encode(String),
    #[error("config: {0}")]
    Config(String),
}

impl SyncError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SyncError::Transport { .. } => ErrorKind::Transport,
            SyncError::HttpStatus { .. } => ErrorKind::HttpStatus,
            // The metadata request for an unlisted collection cannot be made at all.
            SyncError::Decode { .. } | SyncError::UnknownCollection(_) => ErrorKind::Decode,
            SyncError::Normalize { .. } => ErrorKind::Normalize,
            SyncError::Database(_) | SyncError::Encode(_) => ErrorKind::Database,
            SyncError::Config(_) => ErrorKind::Config,
        }
    }

    pub(crate) fn decode(url: &str, message: impl Into<String>) -> Self {
        SyncError::Decode {
            url: url.to_string(),
            message: message.into(),
        }
    }
}

pub type SyncResult<T> = std::result::Result<T, SyncError>;
