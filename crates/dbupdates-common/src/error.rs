use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("error reading update path {}: {message}", .path.display())]
    Discovery { path: PathBuf, message: String },

    /// An update script failed. The script's own message is kept verbatim.
    #[error("{message}")]
    Script { file: String, message: String },

    #[error("error persisting update {file}: {message}")]
    Persistence { file: String, message: String },

    #[error("error checking ledger for update {file}: {message}")]
    Ledger { file: String, message: String },

    #[error("failed to load update {file}: {message}")]
    Loader { file: String, message: String },

    #[error("database error: {0}")]
    Database(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// The update file this error is attributed to, if any.
    pub fn file(&self) -> Option<&str> {
        match self {
            Error::Script { file, .. }
            | Error::Persistence { file, .. }
            | Error::Ledger { file, .. }
            | Error::Loader { file, .. } => Some(file),
            _ => None,
        }
    }
}
