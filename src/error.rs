use std::path::PathBuf;

/// Failures surfaced by the store and the record mutation API.
///
/// Per-line import failures (malformed fields, unknown student ids) are
/// counted by the import pipeline instead of being raised through here.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("storage unavailable at {path}: {source}")]
    StorageUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt data in {path}: {source}")]
    CorruptData {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("student id already exists: {id}")]
    DuplicateKey { id: String },

    #[error("{what} not found: {key}")]
    NotFound { what: &'static str, key: String },
}

impl Error {
    /// Stable wire code used by the IPC error envelope.
    pub fn code(&self) -> &'static str {
        match self {
            Error::StorageUnavailable { .. } => "storage_unavailable",
            Error::CorruptData { .. } => "corrupt_data",
            Error::DuplicateKey { .. } => "duplicate_id",
            Error::NotFound { .. } => "not_found",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
