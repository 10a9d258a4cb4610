use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Stream(#[from] std::io::Error),
    #[error("schema error: {0}")]
    Schema(String),
    #[error("malformed FITS header: {0}")]
    Header(String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl ArchiveError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ArchiveError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn schema(message: impl Into<String>) -> Self {
        ArchiveError::Schema(message.into())
    }
}
