use derive_more::Display;

/// Errors raised by object storage backends.
#[derive(Debug, Display)]
pub enum StorageError {
    #[display("object not found: {_0}")]
    NotFound(String),

    #[display("invalid object key: {_0}")]
    InvalidKey(String),

    #[display("object exceeds size limit ({actual} > {limit} bytes)")]
    SizeLimitExceeded { actual: usize, limit: usize },

    #[display("storage IO error: {_0}")]
    Io(std::io::Error),
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}
