use std::{io, path::PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("I/O error on `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("couldn't encode `{artifact}`: {message}")]
    Encode { artifact: String, message: String },
    #[error("artifact `{0}` was produced twice")]
    DuplicateArtifact(String),
}

impl ArtifactError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn encode(artifact: &str, message: impl ToString) -> Self {
        Self::Encode {
            artifact: artifact.to_string(),
            message: message.to_string(),
        }
    }
}
