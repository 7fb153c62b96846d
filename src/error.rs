use std::{io, path::PathBuf};

use thiserror::Error;

use crate::session::SessionMode;

pub type Result<T> = std::result::Result<T, SessionError>;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("malformed recording: {0}")]
    Format(String),

    #[error("cannot {requested} while {active:?}")]
    ModeConflict {
        active: SessionMode,
        requested: &'static str,
    },

    /// A previous save failed and its frames are still held for retry.
    #[error("recording '{0}' has not been saved yet")]
    UnsavedRecording(String),

    #[error("failed to encode {}: {source}", .path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("i/o failure on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl SessionError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        SessionError::Io {
            path: path.into(),
            source,
        }
    }
}
