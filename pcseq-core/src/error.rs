//! Error types for pcseq

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Main error type for pcseq operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("input directory does not exist: {}", path.display())]
    DirectoryNotFound { path: PathBuf },

    #[error("failed to read frame {}: {message}", path.display())]
    FrameRead { path: PathBuf, message: String },

    #[error("encode failed: {0}")]
    Encode(String),

    #[error("decode failed: {0}")]
    Decode(String),

    #[error("failed to write frame {}: {message}", path.display())]
    FrameWrite { path: PathBuf, message: String },

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Invalid compression parameters: {0}")]
    InvalidParams(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Wrap any error raised while loading a source frame
    pub fn frame_read(path: impl AsRef<Path>, err: impl std::fmt::Display) -> Self {
        Error::FrameRead {
            path: path.as_ref().to_path_buf(),
            message: err.to_string(),
        }
    }

    /// Wrap any error raised while persisting an output frame
    pub fn frame_write(path: impl AsRef<Path>, err: impl std::fmt::Display) -> Self {
        Error::FrameWrite {
            path: path.as_ref().to_path_buf(),
            message: err.to_string(),
        }
    }
}

/// Result type alias for pcseq operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_keep_cause() {
        let err = Error::frame_write("out/f1.pcq", "permission denied");
        let text = err.to_string();
        assert!(text.contains("f1.pcq"));
        assert!(text.contains("permission denied"));
    }
}
