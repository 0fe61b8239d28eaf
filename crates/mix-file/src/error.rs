//! File I/O error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FileError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid file: {0}")]
    InvalidFile(String),

    #[error("Decode error: {0}")]
    DecodeError(String),

    #[error("WAV error: {0}")]
    WavError(String),

    #[error("Sample directory error: {0}")]
    Listing(String),
}

pub type FileResult<T> = Result<T, FileError>;

impl From<hound::Error> for FileError {
    fn from(err: hound::Error) -> Self {
        FileError::WavError(err.to_string())
    }
}

impl From<walkdir::Error> for FileError {
    fn from(err: walkdir::Error) -> Self {
        FileError::Listing(err.to_string())
    }
}
