use std::{io, path::PathBuf, result};

use thiserror::Error;

pub type Result<T> = result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("No asset found for '{0}' in any quality")]
    AssetNotFound(String),
    #[error("Frame '{0}' has a degenerate or out-of-sheet rectangle")]
    DegenerateFrame(String),
    #[error("Nothing was rendered for {0}")]
    EmptyResult(String),
    #[error("Malformed descriptor in {path}: {reason}")]
    MalformedDescriptor { path: PathBuf, reason: String },
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    PngEncoding(#[from] png::EncodingError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
    #[error("Failed to install logger: {0}")]
    Logger(#[from] log::SetLoggerError),
}

impl Error {
    pub fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::MalformedDescriptor {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Missing-data conditions that are expected during normal operation.
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            Error::AssetNotFound(_) | Error::DegenerateFrame(_) | Error::EmptyResult(_)
        )
    }
}
