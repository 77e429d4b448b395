//! Error types for the arib2ass command.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that end a conversion run.
#[derive(Error, Debug)]
pub enum AppError {
    /// File could not be opened, read or written.
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Stream processing failed.
    #[error(transparent)]
    Caption(#[from] arib_caption::Error),

    /// Configuration file is not valid TOML for this tool.
    #[error("Invalid config file {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Glyph image could not be encoded.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

impl AppError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        AppError::Io {
            context: context.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
