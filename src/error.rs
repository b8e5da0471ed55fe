//! Error types for voxbook operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while extracting or converting a document.
///
/// Variants that describe a broken document carry the stage that failed
/// (container, package, navigation) so a single message is enough to tell
/// the user where the source is malformed.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unreadable archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("container parse failed: {0}")]
    Container(String),

    #[error("package parse failed: {0}")]
    Package(String),

    #[error("navigation parse failed: {0}")]
    Navigation(String),

    #[error("no chapters found in {0}")]
    NoChapters(String),

    #[error("PDF text extraction failed: {0}")]
    Pdf(String),

    #[error("no extractor available for {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("voice not found: {0}")]
    VoiceNotFound(String),

    #[error("synthesis of chunk {index}/{total} failed: {message}")]
    Synthesis {
        index: usize,
        total: usize,
        message: String,
    },

    #[error("operation cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, Error>;
