//! Error types for the Markdown filter.

use std::path::PathBuf;

use crate::options::ImageMode;

/// Invalid filter options.
#[derive(Debug, thiserror::Error)]
pub enum OptionsError {
    /// More than one exclusive image mode was requested.
    #[error("only one of check|copy|import|export may be specified for images (got {first} and {second})")]
    MultipleModes {
        /// Mode seen first.
        first: ImageMode,
        /// Conflicting mode.
        second: ImageMode,
    },

    /// Unrecognized image token.
    #[error("unknown image option: {0}")]
    UnknownImageToken(String),
}

/// Failure to retrieve link data.
///
/// Always soft: callers report it and leave the original markup in place.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Local file does not exist.
    #[error("file {} does not exist", .0.display())]
    Missing(PathBuf),

    /// Malformed `data:` URL.
    #[error("invalid data URL")]
    InvalidDataUrl,

    /// Base64 payload could not be decoded.
    #[error("invalid base64 data: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Data URL output requested for content of unknown type.
    #[error("unknown content type for file {0}")]
    UnknownContentType(String),

    /// HTTP request failed (network error, timeout, etc).
    #[error("HTTP request failed: {0}")]
    Http(#[from] ureq::Error),

    /// Server returned an error status.
    #[error("HTTP error: {0}")]
    HttpStatus(u16),

    /// I/O error reading a local file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure to write a file.
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    /// Target exists with different content and overwriting is not allowed.
    #[error("file {} exists with different content; specify --overwrite to replace it", .path.display())]
    Conflict {
        /// Target path.
        path: PathBuf,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Hard failure of a filter run.
///
/// No output text is produced when a run fails.
#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    /// Write conflict while copying or exporting an asset.
    #[error("write conflict: {0}")]
    WriteConflict(WriteError),
}

impl FilterError {
    /// Message for a soft write failure.
    ///
    /// Conflicts abort the run; other I/O errors are returned for reporting.
    pub(crate) fn soft_write_message(err: WriteError) -> Result<String, Self> {
        match err {
            WriteError::Conflict { .. } => Err(Self::WriteConflict(err)),
            WriteError::Io(e) => Ok(e.to_string()),
        }
    }
}
