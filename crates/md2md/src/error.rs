//! CLI error types.

use md2md_config::ConfigError;
use md2md_filter::{FilterError, OptionsError};

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Filter(#[from] FilterError),

    #[error("{0}")]
    Options(#[from] OptionsError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Validation(String),
}
