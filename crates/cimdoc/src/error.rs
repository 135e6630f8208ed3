//! CLI error types.

use cimdoc_config::ConfigError;
use cimdoc_model::ModelError;
use cimdoc_writer::WriterError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Model(#[from] ModelError),

    #[error("{0}")]
    Writer(#[from] WriterError),
}
