//! Error types emitted by the groomer CLI.

use std::sync::Arc;

use camino::Utf8PathBuf;
use groomer_core::CityCellError;
use groomer_data::HarvestError;
use thiserror::Error;

/// Errors emitted by the groomer CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// Opening the cells file failed.
    #[error("failed to open cells file at {path:?}: {source}")]
    OpenCells {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The cells file is not a JSON array of cells.
    #[error("failed to parse cells JSON at {path:?}: {source}")]
    ParseCells {
        path: Utf8PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// A cell in the cells file failed validation.
    #[error("invalid cell in {path:?}: {source}")]
    InvalidCell {
        path: Utf8PathBuf,
        #[source]
        source: CityCellError,
    },
    /// The harvest stopped on a configuration or output error.
    #[error(transparent)]
    Harvest(#[from] HarvestError),
}
