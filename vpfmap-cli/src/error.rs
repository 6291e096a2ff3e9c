//! CLI error type.

use thiserror::Error;
use vpfmap::{DataError, LayerError};

/// Errors surfaced to the terminal.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Layer(#[from] LayerError),

    /// Viewport bounds that do not describe a north-west to south-east
    /// rectangle.
    #[error("invalid viewport bounds: {0}")]
    InvalidBounds(String),
}
