use common::ErrorLocation;

use proctor_core::error::CoreError;

use thiserror::Error;

/// Errors that stop the proctor client from starting or running.
#[derive(Debug, Error)]
pub enum ProctorError {
    /// Error from this App (directories, logger, signals)
    #[error("Proctor Error: {message} {location}")]
    Proctor {
        message: String,
        location: ErrorLocation,
    },

    /// Error from the bus, configuration, or exam server
    #[error(transparent)]
    Core(#[from] CoreError),
}
