use crate::envelope::Discriminant;

use common::ErrorLocation;

use std::panic::Location;

use thiserror::Error as ThisError;

/// Failure inside a subscriber.
///
/// Never returned to the code that delivered the envelope; it is caught at the
/// dispatch boundary and published on the handler-failure channel instead.
#[derive(Debug, Clone, ThisError)]
pub enum HandlerError {
    #[error("Handler Error: {message} {location}")]
    Failed {
        message: String,
        location: ErrorLocation,
    },

    #[error("Handler Panic Error: {message} {location}")]
    Panicked {
        message: String,
        location: ErrorLocation,
    },

    #[error("Payload Mismatch Error: expected {expected}, got {actual} {location}")]
    PayloadMismatch {
        expected: Discriminant,
        actual: Discriminant,
        location: ErrorLocation,
    },

    #[error("No Runtime Error: handler future for {discriminant} could not be spawned {location}")]
    NoRuntime {
        discriminant: Discriminant,
        location: ErrorLocation,
    },
}

impl HandlerError {
    #[track_caller]
    pub fn failed(message: impl Into<String>) -> Self {
        HandlerError::Failed {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
