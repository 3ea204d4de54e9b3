use crate::connection::ConnectionState;

use common::ErrorLocation;

use std::panic::Location;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum ConnectionError {
    #[error("Establish Error: {message} {location}")]
    EstablishFailed {
        message: String,
        location: ErrorLocation,
    },

    #[error("Not Open Error: connection is {state}, frame not queued {location}")]
    NotOpen {
        state: ConnectionState,
        location: ErrorLocation,
    },

    #[error("URL Parse Error: {message} {location}")]
    InvalidUrl {
        message: String,
        location: ErrorLocation,
    },
}

impl From<url::ParseError> for ConnectionError {
    #[track_caller]
    fn from(error: url::ParseError) -> Self {
        ConnectionError::InvalidUrl {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
