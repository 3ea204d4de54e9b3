use crate::envelope::Discriminant;

use common::ErrorLocation;

use thiserror::Error as ThisError;

/// Why an inbound frame could not become an [`Envelope`](crate::envelope::Envelope).
///
/// All variants are recoverable: the frame is dropped and the read loop continues.
#[derive(Debug, ThisError)]
pub enum DecodeError {
    #[error("Malformed Frame Error: {message} {location}")]
    MalformedFrame {
        message: String,
        location: ErrorLocation,
    },

    #[error("Unknown Discriminant Error: '{discriminant}' {location}")]
    UnknownDiscriminant {
        discriminant: String,
        location: ErrorLocation,
    },

    #[error("Invalid Payload Error: {discriminant}: {message} {location}")]
    InvalidPayload {
        discriminant: Discriminant,
        message: String,
        location: ErrorLocation,
    },
}

#[derive(Debug, ThisError)]
pub enum EncodeError {
    #[error("Encode Error: {discriminant}: {message} {location}")]
    Serialize {
        discriminant: Discriminant,
        message: String,
        location: ErrorLocation,
    },
}
