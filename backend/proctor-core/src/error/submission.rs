use common::{ErrorLocation, HttpStatusCode};

use std::panic::Location;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum SubmissionError {
    #[error("HTTP Error: {message} {location}")]
    Http {
        message: String,
        location: ErrorLocation,
    },

    #[error("JSON Error: {message} {location}")]
    Json {
        message: String,
        location: ErrorLocation,
    },

    #[error("URL Parse Error: {message} {location}")]
    UrlParse {
        message: String,
        location: ErrorLocation,
    },

    /// `/submit-test` answered 400: the test was never opened.
    #[error("Test Not Opened Error: test {test_id} was never opened {location}")]
    TestNotOpened {
        test_id: String,
        location: ErrorLocation,
    },

    #[error("Server Error: HTTP {status} - {message} {location}")]
    Server {
        status: HttpStatusCode,
        message: String,
        location: ErrorLocation,
    },
}

impl From<url::ParseError> for SubmissionError {
    #[track_caller]
    fn from(error: url::ParseError) -> Self {
        SubmissionError::UrlParse {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<reqwest::Error> for SubmissionError {
    #[track_caller]
    fn from(error: reqwest::Error) -> Self {
        let location = ErrorLocation::from(Location::caller());
        if error.is_decode() {
            SubmissionError::Json {
                message: error.to_string(),
                location,
            }
        } else {
            SubmissionError::Http {
                message: error.to_string(),
                location,
            }
        }
    }
}

impl From<serde_json::Error> for SubmissionError {
    #[track_caller]
    fn from(error: serde_json::Error) -> Self {
        SubmissionError::Json {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
