use crate::error::bus::BusError;
use crate::error::submission::SubmissionError;

use common::ErrorLocation;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum WorkflowError {
    #[error("Unsupported Test Type Error: '{test_type}' has no associated app {location}")]
    UnsupportedTestType {
        test_type: String,
        location: ErrorLocation,
    },

    #[error(transparent)]
    Bus(#[from] BusError),

    #[error(transparent)]
    Submission(#[from] SubmissionError),
}
