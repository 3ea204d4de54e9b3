pub mod bus;
pub mod codec;
pub mod config;
pub mod connection;
pub mod dispatch;
pub mod submission;
pub mod workflow;

pub use bus::BusError;
pub use codec::{DecodeError, EncodeError};
pub use config::ConfigError;
pub use connection::ConnectionError;
pub use dispatch::HandlerError;
pub use submission::SubmissionError;
pub use workflow::WorkflowError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error(transparent)]
    Bus(#[from] BusError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Submission(#[from] SubmissionError),

    #[error(transparent)]
    Workflow(#[from] WorkflowError),
}
