use crate::error::codec::EncodeError;
use crate::error::connection::ConnectionError;

use thiserror::Error as ThisError;

/// Failure of [`Bus::send`](crate::bus::Bus::send).
#[derive(Debug, ThisError)]
pub enum BusError {
    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Connection(#[from] ConnectionError),
}

impl BusError {
    /// True when the frame was refused because the connection is not open.
    pub fn is_not_open(&self) -> bool {
        matches!(self, BusError::Connection(ConnectionError::NotOpen { .. }))
    }
}
