//! The bus facade: the only surface screens use.
//!
//! A [`Bus`] is built once at startup and cloned into every component that
//! needs it. It ties together the [`DispatchRegistry`] and the
//! [`ConnectionManager`], and adds typed `send`/`subscribe` on top of them.
//!
//! # Examples
//!
//! ```no_run
//! use proctor_core::bus::Bus;
//! use proctor_core::config::BusConfig;
//! use proctor_core::envelope::{LoadRoute, QuitApp};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bus = Bus::new(&BusConfig::default())?;
//!     bus.connect().await?;
//!
//!     let unsubscribe = bus.subscribe(|payload: LoadRoute| async move {
//!         println!("navigate to {}", payload.route);
//!         Ok(())
//!     });
//!
//!     bus.send(QuitApp {})?;
//!     unsubscribe.unsubscribe();
//!     Ok(())
//! }
//! ```

use crate::config::BusConfig;
use crate::connection::{ConnectionManager, ConnectionState};
use crate::dispatch::{DispatchRegistry, Handler, HandlerFailure, HandlerFuture, Unsubscribe};
use crate::envelope::{Discriminant, Envelope, Payload, encode};
use crate::error::bus::BusError;
use crate::error::connection::ConnectionError;
use crate::error::dispatch::HandlerError;

use common::ErrorLocation;

use std::future::{Future, ready};
use std::panic::Location;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};
use tokio::sync::{broadcast, watch};
use url::Url;

/// Process-wide message bus.
#[derive(Clone)]
pub struct Bus {
    registry: DispatchRegistry,
    connection: ConnectionManager,
}

impl Bus {
    /// Build the bus from configuration. Does not connect.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::InvalidUrl`] if `bridge_url` does not parse.
    #[track_caller]
    pub fn new(config: &BusConfig) -> Result<Self, ConnectionError> {
        let url = Url::parse(&config.server.bridge_url)?;
        let registry = DispatchRegistry::new();
        let connection = ConnectionManager::new(
            url,
            Duration::from_secs(config.server.connect_timeout_secs),
            registry.clone(),
        );

        Ok(Self {
            registry,
            connection,
        })
    }

    /// See [`ConnectionManager::connect`].
    pub async fn connect(&self) -> Result<(), ConnectionError> {
        self.connection.connect().await
    }

    /// Encode `message` and queue it on the connection.
    ///
    /// # Errors
    ///
    /// - [`BusError::Connection`] with [`ConnectionError::NotOpen`] when the
    ///   connection is not open; the message is lost
    /// - [`BusError::Encode`] if the payload cannot be serialized
    #[track_caller]
    pub fn send(&self, message: impl Into<Envelope>) -> Result<(), BusError> {
        let envelope = message.into();
        let frame = encode(&envelope)?;
        self.connection.send(frame)?;
        debug!("Sent {} to desktop bridge", envelope.discriminant());
        Ok(())
    }

    /// Subscribe to one payload type.
    ///
    /// The handler is called once per matching envelope, in registration
    /// order among subscribers of the same kind. The future it returns is
    /// polled once inline and runs detached once it suspends. Returns the
    /// handle that removes this subscription.
    pub fn subscribe<P, F, Fut>(&self, handler: F) -> Unsubscribe
    where
        P: Payload,
        F: Fn(P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        let erased: Handler = Arc::new(move |envelope: Envelope| -> HandlerFuture {
            match P::from_envelope(envelope) {
                Ok(payload) => Box::pin(handler(payload)),
                Err(other) => Box::pin(ready(Err(HandlerError::PayloadMismatch {
                    expected: P::DISCRIMINANT,
                    actual: other.discriminant(),
                    location: ErrorLocation::from(Location::caller()),
                }))),
            }
        });

        self.registry.subscribe(P::DISCRIMINANT, erased)
    }

    /// Subscribe to raw envelopes of one discriminant.
    pub fn subscribe_envelope<F, Fut>(&self, discriminant: Discriminant, handler: F) -> Unsubscribe
    where
        F: Fn(Envelope) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        let erased: Handler =
            Arc::new(move |envelope: Envelope| -> HandlerFuture { Box::pin(handler(envelope)) });

        self.registry.subscribe(discriminant, erased)
    }

    pub fn state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// Observe connection state transitions (offline notification).
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.connection.watch_state()
    }

    /// Failures raised by any subscriber from now on.
    pub fn handler_failures(&self) -> broadcast::Receiver<HandlerFailure> {
        self.registry.failures()
    }

    /// Close the connection and drop every subscription.
    pub async fn close(&self) {
        self.connection.close().await;
        self.registry.clear();
        info!("Bus closed");
    }

    #[cfg(test)]
    pub(crate) fn registry(&self) -> &DispatchRegistry {
        &self.registry
    }

    #[cfg(test)]
    pub(crate) fn connection(&self) -> &ConnectionManager {
        &self.connection
    }
}
