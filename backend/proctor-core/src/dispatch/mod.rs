//! Routing of decoded envelopes to subscribers.
//!
//! The [`DispatchRegistry`] keeps, per discriminant, the subscribers in
//! registration order. Delivery works from a snapshot, so handlers may
//! subscribe or unsubscribe (themselves or others) while being delivered to.
//! Changes take effect from the next delivery.
//!
//! Handlers are fire-and-forget: each handler is called in order and the
//! future it returns is polled once inline, so bodies up to their first
//! `.await` that suspends keep registration and frame order. The pending
//! remainder is spawned as its own task. A handler that errors or
//! panics is reported on the handler-failure channel; it never affects its
//! siblings or the caller of [`DispatchRegistry::deliver`].

mod registry;
mod subscription;

pub use registry::DispatchRegistry;
pub use subscription::Unsubscribe;

use crate::envelope::{Discriminant, Envelope};
use crate::error::dispatch::HandlerError;

use std::fmt::{Display, Formatter, Result as FormatResult};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Future returned by a subscriber.
pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<(), HandlerError>> + Send + 'static>>;

/// Type-erased subscriber callback.
pub type Handler = Arc<dyn Fn(Envelope) -> HandlerFuture + Send + Sync + 'static>;

/// Identifier of one registration. Only used to remove it again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl Display for SubscriptionId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        write!(formatter, "#{}", self.0)
    }
}

/// A subscriber failure, as published on the handler-failure channel.
#[derive(Debug, Clone)]
pub struct HandlerFailure {
    pub subscription: SubscriptionId,
    pub discriminant: Discriminant,
    pub error: HandlerError,
}
