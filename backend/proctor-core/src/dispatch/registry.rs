use crate::dispatch::subscription::Unsubscribe;
use crate::dispatch::{Handler, HandlerFailure, HandlerFuture, SubscriptionId};
use crate::envelope::{Discriminant, Envelope};
use crate::error::dispatch::HandlerError;

use common::ErrorLocation;

use std::any::Any;
use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, Location, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::FutureExt;
use log::{debug, error};
use tokio::runtime::Handle;
use tokio::sync::broadcast;

/// Handler failures buffered per receiver before old ones are skipped.
const FAILURE_CHANNEL_CAPACITY: usize = 64;

struct Subscription {
    id: SubscriptionId,
    handler: Handler,
}

/// Discriminant → subscribers in registration order.
#[derive(Default)]
pub(crate) struct RegistryTable {
    sequences: HashMap<Discriminant, Vec<Subscription>>,
    owners: HashMap<SubscriptionId, Discriminant>,
}

impl RegistryTable {
    fn insert(&mut self, discriminant: Discriminant, id: SubscriptionId, handler: Handler) {
        self.sequences
            .entry(discriminant)
            .or_default()
            .push(Subscription { id, handler });
        self.owners.insert(id, discriminant);
    }

    /// Returns false if `id` was not registered (already removed or cleared).
    pub(crate) fn remove(&mut self, id: SubscriptionId) -> bool {
        let Some(discriminant) = self.owners.remove(&id) else {
            return false;
        };

        if let Some(sequence) = self.sequences.get_mut(&discriminant) {
            sequence.retain(|subscription| subscription.id != id);
            if sequence.is_empty() {
                self.sequences.remove(&discriminant);
            }
        }

        true
    }

    fn snapshot(&self, discriminant: Discriminant) -> Vec<(SubscriptionId, Handler)> {
        self.sequences
            .get(&discriminant)
            .map(|sequence| {
                sequence
                    .iter()
                    .map(|subscription| (subscription.id, Arc::clone(&subscription.handler)))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn len(&self, discriminant: Discriminant) -> usize {
        self.sequences.get(&discriminant).map_or(0, Vec::len)
    }

    fn clear(&mut self) {
        self.sequences.clear();
        self.owners.clear();
    }
}

/// Subscriber table plus the handler-failure side channel.
///
/// Cheap to clone; all clones share the same table.
#[derive(Clone)]
pub struct DispatchRegistry {
    table: Arc<Mutex<RegistryTable>>,
    next_id: Arc<AtomicU64>,
    failures: broadcast::Sender<HandlerFailure>,
}

impl DispatchRegistry {
    pub fn new() -> Self {
        let (failures, _) = broadcast::channel(FAILURE_CHANNEL_CAPACITY);

        Self {
            table: Arc::new(Mutex::new(RegistryTable::default())),
            next_id: Arc::new(AtomicU64::new(1)),
            failures,
        }
    }

    /// Append `handler` to the subscribers of `discriminant`.
    pub fn register(&self, discriminant: Discriminant, handler: Handler) -> SubscriptionId {
        let id = SubscriptionId::new(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.lock_table().insert(discriminant, id, handler);
        debug!("Registered subscriber {id} for {discriminant}");
        id
    }

    /// [`register`](Self::register), returning the removal capability.
    pub fn subscribe(&self, discriminant: Discriminant, handler: Handler) -> Unsubscribe {
        let id = self.register(discriminant, handler);
        Unsubscribe::new(id, Arc::downgrade(&self.table))
    }

    /// Remove a subscription if it is still present.
    pub fn unregister(&self, id: SubscriptionId) {
        if self.lock_table().remove(id) {
            debug!("Unregistered subscriber {id}");
        }
    }

    /// Drop every subscription (teardown).
    pub fn clear(&self) {
        self.lock_table().clear();
        debug!("Cleared all subscribers");
    }

    pub fn subscriber_count(&self, discriminant: Discriminant) -> usize {
        self.lock_table().len(discriminant)
    }

    /// Receiver for failures raised by any subscriber from now on.
    pub fn failures(&self) -> broadcast::Receiver<HandlerFailure> {
        self.failures.subscribe()
    }

    /// Hand `envelope` to every subscriber registered for its discriminant.
    ///
    /// Subscribers are called in registration order, from a snapshot taken on
    /// entry. Each returned future is polled once right here, so handler
    /// bodies run in order up to their first suspension point; whatever is
    /// still pending is spawned on the current tokio runtime and not awaited.
    /// Envelopes nobody subscribed to are dropped.
    pub fn deliver(&self, envelope: Envelope) {
        let discriminant = envelope.discriminant();
        let snapshot = self.lock_table().snapshot(discriminant);

        if snapshot.is_empty() {
            debug!("No subscribers for {discriminant}, dropping envelope");
            return;
        }

        let runtime = Handle::try_current().ok();

        for (id, handler) in snapshot {
            let invoked = catch_unwind(AssertUnwindSafe(|| handler(envelope.clone())));

            let future = match invoked {
                Ok(future) => future,
                Err(panic) => {
                    report(
                        &self.failures,
                        HandlerFailure {
                            subscription: id,
                            discriminant,
                            error: HandlerError::Panicked {
                                message: panic_message(panic.as_ref()),
                                location: ErrorLocation::from(Location::caller()),
                            },
                        },
                    );
                    continue;
                }
            };

            let mut supervised = Box::pin(supervise(id, discriminant, future, self.failures.clone()));
            if supervised.as_mut().now_or_never().is_some() {
                continue;
            }

            match &runtime {
                Some(runtime) => {
                    runtime.spawn(supervised);
                }
                None => report(
                    &self.failures,
                    HandlerFailure {
                        subscription: id,
                        discriminant,
                        error: HandlerError::NoRuntime {
                            discriminant,
                            location: ErrorLocation::from(Location::caller()),
                        },
                    },
                ),
            }
        }
    }

    fn lock_table(&self) -> MutexGuard<'_, RegistryTable> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for DispatchRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Drive one handler future to completion and report how it failed, if it did.
async fn supervise(
    id: SubscriptionId,
    discriminant: Discriminant,
    future: HandlerFuture,
    failures: broadcast::Sender<HandlerFailure>,
) {
    let error = match AssertUnwindSafe(future).catch_unwind().await {
        Ok(Ok(())) => return,
        Ok(Err(error)) => error,
        Err(panic) => HandlerError::Panicked {
            message: panic_message(panic.as_ref()),
            location: ErrorLocation::from(Location::caller()),
        },
    };

    report(
        &failures,
        HandlerFailure {
            subscription: id,
            discriminant,
            error,
        },
    );
}

fn report(failures: &broadcast::Sender<HandlerFailure>, failure: HandlerFailure) {
    error!(
        "Subscriber {} for {} failed: {}",
        failure.subscription, failure.discriminant, failure.error
    );

    // Nobody listening is fine; the failure is already logged.
    let _ = failures.send(failure);
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        String::from("non-string panic payload")
    }
}
