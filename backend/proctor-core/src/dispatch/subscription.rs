use crate::dispatch::SubscriptionId;
use crate::dispatch::registry::RegistryTable;

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError, Weak};

/// Capability that removes one subscription.
///
/// Holds the subscription id and a weak reference to the registry table, so
/// it never keeps the registry alive. Calling [`unsubscribe`](Self::unsubscribe)
/// more than once, or after the registry was cleared or dropped, does nothing.
///
/// Dropping the handle does **not** unsubscribe.
pub struct Unsubscribe {
    id: SubscriptionId,
    table: Weak<Mutex<RegistryTable>>,
    done: AtomicBool,
}

impl Unsubscribe {
    pub(crate) fn new(id: SubscriptionId, table: Weak<Mutex<RegistryTable>>) -> Self {
        Self {
            id,
            table,
            done: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn is_unsubscribed(&self) -> bool {
        self.done.load(Ordering::SeqCst)
    }

    /// Remove the subscription. Idempotent.
    pub fn unsubscribe(&self) {
        if self.done.swap(true, Ordering::SeqCst) {
            return;
        }

        if let Some(table) = self.table.upgrade() {
            table
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(self.id);
        }
    }
}

impl fmt::Debug for Unsubscribe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unsubscribe")
            .field("id", &self.id)
            .field("unsubscribed", &self.is_unsubscribed())
            .finish()
    }
}
