use crate::bus::Bus;
use crate::connection::ConnectionState;
use crate::shell::{Notifier, Toast};

use std::sync::Arc;

use log::{debug, warn};
use tokio::sync::watch;
use tokio::task::JoinHandle;

const OFFLINE_TITLE: &str = "You are offline";
const OFFLINE_DESCRIPTION: &str = "Lost connection to the desktop bridge.";
const ONLINE_TITLE: &str = "Back online";
const ONLINE_DESCRIPTION: &str = "Connection to the desktop bridge restored.";

/// Background watcher that tells the candidate when the bridge goes away.
pub struct OfflineMonitor {
    task: JoinHandle<()>,
}

impl OfflineMonitor {
    /// Start watching `bus`. Must be called from within a tokio runtime.
    pub fn spawn(bus: &Bus, notifier: Arc<dyn Notifier>) -> Self {
        let states = bus.watch_state();
        let task = tokio::spawn(watch_connection(states, notifier));
        Self { task }
    }

    pub fn stop(self) {
        self.task.abort();
        debug!("Offline monitor stopped");
    }
}

async fn watch_connection(
    mut states: watch::Receiver<ConnectionState>,
    notifier: Arc<dyn Notifier>,
) {
    let mut previous = *states.borrow_and_update();
    let mut offline = false;

    while states.changed().await.is_ok() {
        let current = *states.borrow_and_update();

        match current {
            ConnectionState::Disconnected if previous.is_open() => {
                warn!("Desktop bridge connection lost");
                offline = true;
                notifier.notify(Toast::destructive(OFFLINE_TITLE, OFFLINE_DESCRIPTION));
            }
            ConnectionState::Open if offline => {
                offline = false;
                notifier.notify(Toast::new(ONLINE_TITLE, ONLINE_DESCRIPTION));
            }
            _ => {}
        }

        previous = current;
    }
}
