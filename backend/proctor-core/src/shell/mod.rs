//! The root screen's reactions to bridge messages.
//!
//! The UI itself is out of reach here; it is represented by two collaborator
//! traits. [`Notifier`] shows toasts, [`Navigator`] switches screens.

mod offline;

pub use offline::OfflineMonitor;

use crate::bus::Bus;
use crate::dispatch::Unsubscribe;
use crate::envelope::{ErrorReport, ExeNotFound, LoadRoute, WarnUser};
use crate::error::dispatch::HandlerError;

use std::future::{Ready, ready};
use std::sync::Arc;

use log::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToastVariant {
    #[default]
    Default,
    Destructive,
}

/// A transient message shown to the candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub title: String,
    pub description: String,
    pub variant: ToastVariant,
}

impl Toast {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            variant: ToastVariant::Default,
        }
    }

    pub fn destructive(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            variant: ToastVariant::Destructive,
            ..Self::new(title, description)
        }
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, toast: Toast);
}

pub trait Navigator: Send + Sync {
    fn navigate(&self, route: &str);
}

/// Subscriptions held for as long as the root screen is mounted.
pub struct EventShell {
    subscriptions: Vec<Unsubscribe>,
}

impl EventShell {
    /// Register the root screen's handlers on `bus`.
    pub fn install(bus: &Bus, notifier: Arc<dyn Notifier>, navigator: Arc<dyn Navigator>) -> Self {
        let mut subscriptions = Vec::with_capacity(4);

        let exe_notifier = Arc::clone(&notifier);
        subscriptions.push(bus.subscribe(move |payload: ExeNotFound| {
            error!("Error from desktop bridge: {}", payload.err_msg);
            exe_notifier.notify(Toast::destructive("Error", payload.err_msg));
            handled()
        }));

        subscriptions.push(bus.subscribe(move |payload: LoadRoute| {
            info!("Navigating to {}", payload.route);
            navigator.navigate(&payload.route);
            handled()
        }));

        let err_notifier = Arc::clone(&notifier);
        subscriptions.push(bus.subscribe(move |payload: ErrorReport| {
            error!("Error from desktop bridge: {}", payload.message);
            err_notifier.notify(Toast::destructive("Error", payload.message));
            handled()
        }));

        subscriptions.push(bus.subscribe(move |payload: WarnUser| {
            warn!("Warning to the user: {}", payload.message);
            notifier.notify(Toast::destructive("Warning", payload.message));
            handled()
        }));

        Self { subscriptions }
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Remove every handler this shell installed.
    pub fn teardown(self) {
        for subscription in &self.subscriptions {
            subscription.unsubscribe();
        }
        info!("Event shell torn down");
    }
}

fn handled() -> Ready<Result<(), HandlerError>> {
    ready(Ok(()))
}
