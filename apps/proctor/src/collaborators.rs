//! Headless stand-ins for the UI the event shell talks to.

use proctor_core::shell::{Navigator, Notifier, Toast, ToastVariant};

use std::sync::{Mutex, PoisonError};

use log::{info, warn};

/// Shows toasts by writing them to the log.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, toast: Toast) {
        match toast.variant {
            ToastVariant::Default => info!("[toast] {}: {}", toast.title, toast.description),
            ToastVariant::Destructive => warn!("[toast] {}: {}", toast.title, toast.description),
        }
    }
}

/// Remembers the screen the bridge last asked for.
#[derive(Debug, Default)]
pub struct RouteTracker {
    current: Mutex<Option<String>>,
}

impl RouteTracker {
    pub fn current(&self) -> Option<String> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Navigator for RouteTracker {
    fn navigate(&self, route: &str) {
        let previous = self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(route.to_string());

        match previous {
            Some(previous) => info!("Screen changed: {previous} -> {route}"),
            None => info!("Screen changed: {route}"),
        }
    }
}
