// Shared fakes for the unit tests.

use crate::dispatch::{Handler, HandlerFuture};
use crate::envelope::Envelope;
use crate::error::dispatch::HandlerError;
use crate::shell::{Navigator, Notifier, Toast};

use std::future::ready;
use std::sync::{Arc, Mutex};

/// Collects every toast it is asked to show.
#[derive(Default)]
pub struct RecordingNotifier {
    pub toasts: Mutex<Vec<Toast>>,
}

impl RecordingNotifier {
    pub fn toasts(&self) -> Vec<Toast> {
        self.toasts.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, toast: Toast) {
        self.toasts.lock().unwrap().push(toast);
    }
}

#[derive(Default)]
pub struct RecordingNavigator {
    pub routes: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn routes(&self) -> Vec<String> {
        self.routes.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: &str) {
        self.routes.lock().unwrap().push(route.to_string());
    }
}

/// Handler that appends `label` to `log` when called and succeeds.
pub fn recording_handler(label: &'static str, log: Arc<Mutex<Vec<String>>>) -> Handler {
    Arc::new(move |_envelope: Envelope| -> HandlerFuture {
        log.lock().unwrap().push(label.to_string());
        Box::pin(ready(Ok::<(), HandlerError>(())))
    })
}

pub fn call_log() -> Arc<Mutex<Vec<String>>> {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn entries(log: &Arc<Mutex<Vec<String>>>) -> Vec<String> {
    log.lock().unwrap().clone()
}
