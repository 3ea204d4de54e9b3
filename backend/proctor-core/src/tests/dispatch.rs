use crate::dispatch::{DispatchRegistry, Handler, HandlerFuture, Unsubscribe};
use crate::envelope::{Discriminant, Envelope, LoadRoute, WarnUser};
use crate::error::dispatch::HandlerError;
use crate::tests::support::{call_log, entries, recording_handler};

use std::future::{pending, ready};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::broadcast::error::TryRecvError;
use tokio::time::timeout;

const FAILURE_WAIT: Duration = Duration::from_secs(2);

async fn explode() -> Result<(), HandlerError> {
    panic!("async handler exploded")
}

fn load_route(route: &str) -> Envelope {
    LoadRoute {
        route: route.to_string(),
    }
    .into()
}

/// **VALUE**: Verifies handlers run in the order they were registered.
///
/// **WHY THIS MATTERS**: Screens register follow-up reactions after the root
/// shell; reordering them changes what the candidate sees.
///
/// **BUG THIS CATCHES**: Would catch storing subscribers in a hash set or
/// reversing the sequence on insert.
#[tokio::test]
async fn given_two_handlers_when_envelope_delivered_then_called_in_registration_order() {
    // GIVEN: H1 then H2 subscribed to LoadRoute
    let registry = DispatchRegistry::new();
    let log = call_log();
    let _h1 = registry.subscribe(Discriminant::LoadRoute, recording_handler("H1", log.clone()));
    let _h2 = registry.subscribe(Discriminant::LoadRoute, recording_handler("H2", log.clone()));

    // WHEN: Delivering LoadRoute "/tests"
    registry.deliver(load_route("/tests"));

    // THEN: H1 is called before H2, once each
    assert_eq!(entries(&log), vec!["H1", "H2"]);
}

#[tokio::test]
async fn given_handler_for_other_kind_when_envelope_delivered_then_not_called() {
    let registry = DispatchRegistry::new();
    let log = call_log();
    let _warn = registry.subscribe(Discriminant::WarnUser, recording_handler("warn", log.clone()));

    registry.deliver(load_route("/tests"));

    assert!(entries(&log).is_empty());
}

/// **VALUE**: Verifies the handler receives the envelope's payload.
///
/// **WHY THIS MATTERS**: Handlers act on the payload (route, message), not
/// just on the fact that something arrived.
#[tokio::test]
async fn given_handler_when_envelope_delivered_then_payload_is_passed_through() {
    let registry = DispatchRegistry::new();
    let seen: Arc<Mutex<Option<Envelope>>> = Arc::new(Mutex::new(None));
    let sink = seen.clone();
    let handler: Handler = Arc::new(move |envelope: Envelope| -> HandlerFuture {
        *sink.lock().unwrap() = Some(envelope);
        Box::pin(ready(Ok::<(), HandlerError>(())))
    });
    let _subscription = registry.subscribe(Discriminant::LoadRoute, handler);

    registry.deliver(load_route("/end"));

    assert_eq!(seen.lock().unwrap().clone(), Some(load_route("/end")));
}

/// **VALUE**: Verifies unsubscribe is idempotent and only removes its own entry.
///
/// **WHY THIS MATTERS**: Teardown paths may run twice (remount, error paths).
///
/// **BUG THIS CATCHES**: Would catch a second unsubscribe removing whichever
/// subscriber now sits at the old index.
#[tokio::test]
async fn given_unsubscribed_handler_when_unsubscribed_again_then_nothing_else_changes() {
    // GIVEN: Two subscribers, the first one unsubscribed
    let registry = DispatchRegistry::new();
    let log = call_log();
    let first = registry.subscribe(Discriminant::LoadRoute, recording_handler("H1", log.clone()));
    let _second = registry.subscribe(Discriminant::LoadRoute, recording_handler("H2", log.clone()));
    first.unsubscribe();

    // WHEN: Unsubscribing again
    first.unsubscribe();

    // THEN: Only the second subscriber remains and is called
    assert!(first.is_unsubscribed());
    assert_eq!(registry.subscriber_count(Discriminant::LoadRoute), 1);
    registry.deliver(load_route("/tests"));
    assert_eq!(entries(&log), vec!["H2"]);
}

#[test]
fn given_dropped_handle_when_registry_delivers_then_subscription_is_still_active() {
    let registry = DispatchRegistry::new();
    let log = call_log();
    drop(registry.subscribe(Discriminant::LoadRoute, recording_handler("H1", log.clone())));

    assert_eq!(registry.subscriber_count(Discriminant::LoadRoute), 1);
}

#[test]
fn given_dropped_registry_when_unsubscribed_then_is_noop() {
    let registry = DispatchRegistry::new();
    let handle = registry.subscribe(Discriminant::LoadRoute, recording_handler("H1", call_log()));
    drop(registry);

    handle.unsubscribe();

    assert!(handle.is_unsubscribed());
}

/// **VALUE**: Verifies delivery works from a snapshot taken on entry.
///
/// **WHY THIS MATTERS**: A handler that unsubscribes a sibling (or itself)
/// while being delivered to must not corrupt the ongoing delivery.
///
/// **BUG THIS CATCHES**: Would catch iterating the live table while holding
/// the lock (deadlock) or skipping the sibling mid-delivery.
#[tokio::test]
async fn given_handler_unsubscribing_sibling_when_delivered_then_change_applies_next_time() {
    // GIVEN: H1 unsubscribes H2 when called
    let registry = DispatchRegistry::new();
    let log = call_log();
    let sibling: Arc<Mutex<Option<Unsubscribe>>> = Arc::new(Mutex::new(None));

    let h1_log = log.clone();
    let h1_sibling = sibling.clone();
    let h1: Handler = Arc::new(move |_envelope: Envelope| -> HandlerFuture {
        h1_log.lock().unwrap().push(String::from("H1"));
        if let Some(handle) = h1_sibling.lock().unwrap().as_ref() {
            handle.unsubscribe();
        }
        Box::pin(ready(Ok::<(), HandlerError>(())))
    });
    let _h1 = registry.subscribe(Discriminant::LoadRoute, h1);
    let h2 = registry.subscribe(Discriminant::LoadRoute, recording_handler("H2", log.clone()));
    *sibling.lock().unwrap() = Some(h2);

    // WHEN: Delivering twice
    registry.deliver(load_route("/tests"));
    registry.deliver(load_route("/tests"));

    // THEN: H2 saw the first delivery only
    assert_eq!(entries(&log), vec!["H1", "H2", "H1"]);
}

#[tokio::test]
async fn given_handler_subscribing_during_delivery_when_delivered_then_new_handler_waits() {
    let registry = DispatchRegistry::new();
    let log = call_log();

    let inner_registry = registry.clone();
    let inner_log = log.clone();
    let added: Arc<Mutex<Vec<Unsubscribe>>> = Arc::new(Mutex::new(Vec::new()));
    let added_sink = added.clone();
    let subscriber: Handler = Arc::new(move |_envelope: Envelope| -> HandlerFuture {
        if added_sink.lock().unwrap().is_empty() {
            let handle = inner_registry
                .subscribe(Discriminant::LoadRoute, recording_handler("late", inner_log.clone()));
            added_sink.lock().unwrap().push(handle);
        }
        Box::pin(ready(Ok::<(), HandlerError>(())))
    });
    let _subscriber = registry.subscribe(Discriminant::LoadRoute, subscriber);

    registry.deliver(load_route("/tests"));
    assert!(entries(&log).is_empty());

    registry.deliver(load_route("/tests"));
    assert_eq!(entries(&log), vec!["late"]);
}

/// **VALUE**: Verifies a failing handler does not affect its siblings.
///
/// **WHY THIS MATTERS**: One broken screen must not stop navigation.
///
/// **BUG THIS CATCHES**: Would catch awaiting handler futures in sequence with
/// `?`, which would stop at the first error.
#[tokio::test]
async fn given_failing_handler_when_delivered_then_sibling_runs_and_failure_is_reported() {
    // GIVEN: H1 fails, H2 records
    let registry = DispatchRegistry::new();
    let mut failures = registry.failures();
    let log = call_log();
    let failing: Handler = Arc::new(|_envelope: Envelope| -> HandlerFuture {
        Box::pin(async { Err::<(), _>(HandlerError::failed("screen not mounted")) })
    });
    let h1 = registry.subscribe(Discriminant::LoadRoute, failing);
    let _h2 = registry.subscribe(Discriminant::LoadRoute, recording_handler("H2", log.clone()));

    // WHEN: Delivering
    registry.deliver(load_route("/tests"));

    // THEN: H2 ran, and H1's failure arrived on the channel
    assert_eq!(entries(&log), vec!["H2"]);
    let failure = timeout(FAILURE_WAIT, failures.recv()).await.unwrap().unwrap();
    assert_eq!(failure.subscription, h1.id());
    assert_eq!(failure.discriminant, Discriminant::LoadRoute);
    assert!(matches!(failure.error, HandlerError::Failed { .. }));
}

#[tokio::test]
async fn given_handler_panicking_on_call_when_delivered_then_sibling_still_runs() {
    let registry = DispatchRegistry::new();
    let mut failures = registry.failures();
    let log = call_log();
    let panicking: Handler =
        Arc::new(|_envelope: Envelope| -> HandlerFuture { panic!("handler exploded") });
    let _h1 = registry.subscribe(Discriminant::LoadRoute, panicking);
    let _h2 = registry.subscribe(Discriminant::LoadRoute, recording_handler("H2", log.clone()));

    registry.deliver(load_route("/tests"));

    assert_eq!(entries(&log), vec!["H2"]);
    let failure = timeout(FAILURE_WAIT, failures.recv()).await.unwrap().unwrap();
    match failure.error {
        HandlerError::Panicked { message, .. } => assert_eq!(message, "handler exploded"),
        other => panic!("expected Panicked, got {other:?}"),
    }
}

#[tokio::test]
async fn given_handler_future_panicking_when_delivered_then_panic_is_reported() {
    let registry = DispatchRegistry::new();
    let mut failures = registry.failures();
    let panicking: Handler =
        Arc::new(|_envelope: Envelope| -> HandlerFuture { Box::pin(explode()) });
    let _subscription = registry.subscribe(Discriminant::WarnUser, panicking);

    registry.deliver(
        WarnUser {
            message: String::from("look here"),
        }
        .into(),
    );

    let failure = timeout(FAILURE_WAIT, failures.recv()).await.unwrap().unwrap();
    assert_eq!(failure.discriminant, Discriminant::WarnUser);
    assert!(matches!(failure.error, HandlerError::Panicked { .. }));
}

/// **VALUE**: Verifies envelopes nobody listens to are silently dropped.
///
/// **WHY THIS MATTERS**: The bridge sends kinds (e.g. `Notification`) no
/// screen subscribes to yet.
#[tokio::test]
async fn given_no_subscribers_when_delivered_then_nothing_happens() {
    let registry = DispatchRegistry::new();
    let mut failures = registry.failures();

    registry.deliver(load_route("/tests"));

    assert_eq!(registry.subscriber_count(Discriminant::LoadRoute), 0);
    assert!(matches!(failures.try_recv(), Err(TryRecvError::Empty)));
}

/// **VALUE**: Verifies delivery outside a runtime calls the handler and
/// reports that its suspended future could not be spawned.
///
/// **BUG THIS CATCHES**: Would catch `tokio::spawn` being used directly,
/// which panics without a runtime.
#[test]
fn given_no_runtime_when_delivered_then_handler_is_called_and_no_runtime_reported() {
    // GIVEN: A subscriber whose future never completes, and no tokio runtime
    let registry = DispatchRegistry::new();
    let mut failures = registry.failures();
    let log = call_log();
    let sink = log.clone();
    let suspending: Handler = Arc::new(move |_envelope: Envelope| -> HandlerFuture {
        sink.lock().unwrap().push(String::from("H1"));
        Box::pin(pending::<Result<(), HandlerError>>())
    });
    let _h1 = registry.subscribe(Discriminant::LoadRoute, suspending);

    // WHEN: Delivering
    registry.deliver(load_route("/tests"));

    // THEN: The call happened and NoRuntime was reported
    assert_eq!(entries(&log), vec!["H1"]);
    let failure = failures.try_recv().unwrap();
    assert!(matches!(failure.error, HandlerError::NoRuntime { .. }));
}

/// **VALUE**: Verifies a handler future that completes on its first poll
/// needs no runtime at all.
#[test]
fn given_no_runtime_when_ready_handler_delivered_then_nothing_is_reported() {
    let registry = DispatchRegistry::new();
    let mut failures = registry.failures();
    let log = call_log();
    let _h1 = registry.subscribe(Discriminant::LoadRoute, recording_handler("H1", log.clone()));

    registry.deliver(load_route("/tests"));

    assert_eq!(entries(&log), vec!["H1"]);
    assert!(matches!(failures.try_recv(), Err(TryRecvError::Empty)));
}

/// Handler whose whole body sits inside its `async move` block.
fn async_route_handler(label: &'static str, log: Arc<Mutex<Vec<String>>>) -> Handler {
    Arc::new(move |envelope: Envelope| -> HandlerFuture {
        let log = log.clone();
        Box::pin(async move {
            if let Envelope::LoadRoute(payload) = envelope {
                log.lock().unwrap().push(format!("{label}{}", payload.route));
            }
            Ok::<(), HandlerError>(())
        })
    })
}

/// **VALUE**: Verifies async handler bodies keep registration order and
/// frame order on a work-stealing runtime.
///
/// **WHY THIS MATTERS**: The binary runs on the multi-thread runtime. Two
/// quick `LoadRoute` frames must leave the candidate on the newer route.
///
/// **BUG THIS CATCHES**: Would catch handler futures being spawned unpolled,
/// which lets the scheduler run H2's body for the second frame before H1's
/// body for the first.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn given_async_handlers_on_multi_thread_runtime_when_two_frames_delivered_then_bodies_run_in_order() {
    for _ in 0..100 {
        // GIVEN: H1 then H2, both doing their work inside the future
        let registry = DispatchRegistry::new();
        let log = call_log();
        let _h1 = registry.subscribe(Discriminant::LoadRoute, async_route_handler("H1", log.clone()));
        let _h2 = registry.subscribe(Discriminant::LoadRoute, async_route_handler("H2", log.clone()));

        // WHEN: Two frames are delivered from a worker task, as the reader does
        let reader = registry.clone();
        tokio::spawn(async move {
            reader.deliver(load_route("/a"));
            reader.deliver(load_route("/b"));
        })
        .await
        .unwrap();

        // THEN: Bodies ran per frame, in registration order
        assert_eq!(entries(&log), vec!["H1/a", "H2/a", "H1/b", "H2/b"]);
    }
}

#[test]
fn given_registered_handlers_when_cleared_or_unregistered_then_counts_drop() {
    let registry = DispatchRegistry::new();
    let id = registry.register(Discriminant::LoadRoute, recording_handler("H1", call_log()));
    let _other = registry.subscribe(Discriminant::WarnUser, recording_handler("W", call_log()));

    registry.unregister(id);
    registry.unregister(id);
    assert_eq!(registry.subscriber_count(Discriminant::LoadRoute), 0);
    assert_eq!(registry.subscriber_count(Discriminant::WarnUser), 1);

    registry.clear();
    assert_eq!(registry.subscriber_count(Discriminant::WarnUser), 0);
}
