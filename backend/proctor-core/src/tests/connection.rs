use crate::connection::{ConnectionManager, ConnectionState};
use crate::dispatch::DispatchRegistry;
use crate::envelope::Discriminant;
use crate::error::connection::ConnectionError;
use crate::tests::support::{call_log, entries, recording_handler};

use std::net::TcpListener;
use std::time::Duration;

use url::Url;

fn manager_for(url: &str, registry: DispatchRegistry) -> ConnectionManager {
    ConnectionManager::new(Url::parse(url).unwrap(), Duration::from_secs(2), registry)
}

/// A loopback URL nothing is listening on.
fn unreachable_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("ws://127.0.0.1:{port}/ws")
}

#[test]
fn given_connection_states_when_queried_then_only_open_is_open() {
    assert!(ConnectionState::Open.is_open());
    assert!(!ConnectionState::Connecting.is_open());
    assert!(ConnectionState::Disconnected.can_dial());
    assert!(ConnectionState::Closed.can_dial());
    assert!(!ConnectionState::Connecting.can_dial());
    assert!(!ConnectionState::Open.can_dial());
    assert_eq!(ConnectionState::Disconnected.to_string(), "disconnected");
}

/// **VALUE**: Verifies a send that loses the race with a dying writer reports
/// the state callers can observe.
///
/// **BUG THIS CATCHES**: Would catch `NotOpen` claiming `Disconnected` while
/// `state()` still reads `Open`, leaving logs and callers disagreeing.
#[tokio::test]
async fn given_open_state_with_dead_writer_when_sending_then_not_open_reports_observed_state() {
    // GIVEN: State is Open but the writer queue is closed
    let manager = manager_for("ws://127.0.0.1:9753/ws", DispatchRegistry::new());
    manager.open_with_dead_writer();

    // WHEN: Sending a frame
    let result = manager.send(String::from(r#"{"Typ":"QuitApp","Val":{}}"#));

    // THEN: NotOpen carries the same state `state()` returns
    assert_eq!(manager.state(), ConnectionState::Open);
    assert!(matches!(
        result,
        Err(ConnectionError::NotOpen {
            state: ConnectionState::Open,
            ..
        })
    ));
}

/// **VALUE**: Verifies a fresh manager starts disconnected and refuses sends.
///
/// **WHY THIS MATTERS**: Screens may send before the bridge is reachable; the
/// caller must learn the message was not delivered.
///
/// **BUG THIS CATCHES**: Would catch buffering frames for a connection that
/// does not exist yet.
#[test]
fn given_new_manager_when_sending_then_not_open_with_disconnected_state() {
    // GIVEN: A manager that never connected
    let manager = manager_for("ws://127.0.0.1:9753/ws", DispatchRegistry::new());

    // WHEN: Sending a frame
    let result = manager.send(String::from(r#"{"Typ":"QuitApp","Val":{}}"#));

    // THEN: NotOpen, reporting the current state
    assert_eq!(manager.state(), ConnectionState::Disconnected);
    assert!(matches!(
        result,
        Err(ConnectionError::NotOpen {
            state: ConnectionState::Disconnected,
            ..
        })
    ));
}

/// **VALUE**: Verifies a failed dial reports EstablishFailed and resets the state.
///
/// **WHY THIS MATTERS**: A later `connect()` must be able to retry; a state
/// stuck in `Connecting` would make every retry wait forever.
#[tokio::test]
async fn given_unreachable_bridge_when_connecting_then_establish_failed_and_disconnected() {
    // GIVEN: A URL nobody listens on
    let manager = manager_for(&unreachable_url(), DispatchRegistry::new());

    // WHEN: Connecting
    let result = manager.connect().await;

    // THEN: The attempt fails and the state is back to Disconnected
    assert!(matches!(result, Err(ConnectionError::EstablishFailed { .. })));
    assert_eq!(manager.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn given_no_live_connection_when_closed_then_state_is_closed_and_sends_fail() {
    let manager = manager_for("ws://127.0.0.1:9753/ws", DispatchRegistry::new());
    let mut states = manager.watch_state();

    manager.close().await;

    assert_eq!(manager.state(), ConnectionState::Closed);
    assert!(states.has_changed().unwrap());
    assert_eq!(*states.borrow_and_update(), ConnectionState::Closed);
    assert!(matches!(
        manager.send(String::from("{}")),
        Err(ConnectionError::NotOpen {
            state: ConnectionState::Closed,
            ..
        })
    ));
}

/// **VALUE**: Verifies inbound frames are decoded then delivered, and bad
/// frames are dropped without disturbing later ones.
///
/// **BUG THIS CATCHES**: Would catch a decode error propagating out of the
/// read path and ending it.
#[tokio::test]
async fn given_bad_then_good_frame_when_ingested_then_only_good_frame_is_delivered() {
    // GIVEN: A subscriber to LoadRoute
    let registry = DispatchRegistry::new();
    let log = call_log();
    let _subscription =
        registry.subscribe(Discriminant::LoadRoute, recording_handler("route", log.clone()));
    let manager = manager_for("ws://127.0.0.1:9753/ws", registry);

    // WHEN: Ingesting garbage, an unknown kind, then a valid frame
    manager.ingest(b"{{{ not json");
    manager.ingest(br#"{"Typ":"Bogus","Val":{}}"#);
    manager.ingest(br#"{"Typ":"LoadRoute","Val":{"Route":"/tests"}}"#);

    // THEN: Exactly one delivery
    assert_eq!(entries(&log), vec!["route"]);
}

#[test]
fn given_manager_when_url_queried_then_configured_url_is_returned() {
    let manager = manager_for("ws://127.0.0.1:9753/ws", DispatchRegistry::new());

    assert_eq!(manager.url().as_str(), "ws://127.0.0.1:9753/ws");
}
