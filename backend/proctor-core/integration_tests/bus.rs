use crate::helpers::{
    TestBridge, WAIT, bus_for, connect, push_text, receive_json, wait_for_state,
};

use proctor_core::connection::ConnectionState;
use proctor_core::envelope::{AppType, LoadRoute, OpenApp, QuitApp, WarnUser};
use proctor_core::error::HandlerError;

use std::future::ready;

use futures_util::StreamExt;
use serde_json::json;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;

/// **VALUE**: Verifies a frame pushed by the bridge reaches a typed subscriber.
///
/// **WHY THIS MATTERS**: This is the whole inbound path: socket, reader task,
/// decode, dispatch.
///
/// **BUG THIS CATCHES**: Would catch the reader task never being spawned, or
/// text frames being ignored.
#[tokio::test]
async fn given_open_bus_when_bridge_pushes_load_route_then_subscriber_receives_it() {
    // GIVEN: A connected bus with a LoadRoute subscriber
    let bridge = TestBridge::start().await;
    let bus = bus_for(&bridge.url);
    let (routes, mut received) = mpsc::unbounded_channel();
    let _subscription = bus.subscribe(move |payload: LoadRoute| {
        let _ = routes.send(payload.route);
        ready(Ok::<(), HandlerError>(()))
    });
    let mut side = connect(&bus, &bridge).await;
    assert_eq!(bus.state(), ConnectionState::Open);

    // WHEN: The bridge pushes LoadRoute "/tests"
    push_text(&mut side, r#"{"Typ":"LoadRoute","Val":{"Route":"/tests"}}"#).await;

    // THEN: The subscriber got the route
    let route = timeout(WAIT, received.recv()).await.unwrap().unwrap();
    assert_eq!(route, "/tests");
}

/// **VALUE**: Verifies the bridge's native frame form is accepted end to end.
#[tokio::test]
async fn given_open_bus_when_bridge_pushes_native_frame_then_subscriber_receives_it() {
    let bridge = TestBridge::start().await;
    let bus = bus_for(&bridge.url);
    let (messages, mut received) = mpsc::unbounded_channel();
    let _subscription = bus.subscribe(move |payload: WarnUser| {
        let _ = messages.send(payload.message);
        ready(Ok::<(), HandlerError>(()))
    });
    let mut side = connect(&bus, &bridge).await;

    push_text(&mut side, r#"{"Typ":5,"Val":"{\"Message\":\"eyes front\"}"}"#).await;

    let message = timeout(WAIT, received.recv()).await.unwrap().unwrap();
    assert_eq!(message, "eyes front");
}

/// **VALUE**: Verifies outbound frames arrive as JSON text, in send order.
///
/// **WHY THIS MATTERS**: OpenApp followed by QuitApp must not be reordered,
/// or the bridge closes the app it was just asked to open.
#[tokio::test]
async fn given_open_bus_when_sending_then_bridge_receives_frames_in_order() {
    // GIVEN: A connected bus
    let bridge = TestBridge::start().await;
    let bus = bus_for(&bridge.url);
    let mut side = connect(&bus, &bridge).await;

    // WHEN: Sending OpenApp then QuitApp
    bus.send(OpenApp {
        app_type: AppType::Docx,
        test_id: String::from("t-1"),
    })
    .unwrap();
    bus.send(QuitApp {}).unwrap();

    // THEN: The bridge sees both, in that order, in wire form
    assert_eq!(
        receive_json(&mut side).await,
        json!({"Typ": "OpenApp", "Val": {"Typ": 1, "TestId": "t-1"}})
    );
    assert_eq!(
        receive_json(&mut side).await,
        json!({"Typ": "QuitApp", "Val": {}})
    );
}

/// **VALUE**: Verifies a bad frame is dropped and the connection survives.
///
/// **BUG THIS CATCHES**: Would catch the reader loop ending on a decode error,
/// which would silently deafen the client.
#[tokio::test]
async fn given_open_bus_when_bad_frame_precedes_good_frame_then_good_frame_is_delivered() {
    // GIVEN: A connected bus with a LoadRoute subscriber
    let bridge = TestBridge::start().await;
    let bus = bus_for(&bridge.url);
    let (routes, mut received) = mpsc::unbounded_channel();
    let _subscription = bus.subscribe(move |payload: LoadRoute| {
        let _ = routes.send(payload.route);
        ready(Ok::<(), HandlerError>(()))
    });
    let mut side = connect(&bus, &bridge).await;

    // WHEN: Garbage, an unknown kind, then a valid frame arrive
    push_text(&mut side, "definitely not json").await;
    push_text(&mut side, r#"{"Typ":"Bogus","Val":{}}"#).await;
    push_text(&mut side, r#"{"Typ":"LoadRoute","Val":{"Route":"/end"}}"#).await;

    // THEN: Only the valid one is delivered and the bus is still open
    let route = timeout(WAIT, received.recv()).await.unwrap().unwrap();
    assert_eq!(route, "/end");
    assert!(received.try_recv().is_err());
    assert_eq!(bus.state(), ConnectionState::Open);
}

/// **VALUE**: Verifies connection loss is observable and refuses further sends.
///
/// **WHY THIS MATTERS**: The offline toast and every send caller rely on the
/// state leaving `Open` when the bridge dies.
///
/// **BUG THIS CATCHES**: Would catch the state staying `Open` after the
/// reader sees end of stream.
#[tokio::test]
async fn given_open_bus_when_bridge_drops_then_state_is_disconnected_and_send_fails() {
    // GIVEN: A connected bus
    let bridge = TestBridge::start().await;
    let bus = bus_for(&bridge.url);
    let side = connect(&bus, &bridge).await;

    // WHEN: The bridge goes away without a close handshake
    drop(side);

    // THEN: Disconnected, and sends fail with NotOpen
    wait_for_state(&bus, ConnectionState::Disconnected).await;
    let error = bus.send(QuitApp {}).unwrap_err();
    assert!(error.is_not_open());
}

#[tokio::test]
async fn given_lost_connection_when_connecting_again_then_bus_is_open() {
    let bridge = TestBridge::start().await;
    let bus = bus_for(&bridge.url);
    let side = connect(&bus, &bridge).await;
    drop(side);
    wait_for_state(&bus, ConnectionState::Disconnected).await;

    let mut side = connect(&bus, &bridge).await;

    assert_eq!(bus.state(), ConnectionState::Open);
    bus.send(QuitApp {}).unwrap();
    assert_eq!(
        receive_json(&mut side).await,
        json!({"Typ": "QuitApp", "Val": {}})
    );
}

/// **VALUE**: Verifies `connect` is idempotent while open or connecting.
///
/// **WHY THIS MATTERS**: Every screen may call `connect()` on mount; a second
/// socket would double every inbound message.
#[tokio::test]
async fn given_concurrent_and_repeated_connects_when_awaited_then_one_connection_exists() {
    // GIVEN: A bridge
    let bridge = TestBridge::start().await;
    let bus = bus_for(&bridge.url);

    // WHEN: Two connects race, then a third runs while open
    let (first, second, mut side) = tokio::join!(bus.connect(), bus.connect(), bridge.accept());
    let third = bus.connect().await;

    // THEN: All succeed over the one accepted connection
    first.unwrap();
    second.unwrap();
    third.unwrap();
    assert_eq!(bus.state(), ConnectionState::Open);

    bus.send(QuitApp {}).unwrap();
    assert_eq!(
        receive_json(&mut side).await,
        json!({"Typ": "QuitApp", "Val": {}})
    );
}

/// **VALUE**: Verifies `close` sends a close frame and ends in `Closed`.
#[tokio::test]
async fn given_open_bus_when_closed_then_bridge_sees_close_and_state_is_closed() {
    // GIVEN: A connected bus
    let bridge = TestBridge::start().await;
    let bus = bus_for(&bridge.url);
    let mut side = connect(&bus, &bridge).await;

    // WHEN: Closing
    bus.close().await;

    // THEN: Closed locally, close frame (or end of stream) on the bridge side
    assert_eq!(bus.state(), ConnectionState::Closed);
    let next = timeout(WAIT, side.next()).await.unwrap();
    assert!(matches!(next, Some(Ok(Message::Close(_))) | None | Some(Err(_))));
    assert!(bus.send(QuitApp {}).unwrap_err().is_not_open());
}

#[tokio::test]
async fn given_unreachable_bridge_when_connecting_then_error_and_disconnected() {
    let bridge = TestBridge::start().await;
    let url = bridge.url.clone();
    drop(bridge);
    let bus = bus_for(&url);

    let result = bus.connect().await;

    assert!(result.is_err());
    assert_eq!(bus.state(), ConnectionState::Disconnected);
}
