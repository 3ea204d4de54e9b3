use crate::helpers::{RecordingNotifier, TestBridge, bus_for, connect, wait_for_state};

use proctor_core::connection::ConnectionState;
use proctor_core::shell::{Notifier, OfflineMonitor, ToastVariant};

use std::sync::Arc;

/// **VALUE**: Verifies the candidate is told when the bridge goes away and
/// when it comes back.
///
/// **WHY THIS MATTERS**: Without the bridge, app launches and submissions
/// silently fail; the candidate needs to know to stop and wait.
///
/// **BUG THIS CATCHES**: Would catch the monitor reacting to the initial
/// `Disconnected` state (a toast before the first connect) or never firing
/// the "back online" toast.
#[tokio::test]
async fn given_monitored_bus_when_bridge_drops_and_returns_then_offline_and_online_toasts() {
    // GIVEN: A monitored, connected bus
    let bridge = TestBridge::start().await;
    let bus = bus_for(&bridge.url);
    let notifier = Arc::new(RecordingNotifier::default());
    let monitor = OfflineMonitor::spawn(&bus, notifier.clone() as Arc<dyn Notifier>);
    let side = connect(&bus, &bridge).await;
    tokio::task::yield_now().await;

    // WHEN: The bridge drops
    drop(side);
    wait_for_state(&bus, ConnectionState::Disconnected).await;

    // THEN: One destructive offline toast
    let toasts = notifier.wait_for_toasts(1).await;
    assert_eq!(toasts.len(), 1);
    assert_eq!(toasts[0].variant, ToastVariant::Destructive);
    assert_eq!(toasts[0].title, "You are offline");

    // WHEN: The bridge comes back
    let _side = connect(&bus, &bridge).await;

    // THEN: A default "back online" toast follows
    let toasts = notifier.wait_for_toasts(2).await;
    assert_eq!(toasts[1].variant, ToastVariant::Default);
    assert_eq!(toasts[1].title, "Back online");

    monitor.stop();
}

#[tokio::test]
async fn given_monitored_bus_when_closed_on_purpose_then_no_offline_toast() {
    let bridge = TestBridge::start().await;
    let bus = bus_for(&bridge.url);
    let notifier = Arc::new(RecordingNotifier::default());
    let monitor = OfflineMonitor::spawn(&bus, notifier.clone() as Arc<dyn Notifier>);
    let _side = connect(&bus, &bridge).await;

    bus.close().await;
    tokio::task::yield_now().await;

    assert_eq!(bus.state(), ConnectionState::Closed);
    assert!(notifier.toasts().is_empty());
    monitor.stop();
}
