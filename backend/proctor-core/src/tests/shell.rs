use crate::bus::Bus;
use crate::config::BusConfig;
use crate::envelope::Discriminant;
use crate::shell::{EventShell, Navigator, Notifier, Toast, ToastVariant};
use crate::tests::support::{RecordingNavigator, RecordingNotifier};

use std::sync::Arc;

fn installed() -> (Bus, EventShell, Arc<RecordingNotifier>, Arc<RecordingNavigator>) {
    let bus = Bus::new(&BusConfig::default()).unwrap();
    let notifier = Arc::new(RecordingNotifier::default());
    let navigator = Arc::new(RecordingNavigator::default());
    let shell = EventShell::install(
        &bus,
        notifier.clone() as Arc<dyn Notifier>,
        navigator.clone() as Arc<dyn Navigator>,
    );
    (bus, shell, notifier, navigator)
}

#[test]
fn given_toast_constructors_when_called_then_variant_matches() {
    let plain = Toast::new("Back online", "Connected");
    let loud = Toast::destructive("Error", "Word is not installed");

    assert_eq!(plain.variant, ToastVariant::Default);
    assert_eq!(loud.variant, ToastVariant::Destructive);
    assert_eq!(loud.title, "Error");
    assert_eq!(loud.description, "Word is not installed");
}

/// **VALUE**: Verifies the root shell navigates on LoadRoute.
///
/// **WHY THIS MATTERS**: The bridge drives the whole screen flow (login,
/// instructions, tests, end) through LoadRoute.
#[tokio::test]
async fn given_installed_shell_when_load_route_arrives_then_navigator_is_called() {
    // GIVEN: An installed shell
    let (bus, _shell, notifier, navigator) = installed();

    // WHEN: LoadRoute "/tests" arrives
    bus.connection()
        .ingest(br#"{"Typ":"LoadRoute","Val":{"Route":"/tests"}}"#);

    // THEN: The navigator moved, no toast was shown
    assert_eq!(navigator.routes(), vec![String::from("/tests")]);
    assert!(notifier.toasts().is_empty());
}

/// **VALUE**: Verifies each problem report becomes the right toast.
///
/// **BUG THIS CATCHES**: Would catch ExeNotFound showing `Name` instead of
/// `ErrMsg`, or WarnUser being titled "Error".
#[tokio::test]
async fn given_installed_shell_when_problem_reports_arrive_then_destructive_toasts_are_shown() {
    // GIVEN: An installed shell
    let (bus, _shell, notifier, _navigator) = installed();

    // WHEN: ExeNotFound, Err and WarnUser arrive
    bus.connection().ingest(
        br#"{"Typ":"ExeNotFound","Val":{"Name":"EXCEL.EXE","ErrMsg":"Excel is not installed"}}"#,
    );
    bus.connection()
        .ingest(br#"{"Typ":"Err","Val":{"Message":"database unavailable"}}"#);
    bus.connection()
        .ingest(br#"{"Typ":"WarnUser","Val":{"Message":"Do not leave the window"}}"#);

    // THEN: Three destructive toasts, in arrival order
    assert_eq!(
        notifier.toasts(),
        vec![
            Toast::destructive("Error", "Excel is not installed"),
            Toast::destructive("Error", "database unavailable"),
            Toast::destructive("Warning", "Do not leave the window"),
        ]
    );
}

/// **VALUE**: Verifies teardown removes every handler the shell installed.
///
/// **WHY THIS MATTERS**: Remounting the root screen must not double every toast.
#[tokio::test]
async fn given_installed_shell_when_torn_down_then_messages_are_ignored() {
    // GIVEN: An installed shell
    let (bus, shell, notifier, navigator) = installed();
    assert_eq!(shell.subscription_count(), 4);
    assert_eq!(bus.registry().subscriber_count(Discriminant::LoadRoute), 1);

    // WHEN: Tearing it down and delivering traffic
    shell.teardown();
    bus.connection()
        .ingest(br#"{"Typ":"LoadRoute","Val":{"Route":"/end"}}"#);
    bus.connection()
        .ingest(br#"{"Typ":"WarnUser","Val":{"Message":"ignored"}}"#);

    // THEN: Nothing reacts
    for discriminant in [
        Discriminant::ExeNotFound,
        Discriminant::LoadRoute,
        Discriminant::Err,
        Discriminant::WarnUser,
    ] {
        assert_eq!(bus.registry().subscriber_count(discriminant), 0);
    }
    assert!(navigator.routes().is_empty());
    assert!(notifier.toasts().is_empty());
}
