use crate::ErrorLocation;

use std::panic::Location;

/// **VALUE**: Verifies that `#[track_caller]` helpers report their caller's line.
///
/// **WHY THIS MATTERS**: Every error variant in the workspace embeds an
/// `ErrorLocation`. If propagation breaks, all errors point at the constructor
/// instead of the failing operation.
///
/// **BUG THIS CATCHES**: Would catch if `ErrorLocation::from` stopped taking the
/// `&'static Location` handed in by `Location::caller()`.
#[test]
fn given_two_call_sites_when_capturing_location_then_lines_differ_by_one() {
    // GIVEN: A helper that captures its caller
    #[track_caller]
    fn capture() -> ErrorLocation {
        ErrorLocation::from(Location::caller())
    }

    // WHEN: Capturing from consecutive lines
    let first = capture();
    let second = capture();

    // THEN: Same file, sequential lines
    assert_eq!(first.file, second.file);
    assert!(first.file.contains("error_location.rs"));
    assert_eq!(first.line + 1, second.line);
    assert!(first.column > 0);
}

/// **VALUE**: Verifies the `[file:line:column]` display format used in error messages.
///
/// **BUG THIS CATCHES**: Would catch a Display change that drops brackets or fields.
#[test]
fn given_error_location_when_formatted_then_produces_bracketed_format() {
    // GIVEN: A fixed location
    let location = ErrorLocation {
        file: "src/bus/mod.rs",
        line: 42,
        column: 7,
    };

    // WHEN / THEN
    assert_eq!(location.to_string(), "[src/bus/mod.rs:42:7]");
}
