use crate::HttpStatusCode;

/// **VALUE**: Verifies that 400 is recognised as the "test never opened" signal.
///
/// **WHY THIS MATTERS**: The submit flow halts on exactly this status. Treating
/// it as a generic client error would hide the user-facing warning.
#[test]
fn given_400_when_categorized_then_is_bad_request_and_client_error() {
    let status = HttpStatusCode::from(400);

    assert!(status.is_bad_request());
    assert!(status.is_client_error());
    assert!(!status.is_success());
    assert!(!status.is_server_error());
}

#[test]
fn given_2xx_and_5xx_when_categorized_then_ranges_do_not_overlap() {
    assert!(HttpStatusCode(204).is_success());
    assert!(!HttpStatusCode(204).is_bad_request());

    assert!(HttpStatusCode(503).is_server_error());
    assert!(!HttpStatusCode(503).is_client_error());
    assert!(!HttpStatusCode(404).is_bad_request());
}
