use crate::helpers::RecordingNotifier;

use proctor_core::error::{SubmissionError, WorkflowError};
use proctor_core::shell::{Toast, ToastVariant};
use proctor_core::submission::{SubmissionClient, TestInfo, TestSubmission};
use proctor_core::workflow::{SubmitOutcome, Test, submit_work};

use common::HttpStatusCode;

use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn spreadsheet_test() -> Test {
    Test {
        id: String::from("t-9"),
        test_name: String::from("Budget sheet"),
        test_type: String::from("xlsx"),
        file_path: String::from("/static/t-9.png"),
    }
}

async fn mount_user(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/get-user"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"Id": "u-1", "Name": "Ada"})),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn given_user_endpoint_when_fetching_user_then_id_and_details_are_parsed() {
    let server = MockServer::start().await;
    mount_user(&server).await;
    let client = SubmissionClient::new(&server.uri()).unwrap();

    let user = client.get_user().await.unwrap();

    assert_eq!(user.id, "u-1");
    assert_eq!(user.details.get("Name"), Some(&json!("Ada")));
}

#[tokio::test]
async fn given_user_endpoint_returning_garbage_when_fetching_user_then_json_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/get-user"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;
    let client = SubmissionClient::new(&server.uri()).unwrap();

    let result = client.get_user().await;

    assert!(matches!(result, Err(SubmissionError::Json { .. })));
}

/// **VALUE**: Verifies the submission body matches what the exam server reads.
///
/// **BUG THIS CATCHES**: Would catch `TestInfo.Type` being serialized as
/// `TestType`, which the server would reject as an unopened test.
#[tokio::test]
async fn given_accepting_server_when_submitting_work_then_submitted_with_expected_body() {
    // GIVEN: A server that knows the user and accepts this exact body
    let server = MockServer::start().await;
    mount_user(&server).await;
    Mock::given(method("POST"))
        .and(path("/submit-test"))
        .and(body_json(json!({
            "TestId": "t-9",
            "UserId": "u-1",
            "TestInfo": {"Type": "xlsx"}
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    let client = SubmissionClient::new(&server.uri()).unwrap();
    let notifier = RecordingNotifier::default();

    // WHEN: Submitting
    let outcome = submit_work(&client, &spreadsheet_test(), &notifier)
        .await
        .unwrap();

    // THEN: Submitted, nothing shown
    assert_eq!(outcome, SubmitOutcome::Submitted);
    assert!(notifier.toasts().is_empty());
}

/// **VALUE**: Verifies a 400 halts the flow with the "open it first" toast.
///
/// **WHY THIS MATTERS**: The caller must not finish the test; the candidate
/// must be told why the submission did not go through.
///
/// **BUG THIS CATCHES**: Would catch a 400 being treated as success (test
/// finished with no work saved) or as a generic error with no toast.
#[tokio::test]
async fn given_unopened_test_when_submitting_work_then_not_opened_and_toast_shown() {
    // GIVEN: A server that rejects the submission with 400
    let server = MockServer::start().await;
    mount_user(&server).await;
    Mock::given(method("POST"))
        .and(path("/submit-test"))
        .respond_with(ResponseTemplate::new(400))
        .mount(&server)
        .await;
    let client = SubmissionClient::new(&server.uri()).unwrap();
    let notifier = RecordingNotifier::default();

    // WHEN: Submitting
    let outcome = submit_work(&client, &spreadsheet_test(), &notifier)
        .await
        .unwrap();

    // THEN: NotOpened plus the destructive toast
    assert_eq!(outcome, SubmitOutcome::NotOpened);
    assert_eq!(
        notifier.toasts(),
        vec![Toast::destructive(
            "Failed to submit test",
            "Please at least open the test first!"
        )]
    );
    assert_eq!(notifier.toasts()[0].variant, ToastVariant::Destructive);
}

#[tokio::test]
async fn given_rejecting_server_when_submitting_directly_then_test_not_opened_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/submit-test"))
        .respond_with(ResponseTemplate::new(400))
        .mount(&server)
        .await;
    let client = SubmissionClient::new(&server.uri()).unwrap();
    let submission = TestSubmission {
        test_id: String::from("t-9"),
        user_id: String::from("u-1"),
        test_info: TestInfo {
            test_type: String::from("xlsx"),
        },
    };

    let result = client.submit_test(&submission).await;

    match result {
        Err(SubmissionError::TestNotOpened { test_id, .. }) => assert_eq!(test_id, "t-9"),
        other => panic!("expected TestNotOpened, got {other:?}"),
    }
}

#[tokio::test]
async fn given_failing_server_when_submitting_work_then_server_error_is_returned() {
    let server = MockServer::start().await;
    mount_user(&server).await;
    Mock::given(method("POST"))
        .and(path("/submit-test"))
        .respond_with(ResponseTemplate::new(500).set_body_string("database down"))
        .mount(&server)
        .await;
    let client = SubmissionClient::new(&server.uri()).unwrap();
    let notifier = RecordingNotifier::default();

    let result = submit_work(&client, &spreadsheet_test(), &notifier).await;

    match result {
        Err(WorkflowError::Submission(SubmissionError::Server {
            status, message, ..
        })) => {
            assert_eq!(status, HttpStatusCode(500));
            assert_eq!(message, "database down");
        }
        other => panic!("expected Server error, got {other:?}"),
    }
    assert!(notifier.toasts().is_empty());
}

/// **VALUE**: Verifies an empty error body still yields a message that
/// says which side failed.
///
/// **BUG THIS CATCHES**: Would catch a 5xx or 4xx with no body surfacing as
/// a `Server` error with an empty message.
#[tokio::test]
async fn given_error_status_with_empty_body_when_requesting_then_message_names_the_category() {
    // GIVEN: A 503 on /get-user and a 404 on /submit-test, both without a body
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/get-user"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/submit-test"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    let client = SubmissionClient::new(&server.uri()).unwrap();
    let submission = TestSubmission {
        test_id: String::from("t-9"),
        user_id: String::from("u-1"),
        test_info: TestInfo {
            test_type: String::from("xlsx"),
        },
    };

    // WHEN: Calling both endpoints
    let user_result = client.get_user().await;
    let submit_result = client.submit_test(&submission).await;

    // THEN: The message names the failing side
    match user_result {
        Err(SubmissionError::Server { status, message, .. }) => {
            assert_eq!(status, HttpStatusCode(503));
            assert_eq!(message, "exam server failed to handle the request");
        }
        other => panic!("expected Server error, got {other:?}"),
    }
    match submit_result {
        Err(SubmissionError::Server { status, message, .. }) => {
            assert_eq!(status, HttpStatusCode(404));
            assert_eq!(message, "exam server rejected the request");
        }
        other => panic!("expected Server error, got {other:?}"),
    }
}

#[tokio::test]
async fn given_base_url_with_path_when_requesting_then_path_is_kept() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/get-user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Id": "u-2"})))
        .mount(&server)
        .await;
    let client = SubmissionClient::new(&format!("{}/api", server.uri())).unwrap();

    let user = client.get_user().await.unwrap();

    assert_eq!(user.id, "u-2");
    assert_eq!(client.base_url().path(), "/api/");
}
