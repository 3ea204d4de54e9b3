//! Actions available on a document test: open its app, force-close it,
//! and submit the work.

use crate::bus::Bus;
use crate::envelope::{AppType, OpenApp, QuitApp};
use crate::error::submission::SubmissionError;
use crate::error::workflow::WorkflowError;
use crate::shell::{Notifier, Toast};
use crate::submission::{SubmissionClient, TestInfo, TestSubmission};

use common::ErrorLocation;

use std::panic::Location;

use log::{info, warn};
use serde::{Deserialize, Serialize};

const NOT_OPENED_TITLE: &str = "Failed to submit test";
const NOT_OPENED_DESCRIPTION: &str = "Please at least open the test first!";

/// A test as listed by the exam server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Test {
    pub id: String,
    pub test_name: String,
    #[serde(rename = "Type")]
    pub test_type: String,
    pub file_path: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Submitted,
    /// The server refused the submission because the test was never opened.
    /// The candidate has been told; the test must not be finished.
    NotOpened,
}

/// Map a test's document type to the app that edits it.
pub fn app_type_for(test_type: &str) -> Option<AppType> {
    match test_type.to_ascii_lowercase().as_str() {
        "docx" => Some(AppType::Docx),
        "xlsx" => Some(AppType::Xlsx),
        "pptx" => Some(AppType::Pptx),
        "txt" => Some(AppType::Txt),
        _ => None,
    }
}

/// Ask the bridge to launch the app for `test`.
#[track_caller]
pub fn open_associated_app(bus: &Bus, test: &Test) -> Result<(), WorkflowError> {
    let app_type =
        app_type_for(&test.test_type).ok_or_else(|| WorkflowError::UnsupportedTestType {
            test_type: test.test_type.clone(),
            location: ErrorLocation::from(Location::caller()),
        })?;

    bus.send(OpenApp {
        app_type,
        test_id: test.id.clone(),
    })?;

    info!("Requested {:?} for test {}", app_type, test.id);
    Ok(())
}

#[track_caller]
pub fn force_close_app(bus: &Bus) -> Result<(), WorkflowError> {
    bus.send(QuitApp {})?;
    info!("Requested force close of the test app");
    Ok(())
}

/// Submit the candidate's work on `test`.
///
/// # Errors
///
/// Returns [`WorkflowError::Submission`] for any failure other than the
/// server reporting the test as never opened, which is
/// [`SubmitOutcome::NotOpened`] instead.
pub async fn submit_work(
    client: &SubmissionClient,
    test: &Test,
    notifier: &dyn Notifier,
) -> Result<SubmitOutcome, WorkflowError> {
    let user = client.get_user().await?;

    let submission = TestSubmission {
        test_id: test.id.clone(),
        user_id: user.id,
        test_info: TestInfo {
            test_type: test.test_type.clone(),
        },
    };

    match client.submit_test(&submission).await {
        Ok(()) => {
            info!("Test {} submitted", test.id);
            Ok(SubmitOutcome::Submitted)
        }
        Err(SubmissionError::TestNotOpened { .. }) => {
            warn!("Test {} was not opened before submitting", test.id);
            notifier.notify(Toast::destructive(NOT_OPENED_TITLE, NOT_OPENED_DESCRIPTION));
            Ok(SubmitOutcome::NotOpened)
        }
        Err(e) => Err(e.into()),
    }
}
