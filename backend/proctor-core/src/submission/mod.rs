//! HTTP client for the exam server's candidate endpoints.

pub mod models;

pub use models::{TestInfo, TestSubmission, User};

use crate::error::submission::SubmissionError;

use common::{ErrorLocation, HttpStatusCode};

use std::panic::Location;
use std::time::Duration;

use log::{debug, error, warn};
use reqwest::{Client, Response};
use serde_json::Value;
use url::Url;

const DEFAULT_TIMEOUT_DURATION: Duration = Duration::from_secs(30);
const GET_USER_ENDPOINT: &str = "get-user";
const SUBMIT_TEST_ENDPOINT: &str = "submit-test";

#[derive(Clone)]
pub struct SubmissionClient {
    base_url: Url,
    client: Client,
}

impl SubmissionClient {
    /// # Errors
    ///
    /// Returns [`SubmissionError::UrlParse`] for an unparseable base URL and
    /// [`SubmissionError::Http`] if the HTTP client cannot be built.
    #[track_caller]
    pub fn new(base_url_str: &str) -> Result<Self, SubmissionError> {
        // `Url::join` drops the last path segment unless it ends in '/'.
        let base_url = if base_url_str.ends_with('/') {
            Url::parse(base_url_str)?
        } else {
            Url::parse(&format!("{base_url_str}/"))?
        };
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT_DURATION)
            .build()?;

        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub async fn get_user(&self) -> Result<User, SubmissionError> {
        let url = self.base_url.join(GET_USER_ENDPOINT)?;

        let response = self.client.get(url).send().await?;
        let response = ensure_success(response).await?;

        let json: Value = response.json().await?;
        let user: User = serde_json::from_value(json)?;

        debug!("Fetched user {}", user.id);
        Ok(user)
    }

    /// Submit a finished test.
    ///
    /// # Errors
    ///
    /// Returns [`SubmissionError::TestNotOpened`] when the server answers
    /// 400, which it does for a test whose app was never opened, and
    /// [`SubmissionError::Server`] for any other non-success status.
    pub async fn submit_test(&self, submission: &TestSubmission) -> Result<(), SubmissionError> {
        let url = self.base_url.join(SUBMIT_TEST_ENDPOINT)?;

        let response = self.client.post(url).json(submission).send().await?;

        if HttpStatusCode::from(response.status().as_u16()).is_bad_request() {
            warn!(
                "Submission of test {} rejected: test not opened",
                submission.test_id
            );
            return Err(SubmissionError::TestNotOpened {
                test_id: submission.test_id.clone(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        ensure_success(response).await?;

        debug!("Submitted test {}", submission.test_id);
        Ok(())
    }
}

async fn ensure_success(response: Response) -> Result<Response, SubmissionError> {
    let status = HttpStatusCode::from(response.status().as_u16());
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = if !body.trim().is_empty() {
        body
    } else if status.is_server_error() {
        String::from("exam server failed to handle the request")
    } else if status.is_client_error() {
        String::from("exam server rejected the request")
    } else {
        format!("unexpected status {status}")
    };

    if status.is_server_error() {
        error!("Exam server error {status}: {message}");
    } else {
        warn!("Exam server answered {status}: {message}");
    }

    Err(SubmissionError::Server {
        status,
        message,
        location: ErrorLocation::from(Location::caller()),
    })
}
