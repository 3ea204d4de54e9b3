//! HTTP status categorization for the request/response collaborators.

use std::fmt::{Display, Formatter, Result as FormatResult};

/// Status code returned by one of the exam server endpoints.
///
/// Carried inside errors as a number rather than parsed back out of messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpStatusCode(pub u16);

impl HttpStatusCode {
    pub const BAD_REQUEST: HttpStatusCode = HttpStatusCode(400);

    /// 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.0)
    }

    /// 400 is how `/submit-test` reports a test that was never opened.
    pub fn is_bad_request(&self) -> bool {
        *self == Self::BAD_REQUEST
    }

    /// 4xx client errors.
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.0)
    }

    /// 5xx server errors.
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.0)
    }
}

impl From<u16> for HttpStatusCode {
    fn from(code: u16) -> Self {
        HttpStatusCode(code)
    }
}

impl Display for HttpStatusCode {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        write!(formatter, "{}", self.0)
    }
}
