use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The signed-in candidate, as returned by `/get-user`.
///
/// Only `Id` is needed for a submission; the rest is kept as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "Id")]
    pub id: String,

    #[serde(flatten)]
    pub details: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestInfo {
    #[serde(rename = "Type")]
    pub test_type: String,
}

/// Body of `POST /submit-test`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TestSubmission {
    pub test_id: String,
    pub user_id: String,
    pub test_info: TestInfo,
}
