//! Payload shapes, one per [`Discriminant`](super::Discriminant).
//!
//! Field names follow the backend's exported (PascalCase) struct fields.

use common::RedactedSecret;

use serde::{Deserialize, Serialize};

/// Office application the desktop bridge should launch.
///
/// Encoded as the backend's integer enumeration (`TXT = 0` .. `PPTX = 3`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum AppType {
    Txt = 0,
    Docx = 1,
    Xlsx = 2,
    Pptx = 3,
}

impl From<AppType> for u8 {
    fn from(app_type: AppType) -> Self {
        app_type as u8
    }
}

impl TryFrom<u8> for AppType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(AppType::Txt),
            1 => Ok(AppType::Docx),
            2 => Ok(AppType::Xlsx),
            3 => Ok(AppType::Pptx),
            other => Err(format!("unknown app type {other}")),
        }
    }
}

/// Unexpected backend failure that can only be shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ErrorReport {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Notification {
    pub message: String,
    #[serde(rename = "Typ")]
    pub kind: String,
}

/// The bridge could not find the executable for an office application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExeNotFound {
    #[serde(default)]
    pub name: String,
    pub err_msg: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quit {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserLoginRequest {
    pub username: String,
    pub password: RedactedSecret,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WarnUser {
    pub message: String,
}

/// Instruction to switch the UI to another screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LoadRoute {
    pub route: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReloadUi {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartTest {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestFinished {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckSystem {}

/// Ask the bridge to open the application for a test document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OpenApp {
    #[serde(rename = "Typ")]
    pub app_type: AppType,
    pub test_id: String,
}

/// Ask the bridge to force-close whatever application it opened.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuitApp {}
