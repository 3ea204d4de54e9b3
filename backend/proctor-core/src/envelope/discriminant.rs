use std::fmt::{Display, Formatter, Result as FormatResult};

/// Tag identifying which kind of message an envelope carries.
///
/// Declaration order matches the backend's integer enumeration, so
/// `ALL[n]` is the variant the backend encodes as `n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Discriminant {
    Err,
    Notification,
    ExeNotFound,
    Quit,
    UserLoginRequest,
    WarnUser,
    LoadRoute,
    ReloadUi,
    StartTest,
    TestFinished,
    CheckSystem,
    OpenApp,
    QuitApp,
}

impl Discriminant {
    pub const ALL: [Discriminant; 13] = [
        Discriminant::Err,
        Discriminant::Notification,
        Discriminant::ExeNotFound,
        Discriminant::Quit,
        Discriminant::UserLoginRequest,
        Discriminant::WarnUser,
        Discriminant::LoadRoute,
        Discriminant::ReloadUi,
        Discriminant::StartTest,
        Discriminant::TestFinished,
        Discriminant::CheckSystem,
        Discriminant::OpenApp,
        Discriminant::QuitApp,
    ];

    /// Canonical wire name, always used on encode.
    pub const fn as_str(self) -> &'static str {
        match self {
            Discriminant::Err => "Err",
            Discriminant::Notification => "Notification",
            Discriminant::ExeNotFound => "ExeNotFound",
            Discriminant::Quit => "Quit",
            Discriminant::UserLoginRequest => "UserLoginRequest",
            Discriminant::WarnUser => "WarnUser",
            Discriminant::LoadRoute => "LoadRoute",
            Discriminant::ReloadUi => "ReloadUi",
            Discriminant::StartTest => "StartTest",
            Discriminant::TestFinished => "TestFinished",
            Discriminant::CheckSystem => "CheckSystem",
            Discriminant::OpenApp => "OpenApp",
            Discriminant::QuitApp => "QuitApp",
        }
    }

    /// Resolve a wire name. Accepts the canonical names plus the long-form
    /// aliases `ExecutableNotFound` and `Error`.
    pub fn from_wire(name: &str) -> Option<Self> {
        let discriminant = match name {
            "Err" | "Error" => Discriminant::Err,
            "Notification" => Discriminant::Notification,
            "ExeNotFound" | "ExecutableNotFound" => Discriminant::ExeNotFound,
            "Quit" => Discriminant::Quit,
            "UserLoginRequest" => Discriminant::UserLoginRequest,
            "WarnUser" => Discriminant::WarnUser,
            "LoadRoute" => Discriminant::LoadRoute,
            "ReloadUi" => Discriminant::ReloadUi,
            "StartTest" => Discriminant::StartTest,
            "TestFinished" => Discriminant::TestFinished,
            "CheckSystem" => Discriminant::CheckSystem,
            "OpenApp" => Discriminant::OpenApp,
            "QuitApp" => Discriminant::QuitApp,
            _ => return None,
        };
        Some(discriminant)
    }

    /// Resolve the backend's integer encoding.
    pub fn from_index(index: u64) -> Option<Self> {
        usize::try_from(index)
            .ok()
            .and_then(|index| Self::ALL.get(index).copied())
    }
}

impl Display for Discriminant {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        formatter.write_str(self.as_str())
    }
}
