//! Message envelope: a discriminant plus the payload shape it implies.
//!
//! [`Envelope`] is a closed sum type, one variant per [`Discriminant`].
//! Encode and decode both match on it exhaustively, so adding a message kind
//! fails to compile until every boundary knows about it.

mod codec;
mod discriminant;
mod payload;

pub use codec::{decode, encode};
pub use discriminant::Discriminant;
pub use payload::{
    AppType, CheckSystem, ErrorReport, ExeNotFound, LoadRoute, Notification, OpenApp, Quit,
    QuitApp, ReloadUi, StartTest, TestFinished, UserLoginRequest, WarnUser,
};

use std::fmt::Debug;

/// The unit of exchange over the connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Envelope {
    Err(ErrorReport),
    Notification(Notification),
    ExeNotFound(ExeNotFound),
    Quit(Quit),
    UserLoginRequest(UserLoginRequest),
    WarnUser(WarnUser),
    LoadRoute(LoadRoute),
    ReloadUi(ReloadUi),
    StartTest(StartTest),
    TestFinished(TestFinished),
    CheckSystem(CheckSystem),
    OpenApp(OpenApp),
    QuitApp(QuitApp),
}

impl Envelope {
    pub fn discriminant(&self) -> Discriminant {
        match self {
            Envelope::Err(_) => Discriminant::Err,
            Envelope::Notification(_) => Discriminant::Notification,
            Envelope::ExeNotFound(_) => Discriminant::ExeNotFound,
            Envelope::Quit(_) => Discriminant::Quit,
            Envelope::UserLoginRequest(_) => Discriminant::UserLoginRequest,
            Envelope::WarnUser(_) => Discriminant::WarnUser,
            Envelope::LoadRoute(_) => Discriminant::LoadRoute,
            Envelope::ReloadUi(_) => Discriminant::ReloadUi,
            Envelope::StartTest(_) => Discriminant::StartTest,
            Envelope::TestFinished(_) => Discriminant::TestFinished,
            Envelope::CheckSystem(_) => Discriminant::CheckSystem,
            Envelope::OpenApp(_) => Discriminant::OpenApp,
            Envelope::QuitApp(_) => Discriminant::QuitApp,
        }
    }
}

/// A payload type bound to exactly one discriminant.
///
/// Lets typed subscribers and senders name the payload type instead of the
/// tag, with the pairing checked at compile time.
pub trait Payload: Debug + Clone + Send + Sync + 'static {
    const DISCRIMINANT: Discriminant;

    fn into_envelope(self) -> Envelope;

    /// Extract the payload, handing the envelope back if it carries another kind.
    fn from_envelope(envelope: Envelope) -> Result<Self, Envelope>;
}

macro_rules! impl_payload {
    ($($payload:ident => $variant:ident),* $(,)?) => {
        $(
            impl Payload for $payload {
                const DISCRIMINANT: Discriminant = Discriminant::$variant;

                fn into_envelope(self) -> Envelope {
                    Envelope::$variant(self)
                }

                fn from_envelope(envelope: Envelope) -> Result<Self, Envelope> {
                    match envelope {
                        Envelope::$variant(payload) => Ok(payload),
                        other => Err(other),
                    }
                }
            }

            impl From<$payload> for Envelope {
                fn from(payload: $payload) -> Self {
                    Envelope::$variant(payload)
                }
            }
        )*
    };
}

impl_payload! {
    ErrorReport => Err,
    Notification => Notification,
    ExeNotFound => ExeNotFound,
    Quit => Quit,
    UserLoginRequest => UserLoginRequest,
    WarnUser => WarnUser,
    LoadRoute => LoadRoute,
    ReloadUi => ReloadUi,
    StartTest => StartTest,
    TestFinished => TestFinished,
    CheckSystem => CheckSystem,
    OpenApp => OpenApp,
    QuitApp => QuitApp,
}
