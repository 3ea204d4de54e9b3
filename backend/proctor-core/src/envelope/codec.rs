//! JSON text-frame codec.
//!
//! Outbound frames are always `{"Typ": "<name>", "Val": {..}}`. Inbound frames
//! are also accepted in the backend's native form, where `Typ` is the integer
//! enumeration value and `Val` is a string holding the JSON payload.

use crate::envelope::{Discriminant, Envelope};
use crate::error::codec::{DecodeError, EncodeError};

use common::ErrorLocation;

use std::panic::Location;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Serialize)]
struct OutboundFrame<'a, P: Serialize> {
    #[serde(rename = "Typ")]
    typ: &'static str,
    #[serde(rename = "Val")]
    val: &'a P,
}

/// Serialize an envelope into a text frame.
#[track_caller]
pub fn encode(envelope: &Envelope) -> Result<String, EncodeError> {
    let discriminant = envelope.discriminant();
    let encoded = match envelope {
        Envelope::Err(payload) => frame(discriminant, payload),
        Envelope::Notification(payload) => frame(discriminant, payload),
        Envelope::ExeNotFound(payload) => frame(discriminant, payload),
        Envelope::Quit(payload) => frame(discriminant, payload),
        Envelope::UserLoginRequest(payload) => frame(discriminant, payload),
        Envelope::WarnUser(payload) => frame(discriminant, payload),
        Envelope::LoadRoute(payload) => frame(discriminant, payload),
        Envelope::ReloadUi(payload) => frame(discriminant, payload),
        Envelope::StartTest(payload) => frame(discriminant, payload),
        Envelope::TestFinished(payload) => frame(discriminant, payload),
        Envelope::CheckSystem(payload) => frame(discriminant, payload),
        Envelope::OpenApp(payload) => frame(discriminant, payload),
        Envelope::QuitApp(payload) => frame(discriminant, payload),
    };

    encoded.map_err(|e| EncodeError::Serialize {
        discriminant,
        message: e.to_string(),
        location: ErrorLocation::from(Location::caller()),
    })
}

fn frame<P: Serialize>(discriminant: Discriminant, payload: &P) -> serde_json::Result<String> {
    serde_json::to_string(&OutboundFrame {
        typ: discriminant.as_str(),
        val: payload,
    })
}

/// Parse an inbound frame into an envelope.
///
/// # Errors
///
/// - [`DecodeError::MalformedFrame`] - not JSON, or no usable `Typ`
/// - [`DecodeError::UnknownDiscriminant`] - `Typ` names no known message kind
/// - [`DecodeError::InvalidPayload`] - `Val` does not fit the shape for `Typ`
#[track_caller]
pub fn decode(bytes: &[u8]) -> Result<Envelope, DecodeError> {
    let mut fields: Map<String, Value> =
        serde_json::from_slice(bytes).map_err(|e| DecodeError::MalformedFrame {
            message: e.to_string(),
            location: ErrorLocation::from(Location::caller()),
        })?;

    let Some(typ) = fields.remove("Typ") else {
        return Err(DecodeError::MalformedFrame {
            message: String::from("missing field `Typ`"),
            location: ErrorLocation::from(Location::caller()),
        });
    };

    let discriminant = resolve_discriminant(&typ)?;
    let val = normalize_val(discriminant, fields.remove("Val").unwrap_or(Value::Null))?;

    let envelope = match discriminant {
        Discriminant::Err => Envelope::Err(payload(discriminant, val)?),
        Discriminant::Notification => Envelope::Notification(payload(discriminant, val)?),
        Discriminant::ExeNotFound => Envelope::ExeNotFound(payload(discriminant, val)?),
        Discriminant::Quit => Envelope::Quit(payload(discriminant, val)?),
        Discriminant::UserLoginRequest => {
            Envelope::UserLoginRequest(payload(discriminant, val)?)
        }
        Discriminant::WarnUser => Envelope::WarnUser(payload(discriminant, val)?),
        Discriminant::LoadRoute => Envelope::LoadRoute(payload(discriminant, val)?),
        Discriminant::ReloadUi => Envelope::ReloadUi(payload(discriminant, val)?),
        Discriminant::StartTest => Envelope::StartTest(payload(discriminant, val)?),
        Discriminant::TestFinished => Envelope::TestFinished(payload(discriminant, val)?),
        Discriminant::CheckSystem => Envelope::CheckSystem(payload(discriminant, val)?),
        Discriminant::OpenApp => Envelope::OpenApp(payload(discriminant, val)?),
        Discriminant::QuitApp => Envelope::QuitApp(payload(discriminant, val)?),
    };

    Ok(envelope)
}

#[track_caller]
fn resolve_discriminant(typ: &Value) -> Result<Discriminant, DecodeError> {
    let resolved = match typ {
        Value::String(name) => Discriminant::from_wire(name),
        Value::Number(number) => number.as_u64().and_then(Discriminant::from_index),
        other => {
            return Err(DecodeError::MalformedFrame {
                message: format!("'Typ' must be a string or an integer, got {other}"),
                location: ErrorLocation::from(Location::caller()),
            });
        }
    };

    resolved.ok_or_else(|| DecodeError::UnknownDiscriminant {
        discriminant: match typ {
            Value::String(name) => name.clone(),
            other => other.to_string(),
        },
        location: ErrorLocation::from(Location::caller()),
    })
}

/// Absent or null `Val` means an empty payload; a string `Val` carries the
/// payload as embedded JSON.
#[track_caller]
fn normalize_val(discriminant: Discriminant, val: Value) -> Result<Value, DecodeError> {
    match val {
        Value::Null => Ok(Value::Object(Map::new())),
        Value::String(embedded) => {
            serde_json::from_str(&embedded).map_err(|e| DecodeError::InvalidPayload {
                discriminant,
                message: format!("embedded payload is not JSON: {e}"),
                location: ErrorLocation::from(Location::caller()),
            })
        }
        other => Ok(other),
    }
}

#[track_caller]
fn payload<P: DeserializeOwned>(discriminant: Discriminant, val: Value) -> Result<P, DecodeError> {
    serde_json::from_value(val).map_err(|e| DecodeError::InvalidPayload {
        discriminant,
        message: e.to_string(),
        location: ErrorLocation::from(Location::caller()),
    })
}
