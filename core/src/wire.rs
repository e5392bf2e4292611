//! Recognizing and decoding outcomes received as JSON.
//!
//! A JSON value is an outcome when it is an object with a string `kind`, a
//! boolean `hasData` and a boolean `noValue`. Decoding reverses
//! [`Outcome::expose`](crate::Outcome::expose) for the modeled kinds.
//! Fields stripped by exposure come back as their defaults.
//!
//! Unknown kinds are kept rather than rejected: a data kind is a server
//! defined payload that is its own data, so the whole object is decoded as
//! `T`; a non-data kind becomes [`Foreign`].

use crate::error::WireError;
use crate::outcome::Outcome;
use crate::variants::{
    Empty, FailedRequest, Foreign, Kind, Literal, MissingPermission, NeverFetched, NotFound,
    Pending, SkippedRequest, UnexpectedError,
};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Structural check for outcome-shaped JSON.
#[must_use]
pub fn is_outcome(value: &Value) -> bool {
    value.as_object().is_some_and(|object| {
        object.get("kind").is_some_and(Value::is_string)
            && object.get("hasData").is_some_and(Value::is_boolean)
            && object.get("noValue").is_some_and(Value::is_boolean)
    })
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Header {
    kind: String,
    #[serde(default)]
    status: Option<u16>,
    has_data: bool,
    #[serde(default)]
    has_error: bool,
    no_value: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NotFoundFields {
    #[serde(default)]
    entity_name: Option<String>,
    #[serde(default)]
    permission_error: Option<bool>,
    #[serde(default)]
    find_options: Option<Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UnexpectedFields {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    serialized_error: Option<String>,
    #[serde(default)]
    method: Option<String>,
}

#[derive(Deserialize)]
struct FailedFields {
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Deserialize)]
struct LiteralFields<T> {
    data: T,
}

const HEADER_FIELDS: [&str; 5] = ["kind", "status", "hasData", "hasError", "noValue"];

fn decode<F: DeserializeOwned>(kind: &str, value: Value) -> Result<F, WireError> {
    serde_json::from_value(value).map_err(|source| WireError::Malformed {
        kind: kind.to_string(),
        source,
    })
}

impl<T: DeserializeOwned> Outcome<T> {
    /// Decode an outcome received as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::NotAnOutcome`] when `value` fails
    /// [`is_outcome`], and [`WireError::Malformed`] when a modeled kind
    /// carries fields of the wrong shape or the payload does not decode
    /// as `T`.
    pub fn from_wire(value: Value) -> Result<Self, WireError> {
        if !is_outcome(&value) {
            return Err(WireError::NotAnOutcome);
        }
        let header: Header = decode("outcome", value.clone())?;
        let kind = header.kind.clone();
        let kind = kind.as_str();

        let outcome = match kind {
            k if k == Literal::<T>::KIND => {
                let fields: LiteralFields<T> = decode(kind, value)?;
                Self::Literal(Literal {
                    data: fields.data,
                    created: header.status == Some(201),
                })
            }
            k if k == Empty::KIND => Self::Empty(Empty),
            k if k == NotFound::KIND => {
                let fields: NotFoundFields = decode(kind, value)?;
                Self::NotFound(NotFound {
                    entity_name: fields.entity_name,
                    permission_error: fields
                        .permission_error
                        .unwrap_or(header.status == Some(403)),
                    find_options: fields.find_options,
                })
            }
            k if k == MissingPermission::KIND => Self::MissingPermission(MissingPermission),
            k if k == UnexpectedError::KIND => {
                let fields: UnexpectedFields = decode(kind, value)?;
                Self::UnexpectedError(UnexpectedError {
                    code: fields.code,
                    serialized_error: fields.serialized_error,
                    method: fields.method,
                })
            }
            k if k == FailedRequest::KIND => {
                let fields: FailedFields = decode(kind, value)?;
                Self::FailedRequest(FailedRequest::new(
                    header.status.unwrap_or(FailedRequest::FALLBACK_STATUS),
                    fields.error,
                ))
            }
            k if k == SkippedRequest::KIND => Self::SkippedRequest(SkippedRequest),
            k if k == Pending::KIND => Self::Pending(Pending),
            k if k == NeverFetched::KIND => Self::NeverFetched(NeverFetched),
            _ if header.has_data => {
                let status = header.status;
                Self::Literal(Literal {
                    data: decode(kind, value)?,
                    created: status == Some(201),
                })
            }
            _ => Self::Foreign(Foreign {
                status: header.status.unwrap_or(FailedRequest::FALLBACK_STATUS),
                has_error: header.has_error,
                no_value: header.no_value,
                fields: remaining_fields(value),
                kind: header.kind,
            }),
        };
        Ok(outcome)
    }
}

fn remaining_fields(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(mut object) => {
            for field in HEADER_FIELDS {
                object.remove(field);
            }
            object
        }
        _ => Map::new(),
    }
}
