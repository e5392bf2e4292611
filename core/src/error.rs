//! Errors raised while converting outcomes to and from JSON.

use thiserror::Error;

/// Failure while exposing an outcome.
#[derive(Error, Debug)]
pub enum ExposureError {
    /// The payload could not be serialized.
    #[error("failed to serialize payload of `{kind}`: {source}")]
    Payload {
        /// Kind of the outcome being exposed
        kind: String,
        /// Underlying serializer error
        #[source]
        source: serde_json::Error,
    },
}

/// Failure while decoding an outcome received over the wire.
#[derive(Error, Debug)]
pub enum WireError {
    /// The value does not have the `kind`/`hasData`/`noValue` shape.
    #[error("value is not an outcome")]
    NotAnOutcome,

    /// A field of a known kind had the wrong shape.
    #[error("malformed `{kind}` outcome: {source}")]
    Malformed {
        /// Kind being decoded
        kind: String,
        /// Underlying deserializer error
        #[source]
        source: serde_json::Error,
    },
}
