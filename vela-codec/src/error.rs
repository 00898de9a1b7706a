use std::fmt;

use vela_core::ExtensionError;

/// Errors from framing, serializing, or deserializing an exchange message.
///
/// `NeedMoreInput` has no variant here: it is represented by `Decoder::decode`
/// returning `Ok(None)`, per the `tokio_util::codec` convention, rather than
/// as an error value (see §7 of the design: it's a non-fatal sentinel, not a
/// failure).
#[derive(Debug, Clone)]
pub enum CodecError {
    /// The requested serializer ID has no registered implementation.
    UnknownSerializerId(u8),
    /// A frame's declared body length exceeds the configured payload limit.
    ExceedPayloadLimit { limit: usize, actual: usize },
    /// The body serializer failed to encode a value.
    SerializeFailure(String),
    /// The body serializer failed to decode a value.
    DeserializeFailure(String),
    /// Looking up the serializer extension failed.
    Extension(ExtensionError),
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::UnknownSerializerId(id) => write!(f, "no serializer registered for id {id}"),
            CodecError::ExceedPayloadLimit { limit, actual } => {
                write!(f, "body of {actual} bytes exceeds the {limit} byte payload limit")
            }
            CodecError::SerializeFailure(msg) => write!(f, "serialize failed: {msg}"),
            CodecError::DeserializeFailure(msg) => write!(f, "deserialize failed: {msg}"),
            CodecError::Extension(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for CodecError {}

impl From<ExtensionError> for CodecError {
    fn from(e: ExtensionError) -> Self {
        CodecError::Extension(e)
    }
}
