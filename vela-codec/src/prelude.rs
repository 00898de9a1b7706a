//! `use vela_codec::prelude::*;` for the common wire-protocol types.

// ── Framing ───────────────────────────────────────────────────────────────

pub use crate::codec::{Exchange, ExchangeCodec};
pub use crate::frame::{FrameHeader, MAGIC, STATUS_BAD_RESPONSE, STATUS_CLIENT_ERROR, STATUS_OK};

// ── Messages ──────────────────────────────────────────────────────────────

pub use crate::message::{Request, Response};

// ── Serialization ─────────────────────────────────────────────────────────

pub use crate::serializer::{JsonSerializer, Serializer, SerializerPoint};

// ── Correlation & errors ──────────────────────────────────────────────────

pub use crate::correlation::CorrelationStore;
pub use crate::error::CodecError;
