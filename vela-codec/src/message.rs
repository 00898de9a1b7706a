//! Request/Response message types carried in an exchange frame's body.
//!
//! Body payloads are represented as [`serde_json::Value`] rather than a
//! method-typed Rust value: the shipped reference serializer is JSON, and
//! deferring typed extraction to the caller (via `serde_json::from_value`)
//! keeps this crate free of per-method codegen. Because of that, decoding
//! never needs to pick a concrete return type from the originating request's
//! signature — every body decodes to the same generic `Value` whether or not
//! a correlated request is still on hand.
//!
//! A `Request`'s `version` rides inside the serialized body envelope
//! (`{"version": ..., "data": ...}`) rather than the fixed 16-byte wire
//! header, which has no spare bits for it (every bit in the header's flags
//! byte is already claimed — see `frame.rs`).

use serde_json::Value;

use crate::frame::STATUS_OK;

/// Protocol version stamped on every outgoing `Request` absent an explicit
/// override.
pub const PROTOCOL_VERSION: &str = "1.0";

#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub id: u64,
    pub version: String,
    pub two_way: bool,
    pub event: bool,
    /// Set when the body failed to deserialize; the frame is still delivered
    /// (per the codec's `DecodeFailure` policy) rather than dropped.
    pub broken: bool,
    pub data: Value,
}

impl Request {
    pub fn new(id: u64, data: Value) -> Self {
        Self { id, version: PROTOCOL_VERSION.to_string(), two_way: true, event: false, broken: false, data }
    }

    pub fn one_way(mut self) -> Self {
        self.two_way = false;
        self
    }

    pub fn as_event(mut self) -> Self {
        self.event = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub id: u64,
    pub status: u8,
    pub event: bool,
    /// UTF-8 error message; present iff `status != STATUS_OK`.
    pub error: Option<String>,
    pub result: Option<Value>,
}

impl Response {
    pub fn ok(id: u64, result: Value) -> Self {
        Self { id, status: STATUS_OK, event: false, error: None, result: Some(result) }
    }

    pub fn error(id: u64, status: u8, message: impl Into<String>) -> Self {
        Self { id, status, event: false, error: Some(message.into()), result: None }
    }

    pub fn is_ok(&self) -> bool {
        self.status == STATUS_OK
    }
}
