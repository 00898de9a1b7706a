//! The exchange wire protocol: a 16-byte-header length-prefixed frame codec
//! over a stream transport, with pluggable body serialization (via
//! [`vela_core`]'s extension registry) and request/response correlation.
//!
//! Start at [`codec::ExchangeCodec`] for the `tokio_util::codec` integration,
//! and [`correlation::CorrelationStore`] for matching outbound requests to
//! their eventual response.

pub mod codec;
pub mod correlation;
pub mod error;
pub mod frame;
pub mod message;
pub mod prelude;
pub mod serializer;

pub use codec::{Exchange, ExchangeCodec};
pub use correlation::CorrelationStore;
pub use error::CodecError;
pub use message::{Request, Response};
