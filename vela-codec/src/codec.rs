//! The `tokio_util::codec::{Encoder, Decoder}` implementation for the
//! exchange wire protocol: header framing, magic resynchronization, and
//! serializer-driven body encode/decode.

use bytes::{Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::CodecError;
use crate::frame::{self, FrameHeader, HEADER_LEN, STATUS_BAD_RESPONSE, STATUS_OK};
use crate::message::{Request, Response, PROTOCOL_VERSION};
use crate::serializer;

/// Truncate a `BAD_RESPONSE` error message to this many bytes so a runaway
/// serializer failure can't itself blow the payload limit.
const BAD_RESPONSE_MESSAGE_LIMIT: usize = 4096;

/// A decoded (or about-to-be-encoded) wire unit.
#[derive(Debug, Clone, PartialEq)]
pub enum Exchange {
    Request(Request),
    Response(Response),
    /// Bytes consumed while resynchronizing past a bad magic sequence. This
    /// crate has no telnet/legacy fallback codec of its own (out of scope);
    /// a caller layering one on top can forward these bytes there instead of
    /// silently dropping them.
    Skipped(Bytes),
}

/// Frames [`Exchange`] values onto a byte stream using the 16-byte header
/// layout and a serializer resolved by ID.
pub struct ExchangeCodec {
    payload_limit: usize,
    default_serializer_id: u8,
}

impl ExchangeCodec {
    pub fn new(payload_limit: usize, default_serializer_id: u8) -> Self {
        Self { payload_limit, default_serializer_id }
    }

    fn encode_request(&self, req: &Request, dst: &mut BytesMut) -> Result<(), CodecError> {
        let ser = serializer::by_id(self.default_serializer_id)?;
        let body = if req.event && req.data.is_null() {
            Vec::new()
        } else {
            let envelope = serde_json::json!({"version": req.version, "data": req.data});
            ser.encode(&envelope)?
        };
        if body.len() > self.payload_limit {
            return Err(CodecError::ExceedPayloadLimit { limit: self.payload_limit, actual: body.len() });
        }
        FrameHeader {
            request: true,
            two_way: req.two_way,
            event: req.event,
            serializer_id: ser.id(),
            status: 0,
            id: req.id,
            body_len: body.len() as u32,
        }
        .write(dst);
        dst.extend_from_slice(&body);
        Ok(())
    }

    /// Encode `res`. On a body-serialize failure, rolls back anything
    /// written for this frame and substitutes a `BAD_RESPONSE` frame instead
    /// of propagating the error, per the codec's encode-failure policy (§7).
    fn encode_response(&self, res: &Response, dst: &mut BytesMut) -> Result<(), CodecError> {
        let start = dst.len();
        let ser = serializer::by_id(self.default_serializer_id)?;
        let encoded = match (&res.error, &res.result) {
            (Some(msg), _) => Ok(msg.clone().into_bytes()),
            (None, Some(value)) => ser.encode(value),
            (None, None) => Ok(Vec::new()),
        };
        match encoded {
            Ok(body) if body.len() <= self.payload_limit => {
                FrameHeader {
                    request: false,
                    two_way: false,
                    event: res.event,
                    serializer_id: ser.id(),
                    status: res.status,
                    id: res.id,
                    body_len: body.len() as u32,
                }
                .write(dst);
                dst.extend_from_slice(&body);
                Ok(())
            }
            Ok(body) => {
                dst.truncate(start);
                let err = CodecError::ExceedPayloadLimit { limit: self.payload_limit, actual: body.len() };
                self.encode_bad_response(res.id, &err, dst);
                Ok(())
            }
            Err(e) => {
                dst.truncate(start);
                tracing::warn!(error = %e, id = res.id, "response body encode failed, substituting BAD_RESPONSE frame");
                self.encode_bad_response(res.id, &e, dst);
                Ok(())
            }
        }
    }

    fn encode_bad_response(&self, id: u64, cause: &CodecError, dst: &mut BytesMut) {
        let message: String = cause.to_string().chars().take(BAD_RESPONSE_MESSAGE_LIMIT).collect();
        let body = message.into_bytes();
        FrameHeader {
            request: false,
            two_way: false,
            event: false,
            serializer_id: 0,
            status: STATUS_BAD_RESPONSE,
            id,
            body_len: body.len() as u32,
        }
        .write(dst);
        dst.extend_from_slice(&body);
    }

    fn to_exchange(&self, header: FrameHeader, body: &[u8]) -> Result<Exchange, CodecError> {
        if header.request {
            if header.event && body.is_empty() {
                return Ok(Exchange::Request(Request {
                    id: header.id,
                    version: PROTOCOL_VERSION.to_string(),
                    two_way: header.two_way,
                    event: true,
                    broken: false,
                    data: serde_json::Value::Null,
                }));
            }
            let ser = serializer::by_id(header.serializer_id)?;
            return Ok(Exchange::Request(match ser.decode(body) {
                Ok(envelope) => {
                    let version =
                        envelope.get("version").and_then(|v| v.as_str()).unwrap_or(PROTOCOL_VERSION).to_string();
                    let data = envelope.get("data").cloned().unwrap_or(serde_json::Value::Null);
                    Request { id: header.id, version, two_way: header.two_way, event: header.event, broken: false, data }
                }
                Err(e) => {
                    tracing::warn!(error = %e, id = header.id, "request body decode failed, marking broken");
                    Request {
                        id: header.id,
                        version: PROTOCOL_VERSION.to_string(),
                        two_way: header.two_way,
                        event: header.event,
                        broken: true,
                        data: serde_json::Value::Null,
                    }
                }
            }));
        }

        if header.status != STATUS_OK {
            let message = String::from_utf8_lossy(body).into_owned();
            return Ok(Exchange::Response(Response {
                id: header.id,
                status: header.status,
                event: header.event,
                error: Some(message),
                result: None,
            }));
        }
        let ser = serializer::by_id(header.serializer_id)?;
        let result = ser.decode(body)?;
        Ok(Exchange::Response(Response { id: header.id, status: header.status, event: header.event, error: None, result: Some(result) }))
    }
}

impl Default for ExchangeCodec {
    fn default() -> Self {
        Self::new(8 * 1024 * 1024, serializer::DEFAULT_SERIALIZER_ID)
    }
}

impl Encoder<Exchange> for ExchangeCodec {
    type Error = CodecError;

    fn encode(&mut self, item: Exchange, dst: &mut BytesMut) -> Result<(), Self::Error> {
        match item {
            Exchange::Request(req) => self.encode_request(&req, dst),
            Exchange::Response(res) => self.encode_response(&res, dst),
            Exchange::Skipped(bytes) => {
                dst.extend_from_slice(&bytes);
                Ok(())
            }
        }
    }
}

impl Decoder for ExchangeCodec {
    type Item = Exchange;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < 2 {
            return Ok(None);
        }
        if !frame::has_magic(src) {
            return Ok(Some(self.skip_to_resync(src)));
        }
        if src.len() < HEADER_LEN {
            return Ok(None);
        }

        let header = FrameHeader::read(&src[..HEADER_LEN]).expect("magic already checked above");
        let body_len = header.body_len as usize;
        if body_len > self.payload_limit {
            frame::skip(src, HEADER_LEN);
            return Err(CodecError::ExceedPayloadLimit { limit: self.payload_limit, actual: body_len });
        }
        if HEADER_LEN + body_len > src.len() {
            src.reserve(HEADER_LEN + body_len - src.len());
            return Ok(None);
        }

        let body = src[HEADER_LEN..HEADER_LEN + body_len].to_vec();
        frame::skip(src, HEADER_LEN + body_len);
        self.to_exchange(header, &body).map(Some)
    }
}

impl ExchangeCodec {
    fn skip_to_resync(&self, src: &mut BytesMut) -> Exchange {
        let skip_len = match frame::find_magic(&src[1..]) {
            Some(offset) => 1 + offset,
            None => src.len() - 1,
        };
        Exchange::Skipped(src.split_to(skip_len.max(1)).freeze())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serializer::bootstrap;

    fn codec() -> ExchangeCodec {
        bootstrap();
        ExchangeCodec::default()
    }

    #[test]
    fn request_round_trips_through_encode_decode() {
        let mut c = codec();
        let req = Request::new(7, serde_json::json!({"method": "sayHello", "args": ["world"]}));
        let mut buf = BytesMut::new();
        c.encode(Exchange::Request(req.clone()), &mut buf).unwrap();
        let decoded = c.decode(&mut buf).unwrap().unwrap();
        assert_eq!(decoded, Exchange::Request(req));
        assert!(buf.is_empty());
    }

    #[test]
    fn response_round_trips_through_encode_decode() {
        let mut c = codec();
        let res = Response::ok(7, serde_json::json!("hello world"));
        let mut buf = BytesMut::new();
        c.encode(Exchange::Response(res.clone()), &mut buf).unwrap();
        let decoded = c.decode(&mut buf).unwrap().unwrap();
        assert_eq!(decoded, Exchange::Response(res));
    }

    #[test]
    fn partial_frame_signals_need_more_input_and_keeps_the_read_index() {
        let mut c = codec();
        let req = Request::new(1, serde_json::json!({"a": 1}));
        let mut full = BytesMut::new();
        c.encode(Exchange::Request(req), &mut full).unwrap();

        for cut in 0..full.len() {
            let mut partial = BytesMut::from(&full[..cut]);
            let before = partial.clone();
            let result = c.decode(&mut partial).unwrap();
            assert!(result.is_none(), "expected need-more-input at {cut} bytes");
            assert_eq!(partial, before, "decode must not consume a partial frame");
        }
    }

    #[test]
    fn magic_resync_skips_garbage_prefix() {
        let mut c = codec();
        let req = Request::new(1, serde_json::json!(null)).as_event();
        let mut buf = BytesMut::new();
        buf.extend_from_slice(&[0xAA, 0x55]);
        c.encode(Exchange::Request(req.clone()), &mut buf).unwrap();

        let skipped = c.decode(&mut buf).unwrap().unwrap();
        assert_eq!(skipped, Exchange::Skipped(Bytes::copy_from_slice(&[0xAA, 0x55])));

        let frame = c.decode(&mut buf).unwrap().unwrap();
        assert_eq!(frame, Exchange::Request(req));
    }

    #[test]
    fn response_encode_failure_substitutes_bad_response() {
        bootstrap();
        let mut c = ExchangeCodec::new(4, serializer::DEFAULT_SERIALIZER_ID);
        let res = Response::ok(3, serde_json::json!({"too": "big-for-the-limit"}));
        let mut buf = BytesMut::new();
        c.encode(Exchange::Response(res), &mut buf).unwrap();

        let decoded = c.decode(&mut buf).unwrap().unwrap();
        match decoded {
            Exchange::Response(r) => {
                assert_eq!(r.id, 3);
                assert_eq!(r.status, STATUS_BAD_RESPONSE);
                assert!(r.error.is_some());
            }
            other => panic!("expected a response, got {other:?}"),
        }
    }
}
