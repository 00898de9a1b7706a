//! A minimal TCP server proving the extension registry and exchange codec
//! compose: every connection is framed with `ExchangeCodec`, and every
//! `greet` request is dispatched through the `Greeter` extension point's
//! adaptive dispatcher, keyed on a `target` field the caller supplies.

mod greeter;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio_util::codec::Framed;

use vela::prelude::*;
use vela_codec::frame::STATUS_CLIENT_ERROR;
use vela_codec::{Exchange, ExchangeCodec, Request, Response};

#[tokio::main]
async fn main() {
    vela::init_tracing();

    let config = VelaConfig::from_env();
    vela_codec::serializer::bootstrap();
    greeter::bootstrap();

    let addr = std::env::var("VELA_ECHO_ADDR").unwrap_or_else(|_| "127.0.0.1:7777".to_string());
    let listener = TcpListener::bind(&addr).await.expect("failed to bind listener");
    tracing::info!(%addr, "vela-echo listening");

    loop {
        let (socket, peer) = match listener.accept().await {
            Ok(pair) => pair,
            Err(e) => {
                tracing::warn!(error = %e, "accept failed");
                continue;
            }
        };
        tracing::debug!(%peer, "accepted connection");
        let codec = ExchangeCodec::new(config.payload_limit(), config.default_serializer_id());
        tokio::spawn(handle_connection(socket, codec));
    }
}

async fn handle_connection(socket: tokio::net::TcpStream, codec: ExchangeCodec) {
    let mut framed = Framed::new(socket, codec);
    while let Some(frame) = framed.next().await {
        let exchange = match frame {
            Ok(exchange) => exchange,
            Err(e) => {
                tracing::warn!(error = %e, "failed to decode frame, closing connection");
                return;
            }
        };
        match exchange {
            Exchange::Request(req) if req.two_way => {
                let response = handle_request(&req);
                if framed.send(Exchange::Response(response)).await.is_err() {
                    return;
                }
            }
            Exchange::Request(_) => {
                // one-way or event: nothing to send back.
            }
            Exchange::Response(_) => {
                tracing::warn!("server received a Response frame, ignoring");
            }
            Exchange::Skipped(bytes) => {
                tracing::debug!(skipped = bytes.len(), "resynchronized past garbage on the wire");
            }
        }
    }
}

fn handle_request(req: &Request) -> Response {
    if req.broken {
        return Response::error(req.id, STATUS_CLIENT_ERROR, "request body failed to decode");
    }
    let method = req.data.get("method").and_then(|v| v.as_str()).unwrap_or_default();
    match method {
        "greet" => {
            let name = req.data.get("name").and_then(|v| v.as_str()).unwrap_or("world");
            let mut url = Url::new("vela", "demo");
            if let Some(target) = req.data.get("target").and_then(|v| v.as_str()) {
                url = url.with_parameter("greeter", target);
            }
            match greeter::dispatcher().resolve(&url, None) {
                Ok(g) => Response::ok(req.id, serde_json::json!(g.greet(name))),
                Err(e) => Response::error(req.id, STATUS_CLIENT_ERROR, e.to_string()),
            }
        }
        other => Response::error(req.id, STATUS_CLIENT_ERROR, format!("unknown method '{other}'")),
    }
}
