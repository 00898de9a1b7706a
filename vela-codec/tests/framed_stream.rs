//! Drives `ExchangeCodec` through `tokio_util::codec::Framed` over an
//! in-memory duplex stream, proving it composes with a real async transport
//! rather than just a `BytesMut` buffer.

use futures_util::{SinkExt, StreamExt};
use tokio::io::duplex;
use tokio_util::codec::Framed;

use vela_codec::{Exchange, ExchangeCodec, Request, Response};

#[tokio::test]
async fn request_and_response_survive_a_duplex_round_trip() {
    vela_codec::serializer::bootstrap();
    let (client_io, server_io) = duplex(4096);
    let mut client = Framed::new(client_io, ExchangeCodec::default());
    let mut server = Framed::new(server_io, ExchangeCodec::default());

    let req = Request::new(101, serde_json::json!({"method": "ping"}));
    client.send(Exchange::Request(req.clone())).await.unwrap();
    let received = server.next().await.unwrap().unwrap();
    assert_eq!(received, Exchange::Request(req));

    let res = Response::ok(101, serde_json::json!("pong"));
    server.send(Exchange::Response(res.clone())).await.unwrap();
    let received = client.next().await.unwrap().unwrap();
    assert_eq!(received, Exchange::Response(res));
}
