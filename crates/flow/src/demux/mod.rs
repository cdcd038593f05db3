//! Per-connection flow demultiplexing.
//!
//! This module turns the two directions of one reassembled TCP connection
//! into a stream of decoded HTTP messages:
//!
//! - [`FlowDemux`]: owns the request- and response-direction decoders of a
//!   single connection, routes direction-tagged bytes and the end-of-session
//!   signal, and emits [`FlowEvent`]s
//! - [`FlowEvents`]: the bounded, pull-based event stream handed to the
//!   consumer
//! - [`CaptureAdapter`]: opens one demultiplexer per connection reported by
//!   the reassembly collaborator and merges all connections into one stream
//!
//! The two directions of a connection are decoded independently and may be
//! fed interleaved; events are ordered only within a direction. Connections
//! share no state.

mod event;
pub use event::FlowEvent;
pub use event::FlowEvents;
pub use event::FlowMessage;

mod flow;
pub use flow::DemuxConfig;
pub use flow::FlowDemux;

mod adapter;
pub use adapter::CaptureAdapter;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{Direction, Endpoint, ParseError, PayloadSize};

    use bytes::Bytes;
    use futures::FutureExt;
    use http::{Method, StatusCode, Version};

    fn init_tracing() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    }

    fn endpoint() -> Endpoint {
        Endpoint::new("10.0.0.1:51234", "10.0.0.2:80", 42)
    }

    async fn drain_body(message: &mut FlowMessage) -> Vec<u8> {
        let mut body = Vec::new();
        while let Some(bytes) = message.body.chunk().await {
            body.extend_from_slice(&bytes);
        }
        body
    }

    #[tokio::test]
    async fn request_headers_event() {
        init_tracing();
        let (mut demux, mut events) = FlowDemux::open(endpoint());

        demux.feed(Direction::ClientToServer, b"GET /x HTTP/1.1\r\nHost: h\r\n\r\n").await;

        let Some(FlowEvent::Headers(mut message)) = events.recv().await else {
            panic!("expected headers event");
        };
        assert_eq!(message.direction, Direction::ClientToServer);
        assert_eq!(message.endpoint.src(), "10.0.0.1:51234");
        assert_eq!(message.head.method(), Some(&Method::GET));
        assert_eq!(message.head.target().unwrap().path(), "/x");
        assert_eq!(message.head.version(), Version::HTTP_11);
        assert_eq!(message.head.header("host"), Some("h"));

        assert!(drain_body(&mut message).await.is_empty());
        assert!(matches!(events.recv().await, Some(FlowEvent::MessageEnd { .. })));
    }

    #[tokio::test]
    async fn response_with_content_length_body() {
        init_tracing();
        let (mut demux, mut events) = FlowDemux::open(endpoint());

        demux.feed(Direction::ServerToClient, b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\nhello").await;

        let Some(FlowEvent::Headers(mut message)) = events.recv().await else {
            panic!("expected headers event");
        };
        assert_eq!(message.head.status(), Some(StatusCode::OK));
        assert_eq!(message.head.reason(), Some("OK"));
        assert_eq!(message.body.framing(), PayloadSize::Length(5));

        assert_eq!(drain_body(&mut message).await, b"hello");

        let Some(FlowEvent::MessageEnd { direction, head, .. }) = events.recv().await else {
            panic!("expected message end");
        };
        assert_eq!(direction, Direction::ServerToClient);
        assert_eq!(head.status(), Some(StatusCode::OK));
    }

    #[tokio::test]
    async fn content_length_body_is_split_invariant() {
        init_tracing();
        let (mut demux, mut events) = FlowDemux::open(endpoint());

        demux.feed(Direction::ServerToClient, b"HTTP/1.1 200 OK\r\nContent-Le").await;
        assert!(events.recv().now_or_never().is_none());

        demux.feed(Direction::ServerToClient, b"ngth: 5\r\n\r\nhe").await;
        demux.feed(Direction::ServerToClient, b"llo").await;

        let Some(FlowEvent::Headers(mut message)) = events.recv().await else {
            panic!("expected headers event");
        };
        assert_eq!(drain_body(&mut message).await, b"hello");
        assert!(matches!(events.recv().await, Some(FlowEvent::MessageEnd { .. })));
    }

    #[tokio::test]
    async fn chunked_body_is_dechunked() {
        init_tracing();
        let (mut demux, mut events) = FlowDemux::open(endpoint());

        demux
            .feed(
                Direction::ServerToClient,
                b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n3\r\nfoo\r\n0\r\n\r\n",
            )
            .await;
        demux.end().await;
        drop(demux);

        let Some(FlowEvent::Headers(mut message)) = events.recv().await else {
            panic!("expected headers event");
        };
        assert_eq!(message.body.framing(), PayloadSize::Chunked);
        assert_eq!(drain_body(&mut message).await, b"foo");

        // message end fires exactly once
        let mut ends = 0;
        while let Some(event) = events.recv().await {
            if matches!(event, FlowEvent::MessageEnd { .. }) {
                ends += 1;
            }
        }
        assert_eq!(ends, 1);
    }

    #[tokio::test]
    async fn close_delimited_body_completes_on_end() {
        init_tracing();
        let (mut demux, mut events) = FlowDemux::open(endpoint());

        demux.feed(Direction::ServerToClient, b"HTTP/1.1 200 OK\r\n\r\nstreamed ").await;
        demux.feed(Direction::ServerToClient, b"until close").await;

        let Some(FlowEvent::Headers(mut message)) = events.recv().await else {
            panic!("expected headers event");
        };
        assert_eq!(message.body.framing(), PayloadSize::CloseDelimited);

        demux.end().await;

        assert_eq!(drain_body(&mut message).await, b"streamed until close");
        assert!(matches!(events.recv().await, Some(FlowEvent::MessageEnd { .. })));
    }

    #[tokio::test]
    async fn directions_are_independent_and_interleavable() {
        init_tracing();
        let (mut demux, mut events) = FlowDemux::open(endpoint());

        demux.feed(Direction::ClientToServer, b"GET /a HTTP/1.1\r\n").await;
        demux.feed(Direction::ServerToClient, b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\n").await;
        demux.feed(Direction::ClientToServer, b"Host: h\r\n\r\n").await;
        demux.feed(Direction::ServerToClient, b"\r\n").await;

        let first = events.recv().await.unwrap();
        assert_eq!(first.direction(), Direction::ClientToServer);
        assert!(matches!(first, FlowEvent::Headers(_)));

        // per-direction order holds even though the feeds interleaved
        let directions: Vec<Direction> = [
            events.recv().await.unwrap(),
            events.recv().await.unwrap(),
            events.recv().await.unwrap(),
        ]
        .iter()
        .map(FlowEvent::direction)
        .collect();
        assert!(directions.contains(&Direction::ServerToClient));
    }

    #[tokio::test]
    async fn pipelined_requests_arrive_as_a_sequence() {
        init_tracing();
        let (mut demux, mut events) = FlowDemux::open(endpoint());

        demux
            .feed(Direction::ClientToServer, b"GET /a HTTP/1.1\r\nHost: h\r\n\r\nGET /b HTTP/1.1\r\nHost: h\r\n\r\n")
            .await;

        let mut paths = Vec::new();
        for _ in 0..4 {
            match events.recv().await.unwrap() {
                FlowEvent::Headers(message) => paths.push(message.head.target().unwrap().path().to_owned()),
                FlowEvent::MessageEnd { .. } => {}
                FlowEvent::ParseError { error, .. } => panic!("unexpected error: {error}"),
            }
        }
        assert_eq!(paths, ["/a", "/b"]);
    }

    #[tokio::test]
    async fn no_start_line_yields_only_premature_end() {
        init_tracing();
        let (mut demux, mut events) = FlowDemux::open(endpoint());

        demux.feed(Direction::ClientToServer, b"GET /x HT").await;
        demux.end().await;
        drop(demux);

        let Some(FlowEvent::ParseError { direction, error, .. }) = events.recv().await else {
            panic!("expected parse error event");
        };
        assert_eq!(direction, Direction::ClientToServer);
        assert!(matches!(error, ParseError::PrematureEnd { stage: "headers" }));

        // nothing else: no headers, no message end, no event for the idle peer
        assert!(events.recv().await.is_none());
    }

    #[tokio::test]
    async fn end_without_bytes_is_silent() {
        init_tracing();
        let (mut demux, mut events) = FlowDemux::open(endpoint());

        demux.end().await;
        demux.end().await;
        drop(demux);

        assert!(events.recv().await.is_none());
    }

    #[tokio::test]
    async fn parse_error_leaves_other_direction_working() {
        init_tracing();
        let (mut demux, mut events) = FlowDemux::open(endpoint());

        demux.feed(Direction::ClientToServer, b"\x00\x01garbage\r\n\r\n").await;
        let Some(FlowEvent::ParseError { direction, .. }) = events.recv().await else {
            panic!("expected parse error event");
        };
        assert_eq!(direction, Direction::ClientToServer);

        // further bytes on the aborted direction are dropped
        demux.feed(Direction::ClientToServer, b"GET /x HTTP/1.1\r\n\r\n").await;

        demux.feed(Direction::ServerToClient, b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nok").await;
        let Some(FlowEvent::Headers(mut message)) = events.recv().await else {
            panic!("expected headers event");
        };
        assert_eq!(message.direction, Direction::ServerToClient);
        assert_eq!(drain_body(&mut message).await, b"ok");
    }

    #[tokio::test]
    async fn dropped_body_consumer_does_not_stall_decoding() {
        init_tracing();
        let (mut demux, mut events) =
            FlowDemux::open_with(endpoint(), DemuxConfig { event_capacity: 16, body_capacity: 0 });

        demux.feed(Direction::ClientToServer, b"POST /u HTTP/1.1\r\nContent-Length: 6\r\n\r\nab").await;

        let Some(FlowEvent::Headers(message)) = events.recv().await else {
            panic!("expected headers event");
        };
        drop(message); // consumer abandons the body

        // remaining chunks are discarded and the message still completes
        demux.feed(Direction::ClientToServer, b"cdef").await;
        assert!(matches!(events.recv().await, Some(FlowEvent::MessageEnd { .. })));

        // the next pipelined message decodes normally
        demux.feed(Direction::ClientToServer, b"GET /x HTTP/1.1\r\n\r\n").await;
        assert!(matches!(events.recv().await, Some(FlowEvent::Headers(_))));
    }

    #[tokio::test]
    async fn duplicate_headers_normalize_last_wins() {
        init_tracing();
        let (mut demux, mut events) = FlowDemux::open(endpoint());

        demux.feed(Direction::ClientToServer, b"GET / HTTP/1.1\r\nX-A: 1\r\nX-A: 2\r\n\r\n").await;

        let Some(FlowEvent::Headers(message)) = events.recv().await else {
            panic!("expected headers event");
        };
        assert_eq!(message.head.header("x-a"), Some("2"));
        assert_eq!(
            message.head.raw_headers(),
            &[("X-A".to_owned(), "1".to_owned()), ("X-A".to_owned(), "2".to_owned())]
        );
    }

    #[tokio::test]
    async fn adapter_merges_connections_with_identity() {
        init_tracing();
        let (adapter, mut events) = CaptureAdapter::new();

        let mut first = adapter.connection(Endpoint::new("10.0.0.1:1000", "10.0.0.2:80", 1));
        let mut second = adapter.connection(Endpoint::new("10.0.0.3:2000", "10.0.0.2:80", 2));

        first.feed(Direction::ClientToServer, b"GET /one HTTP/1.1\r\n\r\n").await;
        second.feed(Direction::ClientToServer, b"GET /two HTTP/1.1\r\n\r\n").await;

        let mut seen = Vec::new();
        for _ in 0..4 {
            let event = events.recv().await.unwrap();
            if let FlowEvent::Headers(message) = event {
                seen.push((message.endpoint.src().to_owned(), message.head.target().unwrap().path().to_owned()));
            }
        }
        seen.sort();
        assert_eq!(
            seen,
            [("10.0.0.1:1000".to_owned(), "/one".to_owned()), ("10.0.0.3:2000".to_owned(), "/two".to_owned())]
        );
    }

    #[tokio::test]
    async fn bodies_can_stream_through_http_body() {
        use http_body_util::BodyExt;

        init_tracing();
        let (mut demux, mut events) = FlowDemux::open(endpoint());

        demux.feed(Direction::ServerToClient, b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\nhello").await;

        let Some(FlowEvent::Headers(message)) = events.recv().await else {
            panic!("expected headers event");
        };
        let collected = message.body.collect().await.unwrap();
        assert_eq!(collected.to_bytes(), Bytes::from_static(b"hello"));
    }
}
