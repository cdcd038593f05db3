//! HTTP/1.x message reconstruction over reassembled TCP streams.
//!
//! This crate turns the two byte streams of an already-reassembled TCP
//! connection back into the HTTP/1.x requests and responses that were carried
//! on it. It performs no capture and no reassembly of its own: a collaborator
//! (a pcap reader, a live sniffer, a proxy tap) hands over strictly ordered,
//! gap-free bytes per direction, and the crate emits decoded message heads and
//! streaming bodies.
//!
//! # Features
//!
//! - Full HTTP/1.1 and HTTP/1.0 message decoding, requests and responses
//! - Incremental parsing: bytes may arrive split at any boundary
//! - Streaming bodies with fixed-length, chunked and close-delimited framing
//! - Pipelined messages decoded back-to-back on one direction
//! - Both directions of a connection decoded independently
//! - Bounded queues end to end, so a slow consumer backpressures the source
//! - Parse failures isolated to the affected direction
//!
//! # Example
//!
//! ```no_run
//! use http_flow::demux::{CaptureAdapter, FlowEvent};
//! use http_flow::protocol::{Direction, Endpoint};
//! use tracing::{error, info, Level};
//! use tracing_subscriber::FmtSubscriber;
//!
//! #[tokio::main]
//! async fn main() {
//!     let subscriber = FmtSubscriber::builder()
//!         .with_max_level(Level::INFO)
//!         .finish();
//!     tracing::subscriber::set_global_default(subscriber)
//!         .expect("setting default subscriber failed");
//!
//!     let (adapter, mut events) = CaptureAdapter::new();
//!
//!     // the reassembly side: one demultiplexer per observed connection
//!     tokio::spawn(async move {
//!         let mut demux = adapter.connection(Endpoint::new("10.0.0.1:51234", "10.0.0.2:80", 0));
//!         demux.feed(Direction::ClientToServer, b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n").await;
//!         demux.feed(Direction::ServerToClient, b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nok").await;
//!         demux.end().await;
//!     });
//!
//!     // the consumer side: decoded messages from every connection
//!     while let Some(event) = events.recv().await {
//!         match event {
//!             FlowEvent::Headers(mut message) => {
//!                 info!(endpoint = %message.endpoint, direction = %message.direction, "headers");
//!                 while let Some(chunk) = message.body.chunk().await {
//!                     info!(len = chunk.len(), "body chunk");
//!                 }
//!             }
//!             FlowEvent::MessageEnd { endpoint, .. } => {
//!                 info!(endpoint = %endpoint, "message complete");
//!             }
//!             FlowEvent::ParseError { endpoint, error, .. } => {
//!                 error!(endpoint = %endpoint, %error, "direction aborted");
//!             }
//!         }
//!     }
//! }
//! ```
//!
//! # Architecture
//!
//! The crate is organized into three modules:
//!
//! - [`protocol`]: the passive data model (endpoints, message heads, payload
//!   framing, body handles, errors)
//! - [`codec`]: incremental per-direction decoding (head parsing, framing
//!   selection, body decoders)
//! - [`demux`]: per-connection orchestration and the merged event stream
//!
//! # Framing
//!
//! The body framing mode is chosen from the frozen head, in order:
//! `Transfer-Encoding: chunked` wins over `Content-Length`; absent both, a
//! request has no body while a response body runs until end of session, except
//! for status codes that never carry one (1xx, 204, 304).
//!
//! # Limitations
//!
//! - HTTP/1.x only; TLS-carried traffic must be decrypted upstream
//! - Maximum header block size: 8KB
//! - Maximum number of headers: 64

pub mod codec;
pub mod demux;
pub mod protocol;
