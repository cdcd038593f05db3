//! TCP connection identity.
//!
//! A reassembled connection is identified by the tuple the capture layer
//! reports when it first observes the flow: source name, destination name and
//! the initial sequence number of the client side. The same [`Endpoint`] is
//! shared by every message decoded on either direction of the connection.

use std::fmt::{Display, Formatter};

/// Identity of one observed TCP connection.
///
/// Built once by the reassembly collaborator when the connection opens and
/// never mutated afterwards; the demultiplexer hands it out behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    src: String,
    dst: String,
    isn: u32,
}

impl Endpoint {
    /// Creates a connection identity from `"addr:port"` names and the initial
    /// sequence number.
    pub fn new(src: impl Into<String>, dst: impl Into<String>, isn: u32) -> Self {
        Self { src: src.into(), dst: dst.into(), isn }
    }

    /// Source (client) `"addr:port"` name.
    pub fn src(&self) -> &str {
        &self.src
    }

    /// Destination (server) `"addr:port"` name.
    pub fn dst(&self) -> &str {
        &self.dst
    }

    /// Initial sequence number of the client side.
    pub fn isn(&self) -> u32 {
        self.isn
    }
}

impl Display for Endpoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.src, self.dst)
    }
}

/// One of the two independent byte streams of a TCP connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Bytes sent by the client, carrying HTTP requests.
    ClientToServer,
    /// Bytes sent by the server, carrying HTTP responses.
    ServerToClient,
}

impl Direction {
    /// Returns true for the request-carrying direction.
    #[inline]
    pub fn is_request(self) -> bool {
        matches!(self, Direction::ClientToServer)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::ClientToServer => "client->server",
            Direction::ServerToClient => "server->client",
        }
    }
}

impl Display for Direction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
