//! Decoded message heads.
//!
//! A [`MessageHead`] is the frozen result of parsing one start line and its
//! header block. Headers are kept twice: the raw list exactly as they appeared
//! on the wire (order, duplicates and case preserved) and a normalized map
//! keyed by lowercase name. The normalized map is folded from the raw list
//! once the header block completes, so on duplicate names the last occurrence
//! wins.

use std::collections::HashMap;

use http::{Method, StatusCode, Uri, Version};

/// The first line of an HTTP/1.x message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartLine {
    /// Request line: `METHOD target HTTP/maj.min`
    Request { method: Method, target: Uri },
    /// Status line: `HTTP/maj.min code reason`
    Response { status: StatusCode, reason: String },
}

/// One decoded request or response head.
///
/// Immutable once built; the demultiplexer shares it between the
/// headers-complete and message-complete events behind an `Arc`.
#[derive(Debug, Clone)]
pub struct MessageHead {
    start_line: StartLine,
    version: Version,
    raw_headers: Vec<(String, String)>,
    headers: HashMap<String, String>,
}

impl MessageHead {
    pub(crate) fn new(start_line: StartLine, version: Version, raw_headers: Vec<(String, String)>) -> Self {
        // last occurrence wins on duplicate names
        let headers =
            raw_headers.iter().map(|(name, value)| (name.to_ascii_lowercase(), value.clone())).collect();

        Self { start_line, version, raw_headers, headers }
    }

    pub fn start_line(&self) -> &StartLine {
        &self.start_line
    }

    pub fn version(&self) -> Version {
        self.version
    }

    /// Header fields in wire order, duplicates and name case preserved.
    pub fn raw_headers(&self) -> &[(String, String)] {
        &self.raw_headers
    }

    /// Normalized header map: lowercase name, last occurrence wins.
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Case-insensitive single-header lookup against the normalized map.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    /// Returns true when the head was decoded from the request direction.
    #[inline]
    pub fn is_request(&self) -> bool {
        matches!(self.start_line, StartLine::Request { .. })
    }

    /// Request method, if this is a request head.
    pub fn method(&self) -> Option<&Method> {
        match &self.start_line {
            StartLine::Request { method, .. } => Some(method),
            StartLine::Response { .. } => None,
        }
    }

    /// Request target, if this is a request head.
    pub fn target(&self) -> Option<&Uri> {
        match &self.start_line {
            StartLine::Request { target, .. } => Some(target),
            StartLine::Response { .. } => None,
        }
    }

    /// Status code, if this is a response head.
    pub fn status(&self) -> Option<StatusCode> {
        match &self.start_line {
            StartLine::Request { .. } => None,
            StartLine::Response { status, .. } => Some(*status),
        }
    }

    /// Status reason phrase, if this is a response head.
    pub fn reason(&self) -> Option<&str> {
        match &self.start_line {
            StartLine::Request { .. } => None,
            StartLine::Response { reason, .. } => Some(reason),
        }
    }
}
