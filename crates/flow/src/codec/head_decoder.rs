//! Incremental start-line and header-block decoder.
//!
//! Parses one message head from the front of a direction's byte buffer using
//! `httparse`, returning `None` until the terminating empty line has arrived.
//! On completion the decoder yields the frozen [`MessageHead`] together with
//! the [`PayloadSize`] framing mode selected from its headers, and consumes
//! the head bytes from the buffer.
//!
//! # Limits
//!
//! - Maximum number of headers: 64
//! - Maximum head size: 8 KiB
//!
//! Both limits abort the direction with a parse error when exceeded.

use bytes::{Buf, BytesMut};
use http::{Method, StatusCode, Uri, Version};
use httparse::Status;
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::protocol::{MessageHead, ParseError, PayloadSize, StartLine};

/// Maximum number of headers allowed in one message head
pub(crate) const MAX_HEADER_NUM: usize = 64;

/// Maximum size in bytes allowed for one message head
pub(crate) const MAX_HEADER_BYTES: usize = 8 * 1024;

/// Whether a direction carries requests or responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Request,
    Response,
}

/// Decoder for message heads, configured per direction.
#[derive(Debug, Clone, Copy)]
pub(crate) struct HeadDecoder {
    kind: MessageKind,
}

impl HeadDecoder {
    pub(crate) fn new(kind: MessageKind) -> Self {
        Self { kind }
    }
}

impl Decoder for HeadDecoder {
    type Item = (MessageHead, PayloadSize);
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.is_empty() {
            return Ok(None);
        }

        let parsed = match self.kind {
            MessageKind::Request => parse_request(src.as_ref())?,
            MessageKind::Response => parse_response(src.as_ref())?,
        };

        match parsed {
            Some(parsed) => {
                trace!(head_size = parsed.head_end, "parsed message head");
                if parsed.head_end > MAX_HEADER_BYTES {
                    return Err(ParseError::too_large_header(parsed.head_end, MAX_HEADER_BYTES));
                }

                src.advance(parsed.head_end);

                let head = MessageHead::new(parsed.start_line, parsed.version, parsed.raw_headers);
                let framing = select_framing(&head, self.kind)?;

                Ok(Some((head, framing)))
            }
            None => {
                if src.len() > MAX_HEADER_BYTES {
                    return Err(ParseError::too_large_header(src.len(), MAX_HEADER_BYTES));
                }
                Ok(None)
            }
        }
    }
}

struct ParsedHead {
    start_line: StartLine,
    version: Version,
    raw_headers: Vec<(String, String)>,
    head_end: usize,
}

fn parse_request(src: &[u8]) -> Result<Option<ParsedHead>, ParseError> {
    let mut headers = [httparse::EMPTY_HEADER; MAX_HEADER_NUM];
    let mut req = httparse::Request::new(&mut headers);

    match req.parse(src).map_err(map_httparse_error)? {
        Status::Complete(head_end) => {
            let version = http_version(req.version)?;

            let method = req
                .method
                .and_then(|m| Method::from_bytes(m.as_bytes()).ok())
                .ok_or_else(|| ParseError::malformed_start_line("invalid request method"))?;

            let target = req
                .path
                .and_then(|p| p.parse::<Uri>().ok())
                .ok_or_else(|| ParseError::malformed_start_line("invalid request target"))?;

            Ok(Some(ParsedHead {
                start_line: StartLine::Request { method, target },
                version,
                raw_headers: raw_headers(req.headers),
                head_end,
            }))
        }
        Status::Partial => Ok(None),
    }
}

fn parse_response(src: &[u8]) -> Result<Option<ParsedHead>, ParseError> {
    let mut headers = [httparse::EMPTY_HEADER; MAX_HEADER_NUM];
    let mut res = httparse::Response::new(&mut headers);

    match res.parse(src).map_err(map_httparse_error)? {
        Status::Complete(head_end) => {
            let version = http_version(res.version)?;

            let status = res
                .code
                .and_then(|code| StatusCode::from_u16(code).ok())
                .ok_or_else(|| ParseError::malformed_start_line("invalid status code"))?;

            let reason = res.reason.unwrap_or("").to_owned();

            Ok(Some(ParsedHead {
                start_line: StartLine::Response { status, reason },
                version,
                raw_headers: raw_headers(res.headers),
                head_end,
            }))
        }
        Status::Partial => Ok(None),
    }
}

fn raw_headers(headers: &[httparse::Header<'_>]) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|header| (header.name.to_owned(), String::from_utf8_lossy(header.value).into_owned()))
        .collect()
}

fn map_httparse_error(error: httparse::Error) -> ParseError {
    match error {
        httparse::Error::TooManyHeaders => ParseError::too_many_headers(MAX_HEADER_NUM),
        httparse::Error::HeaderName | httparse::Error::HeaderValue => ParseError::malformed_header(error),
        error => ParseError::malformed_start_line(error),
    }
}

fn http_version(version: Option<u8>) -> Result<Version, ParseError> {
    match version {
        Some(0) => Ok(Version::HTTP_10),
        Some(1) => Ok(Version::HTTP_11),
        // HTTP/2 and HTTP/3 use binary framing and never reach this decoder
        other => Err(ParseError::InvalidVersion(other)),
    }
}

/// Selects the body framing mode for a freshly decoded head.
///
/// Per RFC 9112 section 6.3: chunked transfer encoding takes precedence over
/// `Content-Length` when both are present, since that is how the endpoints
/// will have framed the body on the wire. Requests without declared framing
/// have no body; responses without declared framing are close-delimited unless
/// the status code forbids a body.
fn select_framing(head: &MessageHead, kind: MessageKind) -> Result<PayloadSize, ParseError> {
    if let Some(te_value) = head.header("transfer-encoding") {
        if is_chunked(te_value) {
            return Ok(PayloadSize::Chunked);
        }
    }

    if let Some(cl_value) = head.header("content-length") {
        let length = cl_value
            .trim()
            .parse::<u64>()
            .map_err(|_| ParseError::invalid_content_length(format!("value {cl_value:?} is not a non-negative integer")))?;
        return Ok(PayloadSize::Length(length));
    }

    match kind {
        MessageKind::Request => Ok(PayloadSize::Empty),
        MessageKind::Response => {
            if head.status().is_some_and(is_bodyless_status) {
                Ok(PayloadSize::Empty)
            } else {
                Ok(PayloadSize::CloseDelimited)
            }
        }
    }
}

/// Chunked must be the final encoding of the Transfer-Encoding list to frame
/// the body (RFC 9112).
fn is_chunked(value: &str) -> bool {
    value.rsplit(',').next().is_some_and(|last| last.trim().eq_ignore_ascii_case("chunked"))
}

fn is_bodyless_status(status: StatusCode) -> bool {
    status.is_informational() || status == StatusCode::NO_CONTENT || status == StatusCode::NOT_MODIFIED
}
