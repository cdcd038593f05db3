use thiserror::Error;

/// Errors raised while reconstructing a message stream.
///
/// Every variant is local to one direction of one connection: the affected
/// decoder stops consuming bytes, the error is surfaced as an event, and the
/// other direction keeps decoding.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("malformed start line: {reason}")]
    MalformedStartLine { reason: String },

    #[error("malformed header: {reason}")]
    MalformedHeader { reason: String },

    #[error("unsupported http version: {0:?}")]
    InvalidVersion(Option<u8>),

    #[error("header block too large, current: {current_size} exceeds the limit {max_size}")]
    TooLargeHeader { current_size: usize, max_size: usize },

    #[error("header count exceeds the limit {max_num}")]
    TooManyHeaders { max_num: usize },

    #[error("invalid content-length header: {reason}")]
    InvalidContentLength { reason: String },

    #[error("invalid chunked encoding: {reason}")]
    InvalidChunkEncoding { reason: String },

    #[error("connection ended while parsing {stage}")]
    PrematureEnd { stage: &'static str },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ParseError {
    pub fn malformed_start_line<S: ToString>(reason: S) -> Self {
        Self::MalformedStartLine { reason: reason.to_string() }
    }

    pub fn malformed_header<S: ToString>(reason: S) -> Self {
        Self::MalformedHeader { reason: reason.to_string() }
    }

    pub fn too_large_header(current_size: usize, max_size: usize) -> Self {
        Self::TooLargeHeader { current_size, max_size }
    }

    pub fn too_many_headers(max_num: usize) -> Self {
        Self::TooManyHeaders { max_num }
    }

    pub fn invalid_content_length<S: ToString>(reason: S) -> Self {
        Self::InvalidContentLength { reason: reason.to_string() }
    }

    pub fn invalid_chunk<S: ToString>(reason: S) -> Self {
        Self::InvalidChunkEncoding { reason: reason.to_string() }
    }

    pub fn premature_end(stage: &'static str) -> Self {
        Self::PrematureEnd { stage }
    }
}
