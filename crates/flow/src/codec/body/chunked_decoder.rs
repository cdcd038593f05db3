use bytes::{Buf, Bytes, BytesMut};
use tracing::trace;

use crate::protocol::{ParseError, PayloadItem};

use ChunkedState::*;

/// Decoder for chunked transfer encoding.
///
/// Walks the framing byte by byte: size line (hex digits, optional chunk
/// extension after `;`), chunk data, per-chunk CRLF, and the trailer section
/// after the zero-length terminal chunk. Only the chunk data itself is emitted;
/// every framing octet is consumed and dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ChunkedDecoder {
    state: ChunkedState,
    remaining: u64,
}

impl ChunkedDecoder {
    pub(crate) fn new() -> Self {
        Self { state: Size, remaining: 0 }
    }

    pub(crate) fn decode(&mut self, src: &mut BytesMut) -> Result<Option<PayloadItem>, ParseError> {
        loop {
            if self.state == End {
                trace!("finished reading chunked body");
                return Ok(Some(PayloadItem::Eof));
            }

            if src.is_empty() {
                // need more data
                return Ok(None);
            }

            let mut chunk = None;
            match self.state.step(src, &mut self.remaining, &mut chunk)? {
                Step::Next(state) => self.state = state,
                Step::NeedMore => return Ok(None),
            }

            if let Some(bytes) = chunk {
                trace!(len = bytes.len(), "read chunked bytes");
                return Ok(Some(PayloadItem::Chunk(bytes)));
            }
        }
    }

    /// True once the terminal chunk and its trailer section were consumed.
    pub(crate) fn is_complete(&self) -> bool {
        self.state == End
    }
}

enum Step {
    Next(ChunkedState),
    NeedMore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChunkedState {
    Size,
    SizeLws,
    Extension,
    SizeLf,
    Body,
    BodyCr,
    BodyLf,
    Trailer,
    TrailerLf,
    EndCr,
    EndLf,
    End,
}

macro_rules! next_byte {
    ($src:ident) => {{
        if $src.is_empty() {
            return Ok(Step::NeedMore);
        }
        $src.get_u8()
    }};
}

impl ChunkedState {
    fn step(self, src: &mut BytesMut, remaining: &mut u64, chunk: &mut Option<Bytes>) -> Result<Step, ParseError> {
        match self {
            Size => Self::read_size(src, remaining),
            SizeLws => Self::read_size_lws(src),
            Extension => Self::read_extension(src),
            SizeLf => Self::read_size_lf(src, *remaining),
            Body => Self::read_body(src, remaining, chunk),
            BodyCr => Self::expect(src, b'\r', BodyLf, "chunk data CR"),
            BodyLf => Self::expect(src, b'\n', Size, "chunk data LF"),
            Trailer => Self::read_trailer(src),
            TrailerLf => Self::expect(src, b'\n', EndCr, "trailer line LF"),
            EndCr => Self::read_end_cr(src),
            EndLf => Self::expect(src, b'\n', End, "final LF"),
            End => Ok(Step::Next(End)),
        }
    }

    fn read_size(src: &mut BytesMut, remaining: &mut u64) -> Result<Step, ParseError> {
        let digit = |b: u8| -> Option<u64> {
            match b {
                b'0'..=b'9' => Some(u64::from(b - b'0')),
                b'a'..=b'f' => Some(u64::from(b + 10 - b'a')),
                b'A'..=b'F' => Some(u64::from(b + 10 - b'A')),
                _ => None,
            }
        };

        let byte = next_byte!(src);
        if let Some(value) = digit(byte) {
            *remaining = remaining
                .checked_mul(16)
                .and_then(|size| size.checked_add(value))
                .ok_or_else(|| ParseError::invalid_chunk("chunk size overflows u64"))?;
            return Ok(Step::Next(Size));
        }

        match byte {
            b'\t' | b' ' => Ok(Step::Next(SizeLws)),
            b';' => Ok(Step::Next(Extension)),
            b'\r' => Ok(Step::Next(SizeLf)),
            _ => Err(ParseError::invalid_chunk(format!("invalid chunk size character {byte:#04x}"))),
        }
    }

    fn read_size_lws(src: &mut BytesMut) -> Result<Step, ParseError> {
        // linear white space may follow the size, but no further digits
        match next_byte!(src) {
            b'\t' | b' ' => Ok(Step::Next(SizeLws)),
            b';' => Ok(Step::Next(Extension)),
            b'\r' => Ok(Step::Next(SizeLf)),
            _ => Err(ParseError::invalid_chunk("invalid chunk size linear white space")),
        }
    }

    fn read_extension(src: &mut BytesMut) -> Result<Step, ParseError> {
        // extensions are ignored wholesale; they end at the next CRLF. A bare
        // LF inside an extension is rejected rather than silently accepted.
        match next_byte!(src) {
            b'\r' => Ok(Step::Next(SizeLf)),
            b'\n' => Err(ParseError::invalid_chunk("chunk extension contains bare newline")),
            _ => Ok(Step::Next(Extension)),
        }
    }

    fn read_size_lf(src: &mut BytesMut, remaining: u64) -> Result<Step, ParseError> {
        match next_byte!(src) {
            b'\n' if remaining == 0 => Ok(Step::Next(EndCr)),
            b'\n' => Ok(Step::Next(Body)),
            _ => Err(ParseError::invalid_chunk("invalid chunk size line LF")),
        }
    }

    fn read_body(src: &mut BytesMut, remaining: &mut u64, chunk: &mut Option<Bytes>) -> Result<Step, ParseError> {
        if src.is_empty() {
            return Ok(Step::Next(Body));
        }

        if *remaining == 0 {
            return Ok(Step::Next(BodyCr));
        }

        let len = match usize::try_from(*remaining) {
            Ok(remaining) => remaining.min(src.len()),
            Err(_) => src.len(),
        };

        *remaining -= len as u64;
        *chunk = Some(src.split_to(len).freeze());

        if *remaining > 0 { Ok(Step::Next(Body)) } else { Ok(Step::Next(BodyCr)) }
    }

    fn read_trailer(src: &mut BytesMut) -> Result<Step, ParseError> {
        match next_byte!(src) {
            b'\r' => Ok(Step::Next(TrailerLf)),
            _ => Ok(Step::Next(Trailer)),
        }
    }

    fn read_end_cr(src: &mut BytesMut) -> Result<Step, ParseError> {
        match next_byte!(src) {
            b'\r' => Ok(Step::Next(EndLf)),
            // a trailer field instead of the final CRLF
            _ => Ok(Step::Next(Trailer)),
        }
    }

    fn expect(src: &mut BytesMut, expected: u8, next: ChunkedState, what: &str) -> Result<Step, ParseError> {
        let byte = next_byte!(src);
        if byte == expected { Ok(Step::Next(next)) } else { Err(ParseError::invalid_chunk(format!("invalid {what}"))) }
    }
}
