use bytes::BytesMut;

use crate::protocol::PayloadItem;

/// Decoder for close-delimited bodies.
///
/// Legacy responses may declare neither `Content-Length` nor chunked framing;
/// their body is everything until the connection closes. Bytes pass through
/// untouched and `Eof` is only emitted after [`finish`](Self::finish) marks
/// the end-of-session signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct UntilCloseDecoder {
    finished: bool,
}

impl UntilCloseDecoder {
    pub(crate) fn new() -> Self {
        Self { finished: false }
    }

    pub(crate) fn decode(&mut self, src: &mut BytesMut) -> Option<PayloadItem> {
        if !src.is_empty() {
            let bytes = src.split_to(src.len()).freeze();
            return Some(PayloadItem::Chunk(bytes));
        }

        if self.finished { Some(PayloadItem::Eof) } else { None }
    }

    /// Records the end-of-session signal; the next decode emits `Eof`.
    pub(crate) fn finish(&mut self) {
        self.finished = true;
    }
}
