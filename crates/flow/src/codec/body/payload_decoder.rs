use bytes::BytesMut;
use tokio_util::codec::Decoder;

use crate::codec::body::{ChunkedDecoder, LengthDecoder, UntilCloseDecoder};
use crate::protocol::{ParseError, PayloadItem, PayloadSize};

/// Decoder for one message body, dispatching on its framing mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PayloadDecoder {
    kind: Kind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Kind {
    /// content-length framed body (also used for empty bodies)
    Length(LengthDecoder),

    /// transfer-encoding chunked body
    Chunked(ChunkedDecoder),

    /// close-delimited body
    UntilClose(UntilCloseDecoder),
}

impl PayloadDecoder {
    pub(crate) fn empty() -> Self {
        Self { kind: Kind::Length(LengthDecoder::new(0)) }
    }

    pub(crate) fn length(size: u64) -> Self {
        Self { kind: Kind::Length(LengthDecoder::new(size)) }
    }

    pub(crate) fn chunked() -> Self {
        Self { kind: Kind::Chunked(ChunkedDecoder::new()) }
    }

    pub(crate) fn until_close() -> Self {
        Self { kind: Kind::UntilClose(UntilCloseDecoder::new()) }
    }

    /// Marks the end-of-session signal.
    ///
    /// Completes a close-delimited body; a no-op for declared framings, whose
    /// incompleteness is then reported by [`is_complete`](Self::is_complete).
    pub(crate) fn finish(&mut self) {
        if let Kind::UntilClose(decoder) = &mut self.kind {
            decoder.finish();
        }
    }

    /// True when the framing permits the message to end right now.
    pub(crate) fn is_complete(&self) -> bool {
        match &self.kind {
            Kind::Length(decoder) => decoder.is_complete(),
            Kind::Chunked(decoder) => decoder.is_complete(),
            // a close-delimited body may end at any point
            Kind::UntilClose(_) => true,
        }
    }
}

impl From<PayloadSize> for PayloadDecoder {
    fn from(payload_size: PayloadSize) -> Self {
        match payload_size {
            PayloadSize::Length(length) => Self::length(length),
            PayloadSize::Chunked => Self::chunked(),
            PayloadSize::CloseDelimited => Self::until_close(),
            PayloadSize::Empty => Self::empty(),
        }
    }
}

impl Decoder for PayloadDecoder {
    type Item = PayloadItem;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match &mut self.kind {
            Kind::Length(decoder) => Ok(decoder.decode(src)),
            Kind::Chunked(decoder) => decoder.decode(src),
            Kind::UntilClose(decoder) => Ok(decoder.decode(src)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn framing_mode_selects_the_decoder() {
        assert!(PayloadDecoder::from(PayloadSize::Empty).is_complete());
        assert!(!PayloadDecoder::from(PayloadSize::Length(3)).is_complete());
        assert!(!PayloadDecoder::from(PayloadSize::Chunked).is_complete());
        assert!(PayloadDecoder::from(PayloadSize::CloseDelimited).is_complete());
    }

    #[test]
    fn finish_completes_only_close_delimited() {
        let mut decoder = PayloadDecoder::from(PayloadSize::CloseDelimited);
        decoder.finish();
        let mut buffer = BytesMut::new();
        assert!(decoder.decode(&mut buffer).unwrap().unwrap().is_eof());

        let mut decoder = PayloadDecoder::from(PayloadSize::Length(3));
        decoder.finish();
        assert!(decoder.decode(&mut buffer).unwrap().is_none());
        assert!(!decoder.is_complete());
    }
}
