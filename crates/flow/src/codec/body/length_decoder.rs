use std::cmp;

use bytes::BytesMut;

use crate::protocol::PayloadItem;

/// Decoder for fixed-length bodies.
///
/// Emits whatever prefix of the remaining length is buffered, one chunk per
/// call, and `Eof` once the declared length has been consumed. A declared
/// length of zero yields `Eof` on the first call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LengthDecoder {
    remaining: u64,
}

impl LengthDecoder {
    pub(crate) fn new(length: u64) -> Self {
        Self { remaining: length }
    }

    pub(crate) fn decode(&mut self, src: &mut BytesMut) -> Option<PayloadItem> {
        if self.remaining == 0 {
            return Some(PayloadItem::Eof);
        }

        if src.is_empty() {
            return None;
        }

        let len = cmp::min(self.remaining, src.len() as u64) as usize;
        let bytes = src.split_to(len).freeze();

        self.remaining -= len as u64;
        Some(PayloadItem::Chunk(bytes))
    }

    /// True once the declared length has been fully consumed.
    pub(crate) fn is_complete(&self) -> bool {
        self.remaining == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stops_at_declared_length() {
        let mut buffer = BytesMut::from(&b"1012345678trailing"[..]);

        let mut decoder = LengthDecoder::new(10);
        let item = decoder.decode(&mut buffer).unwrap();

        assert_eq!(item.as_bytes().unwrap(), &b"1012345678"[..]);
        assert_eq!(&buffer[..], b"trailing");

        assert!(decoder.is_complete());
        assert!(decoder.decode(&mut buffer).unwrap().is_eof());
    }

    #[test]
    fn accumulates_across_partial_feeds() {
        let mut decoder = LengthDecoder::new(5);
        let mut buffer = BytesMut::from(&b"he"[..]);

        assert_eq!(decoder.decode(&mut buffer).unwrap().as_bytes().unwrap(), &b"he"[..]);
        assert!(decoder.decode(&mut buffer).is_none());

        buffer.extend_from_slice(b"llo");
        assert_eq!(decoder.decode(&mut buffer).unwrap().as_bytes().unwrap(), &b"llo"[..]);
        assert!(decoder.decode(&mut buffer).unwrap().is_eof());
    }

    #[test]
    fn zero_length_is_immediately_complete() {
        let mut decoder = LengthDecoder::new(0);
        let mut buffer = BytesMut::new();

        assert!(decoder.decode(&mut buffer).unwrap().is_eof());
        assert!(decoder.is_complete());
    }
}
