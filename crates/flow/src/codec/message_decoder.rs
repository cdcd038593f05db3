//! Per-direction incremental message decoder.
//!
//! One [`MessageDecoder`] turns the ordered byte stream of a single direction
//! into a sequence of decoded messages. It runs head parsing and body framing
//! as a two-phase state machine, in the shape of a `tokio_util` codec:
//!
//! - no payload decoder: parsing the next message head
//! - payload decoder present: streaming that message's body
//!
//! After a body reaches `Eof` the payload decoder is dropped and the next
//! bytes start a new head, so persistent and pipelined connections decode as a
//! sequence of messages.

use bytes::BytesMut;
use tokio_util::codec::Decoder;

use crate::codec::body::PayloadDecoder;
use crate::codec::head_decoder::{HeadDecoder, MessageKind};
use crate::protocol::{Message, MessageHead, ParseError, PayloadItem, PayloadSize};

/// Incremental decoder for one direction of one connection.
#[derive(Debug)]
pub struct MessageDecoder {
    head_decoder: HeadDecoder,
    payload_decoder: Option<PayloadDecoder>,
}

impl MessageDecoder {
    pub fn new(kind: MessageKind) -> Self {
        Self { head_decoder: HeadDecoder::new(kind), payload_decoder: None }
    }

    /// Decoder for the client-to-server (request) direction.
    pub fn request() -> Self {
        Self::new(MessageKind::Request)
    }

    /// Decoder for the server-to-client (response) direction.
    pub fn response() -> Self {
        Self::new(MessageKind::Response)
    }

    /// Applies the end-of-session signal.
    ///
    /// Completes a close-delimited body (draining any buffered bytes first,
    /// one item per call), reports [`ParseError::PrematureEnd`] when the
    /// direction is cut off mid-head or mid-body, and returns `None` once the
    /// direction is cleanly finished.
    pub fn finish(&mut self, src: &mut BytesMut) -> Result<Option<PayloadItem>, ParseError> {
        match &mut self.payload_decoder {
            Some(payload_decoder) => {
                payload_decoder.finish();
                match payload_decoder.decode(src)? {
                    Some(item @ PayloadItem::Chunk(_)) => Ok(Some(item)),
                    Some(item @ PayloadItem::Eof) => {
                        self.payload_decoder.take();
                        Ok(Some(item))
                    }
                    None => {
                        if payload_decoder.is_complete() {
                            self.payload_decoder.take();
                            Ok(Some(PayloadItem::Eof))
                        } else {
                            Err(ParseError::premature_end("body"))
                        }
                    }
                }
            }
            None if src.is_empty() => Ok(None),
            None => Err(ParseError::premature_end("headers")),
        }
    }
}

impl Decoder for MessageDecoder {
    type Item = Message<(MessageHead, PayloadSize)>;
    type Error = ParseError;

    /// Decodes the next item from the direction's buffer.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Message::Header(_)))`: a complete message head
    /// - `Ok(Some(Message::Payload(_)))`: a body chunk or end-of-body marker
    /// - `Ok(None)`: need more data
    /// - `Err(_)`: unrecoverable parse error, the direction must be aborted
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        // stream payload while a body is in flight
        if let Some(payload_decoder) = &mut self.payload_decoder {
            let message = match payload_decoder.decode(src)? {
                Some(item @ PayloadItem::Chunk(_)) => Some(Message::Payload(item)),
                Some(item @ PayloadItem::Eof) => {
                    // message complete, reset for the next head on this direction
                    self.payload_decoder.take();
                    Some(Message::Payload(item))
                }
                None => None,
            };

            return Ok(message);
        }

        // otherwise parse the next head
        let message = match self.head_decoder.decode(src)? {
            Some((head, payload_size)) => {
                self.payload_decoder = Some(payload_size.into());
                Some(Message::Header((head, payload_size)))
            }
            None => None,
        };

        Ok(message)
    }
}
