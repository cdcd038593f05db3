//! Incremental HTTP/1.x decoding.
//!
//! This module contains the per-direction decoding machinery:
//!
//! - [`MessageDecoder`]: drives one direction, head then body, resetting after
//!   each completed message
//! - head parsing (private `head_decoder`): start line, header block and
//!   framing-mode selection
//! - body framing (private `body`): fixed-length, chunked and close-delimited
//!   decoders
//!
//! All decoders implement or follow the `tokio_util::codec::Decoder` calling
//! convention: they consume from the front of a `BytesMut`, return `Ok(None)`
//! when more bytes are needed, and never look at bytes beyond the message they
//! are currently decoding.

mod body;
mod head_decoder;
mod message_decoder;

pub use head_decoder::MessageKind;
pub use message_decoder::MessageDecoder;
