//! Body framing decoders.
//!
//! One message body is delimited in exactly one of three ways, selected from
//! its head (see the head decoder):
//!
//! - [`LengthDecoder`]: fixed `Content-Length` bodies
//! - [`ChunkedDecoder`]: chunked transfer encoding, framing octets stripped
//! - [`UntilCloseDecoder`]: close-delimited bodies, ended only by the
//!   end-of-session signal
//!
//! [`PayloadDecoder`] dispatches between them and carries the end-of-session
//! (`finish`) semantics.

mod chunked_decoder;
mod length_decoder;
mod payload_decoder;
mod until_close_decoder;

pub(crate) use chunked_decoder::ChunkedDecoder;
pub(crate) use length_decoder::LengthDecoder;
pub(crate) use payload_decoder::PayloadDecoder;
pub(crate) use until_close_decoder::UntilCloseDecoder;
