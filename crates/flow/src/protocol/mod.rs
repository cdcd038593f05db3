//! Shared protocol types for reconstructed HTTP message streams.
//!
//! This module provides the data model produced by the decoding pipeline:
//!
//! - **Connection identity** ([`endpoint`]): [`Endpoint`] and [`Direction`]
//! - **Message heads** ([`head`]): [`StartLine`] and [`MessageHead`] with the
//!   raw header list and the normalized header map
//! - **Payload items** ([`message`]): [`Message`], [`PayloadItem`] and the
//!   [`PayloadSize`] framing mode
//! - **Body streaming** ([`body`]): the pull-based [`FlowBody`] handle and its
//!   producer half
//! - **Errors** ([`error`]): the [`ParseError`] taxonomy
//!
//! Everything here is passive data: decoding logic lives in [`crate::codec`]
//! and per-connection orchestration in [`crate::demux`].

mod endpoint;
pub use endpoint::Direction;
pub use endpoint::Endpoint;

mod head;
pub use head::MessageHead;
pub use head::StartLine;

mod message;
pub use message::Message;
pub use message::PayloadItem;
pub use message::PayloadSize;

mod error;
pub use error::ParseError;

mod body;
pub(crate) use body::BodySender;
pub(crate) use body::body_channel;
pub use body::FlowBody;
