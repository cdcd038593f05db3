//! Pull-based body delivery.
//!
//! Body bytes flow through a bounded producer/consumer queue. The decoder side
//! pushes chunks as they are parsed and blocks once the queue is full, which
//! propagates backpressure through `feed` up to whatever layer is supplying
//! bytes. The consumer side, [`FlowBody`], is handed out exactly once with the
//! headers-complete event and pulls at its own pace.
//!
//! End of body is signalled by closing the queue: once the producer half is
//! dropped, every further pull returns the end marker immediately.

use std::convert::Infallible;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::channel::mpsc;
use futures::{SinkExt, Stream, StreamExt};
use http_body::{Body, Frame, SizeHint};

use crate::protocol::PayloadSize;

/// Creates the bounded chunk queue for one message body.
///
/// `capacity` bounds the number of parsed-but-unconsumed chunks (the channel
/// reserves one extra slot for the producer). `framing` is only carried along
/// so the consumer can size-hint and report how the body was delimited.
pub(crate) fn body_channel(capacity: usize, framing: PayloadSize) -> (BodySender, FlowBody) {
    let (sender, receiver) = mpsc::channel(capacity);
    (BodySender { sender }, FlowBody { receiver, framing })
}

/// Producer half of a body queue, owned by the demultiplexer.
///
/// Dropping the sender marks the body complete for the consumer.
#[derive(Debug)]
pub(crate) struct BodySender {
    sender: mpsc::Sender<Bytes>,
}

impl BodySender {
    /// Queues one chunk, waiting while the queue is full.
    ///
    /// Fails once the consumer dropped its [`FlowBody`]; the caller is then
    /// expected to discard the rest of this message's chunks.
    pub(crate) async fn send(&mut self, bytes: Bytes) -> Result<(), mpsc::SendError> {
        self.sender.send(bytes).await
    }
}

/// Consumer handle over one message body.
///
/// Ownership-exclusive: whoever receives it with the headers-complete event is
/// the only reader. Chunks arrive in wire order with all framing octets
/// already stripped. Also usable through [`futures::Stream`] or
/// [`http_body::Body`].
#[derive(Debug)]
pub struct FlowBody {
    receiver: mpsc::Receiver<Bytes>,
    framing: PayloadSize,
}

impl FlowBody {
    /// Pulls the next body chunk.
    ///
    /// Suspends while no chunk is queued and the message is still incomplete.
    /// Returns `None` once the body is fully delivered (and immediately on
    /// every pull thereafter).
    pub async fn chunk(&mut self) -> Option<Bytes> {
        self.receiver.next().await
    }

    /// The framing mode the body was delivered with.
    pub fn framing(&self) -> PayloadSize {
        self.framing
    }
}

impl Stream for FlowBody {
    type Item = Bytes;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_next_unpin(cx)
    }
}

impl Body for FlowBody {
    type Data = Bytes;
    type Error = Infallible;

    fn poll_frame(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        self.receiver.poll_next_unpin(cx).map(|chunk| chunk.map(|bytes| Ok(Frame::data(bytes))))
    }

    fn size_hint(&self) -> SizeHint {
        match self.framing {
            PayloadSize::Length(length) => SizeHint::with_exact(length),
            PayloadSize::Empty => SizeHint::with_exact(0),
            PayloadSize::Chunked | PayloadSize::CloseDelimited => SizeHint::new(),
        }
    }
}
