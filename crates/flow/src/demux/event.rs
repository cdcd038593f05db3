use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::channel::mpsc;
use futures::{Stream, StreamExt};

use crate::protocol::{Direction, Endpoint, FlowBody, MessageHead, ParseError};

/// One decoded message as handed to the consumer.
///
/// Emitted with the headers-complete event, while the body may still be
/// filling. The head is frozen; the body is pulled through [`FlowBody`] and is
/// readable exactly once, by whoever owns this value.
#[derive(Debug)]
pub struct FlowMessage {
    /// Identity of the connection the message was observed on.
    pub endpoint: Arc<Endpoint>,
    /// Direction the message travelled in.
    pub direction: Direction,
    /// The frozen start line and headers.
    pub head: Arc<MessageHead>,
    /// Pull handle over the streaming body.
    pub body: FlowBody,
}

/// Events emitted by a flow demultiplexer.
///
/// Within one direction events arrive in decode order: headers, body chunks
/// (through the message's [`FlowBody`]), then the message end. No ordering is
/// guaranteed between the two directions of a connection.
#[derive(Debug)]
pub enum FlowEvent {
    /// A message head completed; the body is still streaming.
    Headers(FlowMessage),
    /// A message's body was fully delivered (or was empty/absent).
    MessageEnd { endpoint: Arc<Endpoint>, direction: Direction, head: Arc<MessageHead> },
    /// A direction failed to parse and was aborted. The other direction and
    /// other connections are unaffected.
    ParseError { endpoint: Arc<Endpoint>, direction: Direction, error: ParseError },
}

impl FlowEvent {
    /// The connection the event belongs to.
    pub fn endpoint(&self) -> &Arc<Endpoint> {
        match self {
            FlowEvent::Headers(message) => &message.endpoint,
            FlowEvent::MessageEnd { endpoint, .. } => endpoint,
            FlowEvent::ParseError { endpoint, .. } => endpoint,
        }
    }

    /// The direction the event belongs to.
    pub fn direction(&self) -> Direction {
        match self {
            FlowEvent::Headers(message) => message.direction,
            FlowEvent::MessageEnd { direction, .. } => *direction,
            FlowEvent::ParseError { direction, .. } => *direction,
        }
    }
}

/// Consumer side of the event queue.
///
/// Backed by a bounded channel: when the consumer falls behind, the
/// demultiplexer's `feed` calls start waiting, which is how backpressure
/// reaches the byte source.
#[derive(Debug)]
pub struct FlowEvents {
    receiver: mpsc::Receiver<FlowEvent>,
}

impl FlowEvents {
    pub(crate) fn new(receiver: mpsc::Receiver<FlowEvent>) -> Self {
        Self { receiver }
    }

    /// Receives the next event; `None` once every producer is gone.
    pub async fn recv(&mut self) -> Option<FlowEvent> {
        self.receiver.next().await
    }
}

impl Stream for FlowEvents {
    type Item = FlowEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_next_unpin(cx)
    }
}
