use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use futures::SinkExt;
use futures::channel::mpsc;
use tokio_util::codec::Decoder;
use tracing::{debug, error, trace, warn};

use crate::codec::MessageDecoder;
use crate::demux::{FlowEvent, FlowEvents, FlowMessage};
use crate::protocol::{
    BodySender, Direction, Endpoint, Message, MessageHead, ParseError, PayloadItem, body_channel,
};

/// Queue bounds for one demultiplexer.
///
/// Both queues are bounded so a slow consumer stalls `feed` instead of growing
/// memory without limit; the capacities are the number of queued items beyond
/// which the producer waits.
#[derive(Debug, Clone, Copy)]
pub struct DemuxConfig {
    /// Pending [`FlowEvent`]s before `feed` waits.
    pub event_capacity: usize,
    /// Parsed-but-unconsumed chunks per message body before `feed` waits.
    pub body_capacity: usize,
}

impl Default for DemuxConfig {
    fn default() -> Self {
        Self { event_capacity: 16, body_capacity: 8 }
    }
}

/// Demultiplexer for one TCP connection.
///
/// Owns one [`MessageDecoder`] per direction, routes direction-tagged bytes to
/// the matching decoder and forwards decoded messages as [`FlowEvent`]s with
/// the connection identity attached. Performs no I/O of its own.
#[derive(Debug)]
pub struct FlowDemux {
    endpoint: Arc<Endpoint>,
    events: mpsc::Sender<FlowEvent>,
    body_capacity: usize,
    client: DirectionState,
    server: DirectionState,
    ended: bool,
}

impl FlowDemux {
    /// Opens a demultiplexer for a newly observed connection with default
    /// queue bounds.
    pub fn open(endpoint: Endpoint) -> (Self, FlowEvents) {
        Self::open_with(endpoint, DemuxConfig::default())
    }

    /// Opens a demultiplexer with explicit queue bounds.
    pub fn open_with(endpoint: Endpoint, config: DemuxConfig) -> (Self, FlowEvents) {
        let (sender, receiver) = mpsc::channel(config.event_capacity);
        (Self::with_sender(endpoint, sender, config.body_capacity), FlowEvents::new(receiver))
    }

    /// Wires a demultiplexer onto an existing event queue; used by the capture
    /// adapter to merge every connection into one stream.
    pub(crate) fn with_sender(endpoint: Endpoint, events: mpsc::Sender<FlowEvent>, body_capacity: usize) -> Self {
        let endpoint = Arc::new(endpoint);
        Self {
            endpoint,
            events,
            body_capacity,
            client: DirectionState::new(Direction::ClientToServer),
            server: DirectionState::new(Direction::ServerToClient),
            ended: false,
        }
    }

    /// The connection identity this demultiplexer was opened with.
    pub fn endpoint(&self) -> &Arc<Endpoint> {
        &self.endpoint
    }

    /// Feeds strictly ordered, gap-free bytes for one direction.
    ///
    /// The reassembly collaborator guarantees ordering; no reordering happens
    /// here. The call waits whenever the event queue or the current message's
    /// body queue is full.
    pub async fn feed(&mut self, direction: Direction, bytes: &[u8]) {
        if self.ended {
            warn!(endpoint = %self.endpoint, %direction, "feed after end of session, dropping bytes");
            return;
        }

        let Self { endpoint, events, body_capacity, client, server, .. } = self;
        let state = match direction {
            Direction::ClientToServer => client,
            Direction::ServerToClient => server,
        };

        if state.aborted {
            trace!(endpoint = %endpoint, %direction, len = bytes.len(), "direction aborted, dropping bytes");
            return;
        }

        state.buffer.extend_from_slice(bytes);
        state.drive(endpoint, events, *body_capacity).await;
    }

    /// Signals that no further bytes will arrive on either direction.
    ///
    /// Close-delimited bodies complete, directions cut off mid-head or
    /// mid-body surface [`ParseError::PrematureEnd`], and all body queues are
    /// released. Idempotent.
    pub async fn end(&mut self) {
        if self.ended {
            return;
        }
        self.ended = true;

        debug!(endpoint = %self.endpoint, "end of session");

        let Self { endpoint, events, client, server, .. } = self;
        client.finish(endpoint, events).await;
        server.finish(endpoint, events).await;
    }
}

/// Decoder, buffer and in-flight message of one direction.
#[derive(Debug)]
struct DirectionState {
    direction: Direction,
    decoder: MessageDecoder,
    buffer: BytesMut,
    current: Option<InFlight>,
    aborted: bool,
}

/// The message currently streaming its body.
#[derive(Debug)]
struct InFlight {
    head: Arc<MessageHead>,
    /// `None` once the consumer dropped its body handle; remaining chunks of
    /// this message are then discarded while framing stays intact.
    sender: Option<BodySender>,
}

impl DirectionState {
    fn new(direction: Direction) -> Self {
        let decoder = if direction.is_request() { MessageDecoder::request() } else { MessageDecoder::response() };
        Self { direction, decoder, buffer: BytesMut::new(), current: None, aborted: false }
    }

    /// Runs the decoder over the buffered bytes until it needs more data.
    async fn drive(&mut self, endpoint: &Arc<Endpoint>, events: &mut mpsc::Sender<FlowEvent>, body_capacity: usize) {
        loop {
            match self.decoder.decode(&mut self.buffer) {
                Ok(Some(Message::Header((head, framing)))) => {
                    trace!(endpoint = %endpoint, direction = %self.direction, ?framing, "headers complete");

                    let head = Arc::new(head);
                    let (sender, body) = body_channel(body_capacity, framing);
                    self.current = Some(InFlight { head: Arc::clone(&head), sender: Some(sender) });

                    let message =
                        FlowMessage { endpoint: Arc::clone(endpoint), direction: self.direction, head, body };
                    emit(events, FlowEvent::Headers(message)).await;
                }

                Ok(Some(Message::Payload(PayloadItem::Chunk(bytes)))) => {
                    self.deliver(bytes).await;
                }

                Ok(Some(Message::Payload(PayloadItem::Eof))) => {
                    if let Some(current) = self.current.take() {
                        trace!(endpoint = %endpoint, direction = %self.direction, "message complete");
                        // dropping the sender ends the consumer's body stream
                        drop(current.sender);
                        let event = FlowEvent::MessageEnd {
                            endpoint: Arc::clone(endpoint),
                            direction: self.direction,
                            head: current.head,
                        };
                        emit(events, event).await;
                    }
                }

                Ok(None) => return,

                Err(parse_error) => {
                    self.abort(endpoint, events, parse_error).await;
                    return;
                }
            }
        }
    }

    /// Queues one body chunk for the consumer, discarding it if the consumer
    /// dropped its handle.
    async fn deliver(&mut self, bytes: Bytes) {
        let Some(current) = self.current.as_mut() else { return };
        let Some(sender) = current.sender.as_mut() else { return };

        if sender.send(bytes).await.is_err() {
            trace!(direction = %self.direction, "body consumer gone, discarding rest of message");
            current.sender.take();
        }
    }

    /// Applies the end-of-session signal to this direction.
    async fn finish(&mut self, endpoint: &Arc<Endpoint>, events: &mut mpsc::Sender<FlowEvent>) {
        while !self.aborted {
            match self.decoder.finish(&mut self.buffer) {
                Ok(Some(PayloadItem::Chunk(bytes))) => self.deliver(bytes).await,

                Ok(Some(PayloadItem::Eof)) => {
                    if let Some(current) = self.current.take() {
                        drop(current.sender);
                        let event = FlowEvent::MessageEnd {
                            endpoint: Arc::clone(endpoint),
                            direction: self.direction,
                            head: current.head,
                        };
                        emit(events, event).await;
                    }
                }

                Ok(None) => break,

                Err(parse_error) => {
                    self.abort(endpoint, events, parse_error).await;
                    break;
                }
            }
        }

        // release whatever is still open
        self.current.take();
        self.buffer = BytesMut::new();
    }

    /// Stops consuming this direction and surfaces the error.
    async fn abort(&mut self, endpoint: &Arc<Endpoint>, events: &mut mpsc::Sender<FlowEvent>, error: ParseError) {
        error!(endpoint = %endpoint, direction = %self.direction, %error, "direction aborted");

        self.aborted = true;
        self.buffer.clear();
        // drops the body sender; the consumer sees the end marker
        self.current.take();

        let event =
            FlowEvent::ParseError { endpoint: Arc::clone(endpoint), direction: self.direction, error };
        emit(events, event).await;
    }
}

/// Sends an event, waiting while the queue is full. A closed queue (consumer
/// gone) is not an error: decoding continues so framing stays correct.
async fn emit(events: &mut mpsc::Sender<FlowEvent>, event: FlowEvent) {
    if events.send(event).await.is_err() {
        trace!("event consumer gone, dropping event");
    }
}
