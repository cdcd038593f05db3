use futures::channel::mpsc;
use tracing::debug;

use crate::demux::{DemuxConfig, FlowDemux, FlowEvent, FlowEvents};
use crate::protocol::Endpoint;

/// Bridge between the reassembly collaborator and the per-connection
/// demultiplexers.
///
/// The reassembly layer reports connections one at a time; the adapter opens a
/// [`FlowDemux`] for each and merges every connection's events into the single
/// [`FlowEvents`] stream handed out at construction, each event tagged with
/// its connection's endpoint. Connections stay fully independent otherwise.
#[derive(Debug, Clone)]
pub struct CaptureAdapter {
    events: mpsc::Sender<FlowEvent>,
    config: DemuxConfig,
}

impl CaptureAdapter {
    /// Creates an adapter with default queue bounds.
    pub fn new() -> (Self, FlowEvents) {
        Self::with_config(DemuxConfig::default())
    }

    /// Creates an adapter with explicit queue bounds, applied to the merged
    /// event queue and to every connection's body queues.
    pub fn with_config(config: DemuxConfig) -> (Self, FlowEvents) {
        let (sender, receiver) = mpsc::channel(config.event_capacity);
        (Self { events: sender, config }, FlowEvents::new(receiver))
    }

    /// Handles one newly observed TCP connection.
    ///
    /// Call once per connection reported by the reassembly layer; feed the
    /// returned demultiplexer with that connection's direction-tagged bytes
    /// and its end-of-session signal.
    pub fn connection(&self, endpoint: Endpoint) -> FlowDemux {
        debug!(endpoint = %endpoint, "new connection");
        FlowDemux::with_sender(endpoint, self.events.clone(), self.config.body_capacity)
    }
}
