//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ControlLoop (domain)
//! ```
//!
//! Driven adapters (indicator outputs, the broker session, the clock, the
//! diagnostic sink) implement these traits.  The
//! [`ControlLoop`](super::control_loop::ControlLoop) consumes them via
//! generics, so the domain core never touches hardware or sockets directly.
//!
//! The reconnect backoff uses [`embedded_hal::delay::DelayNs`] rather than
//! a port of its own.

use crate::config::TOPIC_CAP;
use crate::error::{OutputError, SessionError};

/// Largest inbound payload accepted; longer control messages are dropped.
pub const PAYLOAD_CAP: usize = 64;

// ───────────────────────────────────────────────────────────────
// Output port (driven adapter: domain → indicators)
// ───────────────────────────────────────────────────────────────

/// Write-side port for the two indicator outputs.
///
/// Every call performs the write; implementations must not suppress
/// writes that repeat the current state.
pub trait OutputPort {
    /// Drive the on/off indicator.
    fn set_switch(&mut self, on: bool) -> Result<(), OutputError>;

    /// Drive the dimmable indicator at an 8-bit duty (0–255).
    fn set_brightness(&mut self, duty: u8) -> Result<(), OutputError>;
}

// ───────────────────────────────────────────────────────────────
// Session port (driven adapter: domain ↔ broker)
// ───────────────────────────────────────────────────────────────

/// A message delivered by the broker on a subscribed topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub topic: heapless::String<TOPIC_CAP>,
    pub payload: heapless::Vec<u8, PAYLOAD_CAP>,
}

impl InboundMessage {
    /// Build from raw parts.  Fails if the topic or the payload does not
    /// fit; a cut-down payload could decode to a different command.
    pub fn new(topic: &str, payload: &[u8]) -> Result<Self, SessionError> {
        let mut t = heapless::String::new();
        t.push_str(topic).map_err(|()| SessionError::TopicTooLong)?;
        let p = heapless::Vec::from_slice(payload).map_err(|()| SessionError::PayloadTooLong)?;
        Ok(Self { topic: t, payload: p })
    }
}

/// Network connectivity plus a publish/subscribe messaging session.
///
/// Inbound messages are delivered asynchronously by the implementation
/// (callback from the MQTT task) and buffered; the control loop drains
/// them with [`poll_inbound`](Self::poll_inbound).  Delivery is assumed
/// in-order per topic, not across topics.
pub trait SessionPort {
    /// Establish (or re-establish) the session.  May block for a bounded time.
    /// Subscriptions never survive a new session.
    fn connect(&mut self) -> Result<(), SessionError>;

    /// Whether the session is currently up.
    fn is_connected(&self) -> bool;

    fn subscribe(&mut self, topic: &str) -> Result<(), SessionError>;

    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), SessionError>;

    /// Next buffered inbound message, if any.  Never blocks.
    fn poll_inbound(&mut self) -> Option<InboundMessage>;
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic millisecond clock, same domain as the interrupt timestamps.
/// Wraps at `u32::MAX` (≈49.7 days); consumers use wrapping arithmetic.
pub trait ClockPort {
    fn now_ms(&self) -> u32;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → diagnostics)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`NodeEvent`](super::events::NodeEvent)s
/// through this port.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::NodeEvent);
}
