//! Outbound application events.
//!
//! [`MotionEvent`]s are published on the motion channel.  [`NodeEvent`]s
//! are diagnostics emitted through the [`EventSink`](super::ports::EventSink)
//! port; adapters on the other side decide what to do with them (serial
//! log in production, a recording vector in tests).

use serde::Serialize;
use serde_json::ser::Formatter;

use crate::config::TOPIC_CAP;
use crate::error::{OutputError, RouteError, SessionError};

use super::commands::Command;
use super::router::Channel;

/// A motion-state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionEvent {
    /// Rising edge on the motion sensor.
    Started,
    /// No trigger for a full quiescence period.
    Ended,
}

/// Wire shape of a motion report: `{"motion": "..."}`.
#[derive(Debug, Serialize)]
struct MotionReport {
    motion: &'static str,
}

/// Compact JSON with one space after each key's colon, the byte layout
/// dashboards already subscribed to the motion topic expect.
struct ReportFormatter;

impl Formatter for ReportFormatter {
    fn begin_object_value<W>(&mut self, writer: &mut W) -> std::io::Result<()>
    where
        W: ?Sized + std::io::Write,
    {
        writer.write_all(b": ")
    }
}

impl MotionEvent {
    /// Human-readable status carried in the report.
    pub fn status(self) -> &'static str {
        match self {
            Self::Started => "Motion detected",
            Self::Ended => "No motion detected",
        }
    }

    /// JSON payload for the motion channel.
    pub fn payload(self) -> Vec<u8> {
        let mut out = Vec::with_capacity(32);
        let mut ser = serde_json::Serializer::with_formatter(&mut out, ReportFormatter);
        // Serialising a struct of one static str into a Vec cannot fail.
        let _ = MotionReport { motion: self.status() }.serialize(&mut ser);
        out
    }
}

/// Structured diagnostics emitted by the control loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeEvent {
    /// Broker session established (`attempt` counts from 1 per outage).
    Connected { attempt: u32 },
    /// A connect attempt failed; the loop backs off and retries.
    ConnectFailed { attempt: u32, error: SessionError },
    /// The session reported a drop while the loop believed it was up.
    LinkLost,
    /// Subscribing a control channel failed; fixed on the next reconnect.
    SubscribeFailed { channel: Channel, error: SessionError },
    /// A motion report reached the broker.
    MotionPublished(MotionEvent),
    /// A motion report was dropped.
    PublishFailed { event: MotionEvent, error: SessionError },
    /// A decoded command was written to the outputs.
    CommandApplied(Command),
    /// An inbound message produced no command.
    CommandIgnored { topic: heapless::String<TOPIC_CAP>, error: RouteError },
    /// A decoded command could not be written to the outputs.
    OutputFailed { command: Command, error: OutputError },
}
