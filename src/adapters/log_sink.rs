//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing node diagnostics to the ESP-IDF
//! logger (UART / USB-CDC in production).  This is the node's only
//! diagnostic output; nothing here feeds back into control decisions.

use log::{info, warn};

use crate::app::events::NodeEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`NodeEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &NodeEvent) {
        match event {
            NodeEvent::Connected { attempt } => {
                info!("LINK | connected to broker (attempt {})", attempt);
            }
            NodeEvent::ConnectFailed { attempt, error } => {
                warn!("LINK | connect attempt {} failed: {}", attempt, error);
            }
            NodeEvent::LinkLost => {
                warn!("LINK | session lost");
            }
            NodeEvent::SubscribeFailed { channel, error } => {
                warn!("LINK | subscribe {:?} failed: {}", channel, error);
            }
            NodeEvent::MotionPublished(ev) => {
                info!("MOTION | {} sent", ev.status());
            }
            NodeEvent::PublishFailed { event, error } => {
                warn!("MOTION | '{}' dropped: {}", event.status(), error);
            }
            NodeEvent::CommandApplied(cmd) => {
                info!("CMD | applied {:?}", cmd);
            }
            NodeEvent::CommandIgnored { topic, error } => {
                info!("CMD | ignored on '{}': {}", topic, error);
            }
            NodeEvent::OutputFailed { command, error } => {
                warn!("CMD | {:?} not applied: {}", command, error);
            }
        }
    }
}
