//! Mock adapters for integration tests.
//!
//! Every port gets a recording double so tests can assert on the full
//! call history, in order, without real GPIO, PWM or network.

use std::cell::Cell;
use std::collections::VecDeque;

use embedded_hal::delay::DelayNs;
use motion_node::app::events::NodeEvent;
use motion_node::app::ports::{ClockPort, EventSink, InboundMessage, OutputPort, SessionPort};
use motion_node::error::{OutputError, SessionError};

// ── Outputs ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputCall {
    Switch(bool),
    Brightness(u8),
}

#[derive(Default)]
pub struct MockOutputs {
    pub calls: Vec<OutputCall>,
}

#[allow(dead_code)]
impl MockOutputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn switch_on(&self) -> Option<bool> {
        self.calls.iter().rev().find_map(|c| match c {
            OutputCall::Switch(on) => Some(*on),
            OutputCall::Brightness(_) => None,
        })
    }

    pub fn duty(&self) -> Option<u8> {
        self.calls.iter().rev().find_map(|c| match c {
            OutputCall::Brightness(d) => Some(*d),
            OutputCall::Switch(_) => None,
        })
    }
}

impl OutputPort for MockOutputs {
    fn set_switch(&mut self, on: bool) -> Result<(), OutputError> {
        self.calls.push(OutputCall::Switch(on));
        Ok(())
    }

    fn set_brightness(&mut self, duty: u8) -> Result<(), OutputError> {
        self.calls.push(OutputCall::Brightness(duty));
        Ok(())
    }
}

// ── Session ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCall {
    Connect,
    Subscribe(String),
    Publish(String, Vec<u8>),
    /// `poll_inbound` handed a message on this topic to the loop.
    Delivered(String),
}

/// Scripted broker session.
///
/// `connect` pops results from `connect_script` (empty means success).
/// Messages queued with [`MockSession::retain`] are delivered as soon as
/// their topic is subscribed, like a broker's retained message.
#[derive(Default)]
pub struct MockSession {
    pub calls: Vec<SessionCall>,
    pub connect_script: VecDeque<Result<(), SessionError>>,
    pub fail_publish: bool,
    pub fail_subscribe: bool,
    connected: bool,
    subscriptions: Vec<String>,
    retained: Vec<(String, Vec<u8>)>,
    inbound: VecDeque<InboundMessage>,
}

#[allow(dead_code)]
impl MockSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session that fails `n` connects before succeeding.
    pub fn failing(n: usize, error: SessionError) -> Self {
        Self {
            connect_script: std::iter::repeat_n(Err(error), n).collect(),
            ..Self::default()
        }
    }

    /// Broker delivers immediately; dropped unless subscribed.
    pub fn deliver(&mut self, topic: &str, payload: &[u8]) {
        if self.connected && self.subscriptions.iter().any(|s| s == topic) {
            self.push_inbound(topic, payload);
        }
    }

    /// Deliver on the next subscribe to `topic`.
    pub fn retain(&mut self, topic: &str, payload: &[u8]) {
        self.retained.push((topic.to_owned(), payload.to_vec()));
    }

    /// Broker drops the session; subscriptions and queued inbound are lost.
    pub fn drop_session(&mut self) {
        self.connected = false;
        self.subscriptions.clear();
        self.inbound.clear();
    }

    pub fn subscriptions(&self) -> &[String] {
        &self.subscriptions
    }

    pub fn published(&self) -> Vec<(String, Vec<u8>)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                SessionCall::Publish(t, p) => Some((t.clone(), p.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn connects(&self) -> usize {
        self.calls.iter().filter(|c| **c == SessionCall::Connect).count()
    }

    fn push_inbound(&mut self, topic: &str, payload: &[u8]) {
        if let Ok(msg) = InboundMessage::new(topic, payload) {
            self.inbound.push_back(msg);
        }
    }
}

impl SessionPort for MockSession {
    fn connect(&mut self) -> Result<(), SessionError> {
        self.calls.push(SessionCall::Connect);
        self.connect_script.pop_front().unwrap_or(Ok(()))?;
        self.connected = true;
        self.subscriptions.clear();
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), SessionError> {
        self.calls.push(SessionCall::Subscribe(topic.to_owned()));
        if self.fail_subscribe {
            return Err(SessionError::SubscribeFailed(-1));
        }
        self.subscriptions.push(topic.to_owned());
        let retained: Vec<_> = self.retained.iter().filter(|(t, _)| t == topic).cloned().collect();
        for (t, p) in retained {
            self.push_inbound(&t, &p);
        }
        Ok(())
    }

    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), SessionError> {
        if self.fail_publish || !self.connected {
            return Err(SessionError::PublishFailed(-1));
        }
        self.calls.push(SessionCall::Publish(topic.to_owned(), payload.to_vec()));
        Ok(())
    }

    fn poll_inbound(&mut self) -> Option<InboundMessage> {
        let msg = self.inbound.pop_front()?;
        self.calls.push(SessionCall::Delivered(msg.topic.as_str().to_owned()));
        Some(msg)
    }
}

// ── Clock / delay / sink ──────────────────────────────────────

#[derive(Default)]
pub struct MockClock {
    now: Cell<u32>,
}

#[allow(dead_code)]
impl MockClock {
    pub fn at(ms: u32) -> Self {
        Self { now: Cell::new(ms) }
    }

    pub fn set(&self, ms: u32) {
        self.now.set(ms);
    }

    pub fn advance(&self, ms: u32) {
        self.now.set(self.now.get().wrapping_add(ms));
    }
}

impl ClockPort for MockClock {
    fn now_ms(&self) -> u32 {
        self.now.get()
    }
}

/// Records requested delays instead of sleeping.
#[derive(Default)]
pub struct MockDelay {
    pub delays_ms: Vec<u32>,
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.delays_ms.push(ns / 1_000_000);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delays_ms.push(ms);
    }
}

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<NodeEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn count(&self, pred: impl Fn(&NodeEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &NodeEvent) {
        self.events.push(event.clone());
    }
}
