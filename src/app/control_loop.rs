//! Control loop: the single cooperative scheduler of the node.
//!
//! [`ControlLoop`] owns the command router, the motion monitor and the
//! link state machine.  All I/O flows through port traits injected at call
//! sites, making the whole loop testable with mock adapters.
//!
//! ```text
//!                 ┌────────────────────────────────┐
//!  SessionPort ◀─▶│          ControlLoop           │──▶ OutputPort
//!  ClockPort  ──▶ │ LinkState · Router · Monitor   │──▶ EventSink
//!                 └────────────────────────────────┘
//! ```
//!
//! ## Link state machine
//!
//! ```text
//!  Disconnected ──connect()──▶ Connecting ──ok + subscribe──▶ Connected
//!        ▲                        │ err: back off, retry            │
//!        └────────────────────────┴──────── session drop ◀──────────┘
//! ```
//!
//! The reconnect path is the only place the loop blocks; each failed
//! attempt waits one fixed backoff.  Everything in [`step`](ControlLoop::step)
//! is bounded and non-blocking.

use embedded_hal::delay::DelayNs;
use log::{debug, info, warn};

use crate::config::{BrightnessTable, NodeConfig};

use super::commands::Command;
use super::events::{MotionEvent, NodeEvent};
use super::motion::MotionMonitor;
use super::ports::{ClockPort, EventSink, InboundMessage, OutputPort, SessionPort};
use super::router::{Channel, CommandRouter, TopicTable};

/// Upper bound on inbound messages handled per iteration.
pub const INBOUND_BURST: usize = 8;

/// Connection lifecycle as seen by the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Disconnected,
    Connecting,
    Connected,
}

/// Counters since boot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeStats {
    pub sessions_established: u32,
    pub connect_failures: u32,
    pub commands_applied: u32,
    pub commands_ignored: u32,
    pub motion_published: u32,
    pub publish_failures: u32,
}

// ───────────────────────────────────────────────────────────────
// ControlLoop
// ───────────────────────────────────────────────────────────────

pub struct ControlLoop {
    router: CommandRouter,
    monitor: MotionMonitor,
    brightness: BrightnessTable,
    quiescence_ms: u32,
    backoff_ms: u32,
    link: LinkState,
    stats: NodeStats,
}

impl ControlLoop {
    /// Construct the loop from configuration.  `monitor` is the same
    /// instance whose trigger was handed to the motion interrupt.
    pub fn new(config: &NodeConfig, monitor: MotionMonitor) -> Self {
        Self {
            router: CommandRouter::new(TopicTable::from_config(config)),
            monitor,
            brightness: config.brightness,
            quiescence_ms: config.quiescence_ms,
            backoff_ms: config.reconnect_backoff_ms,
            link: LinkState::Disconnected,
            stats: NodeStats::default(),
        }
    }

    // ── Per-iteration orchestration ───────────────────────────

    /// One full iteration: restore the session if needed, then [`step`](Self::step).
    pub fn run_once(
        &mut self,
        session: &mut impl SessionPort,
        outputs: &mut impl OutputPort,
        clock: &impl ClockPort,
        delay: &mut impl DelayNs,
        sink: &mut impl EventSink,
    ) {
        self.ensure_connected(session, delay, sink);
        self.step(session, outputs, clock, sink);
    }

    /// Block until the session is up with both control channels subscribed.
    ///
    /// Returns immediately when already connected.  Otherwise retries
    /// `connect()` every backoff period, indefinitely.
    pub fn ensure_connected(
        &mut self,
        session: &mut impl SessionPort,
        delay: &mut impl DelayNs,
        sink: &mut impl EventSink,
    ) {
        if self.link == LinkState::Connected {
            if session.is_connected() {
                return;
            }
            warn!("Session dropped; suspending until reconnected");
            self.link = LinkState::Disconnected;
            sink.emit(&NodeEvent::LinkLost);
        }

        let mut attempt: u32 = 0;
        loop {
            attempt = attempt.saturating_add(1);
            self.link = LinkState::Connecting;

            match session.connect() {
                Ok(()) => {
                    // Edges from while the session was down are not queued.
                    self.monitor.discard_started();
                    self.subscribe_controls(session, sink);
                    self.link = LinkState::Connected;
                    self.stats.sessions_established += 1;
                    sink.emit(&NodeEvent::Connected { attempt });
                    info!("Session up after {} attempt(s); {:?}", attempt, self.stats);
                    return;
                }
                Err(error) => {
                    self.link = LinkState::Disconnected;
                    self.stats.connect_failures += 1;
                    sink.emit(&NodeEvent::ConnectFailed { attempt, error });
                    delay.delay_ms(self.backoff_ms);
                }
            }
        }
    }

    /// Steady-state body: pump inbound → read clock → tick monitor → publish.
    pub fn step(
        &mut self,
        session: &mut impl SessionPort,
        outputs: &mut impl OutputPort,
        clock: &impl ClockPort,
        sink: &mut impl EventSink,
    ) {
        // 1. Inbound commands
        for _ in 0..INBOUND_BURST {
            let Some(msg) = session.poll_inbound() else {
                break;
            };
            self.handle_message(&msg, outputs, sink);
        }

        // 2. Clock
        let now = clock.now_ms();

        // 3. Motion monitor
        let started = self.monitor.take_started();
        let ended = self.monitor.tick(now, self.quiescence_ms);

        // 4. Publish transitions
        for event in [started, ended].into_iter().flatten() {
            self.publish_motion(event, session, sink);
        }
    }

    // ── Command handling ──────────────────────────────────────

    /// Decode one inbound message and apply it.  Undecodable messages are
    /// reported to the sink and otherwise ignored.
    pub fn handle_message(
        &mut self,
        msg: &InboundMessage,
        outputs: &mut impl OutputPort,
        sink: &mut impl EventSink,
    ) {
        match self.router.route(&msg.topic, &msg.payload) {
            Ok(cmd) => self.apply(cmd, outputs, sink),
            Err(error) => {
                debug!("Ignoring message on '{}': {}", msg.topic, error);
                self.stats.commands_ignored += 1;
                sink.emit(&NodeEvent::CommandIgnored {
                    topic: msg.topic.clone(),
                    error,
                });
            }
        }
    }

    /// Write a command to the outputs.  Repeated commands are written again.
    pub fn apply(&mut self, cmd: Command, outputs: &mut impl OutputPort, sink: &mut impl EventSink) {
        let result = match cmd {
            Command::SetSwitch(on) => outputs.set_switch(on),
            Command::SetBrightnessLevel(level) => outputs.set_brightness(self.brightness.duty(level)),
        };

        match result {
            Ok(()) => {
                self.stats.commands_applied += 1;
                sink.emit(&NodeEvent::CommandApplied(cmd));
            }
            Err(error) => {
                warn!("Output write for {:?} failed: {}", cmd, error);
                sink.emit(&NodeEvent::OutputFailed { command: cmd, error });
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn link_state(&self) -> LinkState {
        self.link
    }

    pub fn stats(&self) -> NodeStats {
        self.stats
    }

    pub fn monitor(&self) -> &MotionMonitor {
        &self.monitor
    }

    pub fn topics(&self) -> &TopicTable {
        self.router.topics()
    }

    // ── Internal ──────────────────────────────────────────────

    /// Subscriptions do not survive a session drop, so this runs after
    /// every successful connect.  Failures are reported, not retried.
    fn subscribe_controls(&mut self, session: &mut impl SessionPort, sink: &mut impl EventSink) {
        for channel in Channel::CONTROL {
            let topic = self.router.topics().topic(channel);
            if let Err(error) = session.subscribe(topic) {
                sink.emit(&NodeEvent::SubscribeFailed { channel, error });
            }
        }
    }

    /// At-most-once: a failed publish is reported and dropped.
    fn publish_motion(
        &mut self,
        event: MotionEvent,
        session: &mut impl SessionPort,
        sink: &mut impl EventSink,
    ) {
        let topic = self.router.topics().topic(Channel::Motion);
        match session.publish(topic, &event.payload()) {
            Ok(()) => {
                self.stats.motion_published += 1;
                sink.emit(&NodeEvent::MotionPublished(event));
            }
            Err(error) => {
                self.stats.publish_failures += 1;
                sink.emit(&NodeEvent::PublishFailed { event, error });
            }
        }
    }
}
