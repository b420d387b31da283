//! Motion monitor: interrupt-fed debounce of the PIR sensor.
//!
//! ## Split
//!
//! - [`MotionTrigger`] is handed to the GPIO interrupt.  It only performs
//!   three atomic stores; no I/O, no locks, no logging.
//! - [`MotionMonitor`] stays with the control loop.  Each iteration it
//!   drains the pending "started" edge and evaluates the quiescence timer.
//!
//! ```text
//!   PIR rising edge ──▶ MotionTrigger::on_interrupt(now)
//!                         last_trigger_ms = now
//!                         active = true
//!                         pending_starts += 1
//!
//!   control loop ─────▶ MotionMonitor::take_started()  → Started
//!                       MotionMonitor::tick(now, quiet) → Ended
//! ```
//!
//! Both halves share one [`MotionState`] through an `Arc`, constructed once
//! at startup.  Timestamps are monotonic milliseconds truncated to `u32`;
//! all comparisons use wrapping arithmetic.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use super::events::MotionEvent;

/// Elapsed values above this are treated as "trigger is newer than now".
/// A quiescence period must not exceed it or `Ended` can never fire.
pub const FUTURE_WINDOW: u32 = i32::MAX as u32;

/// Shared motion state.  Only primitive atomics, so the interrupt can
/// update it while the loop is mid-tick without a lock.
#[derive(Debug, Default)]
pub struct MotionState {
    active: AtomicBool,
    last_trigger_ms: AtomicU32,
    pending_starts: AtomicU32,
}

impl MotionState {
    /// Boot state: no motion, last trigger at 0.
    pub const fn new() -> Self {
        Self {
            active: AtomicBool::new(false),
            last_trigger_ms: AtomicU32::new(0),
            pending_starts: AtomicU32::new(0),
        }
    }
}

/// Interrupt-side handle.  Cheap to clone, `Send + Sync`.
#[derive(Debug, Clone)]
pub struct MotionTrigger {
    state: Arc<MotionState>,
}

impl MotionTrigger {
    /// Record a rising edge.  Safe to call from interrupt context.
    ///
    /// The timestamp is stored before `active` so a tick that sees the flag
    /// also sees the fresh timestamp.
    pub fn on_interrupt(&self, now_ms: u32) {
        self.state.last_trigger_ms.store(now_ms, Ordering::Release);
        self.state.active.store(true, Ordering::Release);
        self.state.pending_starts.fetch_add(1, Ordering::AcqRel);
    }
}

/// Loop-side debounce state machine.
#[derive(Debug)]
pub struct MotionMonitor {
    state: Arc<MotionState>,
}

impl Default for MotionMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl MotionMonitor {
    pub fn new() -> Self {
        Self {
            state: Arc::new(MotionState::new()),
        }
    }

    /// Handle for the interrupt handler.
    pub fn trigger(&self) -> MotionTrigger {
        MotionTrigger {
            state: Arc::clone(&self.state),
        }
    }

    /// Drain edges recorded since the last call.
    ///
    /// Edges that land between two loop iterations collapse into a single
    /// `Started`; the loop publishes at most one per iteration.
    pub fn take_started(&mut self) -> Option<MotionEvent> {
        let edges = self.state.pending_starts.swap(0, Ordering::AcqRel);
        (edges > 0).then_some(MotionEvent::Started)
    }

    /// Forget edges recorded while no session was up.  `active` and the
    /// trigger timestamp are left alone, so `Ended` still follows.
    pub fn discard_started(&mut self) {
        self.state.pending_starts.swap(0, Ordering::AcqRel);
    }

    /// Evaluate the quiescence timer.
    ///
    /// Returns `Ended` exactly once when motion is active and more than
    /// `quiescence_ms` has passed since the last trigger; `active` is then
    /// cleared.  A trigger stamped after `now_ms` counts as fresh.
    pub fn tick(&mut self, now_ms: u32, quiescence_ms: u32) -> Option<MotionEvent> {
        if !self.state.active.load(Ordering::Acquire) {
            return None;
        }

        let armed_at = self.state.last_trigger_ms.load(Ordering::Acquire);
        let elapsed = now_ms.wrapping_sub(armed_at);
        if elapsed <= quiescence_ms || elapsed > FUTURE_WINDOW {
            return None;
        }

        if self
            .state
            .active
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return None;
        }

        // An interrupt between the timestamp load and the exchange re-armed
        // the timer; undo the clear and keep waiting.
        if self.state.last_trigger_ms.load(Ordering::Acquire) != armed_at {
            self.state.active.store(true, Ordering::Release);
            return None;
        }

        Some(MotionEvent::Ended)
    }

    pub fn is_active(&self) -> bool {
        self.state.active.load(Ordering::Acquire)
    }
}
