//! Application core: pure domain logic, zero I/O.
//!
//! This module contains the event-driven control logic of the node:
//! the interrupt-to-publish motion path, the "motion ended" quiescence
//! timer, and the inbound command router.  All interaction with the
//! network and the outputs happens through **port traits** defined in
//! [`ports`], keeping this layer fully testable without real peripherals.

pub mod commands;
pub mod control_loop;
pub mod events;
pub mod motion;
pub mod ports;
pub mod router;
