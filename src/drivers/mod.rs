//! Peripheral drivers: indicator outputs, PIR input, task watchdog.

pub mod indicator;
pub mod motion_sensor;
pub mod watchdog;
