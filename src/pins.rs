//! GPIO / peripheral pin assignments for the motion node board.
//!
//! Single source of truth; `main` wires peripherals from these constants.

// ---------------------------------------------------------------------------
// Motion sensor (HC-SR501 class PIR, push-pull output, high on motion)
// ---------------------------------------------------------------------------

/// Digital input, rising-edge interrupt.
pub const PIR_GPIO: i32 = 12;

// ---------------------------------------------------------------------------
// Indicators
// ---------------------------------------------------------------------------

/// On/off LED, active HIGH.
pub const SWITCH_LED_GPIO: i32 = 16;
/// Dimmable LED, LEDC PWM.
pub const DIMMER_LED_GPIO: i32 = 4;

// ---------------------------------------------------------------------------
// PWM configuration
// ---------------------------------------------------------------------------

/// LEDC timer resolution (bits).  8-bit gives 0 – 255 duty levels.
pub const PWM_RESOLUTION_BITS: u32 = 8;
/// LEDC frequency for the dimmable LED (1 kHz, flicker-free).
pub const DIMMER_PWM_FREQ_HZ: u32 = 1_000;
