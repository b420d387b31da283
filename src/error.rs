//! Unified error types for the motion node firmware.
//!
//! Subsystem enums travel inside diagnostic events, so all of them are
//! `Copy`.  None are fatal at runtime: session errors are retried on the
//! next reconnect cycle, everything else is logged and dropped.  The
//! top-level `Error` only exists for boot failures in `main`.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Reasons the firmware cannot finish booting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// An indicator output write failed.
    Output(OutputError),
    /// Build-time configuration is invalid.
    Config(ConfigError),
    /// Peripheral initialisation failed.
    Init(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Output(e) => write!(f, "output: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Session errors
// ---------------------------------------------------------------------------

/// Failures of the network link or the publish/subscribe session.
///
/// Codes carried by the `i32` variants are raw ESP-IDF `esp_err_t` values
/// (`-1` in host simulation).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    /// The WiFi station is not associated.
    NetworkDown,
    /// The broker refused or did not complete the session handshake.
    ConnectFailed(i32),
    /// An operation needed a live session and there was none.
    NotConnected,
    SubscribeFailed(i32),
    PublishFailed(i32),
    /// Topic does not fit the fixed-capacity buffers.
    TopicTooLong,
    /// Payload is longer than the inbound buffer.
    PayloadTooLong,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NetworkDown => write!(f, "network down"),
            Self::ConnectFailed(rc) => write!(f, "broker connect failed (rc={rc})"),
            Self::NotConnected => write!(f, "not connected"),
            Self::SubscribeFailed(rc) => write!(f, "subscribe failed (rc={rc})"),
            Self::PublishFailed(rc) => write!(f, "publish failed (rc={rc})"),
            Self::TopicTooLong => write!(f, "topic too long"),
            Self::PayloadTooLong => write!(f, "payload too long"),
        }
    }
}

// ---------------------------------------------------------------------------
// Routing errors
// ---------------------------------------------------------------------------

/// Why an inbound message produced no command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteError {
    /// Topic is not one of the control channels.
    UnknownTopic,
    /// Switch payload was neither `on` nor `off`.
    UnrecognizedPayload,
    /// Brightness payload parsed to a level outside `0..=5`.
    LevelOutOfRange(i32),
}

impl fmt::Display for RouteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownTopic => write!(f, "topic does not match"),
            Self::UnrecognizedPayload => write!(f, "unrecognized payload"),
            Self::LevelOutOfRange(n) => write!(f, "brightness level {n} out of range"),
        }
    }
}

// ---------------------------------------------------------------------------
// Output errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputError {
    /// GPIO set failed.
    GpioWriteFailed,
    /// PWM duty-cycle write failed.
    PwmWriteFailed,
}

impl fmt::Display for OutputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GpioWriteFailed => write!(f, "GPIO write failed"),
            Self::PwmWriteFailed => write!(f, "PWM write failed"),
        }
    }
}

impl From<OutputError> for Error {
    fn from(e: OutputError) -> Self {
        Self::Output(e)
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A config field failed validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}
