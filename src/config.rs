//! Node configuration parameters
//!
//! Everything here is fixed at build time.  Secrets and addresses can be
//! overridden through environment variables read by `option_env!` when the
//! firmware is compiled; there is no runtime configuration and nothing is
//! persisted.

use serde::{Deserialize, Serialize};

use crate::app::commands::BrightnessLevel;
use crate::app::motion::FUTURE_WINDOW;
use crate::error::ConfigError;

/// Maximum topic length accepted anywhere in the firmware.
pub const TOPIC_CAP: usize = 64;

/// Reference brightness table: 8-bit duty per level (PWM range 0–255).
pub const BRIGHTNESS_LEVELS: [u8; BrightnessLevel::COUNT] = [0, 15, 55, 100, 170, 250];

/// Ordered output intensities indexed by [`BrightnessLevel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrightnessTable([u8; BrightnessLevel::COUNT]);

impl BrightnessTable {
    pub const fn new(levels: [u8; BrightnessLevel::COUNT]) -> Self {
        Self(levels)
    }

    /// Duty value (0–255) for `level`.
    pub fn duty(&self, level: BrightnessLevel) -> u8 {
        self.0[level.get() as usize]
    }

    pub fn levels(&self) -> &[u8; BrightnessLevel::COUNT] {
        &self.0
    }
}

impl Default for BrightnessTable {
    fn default() -> Self {
        Self(BRIGHTNESS_LEVELS)
    }
}

/// Core node configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    // --- WiFi ---
    pub wifi_ssid: heapless::String<32>,
    /// Empty for an open network.
    pub wifi_password: heapless::String<64>,
    /// Poll interval while waiting for association (milliseconds)
    pub wifi_poll_ms: u32,

    // --- Broker ---
    /// Broker URL, e.g. `mqtt://192.168.1.34:1883`
    pub mqtt_url: heapless::String<96>,
    pub mqtt_client_id: heapless::String<32>,
    /// Empty means anonymous.
    pub mqtt_username: heapless::String<32>,
    pub mqtt_password: heapless::String<64>,

    // --- Topics ---
    /// Motion channel (publish only)
    pub motion_topic: heapless::String<TOPIC_CAP>,
    /// Switch-control channel (`on` / `off`)
    pub switch_topic: heapless::String<TOPIC_CAP>,
    /// Brightness-control channel (`0`–`5`)
    pub brightness_topic: heapless::String<TOPIC_CAP>,

    // --- Timing ---
    /// Quiet time after the last trigger before "no motion" is reported (ms)
    pub quiescence_ms: u32,
    /// Delay between broker reconnect attempts (ms)
    pub reconnect_backoff_ms: u32,
    /// Cooperative yield at the end of each loop iteration (ms)
    pub loop_yield_ms: u32,

    // --- Outputs ---
    pub brightness: BrightnessTable,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            // WiFi
            wifi_ssid: bounded(option_env!("NODE_WIFI_SSID").unwrap_or("node1-ap")),
            wifi_password: bounded(option_env!("NODE_WIFI_PASSWORD").unwrap_or("")),
            wifi_poll_ms: 500,

            // Broker
            mqtt_url: bounded(option_env!("NODE_MQTT_URL").unwrap_or("mqtt://192.168.1.34:1883")),
            mqtt_client_id: bounded(option_env!("NODE_MQTT_CLIENT_ID").unwrap_or("node1")),
            mqtt_username: bounded(option_env!("NODE_MQTT_USER").unwrap_or("")),
            mqtt_password: bounded(option_env!("NODE_MQTT_PASSWORD").unwrap_or("")),

            // Topics
            motion_topic: bounded("home/node1/motion"),
            switch_topic: bounded("home/node1/led1"),
            brightness_topic: bounded("home/node1/led2"),

            // Timing
            quiescence_ms: 10_000,
            reconnect_backoff_ms: 5_000,
            loop_yield_ms: 10,

            // Outputs
            brightness: BrightnessTable::default(),
        }
    }
}

impl NodeConfig {
    /// Reject configurations the control loop cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let topics = [
            self.motion_topic.as_str(),
            self.switch_topic.as_str(),
            self.brightness_topic.as_str(),
        ];
        if topics.iter().any(|t| t.is_empty()) {
            return Err(ConfigError::ValidationFailed("topic must not be empty"));
        }
        if topics.iter().any(|t| t.contains(['+', '#'])) {
            return Err(ConfigError::ValidationFailed("topic must not contain wildcards"));
        }
        if topics[0] == topics[1] || topics[0] == topics[2] || topics[1] == topics[2] {
            return Err(ConfigError::ValidationFailed("topics must be distinct"));
        }
        if self.quiescence_ms == 0 {
            return Err(ConfigError::ValidationFailed("quiescence_ms must be > 0"));
        }
        if self.quiescence_ms > FUTURE_WINDOW {
            return Err(ConfigError::ValidationFailed("quiescence_ms must be <= i32::MAX"));
        }
        if self.reconnect_backoff_ms == 0 {
            return Err(ConfigError::ValidationFailed("reconnect_backoff_ms must be > 0"));
        }
        if self.mqtt_url.is_empty() {
            return Err(ConfigError::ValidationFailed("mqtt_url must not be empty"));
        }
        if self.brightness.levels().windows(2).any(|w| w[0] > w[1]) {
            return Err(ConfigError::ValidationFailed("brightness table must be non-decreasing"));
        }
        Ok(())
    }
}

/// Copy `s` into a fixed-capacity string, truncating at a char boundary.
fn bounded<const N: usize>(s: &str) -> heapless::String<N> {
    let mut out = heapless::String::new();
    for c in s.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}
