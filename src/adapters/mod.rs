//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements   | Connects to                   |
//! |------------|--------------|-------------------------------|
//! | `hardware` | OutputPort   | Indicator drivers (GPIO, LEDC)|
//! | `log_sink` | EventSink    | Serial log output             |
//! | `mqtt`     | SessionPort  | ESP-IDF MQTT client           |
//! | `time`     | ClockPort    | ESP32 system timer            |
//! | `wifi`     | Connectivity | ESP-IDF WiFi STA              |

pub mod hardware;
pub mod log_sink;
pub mod mqtt;
pub mod time;
pub mod wifi;
