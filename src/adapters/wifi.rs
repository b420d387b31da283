//! WiFi station-mode adapter.
//!
//! Implements [`Connectivity`]: the network half of the transport session.
//! The broker session ([`MqttSession`](super::mqtt::MqttSession)) asks it
//! to (re)associate before every connect attempt.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: real ESP-IDF WiFi driver calls via
//!   `esp_idf_svc::wifi::BlockingWifi`.
//! - **all other targets**: simulation stub for host-side tests.
//!
//! ## Association policy
//!
//! At boot [`WifiAdapter::associate`] polls every `wifi_poll_ms` until the
//! station is up.  Later attempts go through [`Connectivity::try_associate`],
//! a single bounded attempt; the control loop's reconnect backoff paces
//! the retries.

use core::fmt;
use embedded_hal::delay::DelayNs;
use log::{info, warn};

use crate::config::NodeConfig;

// ───────────────────────────────────────────────────────────────
// Port trait
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityError {
    InvalidSsid,
    InvalidPassword,
    /// Driver error (raw `esp_err_t`, `-1` in simulation).
    AssociationFailed(i32),
}

impl fmt::Display for ConnectivityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => write!(f, "password invalid (must be 8-64 bytes for WPA2, or empty for open)"),
            Self::AssociationFailed(rc) => write!(f, "WiFi association failed (rc={})", rc),
        }
    }
}

/// Network link underneath the broker session.
pub trait Connectivity {
    /// Whether the station is associated with an IP.
    fn is_up(&self) -> bool;

    /// One bounded association attempt.  `Ok` if already up.
    fn try_associate(&mut self) -> Result<(), ConnectivityError>;
}

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

pub fn validate_ssid(ssid: &str) -> Result<(), ConnectivityError> {
    if ssid.is_empty() || ssid.len() > 32 || !is_printable_ascii(ssid) {
        return Err(ConnectivityError::InvalidSsid);
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), ConnectivityError> {
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > 64 {
        return Err(ConnectivityError::InvalidPassword);
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// WiFi adapter
// ───────────────────────────────────────────────────────────────

pub struct WifiAdapter {
    #[cfg(target_os = "espidf")]
    wifi: esp_idf_svc::wifi::BlockingWifi<esp_idf_svc::wifi::EspWifi<'static>>,
    #[cfg(not(target_os = "espidf"))]
    sim_up: bool,
    #[cfg(not(target_os = "espidf"))]
    sim_fail_attempts: u32,
    ssid: heapless::String<32>,
    poll_ms: u32,
}

impl WifiAdapter {
    /// Configure the station and start the driver (not yet associated).
    #[cfg(target_os = "espidf")]
    pub fn new(
        mut wifi: esp_idf_svc::wifi::BlockingWifi<esp_idf_svc::wifi::EspWifi<'static>>,
        config: &NodeConfig,
    ) -> Result<Self, ConnectivityError> {
        use esp_idf_svc::wifi::{AuthMethod, ClientConfiguration, Configuration};

        validate_ssid(&config.wifi_ssid)?;
        validate_password(&config.wifi_password)?;

        let auth_method = if config.wifi_password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        let client = ClientConfiguration {
            ssid: config.wifi_ssid.clone(),
            password: config.wifi_password.clone(),
            auth_method,
            ..Default::default()
        };
        wifi.set_configuration(&Configuration::Client(client))
            .map_err(|e| ConnectivityError::AssociationFailed(e.code()))?;
        wifi.start()
            .map_err(|e| ConnectivityError::AssociationFailed(e.code()))?;

        Ok(Self {
            wifi,
            ssid: config.wifi_ssid.clone(),
            poll_ms: config.wifi_poll_ms,
        })
    }

    /// Simulated station; starts disassociated.
    #[cfg(not(target_os = "espidf"))]
    pub fn new(config: &NodeConfig) -> Result<Self, ConnectivityError> {
        validate_ssid(&config.wifi_ssid)?;
        validate_password(&config.wifi_password)?;
        Ok(Self {
            sim_up: false,
            sim_fail_attempts: 0,
            ssid: config.wifi_ssid.clone(),
            poll_ms: config.wifi_poll_ms,
        })
    }

    /// Block until associated, polling every `wifi_poll_ms`.
    pub fn associate(&mut self, delay: &mut impl DelayNs) {
        info!("WiFi: connecting to '{}'", self.ssid);
        let mut attempts: u32 = 0;
        while let Err(e) = self.try_associate() {
            attempts = attempts.saturating_add(1);
            if attempts % 20 == 1 {
                warn!("WiFi: still waiting for '{}' ({})", self.ssid, e);
            }
            delay.delay_ms(self.poll_ms);
        }
        info!("WiFi: connected to '{}'", self.ssid);
    }

    // ── Simulation controls ───────────────────────────────────

    /// Drop the simulated link.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_drop(&mut self) {
        self.sim_up = false;
    }

    /// Make the next `n` association attempts fail.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_fail_next(&mut self, n: u32) {
        self.sim_fail_attempts = n;
    }
}

// ───────────────────────────────────────────────────────────────
// Connectivity
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
impl Connectivity for WifiAdapter {
    fn is_up(&self) -> bool {
        self.wifi.is_connected().unwrap_or(false)
    }

    fn try_associate(&mut self) -> Result<(), ConnectivityError> {
        if self.is_up() {
            return Ok(());
        }
        self.wifi
            .connect()
            .map_err(|e| ConnectivityError::AssociationFailed(e.code()))?;
        self.wifi
            .wait_netif_up()
            .map_err(|e| ConnectivityError::AssociationFailed(e.code()))?;
        if let Ok(ip) = self.wifi.wifi().sta_netif().get_ip_info() {
            info!("WiFi: IP {}", ip.ip);
        }
        Ok(())
    }
}

#[cfg(not(target_os = "espidf"))]
impl Connectivity for WifiAdapter {
    fn is_up(&self) -> bool {
        self.sim_up
    }

    fn try_associate(&mut self) -> Result<(), ConnectivityError> {
        if self.sim_up {
            return Ok(());
        }
        if self.sim_fail_attempts > 0 {
            self.sim_fail_attempts -= 1;
            return Err(ConnectivityError::AssociationFailed(-1));
        }
        self.sim_up = true;
        Ok(())
    }
}
