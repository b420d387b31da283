//! MQTT session adapter.
//!
//! Implements [`SessionPort`] on top of a [`Connectivity`] link and the
//! ESP-IDF MQTT client.  The client runs its own task and delivers events
//! through a callback; inbound messages are copied into a bounded
//! `embassy-sync` channel that the control loop drains without blocking.
//!
//! ```text
//! ┌──────────────┐ InboundMessage ┌───────────────┐
//! │  MQTT task   │───────────────▶│ Control loop  │
//! │  (callback)  │  connected flag│ (poll_inbound)│
//! └──────────────┘                └───────────────┘
//! ```
//!
//! ## Session semantics
//!
//! - Every [`connect`](SessionPort::connect) builds a fresh client, so no
//!   subscription and no queued inbound message survives a drop.
//! - A disconnect latches `dropped` until the next `connect`, even if the
//!   old client reconnects on its own; the control loop always sees the
//!   drop and re-subscribes.
//! - QoS 0, no retain: at-most-once in both directions.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `esp_idf_svc::mqtt::client::EspMqttClient`.
//! - **all other targets**: an in-memory broker for host-side tests.

use core::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::{info, warn};

use crate::app::ports::{InboundMessage, SessionPort};
use crate::config::NodeConfig;
use crate::error::SessionError;

use super::wifi::Connectivity;

/// Inbound channel depth.
pub const INBOUND_DEPTH: usize = 8;

/// How long `connect` waits for the broker's CONNACK (milliseconds).
#[cfg(target_os = "espidf")]
const CONNACK_TIMEOUT_MS: u32 = 4_000;
#[cfg(target_os = "espidf")]
const CONNACK_POLL_MS: u32 = 50;

// ───────────────────────────────────────────────────────────────
// State shared with the MQTT task
// ───────────────────────────────────────────────────────────────

struct Shared {
    connected: AtomicBool,
    dropped: AtomicBool,
    inbound: Channel<CriticalSectionRawMutex, InboundMessage, INBOUND_DEPTH>,
}

impl Shared {
    fn new() -> Self {
        Self {
            connected: AtomicBool::new(false),
            dropped: AtomicBool::new(false),
            inbound: Channel::new(),
        }
    }

    fn reset(&self) {
        self.connected.store(false, Ordering::Release);
        self.dropped.store(false, Ordering::Release);
        self.inbound.clear();
    }

    fn on_connected(&self) {
        self.connected.store(true, Ordering::Release);
    }

    fn on_disconnected(&self) {
        self.connected.store(false, Ordering::Release);
        self.dropped.store(true, Ordering::Release);
    }

    fn is_up(&self) -> bool {
        self.connected.load(Ordering::Acquire) && !self.dropped.load(Ordering::Acquire)
    }

    /// Queue an inbound message; drops it when the loop is behind.
    fn deliver(&self, topic: &str, data: &[u8]) {
        let msg = match InboundMessage::new(topic, data) {
            Ok(msg) => msg,
            Err(e) => {
                warn!("MQTT: dropping inbound on '{}': {}", topic, e);
                return;
            }
        };
        if self.inbound.try_send(msg).is_err() {
            warn!("MQTT: inbound channel full, dropping message on '{}'", topic);
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Session adapter
// ───────────────────────────────────────────────────────────────

pub struct MqttSession<C: Connectivity> {
    link: C,
    shared: Arc<Shared>,
    #[cfg(target_os = "espidf")]
    client: Option<esp_idf_svc::mqtt::client::EspMqttClient<'static>>,
    #[cfg(target_os = "espidf")]
    url: heapless::String<96>,
    #[cfg(target_os = "espidf")]
    client_id: heapless::String<32>,
    #[cfg(target_os = "espidf")]
    username: heapless::String<32>,
    #[cfg(target_os = "espidf")]
    password: heapless::String<64>,
    #[cfg(not(target_os = "espidf"))]
    sim: SimBroker,
}

impl<C: Connectivity> MqttSession<C> {
    pub fn new(link: C, config: &NodeConfig) -> Self {
        #[cfg(not(target_os = "espidf"))]
        let _ = config;
        Self {
            link,
            shared: Arc::new(Shared::new()),
            #[cfg(target_os = "espidf")]
            client: None,
            #[cfg(target_os = "espidf")]
            url: config.mqtt_url.clone(),
            #[cfg(target_os = "espidf")]
            client_id: config.mqtt_client_id.clone(),
            #[cfg(target_os = "espidf")]
            username: config.mqtt_username.clone(),
            #[cfg(target_os = "espidf")]
            password: config.mqtt_password.clone(),
            #[cfg(not(target_os = "espidf"))]
            sim: SimBroker::default(),
        }
    }

    /// The underlying network link.
    pub fn link_mut(&mut self) -> &mut C {
        &mut self.link
    }

    /// Bring the network up first; the broker is unreachable without it.
    fn ensure_link(&mut self) -> Result<(), SessionError> {
        self.link.try_associate().map_err(|e| {
            warn!("MQTT: network down ({})", e);
            SessionError::NetworkDown
        })
    }
}

// ── ESP-IDF client ────────────────────────────────────────────

#[cfg(target_os = "espidf")]
impl<C: Connectivity> SessionPort for MqttSession<C> {
    fn connect(&mut self) -> Result<(), SessionError> {
        use esp_idf_hal::delay::FreeRtos;
        use esp_idf_svc::mqtt::client::{EspMqttClient, EventPayload, MqttClientConfiguration};

        self.ensure_link()?;

        // Tear down the previous session before anything else can arrive.
        self.client = None;
        self.shared.reset();

        let conf = MqttClientConfiguration {
            client_id: Some(self.client_id.as_str()),
            username: (!self.username.is_empty()).then_some(self.username.as_str()),
            password: (!self.password.is_empty()).then_some(self.password.as_str()),
            ..Default::default()
        };

        let shared = Arc::clone(&self.shared);
        let client = EspMqttClient::new_cb(&self.url, &conf, move |event| match event.payload() {
            EventPayload::Connected(_) => shared.on_connected(),
            EventPayload::Disconnected => shared.on_disconnected(),
            EventPayload::Received {
                topic: Some(topic),
                data,
                ..
            } => shared.deliver(topic, data),
            _ => {}
        })
        .map_err(|e| SessionError::ConnectFailed(e.code()))?;
        self.client = Some(client);
        info!("MQTT: connecting to {} as '{}'", self.url, self.client_id);

        let mut waited = 0;
        while !self.shared.is_up() {
            if waited >= CONNACK_TIMEOUT_MS || self.shared.dropped.load(Ordering::Acquire) {
                self.client = None;
                return Err(SessionError::ConnectFailed(
                    esp_idf_svc::sys::ESP_ERR_TIMEOUT as i32,
                ));
            }
            FreeRtos::delay_ms(CONNACK_POLL_MS);
            waited += CONNACK_POLL_MS;
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.client.is_some() && self.shared.is_up()
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), SessionError> {
        use esp_idf_svc::mqtt::client::QoS;

        let client = self.client.as_mut().ok_or(SessionError::NotConnected)?;
        client
            .subscribe(topic, QoS::AtMostOnce)
            .map(|_| ())
            .map_err(|e| SessionError::SubscribeFailed(e.code()))
    }

    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), SessionError> {
        use esp_idf_svc::mqtt::client::QoS;

        let client = self.client.as_mut().ok_or(SessionError::NotConnected)?;
        // `enqueue` hands the message to the client's outbox without blocking.
        client
            .enqueue(topic, QoS::AtMostOnce, false, payload)
            .map(|_| ())
            .map_err(|e| SessionError::PublishFailed(e.code()))
    }

    fn poll_inbound(&mut self) -> Option<InboundMessage> {
        self.shared.inbound.try_receive().ok()
    }
}

// ── Host simulation ───────────────────────────────────────────

/// In-memory broker used on the host.
#[cfg(not(target_os = "espidf"))]
#[derive(Debug, Default)]
pub struct SimBroker {
    refuse_attempts: u32,
    subscriptions: Vec<String>,
    published: Vec<(String, Vec<u8>)>,
}

#[cfg(not(target_os = "espidf"))]
impl<C: Connectivity> MqttSession<C> {
    /// Make the next `n` broker handshakes fail.
    pub fn sim_refuse_next(&mut self, n: u32) {
        self.sim.refuse_attempts = n;
    }

    /// Broker delivers `payload` on `topic`; dropped unless subscribed.
    pub fn sim_deliver(&self, topic: &str, payload: &[u8]) {
        if self.is_connected() && self.sim.subscriptions.iter().any(|s| s == topic) {
            self.shared.deliver(topic, payload);
        }
    }

    /// Broker-side session drop.
    pub fn sim_drop(&mut self) {
        self.shared.on_disconnected();
    }

    pub fn sim_subscriptions(&self) -> &[String] {
        &self.sim.subscriptions
    }

    pub fn sim_published(&self) -> &[(String, Vec<u8>)] {
        &self.sim.published
    }
}

#[cfg(not(target_os = "espidf"))]
impl<C: Connectivity> SessionPort for MqttSession<C> {
    fn connect(&mut self) -> Result<(), SessionError> {
        self.ensure_link()?;
        self.shared.reset();
        self.sim.subscriptions.clear();
        if self.sim.refuse_attempts > 0 {
            self.sim.refuse_attempts -= 1;
            return Err(SessionError::ConnectFailed(-1));
        }
        self.shared.on_connected();
        info!("MQTT(sim): connected");
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.shared.is_up() && self.link.is_up()
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), SessionError> {
        if !self.is_connected() {
            return Err(SessionError::NotConnected);
        }
        self.sim.subscriptions.push(topic.to_owned());
        Ok(())
    }

    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), SessionError> {
        if !self.is_connected() {
            return Err(SessionError::PublishFailed(-1));
        }
        self.sim.published.push((topic.to_owned(), payload.to_vec()));
        Ok(())
    }

    fn poll_inbound(&mut self) -> Option<InboundMessage> {
        self.shared.inbound.try_receive().ok()
    }
}
