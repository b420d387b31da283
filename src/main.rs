//! Motion node firmware: main entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                     │
//! │                                                              │
//! │  MqttSession<WifiAdapter>  HardwareAdapter   Esp32TimeAdapter│
//! │  (SessionPort)             (OutputPort)      (ClockPort)     │
//! │  LogEventSink              MotionSensor ISR ─▶ MotionTrigger │
//! │  (EventSink)                                                 │
//! │                                                              │
//! │  ──────────────── Port Trait Boundary ─────────────────      │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │            ControlLoop (pure logic)                    │  │
//! │  │  LinkState · CommandRouter · MotionMonitor             │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::{AnyOutputPin, PinDriver};
use esp_idf_hal::ledc::config::TimerConfig;
use esp_idf_hal::ledc::{LedcDriver, LedcTimerDriver, Resolution};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::units::FromValueType;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{BlockingWifi, EspWifi};
use log::{error, info};

use motion_node::adapters::hardware::HardwareAdapter;
use motion_node::adapters::log_sink::LogEventSink;
use motion_node::adapters::mqtt::MqttSession;
use motion_node::adapters::time::Esp32TimeAdapter;
use motion_node::adapters::wifi::WifiAdapter;
use motion_node::app::control_loop::ControlLoop;
use motion_node::app::motion::MotionMonitor;
use motion_node::config::NodeConfig;
use motion_node::drivers::indicator::{DimmerIndicator, SwitchIndicator};
use motion_node::drivers::motion_sensor::MotionSensor;
use motion_node::drivers::watchdog::{self, FeedingDelay, Watchdog};
use motion_node::error::Error;
use motion_node::pins;

/// Log a boot failure and park.  Nothing useful can run without the
/// failed piece; a power cycle is the recovery path.
fn halt(err: Error) -> ! {
    error!("Boot failed: {}; halting", err);
    loop {
        FreeRtos::delay_ms(1_000);
    }
}

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("motion-node v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Configuration ──────────────────────────────────────
    let config = NodeConfig::default();
    if let Err(e) = config.validate() {
        halt(e.into());
    }
    info!(
        "Topics: motion='{}' switch='{}' brightness='{}'",
        config.motion_topic, config.switch_topic, config.brightness_topic
    );

    let watchdog = Watchdog::new(watchdog::DEFAULT_TIMEOUT_MS);
    let peripherals = Peripherals::take()?;

    // ── 3. Indicators (outputs off at boot) ───────────────────
    // SAFETY: neither pin is claimed anywhere else in the firmware.
    let switch_pin = PinDriver::output(unsafe { AnyOutputPin::new(pins::SWITCH_LED_GPIO) })?;
    let dimmer_timer = LedcTimerDriver::new(
        peripherals.ledc.timer0,
        &TimerConfig::default()
            .frequency(pins::DIMMER_PWM_FREQ_HZ.Hz())
            .resolution(Resolution::Bits8),
    )?;
    let dimmer_pwm = LedcDriver::new(
        peripherals.ledc.channel0,
        &dimmer_timer,
        unsafe { AnyOutputPin::new(pins::DIMMER_LED_GPIO) },
    )?;
    let switch = SwitchIndicator::new(switch_pin).unwrap_or_else(|e| halt(e.into()));
    let dimmer = DimmerIndicator::new(dimmer_pwm).unwrap_or_else(|e| halt(e.into()));
    let mut outputs = HardwareAdapter::new(switch, dimmer);

    // ── 4. Network ────────────────────────────────────────────
    let sys_loop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;
    let wifi = BlockingWifi::wrap(
        EspWifi::new(peripherals.modem, sys_loop.clone(), Some(nvs))?,
        sys_loop,
    )?;
    let mut wifi = WifiAdapter::new(wifi, &config).unwrap_or_else(|e| {
        error!("{}", e);
        halt(Error::Init("WiFi"))
    });
    wifi.associate(&mut FeedingDelay::new(&watchdog));

    let mut session = MqttSession::new(wifi, &config);

    // ── 5. First session ──────────────────────────────────────
    let clock = Esp32TimeAdapter::new();
    let mut sink = LogEventSink::new();
    let mut control = ControlLoop::new(&config, MotionMonitor::new());
    control.ensure_connected(&mut session, &mut FeedingDelay::new(&watchdog), &mut sink);

    // ── 6. Motion sensor (armed once the controls are subscribed) ──
    let _pir = MotionSensor::attach(pins::PIR_GPIO, control.monitor().trigger()).unwrap_or_else(|e| {
        error!("{}", e);
        halt(Error::Init("PIR interrupt"))
    });

    // ── 7. Control loop ───────────────────────────────────────
    info!("Entering control loop");
    loop {
        control.run_once(
            &mut session,
            &mut outputs,
            &clock,
            &mut FeedingDelay::new(&watchdog),
            &mut sink,
        );
        watchdog.feed();
        FreeRtos::delay_ms(config.loop_yield_ms);
    }
}
