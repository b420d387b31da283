//! Hardware adapter: bridges the indicator drivers to [`OutputPort`].
//!
//! The only module the control loop reaches the LEDs through.  Generic
//! over the `embedded-hal` traits, so the device build plugs in
//! `esp-idf-hal` peripherals and host tests plug in mocks.

use embedded_hal::digital::OutputPin;
use embedded_hal::pwm::SetDutyCycle;
use log::debug;

use crate::app::ports::OutputPort;
use crate::drivers::indicator::{DimmerIndicator, SwitchIndicator};
use crate::error::OutputError;

/// Concrete adapter that combines both indicators behind [`OutputPort`].
pub struct HardwareAdapter<S: OutputPin, D: SetDutyCycle> {
    switch: SwitchIndicator<S>,
    dimmer: DimmerIndicator<D>,
}

impl<S: OutputPin, D: SetDutyCycle> HardwareAdapter<S, D> {
    pub fn new(switch: SwitchIndicator<S>, dimmer: DimmerIndicator<D>) -> Self {
        Self { switch, dimmer }
    }
}

impl<S: OutputPin, D: SetDutyCycle> OutputPort for HardwareAdapter<S, D> {
    fn set_switch(&mut self, on: bool) -> Result<(), OutputError> {
        debug!("Switch LED -> {}", if on { "on" } else { "off" });
        self.switch.set(on)
    }

    fn set_brightness(&mut self, duty: u8) -> Result<(), OutputError> {
        debug!("Dimmer LED -> duty {}", duty);
        self.dimmer.set_duty(duty)
    }
}
