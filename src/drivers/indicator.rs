//! Indicator output drivers.
//!
//! Two LEDs, each behind an `embedded-hal` 1.0 trait so the device build
//! can hand in `esp-idf-hal` peripherals and host tests can hand in mocks:
//!
//! | Driver              | Trait          | Device peripheral          |
//! |---------------------|----------------|----------------------------|
//! | [`SwitchIndicator`] | `OutputPin`    | `PinDriver<_, Output>`     |
//! | [`DimmerIndicator`] | `SetDutyCycle` | `LedcDriver` (8-bit, 1 kHz)|
//!
//! Both remember the last value written successfully; a failed write
//! leaves the remembered value untouched.

use embedded_hal::digital::{OutputPin, PinState};
use embedded_hal::pwm::SetDutyCycle;

use crate::error::OutputError;

/// Full-scale duty in the brightness table's units.
pub const DUTY_RANGE: u8 = u8::MAX;

pub struct SwitchIndicator<P: OutputPin> {
    pin: P,
    on: bool,
}

impl<P: OutputPin> SwitchIndicator<P> {
    /// Wrap `pin` and drive it low.
    pub fn new(mut pin: P) -> Result<Self, OutputError> {
        pin.set_low().map_err(|_| OutputError::GpioWriteFailed)?;
        Ok(Self { pin, on: false })
    }

    pub fn set(&mut self, on: bool) -> Result<(), OutputError> {
        self.pin
            .set_state(PinState::from(on))
            .map_err(|_| OutputError::GpioWriteFailed)?;
        self.on = on;
        Ok(())
    }

    pub fn is_on(&self) -> bool {
        self.on
    }
}

pub struct DimmerIndicator<P: SetDutyCycle> {
    pwm: P,
    duty: u8,
}

impl<P: SetDutyCycle> DimmerIndicator<P> {
    /// Wrap `pwm` and drive it fully off.
    pub fn new(mut pwm: P) -> Result<Self, OutputError> {
        pwm.set_duty_cycle_fully_off()
            .map_err(|_| OutputError::PwmWriteFailed)?;
        Ok(Self { pwm, duty: 0 })
    }

    /// Write an 8-bit duty, scaled to the channel's resolution.
    pub fn set_duty(&mut self, duty: u8) -> Result<(), OutputError> {
        self.pwm
            .set_duty_cycle_fraction(u16::from(duty), u16::from(DUTY_RANGE))
            .map_err(|_| OutputError::PwmWriteFailed)?;
        self.duty = duty;
        Ok(())
    }

    pub fn duty(&self) -> u8 {
        self.duty
    }
}
