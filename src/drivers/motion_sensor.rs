//! PIR motion sensor input.
//!
//! The sensor's output goes high on motion.  A rising-edge interrupt on the
//! input pin calls [`MotionTrigger::on_interrupt`] with the current uptime;
//! everything else happens in the control loop.
//!
//! On ESP-IDF the handler is registered through the per-pin GPIO ISR
//! service.  The trigger handed to the ISR is leaked once at boot, so the
//! handler's argument pointer stays valid for the life of the program.
//!
//! On host targets [`MotionSensor::simulate_edge`] stands in for the pin.

use core::fmt;

use crate::app::motion::MotionTrigger;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorInitError {
    GpioConfigFailed(i32),
    IsrInstallFailed(i32),
    HandlerAddFailed(i32),
}

impl fmt::Display for SensorInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GpioConfigFailed(rc) => write!(f, "PIR GPIO config failed (rc={})", rc),
            Self::IsrInstallFailed(rc) => write!(f, "GPIO ISR service install failed (rc={})", rc),
            Self::HandlerAddFailed(rc) => write!(f, "PIR ISR handler add failed (rc={})", rc),
        }
    }
}

pub struct MotionSensor {
    gpio: i32,
    #[cfg(not(target_os = "espidf"))]
    trigger: MotionTrigger,
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn pir_gpio_isr(arg: *mut core::ffi::c_void) {
    // SAFETY: `arg` is the `MotionTrigger` leaked in `attach`; never freed.
    let trigger = unsafe { &*(arg as *const MotionTrigger) };
    trigger.on_interrupt(crate::adapters::time::uptime_ms_from_isr());
}

impl MotionSensor {
    /// Configure `gpio` as a rising-edge input and route its interrupt to
    /// `trigger`.  Call once, before the control loop starts.
    #[cfg(target_os = "espidf")]
    pub fn attach(gpio: i32, trigger: MotionTrigger) -> Result<Self, SensorInitError> {
        use esp_idf_svc::sys::*;

        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << gpio,
            mode: gpio_mode_t_GPIO_MODE_INPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_ENABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_POSEDGE,
        };
        // SAFETY: single-threaded boot path; `cfg` outlives the call.
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK {
            return Err(SensorInitError::GpioConfigFailed(ret));
        }

        // ESP_ERR_INVALID_STATE: service already installed by someone else.
        let ret = unsafe { gpio_install_isr_service(0) };
        if ret != ESP_OK && ret != ESP_ERR_INVALID_STATE {
            return Err(SensorInitError::IsrInstallFailed(ret));
        }

        let arg = Box::into_raw(Box::new(trigger)).cast::<core::ffi::c_void>();
        // SAFETY: `pir_gpio_isr` only touches atomics and the timer counter.
        let ret = unsafe { gpio_isr_handler_add(gpio, Some(pir_gpio_isr), arg) };
        if ret != ESP_OK {
            // SAFETY: the handler was not registered, so we still own `arg`.
            drop(unsafe { Box::from_raw(arg.cast::<MotionTrigger>()) });
            return Err(SensorInitError::HandlerAddFailed(ret));
        }
        unsafe { gpio_intr_enable(gpio) };

        log::info!("PIR: rising-edge interrupt on GPIO{}", gpio);
        Ok(Self { gpio })
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn attach(gpio: i32, trigger: MotionTrigger) -> Result<Self, SensorInitError> {
        log::info!("PIR(sim): GPIO{}", gpio);
        Ok(Self { gpio, trigger })
    }

    pub fn gpio(&self) -> i32 {
        self.gpio
    }

    /// Fire the interrupt path as the hardware would.
    #[cfg(not(target_os = "espidf"))]
    pub fn simulate_edge(&self, now_ms: u32) {
        self.trigger.on_interrupt(now_ms);
    }
}
