//! Actuator bank — owns the live handle for every configured output.
//!
//! Hardware objects (GPIO direction claim, LEDC channel) are created
//! lazily on the first command for an output and cached for the process
//! lifetime; later commands reuse the cached handle and never reallocate.
//! The handle arena runs parallel to the output spec list so runtime
//! state never leaks into the immutable config.

use crate::app::ports::HardwareIo;
use crate::config::{DigitalOutputSpec, PinId};
use crate::error::{Error, Result};

/// Fallback PWM parameters when a request carries none.
pub const DEFAULT_PWM_FREQ_HZ: u32 = 10;
pub const DEFAULT_PWM_DUTY: u16 = 512;

/// Resolved PWM parameters for an "on" command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PwmCommand {
    pub freq_hz: u32,
    pub duty: u16,
}

/// Live per-output hardware state, created at most once.
#[derive(Debug)]
enum OutputHandle {
    Gpio { pin: PinId },
    /// PWM handles remember the last commanded frequency so "off"
    /// (duty 0) doesn't lose it; the channel stays allocated for reuse.
    Pwm { pin: PinId, freq_hz: u32 },
}

pub struct ActuatorBank {
    specs: Vec<DigitalOutputSpec>,
    handles: Vec<Option<OutputHandle>>,
}

impl ActuatorBank {
    pub fn new(specs: Vec<DigitalOutputSpec>) -> Self {
        let handles = specs.iter().map(|_| None).collect();
        Self { specs, handles }
    }

    /// Apply an on/off command to the named output.
    ///
    /// * Non-PWM: drives the pin to `on` directly; repeating a command
    ///   just re-asserts the level.
    /// * PWM on: applies `pwm` (or the defaults when `None`).
    /// * PWM off: duty 0, frequency and handle retained.
    ///
    /// An unknown `name` cannot originate from the validated config, so
    /// it is returned as a fatal consistency error rather than ignored.
    pub fn set_output(
        &mut self,
        hw: &mut impl HardwareIo,
        name: &str,
        on: bool,
        pwm: Option<PwmCommand>,
    ) -> Result<()> {
        let idx = self
            .specs
            .iter()
            .position(|s| s.name == name)
            .ok_or_else(|| Error::UnknownOutput(name.to_owned()))?;

        let spec = &self.specs[idx];
        let handle = self.handles[idx].get_or_insert_with(|| {
            hw.claim_output(spec.pin, spec.is_pwm);
            if spec.is_pwm {
                OutputHandle::Pwm {
                    pin: spec.pin,
                    freq_hz: DEFAULT_PWM_FREQ_HZ,
                }
            } else {
                OutputHandle::Gpio { pin: spec.pin }
            }
        });

        match handle {
            OutputHandle::Gpio { pin } => hw.write_digital(*pin, on),
            OutputHandle::Pwm { pin, freq_hz } => {
                if on {
                    let cmd = pwm.unwrap_or(PwmCommand {
                        freq_hz: DEFAULT_PWM_FREQ_HZ,
                        duty: DEFAULT_PWM_DUTY,
                    });
                    hw.set_pwm(*pin, cmd.freq_hz, cmd.duty);
                    *freq_hz = cmd.freq_hz;
                } else {
                    hw.set_pwm(*pin, *freq_hz, 0);
                }
            }
        }
        Ok(())
    }
}
