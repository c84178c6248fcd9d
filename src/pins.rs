//! GPIO / peripheral pin assignments for the RoomNode board.
//!
//! Single source of truth — the default [`Config`](crate::config::Config)
//! and the hardware init code both reference this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Interrupt-watched switch inputs (active-low, external pull-up)
// ---------------------------------------------------------------------------

pub const SWITCH_2_GPIO: i32 = 4;
pub const SWITCH_3_GPIO: i32 = 2;
pub const SWITCH_4_GPIO: i32 = 5;

// ---------------------------------------------------------------------------
// Controllable outputs
// ---------------------------------------------------------------------------

/// Relay driving the AC outlet.
pub const OUTLET_GPIO: i32 = 14;
/// On-board green status LED.
pub const GREEN_LED_GPIO: i32 = 16;
/// Piezo buzzer, driven by LEDC PWM.
pub const BUZZER_GPIO: i32 = 15;

// ---------------------------------------------------------------------------
// Analog sensor (ADC1)
// ---------------------------------------------------------------------------

/// ADC1 channel the room sensor divider feeds (channel 4 = GPIO 5 on S3).
pub const SENSOR_ADC_CHANNEL: u32 = 4;

// ---------------------------------------------------------------------------
// PWM configuration
// ---------------------------------------------------------------------------

/// LEDC duty resolution (bits). 10-bit gives the 0–1023 duty range the
/// control protocol exposes (`duty=512` = 50%).
pub const PWM_RESOLUTION_BITS: u32 = 10;
/// Maximum duty value at [`PWM_RESOLUTION_BITS`].
pub const PWM_DUTY_MAX: u16 = 1023;
/// Number of LEDC channels the lazy claim table can hand out.
pub const PWM_CHANNEL_COUNT: usize = 6;
