//! Default feedback parameters
//!
//! Values follow the drive parameter set of the reference motor: 6 pole
//! pairs, 3000 rpm application limit, 170 MHz timer clock.

use crate::feedback::{MechanicalSpeed, SpeedUnit};

/// Capacity of the speed averaging FIFO; `speed_buffer_size` may not exceed it
pub const SPEED_FIFO_CAPACITY: usize = 18;

/// Speed averaging depth (default)
pub const DEFAULT_SPEED_BUFFER_SIZE: u8 = 18;

/// Speed loop rate [Hz] (default)
pub const DEFAULT_SPEED_SAMPLING_FREQ_HZ: u16 = 1000;

/// Capture timer clock [Hz] (TIM4 on APB1, PSC = 0)
pub const DEFAULT_TIM_CLOCK_FREQ_HZ: u32 = 170_000_000;

/// Consecutive measurement errors tolerated before the sensor is declared faulty
pub const DEFAULT_ERRORS_BEFORE_FAULT: u8 = 3;

/// Motor pole pairs (12 poles / 2)
pub const DEFAULT_POLE_PAIRS: u8 = 6;

/// Highest speed the application commands [rpm, mechanical]
pub const MAX_APPLICATION_SPEED_RPM: i32 = 3000;

/// Measurements up to 115 % of the application limit are still believed
pub const MAX_RELIABLE_SPEED_PERCENT: i32 = 115;

pub const DEFAULT_SPEED_UNIT: SpeedUnit = SpeedUnit::DeciHertz;

/// Largest plausible mechanical speed, in `DEFAULT_SPEED_UNIT`
pub const DEFAULT_MAX_SPEED: MechanicalSpeed = MechanicalSpeed(
    MAX_APPLICATION_SPEED_RPM * MAX_RELIABLE_SPEED_PERCENT / 100 * 10 / 60,
);

/// Substituted for implausible samples, in `DEFAULT_SPEED_UNIT`
pub const DEFAULT_SATURATION_SPEED: MechanicalSpeed = DEFAULT_MAX_SPEED;

/// No edge for this long means the rotor is standing still [ms]
pub const DEFAULT_STALL_TIMEOUT_MS: u16 = 1000;

/// Electrical phase shift between the H1 rising edge and the phase-A back-EMF maximum [deg]
pub const DEFAULT_PHASE_SHIFT_DEG: f32 = 0.0;
