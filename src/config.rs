//! Feedback configuration
//!
//! Everything the estimator needs to know about the sensor, the timer and
//! the motor. Loaded once at drive initialisation and never changed while
//! the estimator is running.

pub mod params;

pub use params::*;

use crate::angle::Angle;
use crate::feedback::speed::mechanical_to_electrical;
use crate::feedback::{MechanicalSpeed, SpeedUnit};

/// Edge timestamps are compared as signed differences, so a stall window
/// must stay under half the 32-bit timer range
const MAX_STALL_TICKS: u64 = 1 << 31;

/// Mechanical placement of the three sensors within one electrical cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorPlacement {
    Degrees120,
    Degrees60,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    #[error("speed buffer size {0} outside 1..=18")]
    BufferSize(u8),
    #[error("pole pairs must be at least 1")]
    ZeroPolePairs,
    #[error("timer clock frequency must be non-zero")]
    ZeroTimerClock,
    #[error("speed sampling frequency must be non-zero")]
    ZeroSamplingFrequency,
    #[error("fault threshold must be at least 1 error")]
    ZeroErrorThreshold,
    #[error("maximum speed must be positive")]
    NonPositiveMaxSpeed,
    #[error("maximum speed exceeds the electrical speed range")]
    MaxSpeedOutOfRange,
    #[error("saturation speed must be positive and not above the maximum speed")]
    SaturationOutOfRange,
    #[error("stall timeout must be non-zero")]
    ZeroStallTimeout,
    #[error("stall timeout longer than half the timer wrap period")]
    StallTimeoutTooLong,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HallConfig {
    pub sensor_placement: SensorPlacement,
    /// Electrical shift between the H1 low→high edge and the phase-A back-EMF maximum
    pub phase_shift: Angle,
    /// Rate at which [`HallEstimator::sample`](crate::HallEstimator::sample) is called
    pub speed_sampling_freq_hz: u16,
    /// Averaging depth, at most [`SPEED_FIFO_CAPACITY`]
    pub speed_buffer_size: u8,
    pub tim_clock_freq_hz: u32,
    pub errors_before_fault: u8,
    /// Largest believable speed magnitude, in `speed_unit`
    pub max_speed: MechanicalSpeed,
    /// Reported in place of a sample above `max_speed`, in `speed_unit`
    pub saturation_speed: MechanicalSpeed,
    /// Electrical to mechanical ratio
    pub pole_pairs: u8,
    pub speed_unit: SpeedUnit,
    pub stall_timeout_ms: u16,
}

impl HallConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.speed_buffer_size == 0 || self.speed_buffer_size as usize > SPEED_FIFO_CAPACITY {
            return Err(ConfigError::BufferSize(self.speed_buffer_size));
        }
        if self.pole_pairs == 0 {
            return Err(ConfigError::ZeroPolePairs);
        }
        if self.tim_clock_freq_hz == 0 {
            return Err(ConfigError::ZeroTimerClock);
        }
        if self.speed_sampling_freq_hz == 0 {
            return Err(ConfigError::ZeroSamplingFrequency);
        }
        if self.errors_before_fault == 0 {
            return Err(ConfigError::ZeroErrorThreshold);
        }
        if self.max_speed.0 <= 0 {
            return Err(ConfigError::NonPositiveMaxSpeed);
        }
        if mechanical_to_electrical(self.max_speed, self.speed_unit, self.pole_pairs) > i32::MAX as i64 {
            return Err(ConfigError::MaxSpeedOutOfRange);
        }
        if self.saturation_speed.0 <= 0 || self.saturation_speed > self.max_speed {
            return Err(ConfigError::SaturationOutOfRange);
        }
        if self.stall_timeout_ms == 0 {
            return Err(ConfigError::ZeroStallTimeout);
        }
        if self.stall_timeout_ms as u64 * self.tim_clock_freq_hz as u64 / 1000 >= MAX_STALL_TICKS {
            return Err(ConfigError::StallTimeoutTooLong);
        }
        Ok(())
    }

    /// Number of speed-sampling periods without an edge before the rotor counts as stopped
    pub fn stall_periods(&self) -> u32 {
        let periods = (self.stall_timeout_ms as u32 * self.speed_sampling_freq_hz as u32).div_ceil(1000);
        periods.max(1)
    }
}

impl Default for HallConfig {
    fn default() -> Self {
        Self {
            sensor_placement: SensorPlacement::Degrees120,
            phase_shift: Angle::from_degrees(DEFAULT_PHASE_SHIFT_DEG),
            speed_sampling_freq_hz: DEFAULT_SPEED_SAMPLING_FREQ_HZ,
            speed_buffer_size: DEFAULT_SPEED_BUFFER_SIZE,
            tim_clock_freq_hz: DEFAULT_TIM_CLOCK_FREQ_HZ,
            errors_before_fault: DEFAULT_ERRORS_BEFORE_FAULT,
            max_speed: DEFAULT_MAX_SPEED,
            saturation_speed: DEFAULT_SATURATION_SPEED,
            pole_pairs: DEFAULT_POLE_PAIRS,
            speed_unit: DEFAULT_SPEED_UNIT,
            stall_timeout_ms: DEFAULT_STALL_TIMEOUT_MS,
        }
    }
}
