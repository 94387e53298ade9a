//! ボード設定
//!
//! Hallセンサー配置、モーター極対数、TIM4クロックなどの設定を
//! [`HallConfig`]にまとめます。

pub mod params;

// params.rsから主要な定数を再エクスポート
pub use params::*;

use hall_feedback::{Angle, HallConfig, MechanicalSpeed, SpeedUnit};

/// このボード向けのフィードバック設定
pub fn hall_config() -> HallConfig {
    HallConfig {
        sensor_placement: SENSOR_PLACEMENT,
        phase_shift: Angle::from_degrees(HALL_PHASE_SHIFT_DEG),
        speed_sampling_freq_hz: SPEED_SAMPLING_FREQ_HZ,
        speed_buffer_size: SPEED_BUFFER_SIZE,
        tim_clock_freq_hz: TIM4_CLOCK_HZ,
        errors_before_fault: ERRORS_BEFORE_FAULT,
        max_speed: MechanicalSpeed(MAX_SPEED_RPM),
        saturation_speed: MechanicalSpeed(MAX_SPEED_RPM),
        pole_pairs: POLE_PAIRS,
        speed_unit: SpeedUnit::Rpm,
        stall_timeout_ms: STALL_TIMEOUT_MS,
    }
}
