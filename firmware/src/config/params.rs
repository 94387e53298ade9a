//! ボード固有のフィードバックパラメータ

use hall_feedback::SensorPlacement;

/// Hallセンサー配置（このモーターは120°配置）
pub const SENSOR_PLACEMENT: SensorPlacement = SensorPlacement::Degrees120;

/// モーターの極対数（ポール数12 / 2 = 6）
pub const POLE_PAIRS: u8 = 6;

/// TIM4クロック [Hz]（APB1 170MHz、PSC=0）
pub const TIM4_CLOCK_HZ: u32 = 170_000_000;

/// 速度サンプリング周期 [Hz]（速度ループと同じ）
pub const SPEED_SAMPLING_FREQ_HZ: u16 = 1000;

/// 速度平均化バッファ長（最大18）
pub const SPEED_BUFFER_SIZE: u8 = 18;

/// 連続エラー許容回数（これに達するとセンサー異常としてラッチ）
pub const ERRORS_BEFORE_FAULT: u8 = 3;

/// 信頼できる最大機械角速度 [RPM]（最大回転数3000RPMの115%）
pub const MAX_SPEED_RPM: i32 = 3450;

/// 停止判定時間 [ms]（この間エッジが無ければ速度0）
pub const STALL_TIMEOUT_MS: u16 = 1000;

/// Hall角度オフセット [度]（H1立ち上がりとA相逆起電力ピークの電気角差）
/// モーターが正しく回転しない場合は調整が必要
pub const HALL_PHASE_SHIFT_DEG: f32 = 0.0;

/// LED点滅周期 [ms]
pub const LED_BLINK_PERIOD_MS: u64 = 500;
