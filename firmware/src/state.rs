//! グローバル共有状態管理
//!
//! TIM4割り込みとタスク間で共有される状態を管理します。

use embassy_sync::blocking_mutex::raw::ThreadModeRawMutex;
use embassy_sync::mutex::Mutex;
use hall_feedback::{FeedbackOutput, SensorFault, SharedEstimator};

/// Hallフィードバック推定器（TIM4割り込みとタスクで共有、クリティカルセクションで保護）
pub static FEEDBACK: SharedEstimator = SharedEstimator::new();

/// 最新のフィードバック出力（速度サンプリングタスクが更新）
pub static FEEDBACK_STATUS: Mutex<ThreadModeRawMutex, FeedbackOutput> =
    Mutex::new(FeedbackOutput::new());

/// ラッチされたセンサー異常（LED表示用）
pub static SENSOR_FAULT: Mutex<ThreadModeRawMutex, Option<SensorFault>> = Mutex::new(None);
