//! 速度サンプリングタスク
//!
//! 速度ループ周期で推定器の平均速度を取り出し、フィードバック状態を更新します。

use embassy_time::{Duration, Ticker};
use hall_feedback::{CaptureTimer, FeedbackOutput};

use crate::config::SPEED_SAMPLING_FREQ_HZ;
use crate::hall_tim::{self, Tim4Clock};
use crate::state::{FEEDBACK, FEEDBACK_STATUS, SENSOR_FAULT};

/// ステータスログの間隔 [サンプル数]（1kHzで1秒ごと）
const LOG_INTERVAL: u32 = 1000;

/// 速度サンプリングタスク（SPEED_SAMPLING_FREQ_HZ周期）
#[embassy_executor::task]
pub async fn speed_sampling_task() {
    info!("Speed sampling task started ({}Hz)", SPEED_SAMPLING_FREQ_HZ);

    let mut ticker = Ticker::every(Duration::from_hz(SPEED_SAMPLING_FREQ_HZ as u64));
    let clock = Tim4Clock;
    let mut fault_reported = false;
    let mut count: u32 = 0;

    loop {
        ticker.next().await;

        let Some((speed, fault)) = FEEDBACK.sample() else {
            continue;
        };

        // 補間角度も含めた最新の出力（時刻はロック内で読む：エッジ割り込みとの前後逆転を防ぐ）
        let output = FEEDBACK
            .with(|estimator| {
                estimator.angle_at(clock.now());
                estimator.output()
            })
            .unwrap_or(FeedbackOutput::IDLE);
        *FEEDBACK_STATUS.lock().await = output;

        // 異常は一度だけ報告（リセットされるまでラッチ）
        match fault {
            Some(fault) if !fault_reported => {
                error!("Hall sensor fault latched: {}", fault);
                *SENSOR_FAULT.lock().await = Some(fault);
                fault_reported = true;
            }
            None if fault_reported => {
                info!("Hall sensor fault cleared");
                *SENSOR_FAULT.lock().await = None;
                fault_reported = false;
            }
            _ => {}
        }

        count = count.wrapping_add(1);
        if count % LOG_INTERVAL == 0 {
            debug!(
                "Hall: speed={}rpm, angle={}, dir={}, state={}",
                speed.0,
                output.electrical_angle.raw(),
                output.direction,
                hall_tim::get_hall_state()
            );
        }
    }
}
