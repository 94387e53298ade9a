//! LED制御タスク
//!
//! フィードバック状態をLEDで表示します。
//! - LED1: 生存表示（点滅）
//! - LED2: ロータ回転中
//! - LED3: センサー異常（ラッチ中は点灯）

use embassy_stm32::gpio::Output;
use embassy_time::{Duration, Timer};
use hall_feedback::MechanicalSpeed;

use crate::config::LED_BLINK_PERIOD_MS;
use crate::state::{FEEDBACK_STATUS, SENSOR_FAULT};

/// LED制御タスク
#[embassy_executor::task]
pub async fn led_task(
    mut led1: Output<'static>,
    mut led2: Output<'static>,
    mut led3: Output<'static>,
) {
    info!("LED task started");

    loop {
        led1.toggle();

        let status = *FEEDBACK_STATUS.lock().await;
        if status.speed != MechanicalSpeed::ZERO {
            led2.set_high();
        } else {
            led2.set_low();
        }

        if SENSOR_FAULT.lock().await.is_some() {
            led3.set_high();
        } else {
            led3.set_low();
        }

        Timer::after(Duration::from_millis(LED_BLINK_PERIOD_MS)).await;
    }
}
