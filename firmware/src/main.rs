#![no_std]
#![no_main]

// マクロを後続モジュールで使うため最初に宣言
mod fmt;

mod config;
mod hall_tim;
mod hardware;
mod state;
mod tasks;

#[cfg(not(feature = "defmt"))]
use panic_halt as _;
#[cfg(feature = "defmt")]
use {defmt_rtt as _, panic_probe as _};

use embassy_executor::Spawner;
use embassy_stm32::gpio::{Level, Output, Speed};
use hall_feedback::HallEstimator;

use tasks::{led_task, speed_sampling_task};

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    // ハードウェア初期化
    let clock_config = hardware::create_clock_config();
    let p = embassy_stm32::init(clock_config);

    info!("═══════════════════════════════════════════════════");
    info!("    Hall feedback • STM32G431VB @ 170MHz");
    info!("═══════════════════════════════════════════════════");

    // 推定器を生成してから割り込みを有効化（最初のエッジから処理するため）
    let hall_config = config::hall_config();
    let estimator = unwrap!(HallEstimator::new(hall_config));
    state::FEEDBACK.install(estimator);
    info!(
        "Hall config: pole pairs={}, buffer={}, sampling={}Hz, fault after {} errors",
        hall_config.pole_pairs,
        hall_config.speed_buffer_size,
        hall_config.speed_sampling_freq_hz,
        hall_config.errors_before_fault
    );

    unsafe {
        hardware::init_hall_sensor();
    }

    // LED初期化＆タスク起動
    let led1 = Output::new(p.PC13, Level::High, Speed::Low);
    let led2 = Output::new(p.PC14, Level::High, Speed::Low);
    let led3 = Output::new(p.PC15, Level::High, Speed::Low);
    unwrap!(spawner.spawn(led_task(led1, led2, led3)));

    // 速度サンプリングタスク起動
    unwrap!(spawner.spawn(speed_sampling_task()));

    info!("All tasks started");
}
