//! ハードウェア初期化モジュール
//!
//! クロックとTIM4 Hallセンサーインターフェースの初期化を集約します。

use embassy_stm32::Config;

use crate::hall_tim;

/// RCCクロック設定を初期化
///
/// HSI → PLL（÷4 × 85 ÷ 2）で170MHz生成、TIM4はAPB1で170MHz
pub fn create_clock_config() -> Config {
    let mut config = Config::default();
    {
        use embassy_stm32::rcc::{Pll, PllMul, PllPreDiv, PllRDiv, PllSource, Sysclk};

        config.rcc.hsi = true;
        config.rcc.pll = Some(Pll {
            source: PllSource::HSI,
            prediv: PllPreDiv::DIV4,
            mul: PllMul::MUL85,
            divp: None,
            divq: None,
            divr: Some(PllRDiv::DIV2),
        });
        config.rcc.sys = Sysclk::PLL1_R;
    }
    config
}

/// TIM4 Hallセンサーインターフェース初期化
///
/// PB6=H1、PB7=H2、PB8=H3（XORモード）
///
/// # Safety
/// PACを使用した直接レジスタ操作を含む
pub unsafe fn init_hall_sensor() {
    info!("Initializing TIM4 Hall Sensor Interface (XOR mode)...");
    hall_tim::init_hall_timer();
    info!("TIM4 Hall Sensor Interface initialized");
}
