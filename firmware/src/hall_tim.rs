//! TIM4 Hallセンサーインターフェース → Hallフィードバック推定器
//!
//! STM32のHall Sensor Interface Mode（XORモード）でエッジ検出とキャプチャを行い、
//! エッジごとに単調増加する32bitタイムスタンプを作って推定器へ渡します。
//!
//! ## ハードウェア構成
//! - TIM4_CH1 (PB6): Hall H1
//! - TIM4_CH2 (PB7): Hall H2
//! - TIM4_CH3 (PB8): Hall H3
//! - クロック: 170MHz (APB1)、PSC=0
//!
//! ## タイムスタンプ
//! TIM4はエッジごとにカウンタがリセットされるため、
//! `周期 = (オーバーフロー回数 << 16) | CCR1` を前回エッジの時刻に積算して
//! 連続した時間軸に変換します。

use core::sync::atomic::{AtomicU32, AtomicU8, Ordering};

use embassy_stm32::pac;
use hall_feedback::{CaptureTimer, HallEdge, HallPattern};

use crate::config::SENSOR_PLACEMENT;
use crate::state::FEEDBACK;

/// Hallピン番号（GPIOB）: H1, H2, H3
const HALL_PINS: [usize; 3] = [6, 7, 8];

/// TIM4のAF番号
const HALL_AF: u8 = 2;

/// オーバーフローカウンタの上限（`<< 16`が32bitに収まる範囲）
const MAX_OVERFLOWS: u32 = 0xFFFF;

/// 最後のHallパターン（生値、デバッグ用）
pub static HALL_STATE: AtomicU8 = AtomicU8::new(0);

/// 最後のエッジのタイムスタンプ [TIM4カウント]
static EDGE_TIMESTAMP: AtomicU32 = AtomicU32::new(0);

/// 前回エッジからのオーバーフロー回数（エッジでリセット、上限で飽和）
static OVERFLOW_COUNTER: AtomicU32 = AtomicU32::new(0);

/// 処理したエッジ数（デバッグ用）
pub static EDGE_COUNT: AtomicU32 = AtomicU32::new(0);

/// TIM4 Hall Sensor Interface の初期化
///
/// # Safety
/// PACを使用した直接的なレジスタ操作を含むため、unsafe
pub unsafe fn init_hall_timer() {
    let rcc = pac::RCC;
    let tim4 = pac::TIM4;
    let gpiob = pac::GPIOB;

    rcc.ahb2enr().modify(|w| w.set_gpioben(true));
    rcc.apb1enr1().modify(|w| w.set_tim4en(true));

    // PB6/PB7/PB8: AF2、プルアップ無し（外部プルアップ前提）
    for pin in HALL_PINS {
        gpiob
            .moder()
            .modify(|w| w.set_moder(pin, pac::gpio::vals::Moder::ALTERNATE));
        gpiob.afr(pin / 8).modify(|w| w.set_afr(pin % 8, HALL_AF));
        gpiob
            .pupdr()
            .modify(|w| w.set_pupdr(pin, pac::gpio::vals::Pupdr::FLOATING));
        gpiob
            .ospeedr()
            .modify(|w| w.set_ospeedr(pin, pac::gpio::vals::Ospeedr::VERY_HIGH_SPEED));
    }

    tim4.cr1().modify(|w| w.set_cen(false));
    tim4.psc().write_value(0);
    tim4.arr().write_value(pac::timer::regs::ArrCore(0xFFFF));

    // CH1/CH2/CH3のXOR → TI1、TI1エッジでカウンタリセット
    tim4.cr2().modify(|w| w.set_ti1s(pac::timer::vals::Ti1s::XOR));
    tim4.smcr().modify(|w| {
        w.set_ts(pac::timer::vals::Ts::TI1F_ED);
        w.set_sms(pac::timer::vals::Sms::RESET_MODE);
    });

    // IC1 = TRC、8サイクルフィルタ
    tim4.ccmr_input(0).modify(|w| {
        w.set_ccs(0, pac::timer::vals::CcmrInputCcs::TRC);
        w.set_icf(0, pac::timer::vals::FilterValue::FCK_INT_N8);
    });
    tim4.ccer().modify(|w| {
        w.set_cce(0, true);
        w.set_ccp(0, false);
    });

    // CC1（エッジ）とUPDATE（オーバーフロー）割り込み
    tim4.dier().modify(|w| {
        w.set_ccie(0, true);
        w.set_uie(true);
    });

    // 優先度2（0x20）: Embassyタスクより高優先度
    unsafe {
        cortex_m::peripheral::NVIC::unmask(pac::Interrupt::TIM4);
        let mut cp = cortex_m::Peripherals::steal();
        cp.NVIC.set_priority(pac::Interrupt::TIM4, 0x20);
    }

    tim4.cnt().write_value(pac::timer::regs::CntCore(0));
    tim4.sr().write(|w| w.0 = 0);
    tim4.egr().write(|w| w.set_ug(true));
    tim4.cr1().modify(|w| {
        w.set_cen(true);
        w.set_urs(pac::timer::vals::Urs::COUNTER_ONLY);
    });
}

/// 現在のHallパターンをGPIOから読み取る
fn read_pattern() -> HallPattern {
    let idr = pac::GPIOB.idr().read();
    let [h1, h2, h3] = HALL_PINS.map(|pin| idr.idr(pin) as u8 != 0);
    HallPattern::from_sensors(h1, h2, h3, SENSOR_PLACEMENT)
}

/// TIM4割り込みハンドラー（Capture/Compare 1 + Update）
///
/// # Safety
/// 割り込みコンテキストで実行されるため、処理は最小限にする
#[inline(always)]
pub unsafe fn tim4_irq_handler() {
    let tim4 = pac::TIM4;
    let sr = tim4.sr().read();

    if sr.uif() {
        tim4.sr().modify(|w| w.set_uif(false));
        let overflow = OVERFLOW_COUNTER.load(Ordering::Relaxed);
        if overflow < MAX_OVERFLOWS {
            OVERFLOW_COUNTER.store(overflow + 1, Ordering::Relaxed);
        }
    }

    if sr.ccif(0) {
        tim4.sr().modify(|w| w.set_ccif(0, false));

        let capture = tim4.ccr(0).read().ccr() as u32;
        let overflow = OVERFLOW_COUNTER.swap(0, Ordering::Relaxed);
        let period = (overflow << 16) | capture;
        let timestamp = EDGE_TIMESTAMP
            .load(Ordering::Relaxed)
            .wrapping_add(period);
        EDGE_TIMESTAMP.store(timestamp, Ordering::Relaxed);

        let pattern = read_pattern();
        HALL_STATE.store(pattern.raw(), Ordering::Relaxed);
        EDGE_COUNT.fetch_add(1, Ordering::Relaxed);

        FEEDBACK.on_edge(HallEdge::new(pattern, timestamp));
    }
}

/// TIM4割り込みのRust側エントリーポイント
#[allow(non_snake_case)]
#[no_mangle]
pub unsafe extern "C" fn TIM4() {
    tim4_irq_handler();
}

/// TIM4を基準にした現在時刻（エッジのタイムスタンプと同じ時間軸）
pub struct Tim4Clock;

impl CaptureTimer for Tim4Clock {
    fn now(&self) -> u32 {
        cortex_m::interrupt::free(|_| {
            let tim4 = pac::TIM4;
            let cnt = tim4.cnt().read().cnt() as u32;
            let mut overflow = OVERFLOW_COUNTER.load(Ordering::Relaxed);
            // 未処理のオーバーフロー（CNTが既に巻き戻っている）を補正
            if tim4.sr().read().uif() && cnt < 0x8000 && overflow < MAX_OVERFLOWS {
                overflow += 1;
            }
            EDGE_TIMESTAMP
                .load(Ordering::Relaxed)
                .wrapping_add((overflow << 16) | cnt)
        })
    }
}

/// Hall状態を取得（最後のエッジで読み取った値）
#[inline(always)]
pub fn get_hall_state() -> u8 {
    HALL_STATE.load(Ordering::Relaxed)
}
