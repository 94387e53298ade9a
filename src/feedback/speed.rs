// Speed estimation from Hall edge intervals
// Instant speed per edge goes into a fixed ring buffer; the speed loop reads the mean

use super::angle_reconstructor::Interval;
use super::FeedbackEvent;
use crate::angle::FULL_TURN;
use crate::config::{HallConfig, SPEED_FIFO_CAPACITY};

/// Unit the mechanical speed is reported in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpeedUnit {
    Rpm,
    /// 0.1 Hz
    DeciHertz,
    /// 0.01 Hz
    CentiHertz,
}

impl SpeedUnit {
    /// Units per mechanical revolution per second
    pub const fn per_hertz(self) -> i64 {
        match self {
            SpeedUnit::Rpm => 60,
            SpeedUnit::DeciHertz => 10,
            SpeedUnit::CentiHertz => 100,
        }
    }
}

/// Signed mechanical speed in the configured [`SpeedUnit`]; positive is forward
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MechanicalSpeed(pub i32);

impl MechanicalSpeed {
    pub const ZERO: Self = Self(0);

    pub fn to_rpm(self, unit: SpeedUnit) -> f32 {
        self.0 as f32 * 60.0 / unit.per_hertz() as f32
    }
}

/// Integer division rounding half away from zero (`den > 0`)
fn div_round(num: i64, den: i64) -> i64 {
    if num >= 0 {
        (num + den / 2) / den
    } else {
        (num - den / 2) / den
    }
}

/// Mechanical speed -> electrical speed [s16 degrees / s]
pub(crate) fn mechanical_to_electrical(speed: MechanicalSpeed, unit: SpeedUnit, pole_pairs: u8) -> i64 {
    div_round(
        speed.0 as i64 * pole_pairs as i64 * FULL_TURN as i64,
        unit.per_hertz(),
    )
}

/// Electrical speed [s16 degrees / s] -> mechanical speed
pub(crate) fn electrical_to_mechanical(el_speed: i64, unit: SpeedUnit, pole_pairs: u8) -> MechanicalSpeed {
    let mech = div_round(
        el_speed * unit.per_hertz(),
        pole_pairs as i64 * FULL_TURN as i64,
    );
    MechanicalSpeed(mech.clamp(i32::MIN as i64, i32::MAX as i64) as i32)
}

/// Fixed-capacity FIFO of instantaneous electrical speeds with a running sum
#[derive(Debug, Clone)]
pub struct SpeedBuffer {
    samples: [i32; SPEED_FIFO_CAPACITY],
    depth: usize,
    /// Next slot to write; the oldest sample once the buffer is full
    head: usize,
    len: usize,
    sum: i64,
}

impl SpeedBuffer {
    /// `depth` is clamped to `1..=SPEED_FIFO_CAPACITY`
    pub fn new(depth: usize) -> Self {
        Self {
            samples: [0; SPEED_FIFO_CAPACITY],
            depth: depth.clamp(1, SPEED_FIFO_CAPACITY),
            head: 0,
            len: 0,
            sum: 0,
        }
    }

    /// Insert a sample, evicting the oldest once `depth` samples are held
    pub fn push(&mut self, sample: i32) {
        if self.len == self.depth {
            self.sum -= self.samples[self.head] as i64;
        } else {
            self.len += 1;
        }
        self.samples[self.head] = sample;
        self.sum += sample as i64;
        self.head = (self.head + 1) % self.depth;
    }

    /// Arithmetic mean of the held samples, 0 when empty
    pub fn mean(&self) -> i64 {
        if self.len == 0 {
            return 0;
        }
        div_round(self.sum, self.len as i64)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
        self.sum = 0;
    }

    /// Held samples, oldest first
    pub fn iter(&self) -> impl Iterator<Item = i32> + '_ {
        let start = (self.head + self.depth - self.len) % self.depth;
        (0..self.len).map(move |i| self.samples[(start + i) % self.depth])
    }
}

/// Averaged speed from Hall edge intervals
pub struct SpeedEstimator {
    buffer: SpeedBuffer,
    unit: SpeedUnit,
    pole_pairs: u8,
    tim_clock_freq_hz: u32,
    /// Largest believable electrical speed magnitude
    max_el_speed: i64,
    /// Stored instead of an implausible sample (magnitude)
    saturation_el_speed: i32,
    stall_periods: u32,
    periods_since_edge: u32,
    edge_since_sample: bool,
    /// Mean of the buffer, refreshed on every push
    average_el_speed: i32,
    /// Last value returned by `sample`
    speed: MechanicalSpeed,
}

impl SpeedEstimator {
    pub fn new(config: &HallConfig) -> Self {
        let max_el_speed =
            mechanical_to_electrical(config.max_speed, config.speed_unit, config.pole_pairs);
        let saturation_el_speed =
            mechanical_to_electrical(config.saturation_speed, config.speed_unit, config.pole_pairs)
                .clamp(0, i32::MAX as i64) as i32;

        Self {
            buffer: SpeedBuffer::new(config.speed_buffer_size as usize),
            unit: config.speed_unit,
            pole_pairs: config.pole_pairs,
            tim_clock_freq_hz: config.tim_clock_freq_hz,
            max_el_speed,
            saturation_el_speed,
            stall_periods: config.stall_periods(),
            periods_since_edge: 0,
            edge_since_sample: false,
            average_el_speed: 0,
            speed: MechanicalSpeed::ZERO,
        }
    }

    /// Electrical speed implied by one sector crossed in `ticks` timer counts
    ///
    /// `None` when the interval is zero.
    pub fn instantaneous_el_speed(&self, interval: Interval) -> Option<i64> {
        if interval.ticks == 0 {
            return None;
        }
        let magnitude = div_round(
            FULL_TURN as i64 * self.tim_clock_freq_hz as i64,
            6 * interval.ticks as i64,
        );
        Some(magnitude * interval.direction.sign() as i64)
    }

    /// Turn a completed sector interval into a buffered sample
    ///
    /// Returns `Valid`, `ZeroInterval` (nothing stored) or `SaturatedSpeed`
    /// (saturation speed stored with the measured sign).
    pub fn push_interval(&mut self, interval: Interval) -> FeedbackEvent {
        self.edge_since_sample = true;

        let Some(el_speed) = self.instantaneous_el_speed(interval) else {
            warn!("Hall interval of 0 ticks, sample dropped");
            return FeedbackEvent::ZeroInterval;
        };

        let (sample, event) = if el_speed.abs() > self.max_el_speed {
            let saturated = self.saturation_el_speed * interval.direction.sign();
            warn!(
                "Implausible Hall speed {} (interval {} ticks), saturating to {}",
                el_speed,
                interval.ticks,
                saturated
            );
            (saturated, FeedbackEvent::SaturatedSpeed)
        } else {
            // `max_el_speed` fits i32 once the config is validated
            let sample = el_speed.clamp(i32::MIN as i64, i32::MAX as i64) as i32;
            (sample, FeedbackEvent::Valid)
        };

        self.buffer.push(sample);
        self.average_el_speed = self.buffer.mean() as i32;
        event
    }

    /// Note a legal edge that produced no interval (direction change, first edge)
    pub fn note_edge(&mut self) {
        self.edge_since_sample = true;
    }

    /// Drop all samples; used when the direction reverses
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.average_el_speed = 0;
    }

    /// Speed-loop tick: stall detection and the averaged mechanical speed
    ///
    /// Returns the speed and whether this call detected a stall.
    pub fn sample(&mut self) -> (MechanicalSpeed, bool) {
        if self.edge_since_sample {
            self.edge_since_sample = false;
            self.periods_since_edge = 0;
        } else {
            self.periods_since_edge = self.periods_since_edge.saturating_add(1);
        }

        // Reported once, on the period the timeout expires
        let stalled = self.periods_since_edge == self.stall_periods;
        if stalled {
            debug!(
                "No Hall edge for {} speed periods, speed forced to 0",
                self.periods_since_edge
            );
            self.clear();
        }

        self.speed = electrical_to_mechanical(self.buffer.mean(), self.unit, self.pole_pairs);
        (self.speed, stalled)
    }

    pub fn reset(&mut self) {
        self.clear();
        self.periods_since_edge = 0;
        self.edge_since_sample = false;
        self.speed = MechanicalSpeed::ZERO;
    }

    /// Last averaged mechanical speed returned by [`sample`](Self::sample)
    pub fn speed(&self) -> MechanicalSpeed {
        self.speed
    }

    /// Mean electrical speed [s16 degrees / s], current as of the last edge
    pub fn average_el_speed(&self) -> i32 {
        self.average_el_speed
    }

    /// Mean electrical speed in s16 degrees per control period
    pub fn el_speed_dpp(&self, control_freq_hz: u32) -> i32 {
        if control_freq_hz == 0 {
            return 0;
        }
        div_round(self.average_el_speed as i64, control_freq_hz as i64) as i32
    }

    pub fn buffer(&self) -> &SpeedBuffer {
        &self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::Direction;

    fn test_config() -> HallConfig {
        HallConfig {
            tim_clock_freq_hz: 1_000_000,
            pole_pairs: 1,
            speed_unit: SpeedUnit::DeciHertz,
            speed_buffer_size: 4,
            speed_sampling_freq_hz: 100,
            stall_timeout_ms: 50,
            max_speed: MechanicalSpeed(10_000),
            saturation_speed: MechanicalSpeed(8_000),
            ..HallConfig::default()
        }
    }

    fn forward(ticks: u32) -> Interval {
        Interval {
            ticks,
            direction: Direction::Forward,
        }
    }

    #[test]
    fn test_buffer_mean_of_partial_fill() {
        let mut buffer = SpeedBuffer::new(4);
        assert_eq!(buffer.mean(), 0);
        buffer.push(10);
        buffer.push(20);
        buffer.push(60);
        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.mean(), 30);
    }

    #[test]
    fn test_buffer_evicts_oldest() {
        let mut buffer = SpeedBuffer::new(3);
        for sample in [1000, 10, 20, 30] {
            buffer.push(sample);
        }
        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.mean(), 20);
        let held: [i32; 3] = {
            let mut out = [0; 3];
            for (slot, sample) in out.iter_mut().zip(buffer.iter()) {
                *slot = sample;
            }
            out
        };
        assert_eq!(held, [10, 20, 30]);
    }

    #[test]
    fn test_buffer_depth_clamped() {
        assert_eq!(SpeedBuffer::new(0).depth(), 1);
        assert_eq!(SpeedBuffer::new(40).depth(), SPEED_FIFO_CAPACITY);
    }

    #[test]
    fn test_div_round() {
        assert_eq!(div_round(5, 2), 3);
        assert_eq!(div_round(-5, 2), -3);
        assert_eq!(div_round(4, 3), 1);
        assert_eq!(div_round(-4, 3), -1);
    }

    #[test]
    fn test_speed_conversion_round_trip() {
        for unit in [SpeedUnit::Rpm, SpeedUnit::DeciHertz, SpeedUnit::CentiHertz] {
            for pole_pairs in [1u8, 4, 7] {
                let speed = MechanicalSpeed(-1234);
                let el = mechanical_to_electrical(speed, unit, pole_pairs);
                assert_eq!(electrical_to_mechanical(el, unit, pole_pairs), speed);
            }
        }
    }

    #[test]
    fn test_instantaneous_speed() {
        let estimator = SpeedEstimator::new(&test_config());
        // 60° in 1000 µs -> 166.67 Hz electrical
        let el = estimator.instantaneous_el_speed(forward(1000)).unwrap();
        assert_eq!(el, 10_922_667);
        let reverse = Interval {
            ticks: 1000,
            direction: Direction::Reverse,
        };
        assert_eq!(estimator.instantaneous_el_speed(reverse), Some(-10_922_667));
        assert_eq!(estimator.instantaneous_el_speed(forward(0)), None);
    }

    #[test]
    fn test_sample_reports_mean() {
        let mut estimator = SpeedEstimator::new(&test_config());
        assert_eq!(estimator.push_interval(forward(1000)), FeedbackEvent::Valid);
        let (speed, stalled) = estimator.sample();
        assert!(!stalled);
        // 166.67 Hz -> 1666.7 dHz
        assert_eq!(speed, MechanicalSpeed(1667));
        assert_eq!(estimator.speed(), speed);
    }

    #[test]
    fn test_empty_buffer_reads_zero() {
        let mut estimator = SpeedEstimator::new(&test_config());
        assert_eq!(estimator.sample(), (MechanicalSpeed::ZERO, false));
    }

    #[test]
    fn test_zero_interval_not_sampled() {
        let mut estimator = SpeedEstimator::new(&test_config());
        assert_eq!(estimator.push_interval(forward(0)), FeedbackEvent::ZeroInterval);
        assert!(estimator.buffer().is_empty());
    }

    #[test]
    fn test_saturation_substitutes_signed_value() {
        let mut estimator = SpeedEstimator::new(&test_config());
        // 60° in 10 µs -> 16.7 kHz, far above 1000 Hz max
        assert_eq!(estimator.push_interval(forward(10)), FeedbackEvent::SaturatedSpeed);
        assert_eq!(estimator.sample().0, MechanicalSpeed(8_000));

        estimator.reset();
        let reverse = Interval {
            ticks: 10,
            direction: Direction::Reverse,
        };
        assert_eq!(estimator.push_interval(reverse), FeedbackEvent::SaturatedSpeed);
        assert_eq!(estimator.sample().0, MechanicalSpeed(-8_000));
    }

    #[test]
    fn test_sample_beyond_i32_saturates_instead_of_wrapping() {
        // Not a valid config: the believable range itself overflows i32
        let config = HallConfig {
            tim_clock_freq_hz: 170_000_000,
            pole_pairs: 200,
            speed_unit: SpeedUnit::Rpm,
            max_speed: MechanicalSpeed(1_000_000),
            saturation_speed: MechanicalSpeed(1_000_000),
            ..HallConfig::default()
        };
        let mut estimator = SpeedEstimator::new(&config);
        // 500 ticks per sector at 170 MHz is about 3.7e9 s16 degrees per second
        assert!(estimator.instantaneous_el_speed(forward(500)).unwrap() > i32::MAX as i64);
        assert_eq!(estimator.push_interval(forward(500)), FeedbackEvent::Valid);
        assert_eq!(estimator.average_el_speed(), i32::MAX);
    }

    #[test]
    fn test_stall_clears_speed() {
        let mut estimator = SpeedEstimator::new(&test_config());
        estimator.push_interval(forward(1000));
        // 50 ms at 100 Hz = 5 periods
        let (speed, stalled) = estimator.sample();
        assert_ne!(speed, MechanicalSpeed::ZERO);
        assert!(!stalled);
        for _ in 0..4 {
            assert!(!estimator.sample().1);
        }
        let (speed, stalled) = estimator.sample();
        assert!(stalled);
        assert_eq!(speed, MechanicalSpeed::ZERO);
        assert_eq!(estimator.average_el_speed(), 0);
        assert!(!estimator.sample().1);
    }

    #[test]
    fn test_dpp() {
        let mut estimator = SpeedEstimator::new(&test_config());
        estimator.push_interval(forward(1000));
        // 10_922_667 s16deg/s at 16 kHz
        assert_eq!(estimator.el_speed_dpp(16_000), 683);
        assert_eq!(estimator.el_speed_dpp(0), 0);
    }
}
