//! Where Hall edges come from
//!
//! On the drive the capture interrupt pushes edges straight into the
//! estimator; anything else (tests, a polled GPIO port, a recorded trace)
//! implements [`SensorEdgeSource`] and is drained with
//! [`HallEstimator::drain`](crate::HallEstimator::drain).

use crate::feedback::HallPattern;

/// One sensor transition and the timer count it was captured at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HallEdge {
    pub pattern: HallPattern,
    pub timestamp: u32,
}

impl HallEdge {
    pub const fn new(pattern: HallPattern, timestamp: u32) -> Self {
        Self { pattern, timestamp }
    }
}

/// Free-running capture time base, in ticks of `tim_clock_freq_hz`
pub trait CaptureTimer {
    fn now(&self) -> u32;
}

pub trait SensorEdgeSource {
    /// Next pending edge, oldest first
    fn next_edge(&mut self) -> Option<HallEdge>;
}

impl<T: CaptureTimer + ?Sized> CaptureTimer for &T {
    fn now(&self) -> u32 {
        (**self).now()
    }
}

impl<S: SensorEdgeSource + ?Sized> SensorEdgeSource for &mut S {
    fn next_edge(&mut self) -> Option<HallEdge> {
        (**self).next_edge()
    }
}
