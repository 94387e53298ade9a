// Consecutive-error counter with a latched fault

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FaultState {
    Reliable,
    /// Latched until `reset`
    Faulted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorFault {
    #[error("Hall sensor unreliable after {errors} consecutive errors")]
    Unreliable { errors: u8 },
}

pub struct ReliabilityMonitor {
    threshold: u8,
    consecutive_errors: u8,
    state: FaultState,
}

impl ReliabilityMonitor {
    pub fn new(threshold: u8) -> Self {
        Self {
            threshold: threshold.max(1),
            consecutive_errors: 0,
            state: FaultState::Reliable,
        }
    }

    /// Account for one feedback event
    ///
    /// A valid event clears the counter but never the latch.
    pub fn observe(&mut self, valid: bool) -> FaultState {
        if valid {
            self.consecutive_errors = 0;
            return self.state;
        }

        self.consecutive_errors = self.consecutive_errors.saturating_add(1);
        if self.state == FaultState::Reliable && self.consecutive_errors >= self.threshold {
            self.state = FaultState::Faulted;
            error!(
                "Hall feedback faulted: {} consecutive errors",
                self.consecutive_errors
            );
        }
        self.state
    }

    pub fn reset(&mut self) {
        self.consecutive_errors = 0;
        self.state = FaultState::Reliable;
    }

    pub fn state(&self) -> FaultState {
        self.state
    }

    pub fn is_reliable(&self) -> bool {
        self.state == FaultState::Reliable
    }

    pub fn consecutive_errors(&self) -> u8 {
        self.consecutive_errors
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    pub fn fault(&self) -> Option<SensorFault> {
        match self.state {
            FaultState::Reliable => None,
            FaultState::Faulted => Some(SensorFault::Unreliable {
                errors: self.consecutive_errors.max(self.threshold),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latches_at_threshold() {
        let mut monitor = ReliabilityMonitor::new(3);
        assert_eq!(monitor.observe(false), FaultState::Reliable);
        assert_eq!(monitor.observe(false), FaultState::Reliable);
        assert_eq!(monitor.consecutive_errors(), 2);
        assert_eq!(monitor.observe(false), FaultState::Faulted);
        assert_eq!(monitor.fault(), Some(SensorFault::Unreliable { errors: 3 }));
    }

    #[test]
    fn test_valid_event_clears_count() {
        let mut monitor = ReliabilityMonitor::new(3);
        monitor.observe(false);
        monitor.observe(false);
        monitor.observe(true);
        assert_eq!(monitor.consecutive_errors(), 0);
        monitor.observe(false);
        monitor.observe(false);
        assert!(monitor.is_reliable());
    }

    #[test]
    fn test_fault_stays_latched() {
        let mut monitor = ReliabilityMonitor::new(1);
        assert_eq!(monitor.observe(false), FaultState::Faulted);
        for _ in 0..10 {
            assert_eq!(monitor.observe(true), FaultState::Faulted);
        }
        assert!(!monitor.is_reliable());
        monitor.reset();
        assert!(monitor.is_reliable());
        assert_eq!(monitor.fault(), None);
    }

    #[test]
    fn test_counter_saturates() {
        let mut monitor = ReliabilityMonitor::new(5);
        for _ in 0..300 {
            monitor.observe(false);
        }
        assert_eq!(monitor.consecutive_errors(), u8::MAX);
    }

    #[test]
    fn test_zero_threshold_treated_as_one() {
        assert_eq!(ReliabilityMonitor::new(0).threshold(), 1);
    }
}
