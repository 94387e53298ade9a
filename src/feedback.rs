// Hall sensor speed & position feedback
// Angle reconstruction per edge, averaged speed per sampling tick, latched fault on bad input

pub mod angle_reconstructor;
pub mod estimator;
pub mod hall_pattern;
pub mod reliability;
pub mod speed;

pub use angle_reconstructor::{AngleReconstructor, EdgeUpdate, Interval};
pub use estimator::{FeedbackOutput, HallEstimator};
pub use hall_pattern::{HallPattern, Transition};
pub use reliability::{FaultState, ReliabilityMonitor, SensorFault};
pub use speed::{MechanicalSpeed, SpeedBuffer, SpeedEstimator, SpeedUnit};

/// Rotation direction, derived from the order of Hall transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// 5 -> 1 -> 3 -> 2 -> 6 -> 4 -> 5
    #[default]
    Forward,
    Reverse,
}

impl Direction {
    pub const fn sign(self) -> i32 {
        match self {
            Direction::Forward => 1,
            Direction::Reverse => -1,
        }
    }
}

/// What a single Hall edge turned out to be
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FeedbackEvent {
    /// Canonical neighbour in the current direction
    Valid,
    /// Canonical neighbour, opposite direction to the previous edge
    DirectionChange,
    /// First pattern after creation or reset; position known to ±30°
    Resync,
    /// 0b000 or 0b111
    InvalidPattern(u8),
    /// Valid pattern that is not a neighbour of the previous one (skipped or repeated sector)
    IllegalTransition { from: u8, to: u8 },
    /// Two edges captured on the same timer count
    ZeroInterval,
    /// Interval implies a speed above the plausible maximum; saturation speed was used
    SaturatedSpeed,
}

impl FeedbackEvent {
    /// Errors count towards the fault threshold, everything else resets it
    pub const fn is_error(self) -> bool {
        matches!(
            self,
            FeedbackEvent::InvalidPattern(_)
                | FeedbackEvent::IllegalTransition { .. }
                | FeedbackEvent::ZeroInterval
                | FeedbackEvent::SaturatedSpeed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(!FeedbackEvent::Valid.is_error());
        assert!(!FeedbackEvent::DirectionChange.is_error());
        assert!(!FeedbackEvent::Resync.is_error());
        assert!(FeedbackEvent::InvalidPattern(7).is_error());
        assert!(FeedbackEvent::IllegalTransition { from: 5, to: 3 }.is_error());
        assert!(FeedbackEvent::ZeroInterval.is_error());
        assert!(FeedbackEvent::SaturatedSpeed.is_error());
    }

    #[test]
    fn test_direction_sign() {
        assert_eq!(Direction::Forward.sign(), 1);
        assert_eq!(Direction::Reverse.sign(), -1);
        assert_eq!(Direction::default(), Direction::Forward);
    }
}
