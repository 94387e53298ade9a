// Hall estimator: angle reconstruction, speed averaging and reliability wired together
// on_edge runs in the capture interrupt, sample in the speed loop, angle_at in the current loop

use super::angle_reconstructor::AngleReconstructor;
use super::reliability::{FaultState, ReliabilityMonitor, SensorFault};
use super::speed::{MechanicalSpeed, SpeedEstimator};
use super::{Direction, FeedbackEvent};
use crate::angle::{Angle, ElectricalAngle, MechanicalAngle};
use crate::config::{ConfigError, HallConfig};
use crate::edge::{HallEdge, SensorEdgeSource};

/// Snapshot handed to the control loops
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FeedbackOutput {
    pub electrical_angle: ElectricalAngle,
    pub mechanical_angle: MechanicalAngle,
    pub speed: MechanicalSpeed,
    pub direction: Direction,
    pub reliable: bool,
}

impl FeedbackOutput {
    /// Before the first edge
    pub const IDLE: Self = Self {
        electrical_angle: Angle::ZERO,
        mechanical_angle: Angle::ZERO,
        speed: MechanicalSpeed::ZERO,
        direction: Direction::Forward,
        reliable: true,
    };

    pub const fn new() -> Self {
        Self::IDLE
    }
}

impl Default for FeedbackOutput {
    fn default() -> Self {
        Self::IDLE
    }
}

pub struct HallEstimator {
    config: HallConfig,
    angle: AngleReconstructor,
    speed: SpeedEstimator,
    reliability: ReliabilityMonitor,
    last_event: Option<FeedbackEvent>,
}

impl HallEstimator {
    pub fn new(config: HallConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        info!(
            "Hall estimator: {} pole pairs, {} sample buffer, fault after {} errors",
            config.pole_pairs,
            config.speed_buffer_size,
            config.errors_before_fault
        );

        Ok(Self {
            angle: AngleReconstructor::new(&config),
            speed: SpeedEstimator::new(&config),
            reliability: ReliabilityMonitor::new(config.errors_before_fault),
            config,
            last_event: None,
        })
    }

    /// Process one captured Hall edge and return the new electrical angle
    pub fn on_edge(&mut self, edge: HallEdge) -> ElectricalAngle {
        let update = self.angle.update(edge.pattern, edge.timestamp);

        let event = match update.event {
            FeedbackEvent::Valid | FeedbackEvent::Resync => match update.interval {
                Some(interval) => self.speed.push_interval(interval),
                None => {
                    self.speed.note_edge();
                    update.event
                }
            },
            FeedbackEvent::DirectionChange => {
                debug!("Rotation reversed, now {}", update.angle.raw());
                self.speed.clear();
                self.speed.note_edge();
                update.event
            }
            FeedbackEvent::InvalidPattern(raw) => {
                warn!("Invalid Hall pattern {}", raw);
                update.event
            }
            FeedbackEvent::IllegalTransition { from, to } => {
                warn!("Illegal Hall transition {} -> {}", from, to);
                update.event
            }
            other => other,
        };

        self.reliability.observe(!event.is_error());
        self.last_event = Some(event);
        update.angle
    }

    /// Electrical angle at timer count `now`, interpolated since the last edge
    pub fn angle_at(&mut self, now: u32) -> ElectricalAngle {
        self.angle.angle_at(now, self.speed.average_el_speed())
    }

    /// Speed-loop tick
    ///
    /// Returns the averaged mechanical speed and the latched fault, if any.
    pub fn sample(&mut self) -> (MechanicalSpeed, Option<SensorFault>) {
        let (speed, stalled) = self.speed.sample();
        if stalled {
            self.angle.forget_timing();
        }
        (speed, self.reliability.fault())
    }

    /// Feed every pending edge from `source`, returning how many were processed
    pub fn drain<S: SensorEdgeSource + ?Sized>(&mut self, source: &mut S) -> usize {
        let mut count = 0;
        while let Some(edge) = source.next_edge() {
            self.on_edge(edge);
            count += 1;
        }
        count
    }

    /// Back to the just-created state, fault latch included
    pub fn reset(&mut self) {
        self.angle.reset();
        self.speed.reset();
        self.reliability.reset();
        self.last_event = None;
        info!("Hall estimator reset");
    }

    pub fn output(&self) -> FeedbackOutput {
        FeedbackOutput {
            electrical_angle: self.angle.electrical_angle(),
            mechanical_angle: self.angle.mechanical_angle(),
            speed: self.speed.speed(),
            direction: self.angle.direction(),
            reliable: self.reliability.is_reliable(),
        }
    }

    pub fn set_mechanical_angle(&mut self, angle: MechanicalAngle) {
        self.angle.set_mechanical_angle(angle);
    }

    pub fn electrical_angle(&self) -> ElectricalAngle {
        self.angle.electrical_angle()
    }

    pub fn mechanical_angle(&self) -> MechanicalAngle {
        self.angle.mechanical_angle()
    }

    /// Last value returned by [`sample`](Self::sample)
    pub fn speed(&self) -> MechanicalSpeed {
        self.speed.speed()
    }

    /// Mean electrical speed [s16 degrees / s]
    pub fn average_el_speed(&self) -> i32 {
        self.speed.average_el_speed()
    }

    /// Mean electrical speed in s16 degrees per control period
    pub fn el_speed_dpp(&self, control_freq_hz: u32) -> i32 {
        self.speed.el_speed_dpp(control_freq_hz)
    }

    pub fn direction(&self) -> Direction {
        self.angle.direction()
    }

    pub fn fault_state(&self) -> FaultState {
        self.reliability.state()
    }

    pub fn fault(&self) -> Option<SensorFault> {
        self.reliability.fault()
    }

    pub fn is_reliable(&self) -> bool {
        self.reliability.is_reliable()
    }

    pub fn consecutive_errors(&self) -> u8 {
        self.reliability.consecutive_errors()
    }

    pub fn last_event(&self) -> Option<FeedbackEvent> {
        self.last_event
    }

    pub fn buffered_samples(&self) -> usize {
        self.speed.buffer().len()
    }

    pub fn config(&self) -> &HallConfig {
        &self.config
    }
}
