// Electrical/mechanical angle reconstruction from Hall edges
// Edge angle is the sector boundary just crossed; between edges the angle is
// interpolated from the averaged speed and clamped inside the current sector

use super::hall_pattern::{HallPattern, Transition};
use super::{Direction, FeedbackEvent};
use crate::angle::{Angle, ElectricalAngle, MechanicalAngle, FULL_TURN, HALF_SECTOR, SECTOR_SPAN};
use crate::config::HallConfig;

/// Timer counts between two legal edges in the same direction (one sector)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Interval {
    pub ticks: u32,
    pub direction: Direction,
}

/// Result of feeding one edge to the reconstructor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EdgeUpdate {
    pub angle: ElectricalAngle,
    pub event: FeedbackEvent,
    /// The previous interval, when this edge closed a full sector
    pub interval: Option<Interval>,
}

pub struct AngleReconstructor {
    phase_shift: Angle,
    pole_pairs: u8,
    tim_clock_freq_hz: u32,
    last_pattern: Option<HallPattern>,
    last_timestamp: u32,
    direction: Direction,
    /// Cleared by a resync; the first legal edge after it sets the direction
    direction_known: bool,
    /// Last edge was a legal boundary crossing, so the next one closes a full sector
    interval_ready: bool,
    /// Interpolate between edges; off while the position is uncertain
    interpolate: bool,
    /// Angle and accumulator at the last boundary crossing
    edge_angle: ElectricalAngle,
    edge_accum: u32,
    electrical_angle: ElectricalAngle,
    /// Electrical angle accumulated over one mechanical turn, `[0, pole_pairs * 65536)`
    accum: u32,
}

impl AngleReconstructor {
    pub fn new(config: &HallConfig) -> Self {
        Self {
            phase_shift: config.phase_shift,
            pole_pairs: config.pole_pairs.max(1),
            tim_clock_freq_hz: config.tim_clock_freq_hz,
            last_pattern: None,
            last_timestamp: 0,
            direction: Direction::Forward,
            direction_known: false,
            interval_ready: false,
            interpolate: false,
            edge_angle: Angle::ZERO,
            edge_accum: 0,
            electrical_angle: Angle::ZERO,
            accum: 0,
        }
    }

    /// Process one Hall edge captured at `timestamp`
    pub fn update(&mut self, pattern: HallPattern, timestamp: u32) -> EdgeUpdate {
        let Some(sector) = pattern.sector() else {
            // Position unknown until a good pattern comes back; hold the last angle
            self.interpolate = false;
            return self.unchanged(FeedbackEvent::InvalidPattern(pattern.raw()));
        };

        let Some(prev) = self.last_pattern else {
            // Nothing to compare against: assume the middle of the sector
            let angle = self
                .phase_shift
                .wrapping_add(Angle::sector_start(sector))
                .wrapping_add(Angle::from_raw(HALF_SECTOR));
            self.last_pattern = Some(pattern);
            self.last_timestamp = timestamp;
            self.interval_ready = false;
            self.interpolate = false;
            self.seat(angle);
            return EdgeUpdate {
                angle,
                event: FeedbackEvent::Resync,
                interval: None,
            };
        };

        let direction = match Transition::between(prev, pattern) {
            Transition::Forward => Direction::Forward,
            Transition::Reverse => Direction::Reverse,
            Transition::Same | Transition::Illegal => {
                // Track the new pattern so the following edge can be judged,
                // but the interval and interpolation base are lost
                self.last_pattern = Some(pattern);
                self.last_timestamp = timestamp;
                self.interval_ready = false;
                self.interpolate = false;
                return self.unchanged(FeedbackEvent::IllegalTransition {
                    from: prev.raw(),
                    to: pattern.raw(),
                });
            }
        };

        // Forward edges enter a sector at its start, reverse edges at its end
        let boundary = match direction {
            Direction::Forward => Angle::sector_start(sector),
            Direction::Reverse => Angle::sector_start(sector + 1),
        };
        let angle = self.phase_shift.wrapping_add(boundary);

        let same_direction = !self.direction_known || direction == self.direction;
        let interval = (self.interval_ready && same_direction).then(|| Interval {
            ticks: timestamp.wrapping_sub(self.last_timestamp),
            direction,
        });
        let event = if same_direction {
            FeedbackEvent::Valid
        } else {
            FeedbackEvent::DirectionChange
        };

        trace!(
            "Hall edge {} -> {} at {}, angle={}",
            prev.raw(),
            pattern.raw(),
            timestamp,
            angle.raw()
        );

        self.last_pattern = Some(pattern);
        self.last_timestamp = timestamp;
        self.direction = direction;
        self.direction_known = true;
        self.interval_ready = true;
        self.interpolate = true;
        self.seat(angle);

        EdgeUpdate {
            angle,
            event,
            interval,
        }
    }

    /// Angle at timer count `now`, interpolated from the last boundary crossing
    ///
    /// `el_speed` is the averaged electrical speed [s16 degrees / s]. The
    /// advance never reaches the next boundary: only a real edge may move the
    /// angle into the next sector.
    pub fn angle_at(&mut self, now: u32, el_speed: i32) -> ElectricalAngle {
        if !self.interpolate || self.tim_clock_freq_hz == 0 {
            return self.electrical_angle;
        }

        // `now` read before an edge that was processed first lands behind it
        let elapsed = (now.wrapping_sub(self.last_timestamp) as i32).max(0) as i64;
        let advance = elapsed * el_speed as i64 / self.tim_clock_freq_hz as i64;
        let limit = SECTOR_SPAN as i64 - 1;
        let advance = match self.direction {
            Direction::Forward => advance.clamp(0, limit),
            Direction::Reverse => advance.clamp(-limit, 0),
        };

        self.electrical_angle = self.edge_angle.wrapping_add_signed(advance as i32);
        self.accum = self.wrap_accum(self.edge_accum, advance);
        self.electrical_angle
    }

    /// Forget the last timestamp after a stall; the next edge starts a fresh interval
    pub fn forget_timing(&mut self) {
        self.interval_ready = false;
        self.interpolate = false;
        self.electrical_angle = self.edge_angle;
        self.accum = self.edge_accum;
    }

    /// Force the mechanical angle (and the electrical angle that follows from it)
    pub fn set_mechanical_angle(&mut self, angle: MechanicalAngle) {
        let accum = angle.raw() as u32 * self.pole_pairs as u32;
        self.accum = accum;
        self.edge_accum = accum;
        self.electrical_angle = Angle::from_raw((accum % FULL_TURN) as u16);
        self.edge_angle = self.electrical_angle;
        self.interpolate = false;
    }

    pub fn reset(&mut self) {
        self.last_pattern = None;
        self.last_timestamp = 0;
        self.direction = Direction::Forward;
        self.direction_known = false;
        self.interval_ready = false;
        self.interpolate = false;
        self.edge_angle = Angle::ZERO;
        self.edge_accum = 0;
        self.electrical_angle = Angle::ZERO;
        self.accum = 0;
    }

    pub fn electrical_angle(&self) -> ElectricalAngle {
        self.electrical_angle
    }

    /// Electrical angle divided by the pole pairs, tracked over the whole mechanical turn
    pub fn mechanical_angle(&self) -> MechanicalAngle {
        Angle::from_raw((self.accum / self.pole_pairs as u32) as u16)
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn last_pattern(&self) -> Option<HallPattern> {
        self.last_pattern
    }

    fn unchanged(&self, event: FeedbackEvent) -> EdgeUpdate {
        EdgeUpdate {
            angle: self.electrical_angle,
            event,
            interval: None,
        }
    }

    /// Move to a new edge angle, carrying the mechanical accumulator along the short way
    fn seat(&mut self, angle: ElectricalAngle) {
        let delta = self.electrical_angle.signed_delta_to(angle) as i64;
        self.accum = self.wrap_accum(self.accum, delta);
        self.electrical_angle = angle;
        self.edge_angle = angle;
        self.edge_accum = self.accum;
    }

    fn wrap_accum(&self, accum: u32, delta: i64) -> u32 {
        let modulus = self.pole_pairs as i64 * FULL_TURN as i64;
        (accum as i64 + delta).rem_euclid(modulus) as u32
    }
}
