//! Hall-sensor speed and position feedback for PMSM/BLDC field-oriented control.
//!
//! Three digital Hall sensors are turned into a continuously available
//! electrical angle, a rotation direction and an averaged mechanical speed.
//! The estimator is driven from two places:
//!
//! - the capture interrupt, once per Hall edge ([`HallEstimator::on_edge`]),
//! - the speed loop, once per sampling period ([`HallEstimator::sample`]).
//!
//! The current loop reads the interpolated angle in between
//! ([`HallEstimator::angle_at`]). Nothing here allocates or blocks, and every
//! input (including garbage) produces a defined output.

#![cfg_attr(not(test), no_std)]

mod fmt;

pub mod angle;
pub mod config;
pub mod edge;
pub mod feedback;
pub mod shared;
pub mod sim;

pub use angle::{Angle, ElectricalAngle, MechanicalAngle};
pub use config::{ConfigError, HallConfig, SensorPlacement};
pub use edge::{CaptureTimer, HallEdge, SensorEdgeSource};
pub use feedback::{
    Direction, FaultState, FeedbackEvent, FeedbackOutput, HallEstimator, HallPattern,
    MechanicalSpeed, SensorFault, SpeedUnit,
};
pub use shared::SharedEstimator;
