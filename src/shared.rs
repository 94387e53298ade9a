//! Estimator shared between the capture interrupt and the control tasks
//!
//! Every call runs inside one short critical section, so a task can never
//! observe the pattern of one edge paired with the timestamp of another.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

use crate::angle::ElectricalAngle;
use crate::edge::{CaptureTimer, HallEdge};
use crate::feedback::{FeedbackOutput, HallEstimator, MechanicalSpeed, SensorFault};

/// Usable as a `static`; every accessor returns `None` until
/// [`install`](Self::install) has been called.
pub struct SharedEstimator {
    inner: Mutex<CriticalSectionRawMutex, RefCell<Option<HallEstimator>>>,
}

impl SharedEstimator {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(None)),
        }
    }

    /// Replace the estimator, dropping any previous state
    pub fn install(&self, estimator: HallEstimator) {
        self.inner.lock(|cell| {
            cell.replace(Some(estimator));
        });
    }

    pub fn is_installed(&self) -> bool {
        self.inner.lock(|cell| cell.borrow().is_some())
    }

    /// Run `f` on the estimator inside the critical section
    pub fn with<R>(&self, f: impl FnOnce(&mut HallEstimator) -> R) -> Option<R> {
        self.inner.lock(|cell| cell.borrow_mut().as_mut().map(f))
    }

    pub fn on_edge(&self, edge: HallEdge) -> Option<ElectricalAngle> {
        self.with(|estimator| estimator.on_edge(edge))
    }

    /// Angle at an instant read by the caller
    ///
    /// `now` must not predate an edge that lands before the lock is taken;
    /// such a read yields the edge angle. Prefer [`angle_now`](Self::angle_now).
    pub fn angle_at(&self, now: u32) -> Option<ElectricalAngle> {
        self.with(|estimator| estimator.angle_at(now))
    }

    /// Angle at the current instant of `timer`, read inside the critical section
    pub fn angle_now<T: CaptureTimer + ?Sized>(&self, timer: &T) -> Option<ElectricalAngle> {
        self.with(|estimator| estimator.angle_at(timer.now()))
    }

    pub fn sample(&self) -> Option<(MechanicalSpeed, Option<SensorFault>)> {
        self.with(|estimator| estimator.sample())
    }

    pub fn reset(&self) {
        self.with(|estimator| estimator.reset());
    }

    pub fn output(&self) -> Option<FeedbackOutput> {
        self.with(|estimator| estimator.output())
    }
}

impl Default for SharedEstimator {
    fn default() -> Self {
        Self::new()
    }
}
