//! Simulated Hall sensors
//!
//! A virtual rotor turning at a constant rate with exact capture
//! timestamps, plus explicit glitch injection. Used by the scenario tests and
//! for bench-testing the feedback path without a motor attached.

use crate::edge::{CaptureTimer, HallEdge, SensorEdgeSource};
use crate::feedback::{Direction, HallPattern};

/// Edges held before the oldest is overwritten
pub const PENDING_CAPACITY: usize = 32;

pub struct SimulatedHall {
    now: u32,
    sector: u8,
    direction: Direction,
    /// Timer counts per 60° electrical, 0 while stopped
    ticks_per_sector: u32,
    since_edge: u32,
    pending: [HallEdge; PENDING_CAPACITY],
    head: usize,
    len: usize,
}

impl SimulatedHall {
    /// Rotor at rest in `sector` (0..=5 along the forward sequence) at time 0
    pub fn new(sector: u8) -> Self {
        Self {
            now: 0,
            sector: sector % 6,
            direction: Direction::Forward,
            ticks_per_sector: 0,
            since_edge: 0,
            pending: [HallEdge::new(HallPattern::new(0), 0); PENDING_CAPACITY],
            head: 0,
            len: 0,
        }
    }

    /// Start the time base somewhere other than 0 (e.g. just before a wrap)
    pub fn with_start_time(mut self, now: u32) -> Self {
        self.now = now;
        self
    }

    /// Spin at one sector per `ticks_per_sector` counts; 0 stops the rotor
    ///
    /// The rotor restarts its sector timing from the current instant.
    pub fn set_motion(&mut self, ticks_per_sector: u32, direction: Direction) {
        self.ticks_per_sector = ticks_per_sector;
        self.direction = direction;
        self.since_edge = 0;
    }

    pub fn stop(&mut self) {
        self.set_motion(0, self.direction);
    }

    /// Advance time, queueing every sector crossing on the way
    pub fn run_for(&mut self, ticks: u32) {
        let mut remaining = ticks;
        while self.ticks_per_sector != 0 && self.since_edge + remaining >= self.ticks_per_sector {
            let step = self.ticks_per_sector - self.since_edge;
            self.now = self.now.wrapping_add(step);
            remaining -= step;
            self.since_edge = 0;
            self.sector = match self.direction {
                Direction::Forward => (self.sector + 1) % 6,
                Direction::Reverse => (self.sector + 5) % 6,
            };
            self.push(HallEdge::new(HallPattern::from_sector(self.sector), self.now));
        }
        self.now = self.now.wrapping_add(remaining);
        self.since_edge += remaining;
    }

    /// Queue a spurious edge carrying `raw` at the current time
    ///
    /// The rotor itself does not move.
    pub fn inject(&mut self, raw: u8) {
        self.push(HallEdge::new(HallPattern::new(raw), self.now));
    }

    /// Pattern the sensors currently read
    pub fn pattern(&self) -> HallPattern {
        HallPattern::from_sector(self.sector)
    }

    pub fn sector(&self) -> u8 {
        self.sector
    }

    pub fn pending(&self) -> usize {
        self.len
    }

    fn push(&mut self, edge: HallEdge) {
        let tail = (self.head + self.len) % PENDING_CAPACITY;
        self.pending[tail] = edge;
        if self.len == PENDING_CAPACITY {
            self.head = (self.head + 1) % PENDING_CAPACITY;
        } else {
            self.len += 1;
        }
    }
}

impl CaptureTimer for SimulatedHall {
    fn now(&self) -> u32 {
        self.now
    }
}

impl SensorEdgeSource for SimulatedHall {
    fn next_edge(&mut self) -> Option<HallEdge> {
        if self.len == 0 {
            return None;
        }
        let edge = self.pending[self.head];
        self.head = (self.head + 1) % PENDING_CAPACITY;
        self.len -= 1;
        Some(edge)
    }
}
