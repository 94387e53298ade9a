//! Fixed-point angle ("s16 degrees")
//!
//! A full turn is 65536 counts, so wrapping `u16` arithmetic is exactly
//! `mod 360°` and an angle can never leave `[0, 360)`.

use core::f32::consts::TAU;

/// Counts per full turn
pub const FULL_TURN: u32 = 1 << 16;

/// One Hall sector (60° electrical), truncated
pub const SECTOR_SPAN: u16 = (FULL_TURN / 6) as u16;

/// Half a sector (30° electrical)
pub const HALF_SECTOR: u16 = (FULL_TURN / 12) as u16;

/// Electrical angle in s16 degrees
pub type ElectricalAngle = Angle;

/// Mechanical angle in s16 degrees
pub type MechanicalAngle = Angle;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Angle(u16);

impl Angle {
    pub const ZERO: Self = Self(0);

    pub const fn from_raw(raw: u16) -> Self {
        Self(raw)
    }

    /// Signed offsets (-180°..180°) map onto the same circle
    pub const fn from_signed(raw: i16) -> Self {
        Self(raw as u16)
    }

    pub const fn raw(self) -> u16 {
        self.0
    }

    /// Build an angle from degrees, wrapping into `[0, 360)`
    pub fn from_degrees(degrees: f32) -> Self {
        let turns = degrees / 360.0;
        let fraction = turns - libm::floorf(turns);
        let counts = libm::roundf(fraction * FULL_TURN as f32) as u32;
        Self((counts % FULL_TURN) as u16)
    }

    /// Build an angle from radians, wrapping into `[0, 2π)`
    pub fn from_radians(radians: f32) -> Self {
        Self::from_degrees(radians * 360.0 / TAU)
    }

    pub fn degrees(self) -> f32 {
        self.0 as f32 * 360.0 / FULL_TURN as f32
    }

    /// Angle in radians `[0, 2π)`, the form the inverse Park transform takes
    pub fn radians(self) -> f32 {
        self.0 as f32 * TAU / FULL_TURN as f32
    }

    pub const fn wrapping_add(self, other: Angle) -> Self {
        Self(self.0.wrapping_add(other.0))
    }

    /// Add a signed count offset; any magnitude wraps around the circle
    pub const fn wrapping_add_signed(self, delta: i32) -> Self {
        Self((self.0 as i32).wrapping_add(delta) as u16)
    }

    /// Shortest signed distance from `self` to `target`, in counts
    pub const fn signed_delta_to(self, target: Angle) -> i16 {
        target.0.wrapping_sub(self.0) as i16
    }

    /// Start angle of Hall sector `k` (0..=6, where 6 wraps back to 0°)
    ///
    /// Each start is truncated individually so six sectors close the circle
    /// exactly.
    pub const fn sector_start(k: u8) -> Self {
        Self(((k as u32 * FULL_TURN) / 6) as u16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_degrees_wraps() {
        assert_eq!(Angle::from_degrees(0.0), Angle::ZERO);
        assert_eq!(Angle::from_degrees(360.0), Angle::ZERO);
        assert_eq!(Angle::from_degrees(90.0).raw(), 16384);
        assert_eq!(Angle::from_degrees(-90.0).raw(), 49152);
        assert_eq!(Angle::from_degrees(450.0).raw(), 16384);
    }

    #[test]
    fn test_radians_round_trip() {
        let angle = Angle::from_raw(12_345);
        let back = Angle::from_radians(angle.radians());
        assert!((back.raw() as i32 - 12_345).abs() <= 1);
        assert!((Angle::from_degrees(180.0).radians() - core::f32::consts::PI).abs() < 1e-5);
    }

    #[test]
    fn test_sector_starts_close_the_circle() {
        assert_eq!(Angle::sector_start(0), Angle::ZERO);
        assert_eq!(Angle::sector_start(1).raw(), 10_922);
        assert_eq!(Angle::sector_start(3).raw(), 32_768);
        assert_eq!(Angle::sector_start(5).raw(), 54_613);
        assert_eq!(Angle::sector_start(6), Angle::ZERO);
    }

    #[test]
    fn test_signed_delta_takes_short_way() {
        let a = Angle::from_raw(65_000);
        let b = Angle::from_raw(500);
        assert_eq!(a.signed_delta_to(b), 1036);
        assert_eq!(b.signed_delta_to(a), -1036);
        assert_eq!(a.wrapping_add_signed(1036), b);
        assert_eq!(Angle::from_signed(-1).raw(), u16::MAX);
    }
}
