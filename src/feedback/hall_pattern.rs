// Hall pattern decoding
// Raw code is H3<<2 | H2<<1 | H1, the same bit order TIM4's GPIO read produces

use crate::config::SensorPlacement;

const INVALID: u8 = 0xFF;

/// Raw pattern (0-7) -> sector index (0-5) along the forward sequence
/// Forward sequence: 5 -> 1 -> 3 -> 2 -> 6 -> 4 -> 5
/// Raw state:  [0,       1, 2, 3, 4, 5, 6, 7      ]
/// Sector:     [invalid, 1, 3, 2, 5, 0, 4, invalid]
const SECTOR_OF_PATTERN: [u8; 8] = [INVALID, 1, 3, 2, 5, 0, 4, INVALID];

/// Sector index -> raw pattern
pub const FORWARD_SEQUENCE: [u8; 6] = [5, 1, 3, 2, 6, 4];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HallPattern(u8);

impl HallPattern {
    /// Only the low three bits are kept
    pub const fn new(raw: u8) -> Self {
        Self(raw & 0b111)
    }

    /// Assemble the pattern from the three sensor levels
    ///
    /// With 60° placement the middle sensor is inverted and moved to the top
    /// bit, which yields the code a 120° arrangement would have produced for
    /// the same rotor position. Everything downstream only sees 120° codes.
    pub const fn from_sensors(h1: bool, h2: bool, h3: bool, placement: SensorPlacement) -> Self {
        let raw = match placement {
            SensorPlacement::Degrees120 => ((h3 as u8) << 2) | ((h2 as u8) << 1) | h1 as u8,
            SensorPlacement::Degrees60 => ((!h2 as u8) << 2) | ((h3 as u8) << 1) | h1 as u8,
        };
        Self(raw)
    }

    pub const fn from_sector(sector: u8) -> Self {
        Self(FORWARD_SEQUENCE[(sector % 6) as usize])
    }

    pub const fn raw(self) -> u8 {
        self.0
    }

    pub const fn is_valid(self) -> bool {
        SECTOR_OF_PATTERN[self.0 as usize] != INVALID
    }

    /// Position of this pattern in the forward sequence, `None` for 0b000/0b111
    pub const fn sector(self) -> Option<u8> {
        match SECTOR_OF_PATTERN[self.0 as usize] {
            INVALID => None,
            sector => Some(sector),
        }
    }
}

/// Relation between two consecutive patterns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Transition {
    Forward,
    Reverse,
    Same,
    Illegal,
}

impl Transition {
    pub const fn between(prev: HallPattern, next: HallPattern) -> Self {
        let (Some(a), Some(b)) = (prev.sector(), next.sector()) else {
            return Transition::Illegal;
        };
        if b == (a + 1) % 6 {
            Transition::Forward
        } else if b == (a + 5) % 6 {
            Transition::Reverse
        } else if a == b {
            Transition::Same
        } else {
            Transition::Illegal
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sector_table() {
        assert_eq!(HallPattern::new(0).sector(), None);
        assert_eq!(HallPattern::new(7).sector(), None);
        for (sector, &raw) in FORWARD_SEQUENCE.iter().enumerate() {
            assert_eq!(HallPattern::new(raw).sector(), Some(sector as u8));
            assert_eq!(HallPattern::from_sector(sector as u8).raw(), raw);
        }
    }

    #[test]
    fn test_new_masks_upper_bits() {
        assert_eq!(HallPattern::new(0b1111_1101).raw(), 5);
    }

    #[test]
    fn test_transitions() {
        let p = HallPattern::new;
        assert_eq!(Transition::between(p(5), p(1)), Transition::Forward);
        assert_eq!(Transition::between(p(4), p(5)), Transition::Forward);
        assert_eq!(Transition::between(p(5), p(4)), Transition::Reverse);
        assert_eq!(Transition::between(p(1), p(5)), Transition::Reverse);
        assert_eq!(Transition::between(p(3), p(3)), Transition::Same);
        assert_eq!(Transition::between(p(5), p(3)), Transition::Illegal);
        assert_eq!(Transition::between(p(5), p(0)), Transition::Illegal);
        assert_eq!(Transition::between(p(7), p(1)), Transition::Illegal);
    }

    #[test]
    fn test_sixty_degree_remap() {
        // Sensors at 0°, 60°, 120°: inverting the 60° sensor gives the 240°
        // sensor of a 120° arrangement, so every 60° state maps to a valid code.
        let placement = SensorPlacement::Degrees60;
        let states = [
            (true, false, false),
            (true, true, false),
            (true, true, true),
            (false, true, true),
            (false, false, true),
            (false, false, false),
        ];
        let mut seen = [false; 8];
        for (h1, h2, h3) in states {
            let pattern = HallPattern::from_sensors(h1, h2, h3, placement);
            assert!(pattern.is_valid(), "pattern {} invalid", pattern.raw());
            seen[pattern.raw() as usize] = true;
        }
        assert_eq!(seen.iter().filter(|s| **s).count(), 6);

        // 0b000 and 0b111 are the illegal combinations in 60° placement
        assert!(!HallPattern::from_sensors(true, false, true, placement).is_valid());
        assert!(!HallPattern::from_sensors(false, true, false, placement).is_valid());
    }

    #[test]
    fn test_sixty_degree_sequence_is_canonical() {
        // Walking the 60° states in rotor order follows a canonical cycle
        let placement = SensorPlacement::Degrees60;
        let states = [
            (true, false, false),
            (true, true, false),
            (true, true, true),
            (false, true, true),
            (false, false, true),
            (false, false, false),
        ];
        let first = HallPattern::from_sensors(states[0].0, states[0].1, states[0].2, placement);
        let second = HallPattern::from_sensors(states[1].0, states[1].1, states[1].2, placement);
        let direction = Transition::between(first, second);
        assert!(matches!(direction, Transition::Forward | Transition::Reverse));
        for i in 0..6 {
            let (a1, a2, a3) = states[i];
            let (b1, b2, b3) = states[(i + 1) % 6];
            let a = HallPattern::from_sensors(a1, a2, a3, placement);
            let b = HallPattern::from_sensors(b1, b2, b3, placement);
            assert_eq!(Transition::between(a, b), direction);
        }
    }
}
