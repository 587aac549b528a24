//! Capacity tier resolution.
//!
//! Capacity is an external "operating stability" score owned by another
//! subsystem. This module maps it to the usable-energy ceiling and the XP
//! efficiency multiplier. The breakpoints are a deliberate design policy:
//! low capacity caps both how much usable energy exists and how efficiently
//! activity converts to progress.

use serde::{Deserialize, Serialize};

/// Hard ceiling applied while the owner is in burnout, regardless of tier.
pub const BURNOUT_ENERGY_CAP: f64 = 40.0;

/// Highest ceiling any tier grants.
pub const MAX_ENERGY_CEILING: f64 = 110.0;

/// Ceiling and XP efficiency for a capacity score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CapacityTier {
    /// Maximum usable energy for this tier
    pub ceiling: f64,
    /// Multiplier applied when converting activity to XP
    pub xp_efficiency: f64,
}

/// Resolve the capacity tier for a score.
///
/// Total function: every score (including negative or absurdly large ones)
/// lands in a tier. Lower bounds are inclusive, upper bounds exclusive.
///
/// | capacity   | ceiling | xp_efficiency |
/// |------------|---------|---------------|
/// | < 30       | 70      | 0.70          |
/// | [30, 60)   | 85      | 0.85          |
/// | [60, 80)   | 100     | 1.00          |
/// | >= 80      | 110     | 1.10          |
pub fn resolve_ceiling(capacity: f64) -> CapacityTier {
    if capacity < 30.0 {
        CapacityTier {
            ceiling: 70.0,
            xp_efficiency: 0.70,
        }
    } else if capacity < 60.0 {
        CapacityTier {
            ceiling: 85.0,
            xp_efficiency: 0.85,
        }
    } else if capacity < 80.0 {
        CapacityTier {
            ceiling: 100.0,
            xp_efficiency: 1.00,
        }
    } else {
        CapacityTier {
            ceiling: 110.0,
            xp_efficiency: 1.10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn tier_table_values() {
        let low = resolve_ceiling(25.0);
        assert_eq!(low.ceiling, 70.0);
        assert_eq!(low.xp_efficiency, 0.70);

        let top = resolve_ceiling(80.0);
        assert_eq!(top.ceiling, 110.0);
        assert_eq!(top.xp_efficiency, 1.10);
    }

    #[test]
    fn tier_boundaries() {
        // Lower bounds inclusive, upper bounds exclusive
        assert_eq!(resolve_ceiling(29.9).ceiling, 70.0);
        assert_eq!(resolve_ceiling(30.0).ceiling, 85.0);
        assert_eq!(resolve_ceiling(59.9).ceiling, 85.0);
        assert_eq!(resolve_ceiling(60.0).ceiling, 100.0);
        assert_eq!(resolve_ceiling(79.9).ceiling, 100.0);
        assert_eq!(resolve_ceiling(80.0).ceiling, 110.0);
    }

    #[test]
    fn total_over_degenerate_scores() {
        assert_eq!(resolve_ceiling(-50.0).ceiling, 70.0);
        assert_eq!(resolve_ceiling(10_000.0).ceiling, 110.0);
    }

    proptest! {
        #[test]
        fn ceiling_monotonically_non_decreasing(a in -100.0f64..200.0, b in -100.0f64..200.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(resolve_ceiling(lo).ceiling <= resolve_ceiling(hi).ceiling);
        }

        #[test]
        fn efficiency_tracks_ceiling(c in -100.0f64..200.0) {
            let tier = resolve_ceiling(c);
            // Each ceiling pairs with exactly one efficiency
            let expected = match tier.ceiling as u32 {
                70 => 0.70,
                85 => 0.85,
                100 => 1.00,
                110 => 1.10,
                _ => unreachable!(),
            };
            prop_assert_eq!(tier.xp_efficiency, expected);
        }
    }
}
