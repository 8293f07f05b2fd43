//! Health arithmetic and stage derivation.

use crate::core::types::{MAX_HEALTH, Stage};

/// Derive the growth stage from health. Total over all inputs.
pub fn stage_of(health: u32) -> Stage {
    match health {
        75.. => Stage::Bloom,
        50..=74 => Stage::Sapling,
        25..=49 => Stage::Seed,
        _ => Stage::Decay,
    }
}

/// Apply a signed delta, clamping the result into `[0, MAX_HEALTH]`.
pub fn apply_health_delta(health: u32, delta: i32) -> u32 {
    let next = i64::from(health) + i64::from(delta);
    next.clamp(0, i64::from(MAX_HEALTH)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::HEALTH_STEP;

    #[test]
    fn stage_boundaries_land_on_documented_side() {
        assert_eq!(stage_of(0), Stage::Decay);
        assert_eq!(stage_of(24), Stage::Decay);
        assert_eq!(stage_of(25), Stage::Seed);
        assert_eq!(stage_of(49), Stage::Seed);
        assert_eq!(stage_of(50), Stage::Sapling);
        assert_eq!(stage_of(74), Stage::Sapling);
        assert_eq!(stage_of(75), Stage::Bloom);
        assert_eq!(stage_of(100), Stage::Bloom);
    }

    #[test]
    fn stage_of_is_monotonic() {
        let rank = |stage: Stage| match stage {
            Stage::Decay => 0,
            Stage::Seed => 1,
            Stage::Sapling => 2,
            Stage::Bloom => 3,
        };
        for health in 0..MAX_HEALTH {
            assert!(rank(stage_of(health)) <= rank(stage_of(health + 1)));
        }
    }

    #[test]
    fn health_clamps_at_both_ends() {
        assert_eq!(apply_health_delta(50, HEALTH_STEP), 55);
        assert_eq!(apply_health_delta(98, HEALTH_STEP), 100);
        assert_eq!(apply_health_delta(3, -HEALTH_STEP), 0);
        assert_eq!(apply_health_delta(0, -HEALTH_STEP), 0);
    }

    #[test]
    fn health_stays_in_range_for_long_sequences() {
        for start in [0, 1, 49, 50, 99, 100] {
            let mut health = start;
            // deterministic pseudo-random walk biased by the start value
            for step in 0..500u32 {
                let positive = (step * 7 + start) % 3 != 0 || step % 11 == 0;
                let delta = if positive { HEALTH_STEP } else { -HEALTH_STEP };
                health = apply_health_delta(health, delta);
                assert!(health <= MAX_HEALTH);
            }
            for _ in 0..40 {
                health = apply_health_delta(health, -HEALTH_STEP);
            }
            assert_eq!(health, 0);
        }
    }
}
