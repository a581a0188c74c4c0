//! Monte Carlo cross-check of the analytic weapon expectation.

use serde::Serialize;

use crate::dice::Dice;
use crate::roll::RollOutcome;
use crate::weapon::{self, WeaponBuildInputs};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleSummary {
    pub trials: u32,
    pub mean_damage: f64,
    pub expected_damage: f64,
    pub hit_rate: f64,
    pub crit_rate: f64,
    pub graze_rate: f64,
    pub miss_rate: f64,
}

/// Roll `trials` attacks with a seeded d20 and average the per-face damage.
pub fn sample_weapon(inputs: &WeaponBuildInputs, trials: u32, seed: u64) -> SampleSummary {
    let breakdown = weapon::compose(inputs);
    let mut dice = Dice::from_seed(seed);

    let mut damage = 0.0;
    let (mut hits, mut crits, mut grazes, mut misses) = (0u32, 0u32, 0u32, 0u32);
    for _ in 0..trials {
        let face = dice.d20();
        let row = &breakdown.roll_table[usize::from(face) - 1];
        damage += row.damage;
        match row.outcome {
            RollOutcome::Miss => misses += 1,
            RollOutcome::Graze => grazes += 1,
            outcome => {
                hits += 1;
                if outcome.is_crit() {
                    crits += 1;
                }
            }
        }
    }

    let rate = |n: u32| if trials == 0 { 0.0 } else { f64::from(n) / f64::from(trials) };
    SampleSummary {
        trials,
        mean_damage: if trials == 0 { 0.0 } else { damage / f64::from(trials) },
        expected_damage: breakdown.total,
        hit_rate: rate(hits),
        crit_rate: rate(crits),
        graze_rate: rate(grazes),
        miss_rate: rate(misses),
    }
}
