use engine::roll::{RollOutcome, RollThresholds};
use proptest::prelude::*;

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-12
}

#[test]
fn natural_twenty_only() {
    let p = RollThresholds::new(1, 0, 1).probabilities();
    assert!(close(p.miss, 0.05));
    assert!(close(p.normal, 0.9));
    assert!(close(p.special_crit, 0.05));
    assert_eq!(p.normal_crit, 0.0);
    assert_eq!(p.graze, 0.0);
    assert!(close(p.crit(), 0.05));
    assert!(close(p.hit(), 0.95));
}

#[test]
fn wide_threat_range_splits_crits() {
    // 15-20 threatens; 19 and 20 carry the bonus multiplier
    let t = RollThresholds::new(1, 0, 6);
    assert_eq!(t.crit_start(), 15);
    let p = t.probabilities();
    assert!(close(p.normal_crit, 0.2));
    assert!(close(p.special_crit, 0.1));
    assert!(close(p.normal, 0.65));
}

#[test]
fn thresholds_win_over_crit_range() {
    let t = RollThresholds::new(19, 20, 5);
    assert_eq!(t.classify(19), RollOutcome::Miss);
    assert_eq!(t.classify(20), RollOutcome::Graze);
    let p = t.probabilities();
    assert_eq!(p.crit(), 0.0);
    assert!(close(p.miss, 0.95));
}

#[test]
fn graze_band_sits_between_miss_and_hit() {
    let t = RollThresholds::new(2, 5, 1);
    assert_eq!(t.classify(2), RollOutcome::Miss);
    assert_eq!(t.classify(3), RollOutcome::Graze);
    assert_eq!(t.classify(5), RollOutcome::Graze);
    assert_eq!(t.classify(6), RollOutcome::Normal);
    assert!(close(t.probabilities().graze, 0.15));
}

#[test]
fn miss_threshold_is_at_least_one() {
    let t = RollThresholds::new(0, 0, 1);
    assert_eq!(t.classify(1), RollOutcome::Miss);
}

proptest! {
    #[test]
    fn outcome_buckets_sum_to_one(miss in 1u8..=20, graze in 0u8..=20, threat in 1u8..=20) {
        let p = RollThresholds::new(miss, graze, threat).probabilities();
        prop_assert!(close(p.total(), 1.0));
        prop_assert!(close(p.hit(), 1.0 - p.miss - p.graze));
    }
}
