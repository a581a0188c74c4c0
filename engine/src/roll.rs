//! Outcome classes of a single d20 attack roll and their probabilities.

use serde::{Deserialize, Serialize};

pub const D20_FACES: u8 = 20;

/// Outcome class of one attack roll face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RollOutcome {
    Miss,
    Graze,
    Normal,
    /// Critical inside the threat range but below a natural 19.
    NormalCrit,
    /// Critical on a natural 19 or 20, which carries the extra multiplier.
    SpecialCrit,
}

impl RollOutcome {
    pub fn is_crit(self) -> bool {
        matches!(self, RollOutcome::NormalCrit | RollOutcome::SpecialCrit)
    }

    /// Normal hits and criticals; grazes and misses are not hits.
    pub fn is_hit(self) -> bool {
        matches!(self, RollOutcome::Normal) || self.is_crit()
    }

    pub fn label(self) -> &'static str {
        match self {
            RollOutcome::Miss => "miss",
            RollOutcome::Graze => "graze",
            RollOutcome::Normal => "hit",
            RollOutcome::NormalCrit => "crit",
            RollOutcome::SpecialCrit => "crit 19-20",
        }
    }
}

/// Roll thresholds that decide each face's outcome.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RollThresholds {
    /// Faces at or below this miss.
    pub miss_threshold: u8,
    /// Faces at or below this (and above the miss threshold) graze.
    pub graze_threshold: u8,
    /// How many of the top faces threaten a critical, 1..=20.
    pub threat_range: u8,
}

impl RollThresholds {
    pub fn new(miss_threshold: u8, graze_threshold: u8, threat_range: u8) -> Self {
        Self {
            miss_threshold: miss_threshold.max(1),
            graze_threshold,
            threat_range: threat_range.clamp(1, D20_FACES),
        }
    }

    pub fn crit_start(&self) -> u8 {
        D20_FACES + 1 - self.threat_range.clamp(1, D20_FACES)
    }

    /// Classify one face. Miss and graze take precedence over the threat
    /// range even when they overlap it.
    pub fn classify(&self, roll: u8) -> RollOutcome {
        let crit_start = self.crit_start();
        if roll <= self.miss_threshold.max(1) {
            RollOutcome::Miss
        } else if roll <= self.graze_threshold {
            RollOutcome::Graze
        } else if roll >= 19 && roll >= crit_start {
            RollOutcome::SpecialCrit
        } else if roll >= crit_start {
            RollOutcome::NormalCrit
        } else {
            RollOutcome::Normal
        }
    }

    pub fn probabilities(&self) -> OutcomeProbabilities {
        let mut counts = [0u32; 5];
        for roll in 1..=D20_FACES {
            let slot = match self.classify(roll) {
                RollOutcome::Miss => 0,
                RollOutcome::Graze => 1,
                RollOutcome::Normal => 2,
                RollOutcome::NormalCrit => 3,
                RollOutcome::SpecialCrit => 4,
            };
            counts[slot] += 1;
        }
        let p = |n: u32| n as f64 / D20_FACES as f64;
        OutcomeProbabilities {
            miss: p(counts[0]),
            graze: p(counts[1]),
            normal: p(counts[2]),
            normal_crit: p(counts[3]),
            special_crit: p(counts[4]),
        }
    }
}

/// Probability of each outcome class over a uniform d20.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OutcomeProbabilities {
    pub miss: f64,
    pub graze: f64,
    pub normal: f64,
    pub normal_crit: f64,
    pub special_crit: f64,
}

impl OutcomeProbabilities {
    pub fn crit(&self) -> f64 {
        self.normal_crit + self.special_crit
    }

    /// Probability of a normal hit or a critical.
    pub fn hit(&self) -> f64 {
        self.normal + self.crit()
    }

    pub fn of(&self, outcome: RollOutcome) -> f64 {
        match outcome {
            RollOutcome::Miss => self.miss,
            RollOutcome::Graze => self.graze,
            RollOutcome::Normal => self.normal,
            RollOutcome::NormalCrit => self.normal_crit,
            RollOutcome::SpecialCrit => self.special_crit,
        }
    }

    pub fn total(&self) -> f64 {
        self.miss + self.graze + self.normal + self.normal_crit + self.special_crit
    }
}
