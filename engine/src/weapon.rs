//! Expected damage per attack for melee and ranged builds.

use serde::{Deserialize, Serialize};

use crate::dice::{evaluate_average, first_die_sides};
use crate::lenient;
use crate::roll::{D20_FACES, OutcomeProbabilities, RollOutcome, RollThresholds};
use crate::DamageComponent;

/// Mean of one sneak attack die; sneak dice are always d6.
pub const SNEAK_DIE_AVERAGE: f64 = 3.5;
/// Every full seven imbue dice add one die to imbue-scaled rows.
pub const IMBUE_DICE_PER_BONUS_DIE: u32 = 7;
pub const MAX_REAPER_SKULLS: u8 = 10;

/// An extra damage source layered on each attack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DamageSourceRow {
    pub id: u32,
    pub damage: String,
    #[serde(deserialize_with = "lenient::number")]
    pub proc_chance: f64,
    pub applies_on_multi_strike: bool,
    pub on_crit_only: bool,
}

impl Default for DamageSourceRow {
    fn default() -> Self {
        Self {
            id: 0,
            damage: String::new(),
            proc_chance: 1.0,
            applies_on_multi_strike: false,
            on_crit_only: false,
        }
    }
}

/// Dice that scale with melee power and optionally with the imbue count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScaledDiceRow {
    pub id: u32,
    pub base_dice: String,
    #[serde(deserialize_with = "lenient::number")]
    pub proc_chance: f64,
    pub scales_with_imbue_count: bool,
    /// Share of melee power applied, as a ratio (1.0 is full scaling).
    #[serde(deserialize_with = "lenient::number")]
    pub scaling: f64,
    pub enabled: bool,
}

impl Default for ScaledDiceRow {
    fn default() -> Self {
        Self {
            id: 0,
            base_dice: String::new(),
            proc_chance: 1.0,
            scales_with_imbue_count: false,
            scaling: 1.0,
            enabled: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WeaponBuildInputs {
    pub base_dice: String,
    /// Extra multiples of the weapon dice, e.g. 0.5 for +0.5[W].
    #[serde(deserialize_with = "lenient::number")]
    pub weapon_dice_bonus: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub bonus_damage: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub melee_power: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub spell_power: f64,
    #[serde(deserialize_with = "lenient::small")]
    pub threat_range: u8,
    #[serde(deserialize_with = "lenient::number")]
    pub crit_multiplier: f64,
    /// Added to `crit_multiplier` on a natural 19 or 20.
    #[serde(deserialize_with = "lenient::number")]
    pub crit_multiplier_19_20: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub seeker: f64,
    #[serde(deserialize_with = "lenient::count")]
    pub sneak_dice: u32,
    #[serde(deserialize_with = "lenient::number")]
    pub sneak_bonus: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub multi_strike_percent: f64,
    /// Doubleshot may exceed a 100% repeat chance.
    pub doubleshot: bool,
    #[serde(deserialize_with = "lenient::small")]
    pub miss_threshold: u8,
    #[serde(deserialize_with = "lenient::small")]
    pub graze_threshold: u8,
    #[serde(deserialize_with = "lenient::number")]
    pub graze_percent: f64,
    #[serde(deserialize_with = "lenient::small")]
    pub reaper_skulls: u8,
    #[serde(deserialize_with = "lenient::count")]
    pub imbue_dice: u32,
    #[serde(deserialize_with = "lenient::number")]
    pub imbue_die_size: f64,
    /// Share of the chosen power applied, as a ratio (1.0 is full scaling).
    #[serde(deserialize_with = "lenient::number")]
    pub imbue_scaling: f64,
    pub imbue_uses_spell_power: bool,
    pub imbue_can_crit: bool,
    pub damage_sources: Vec<DamageSourceRow>,
    pub scaled_dice: Vec<ScaledDiceRow>,
}

impl Default for WeaponBuildInputs {
    fn default() -> Self {
        Self {
            base_dice: "1d8".to_string(),
            weapon_dice_bonus: 0.0,
            bonus_damage: 0.0,
            melee_power: 0.0,
            spell_power: 0.0,
            threat_range: 1,
            crit_multiplier: 2.0,
            crit_multiplier_19_20: 0.0,
            seeker: 0.0,
            sneak_dice: 0,
            sneak_bonus: 0.0,
            multi_strike_percent: 0.0,
            doubleshot: false,
            miss_threshold: 1,
            graze_threshold: 0,
            graze_percent: 0.0,
            reaper_skulls: 0,
            imbue_dice: 0,
            imbue_die_size: 6.0,
            imbue_scaling: 1.0,
            imbue_uses_spell_power: false,
            imbue_can_crit: false,
            damage_sources: Vec::new(),
            scaled_dice: Vec::new(),
        }
    }
}

impl WeaponBuildInputs {
    pub fn thresholds(&self) -> RollThresholds {
        RollThresholds::new(self.miss_threshold, self.graze_threshold, self.threat_range)
    }

    /// Chance of an extra strike as a ratio; capped at 1 unless doubleshot.
    pub fn multi_strike_chance(&self) -> f64 {
        let chance = (self.multi_strike_percent / 100.0).max(0.0);
        if self.doubleshot { chance } else { chance.min(1.0) }
    }
}

/// Damage each source deals on a single landed roll, before odds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WeaponPortions {
    pub weapon: f64,
    pub seeker: f64,
    pub sneak: f64,
    pub imbue: f64,
    pub scaled_dice: f64,
}

/// Unscaled rows summed per multi-strike and crit-only bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RowBuckets {
    pub strike_on_crit: f64,
    pub strike_on_hit: f64,
    pub on_crit: f64,
    pub on_hit: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RollRow {
    pub roll: u8,
    pub outcome: RollOutcome,
    pub damage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeaponBreakdown {
    pub odds: OutcomeProbabilities,
    pub portions: WeaponPortions,
    pub rows: RowBuckets,
    pub multi_strike_multiplier: f64,
    pub reaper_multiplier: f64,
    pub components: Vec<DamageComponent>,
    pub total: f64,
    pub roll_table: Vec<RollRow>,
}

/// Damage reduction from reaper difficulty. Both branches are kept as-is,
/// including the step between 6 and 7 skulls.
pub fn reaper_multiplier(skulls: u8) -> f64 {
    let s = f64::from(skulls.min(MAX_REAPER_SKULLS));
    match skulls.min(MAX_REAPER_SKULLS) {
        0 => 1.0,
        1..=6 => 20.0 / (s * s + s + 24.0),
        _ => 5.0 / (4.0 * s - 8.0),
    }
}

pub fn portions(inputs: &WeaponBuildInputs) -> WeaponPortions {
    let melee = inputs.melee_power / 100.0;

    let base = evaluate_average(&inputs.base_dice) * (1.0 + inputs.weapon_dice_bonus)
        + inputs.bonus_damage;
    let sneak = (f64::from(inputs.sneak_dice) * SNEAK_DIE_AVERAGE + inputs.sneak_bonus)
        * (1.0 + 1.5 * melee);

    WeaponPortions {
        weapon: base * (1.0 + melee),
        seeker: inputs.seeker * (1.0 + melee),
        sneak,
        imbue: imbue_portion(inputs),
        scaled_dice: scaled_dice_portion(inputs),
    }
}

fn imbue_portion(inputs: &WeaponBuildInputs) -> f64 {
    // One implicit die rides along once any imbue dice are present.
    let dice = if inputs.imbue_dice > 0 { inputs.imbue_dice.saturating_add(1) } else { 0 };
    let average = f64::from(dice) * (inputs.imbue_die_size + 1.0) / 2.0;
    let power = if inputs.imbue_uses_spell_power {
        inputs.spell_power
    } else {
        inputs.melee_power
    };
    average * (1.0 + power * inputs.imbue_scaling / 100.0)
}

fn scaled_dice_portion(inputs: &WeaponBuildInputs) -> f64 {
    let bonus_dice = inputs.imbue_dice / IMBUE_DICE_PER_BONUS_DIE;
    inputs
        .scaled_dice
        .iter()
        .filter(|row| row.enabled)
        .map(|row| {
            let base = evaluate_average(&row.base_dice);
            let bonus = match first_die_sides(&row.base_dice) {
                Some(sides) if row.scales_with_imbue_count => {
                    f64::from(bonus_dice) * (sides + 1.0) / 2.0
                }
                _ => 0.0,
            };
            (base + bonus)
                * (1.0 + inputs.melee_power * row.scaling / 100.0)
                * row.proc_chance.clamp(0.0, 1.0)
        })
        .sum()
}

pub fn row_buckets(rows: &[DamageSourceRow]) -> RowBuckets {
    rows.iter().fold(RowBuckets::default(), |mut acc, row| {
        let value = evaluate_average(&row.damage) * row.proc_chance.clamp(0.0, 1.0);
        match (row.applies_on_multi_strike, row.on_crit_only) {
            (true, true) => acc.strike_on_crit += value,
            (true, false) => acc.strike_on_hit += value,
            (false, true) => acc.on_crit += value,
            (false, false) => acc.on_hit += value,
        }
        acc
    })
}

struct Multipliers {
    base_crit: f64,
    crit_19_20: f64,
    graze: f64,
    multi_strike: f64,
    strike_chance: f64,
    reaper: f64,
}

impl Multipliers {
    fn of(inputs: &WeaponBuildInputs) -> Self {
        let strike_chance = inputs.multi_strike_chance();
        Self {
            base_crit: inputs.crit_multiplier,
            crit_19_20: inputs.crit_multiplier_19_20,
            graze: inputs.graze_percent / 100.0,
            multi_strike: 1.0 + strike_chance,
            strike_chance,
            reaper: reaper_multiplier(inputs.reaper_skulls),
        }
    }
}

/// Full expected-damage breakdown for a weapon build.
pub fn compose(inputs: &WeaponBuildInputs) -> WeaponBreakdown {
    let thresholds = inputs.thresholds();
    let odds = thresholds.probabilities();
    let portions = portions(inputs);
    let rows = row_buckets(&inputs.damage_sources);
    let m = Multipliers::of(inputs);

    let crit_hit = portions.weapon + portions.seeker;
    let base_hit = odds.special_crit * crit_hit * (m.base_crit + m.crit_19_20)
        + odds.normal_crit * crit_hit * m.base_crit
        + odds.normal * portions.weapon
        + odds.graze * portions.weapon * m.graze;
    let sneak = portions.sneak * (1.0 - odds.miss);
    let imbue_odds = odds.hit() + if inputs.imbue_can_crit { odds.crit() } else { 0.0 };
    let imbue = portions.imbue * imbue_odds;
    let extra = (rows.strike_on_crit * (1.0 + m.strike_chance) + rows.on_crit) * odds.crit()
        + (rows.strike_on_hit * (1.0 + m.strike_chance) + rows.on_hit) * odds.hit();
    let scaled = portions.scaled_dice * odds.hit();

    // Extra-damage rows carry their own multi-strike weighting.
    let global = m.multi_strike * m.reaper;
    let components = vec![
        DamageComponent::new("Base hit", base_hit * global),
        DamageComponent::new("Sneak attack", sneak * global),
        DamageComponent::new("Imbue", imbue * global),
        DamageComponent::new("Extra damage", extra * m.reaper),
        DamageComponent::new("Scaled dice", scaled * global),
    ];
    let total = components.iter().map(|c| c.expected).sum();

    let roll_table = (1..=D20_FACES)
        .map(|roll| {
            let outcome = thresholds.classify(roll);
            RollRow { roll, outcome, damage: face_damage(outcome, inputs, &portions, &rows, &m) }
        })
        .collect();

    WeaponBreakdown {
        odds,
        portions,
        rows,
        multi_strike_multiplier: m.multi_strike,
        reaper_multiplier: m.reaper,
        components,
        total,
        roll_table,
    }
}

/// Damage dealt when the die shows a face of the given outcome.
fn face_damage(
    outcome: RollOutcome,
    inputs: &WeaponBuildInputs,
    portions: &WeaponPortions,
    rows: &RowBuckets,
    m: &Multipliers,
) -> f64 {
    let crit_hit = portions.weapon + portions.seeker;
    let base = match outcome {
        RollOutcome::Miss => 0.0,
        RollOutcome::Graze => portions.weapon * m.graze,
        RollOutcome::Normal => portions.weapon,
        RollOutcome::NormalCrit => crit_hit * m.base_crit,
        RollOutcome::SpecialCrit => crit_hit * (m.base_crit + m.crit_19_20),
    };
    let sneak = if outcome == RollOutcome::Miss { 0.0 } else { portions.sneak };

    let mut imbue = 0.0;
    let mut extra = 0.0;
    let mut scaled = 0.0;
    if outcome.is_hit() {
        imbue += portions.imbue;
        extra += rows.strike_on_hit * (1.0 + m.strike_chance) + rows.on_hit;
        scaled += portions.scaled_dice;
    }
    if outcome.is_crit() {
        if inputs.imbue_can_crit {
            imbue += portions.imbue;
        }
        extra += rows.strike_on_crit * (1.0 + m.strike_chance) + rows.on_crit;
    }

    (base + sneak + imbue + scaled) * m.multi_strike * m.reaper + extra * m.reaper
}
