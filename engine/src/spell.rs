//! Expected damage per cast for caster builds.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::DamageComponent;
use crate::dice::evaluate_average;
use crate::error::{EngineError, Result};
use crate::lenient;

pub const EMPOWER_SPELL_POWER: f64 = 75.0;
pub const INTENSIFY_SPELL_POWER: f64 = 75.0;
pub const MAXIMIZE_SPELL_POWER: f64 = 150.0;
pub const WELLSPRING_SPELL_POWER: f64 = 150.0;
pub const WELLSPRING_CRIT_DAMAGE: f64 = 0.20;
pub const NIGHT_HORRORS_CRIT_DAMAGE: f64 = 0.25;
/// Profile used for each source's own base and per-level dice.
pub const PRIMARY_PROFILE_ID: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SpellPowerProfile {
    pub id: u32,
    #[serde(deserialize_with = "lenient::number")]
    pub spell_power: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub crit_chance: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub crit_damage_bonus: f64,
    pub label: String,
}

impl Default for SpellPowerProfile {
    fn default() -> Self {
        Self {
            id: PRIMARY_PROFILE_ID,
            spell_power: 0.0,
            crit_chance: 0.0,
            crit_damage_bonus: 0.0,
            label: String::new(),
        }
    }
}

/// Extra dice on a source that scale with a different profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdditionalScaling {
    pub id: u32,
    pub base: String,
    pub per_caster_level: String,
    #[serde(deserialize_with = "lenient::count")]
    pub profile_id: u32,
}

impl Default for AdditionalScaling {
    fn default() -> Self {
        Self {
            id: 0,
            base: String::new(),
            per_caster_level: String::new(),
            profile_id: PRIMARY_PROFILE_ID,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SpellDamageSource {
    pub id: u32,
    pub name: String,
    pub base: String,
    pub per_caster_level: String,
    #[serde(deserialize_with = "lenient::count")]
    pub caster_level: u32,
    #[serde(deserialize_with = "lenient::count")]
    pub hit_count: u32,
    pub additional_scalings: Vec<AdditionalScaling>,
}

impl Default for SpellDamageSource {
    fn default() -> Self {
        Self {
            id: 0,
            name: String::new(),
            base: String::new(),
            per_caster_level: String::new(),
            caster_level: 0,
            hit_count: 1,
            additional_scalings: Vec::new(),
        }
    }
}

/// Metamagic feats and temporary boosts, each an independent toggle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SpellBoosts {
    pub empowered: bool,
    pub intensified: bool,
    pub maximized: bool,
    pub wellspring: bool,
    pub night_horrors: bool,
}

impl SpellBoosts {
    /// Flat spell power added on top of every profile.
    pub fn spell_power_bonus(&self) -> f64 {
        let on = |flag: bool, amount: f64| if flag { amount } else { 0.0 };
        on(self.empowered, EMPOWER_SPELL_POWER)
            + on(self.intensified, INTENSIFY_SPELL_POWER)
            + on(self.maximized, MAXIMIZE_SPELL_POWER)
            + on(self.wellspring, WELLSPRING_SPELL_POWER)
    }

    pub fn crit_damage_bonus(&self) -> f64 {
        let on = |flag: bool, amount: f64| if flag { amount } else { 0.0 };
        on(self.wellspring, WELLSPRING_CRIT_DAMAGE) + on(self.night_horrors, NIGHT_HORRORS_CRIT_DAMAGE)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SpellBuildInputs {
    pub sources: Vec<SpellDamageSource>,
    pub profiles: Vec<SpellPowerProfile>,
    pub boosts: SpellBoosts,
}

impl Default for SpellBuildInputs {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            profiles: vec![SpellPowerProfile::default()],
            boosts: SpellBoosts::default(),
        }
    }
}

impl SpellBuildInputs {
    /// Profile by id, falling back to the first profile when the id is gone.
    pub fn profile_or_first(&self, id: u32) -> SpellPowerProfile {
        if let Some(profile) = self.profiles.iter().find(|p| p.id == id) {
            return profile.clone();
        }
        if id != PRIMARY_PROFILE_ID {
            warn!(profile_id = id, "spell power profile missing; using first profile");
        }
        self.profiles.first().cloned().unwrap_or_default()
    }

    /// Append a profile under the lowest unused positive id.
    pub fn add_profile(&mut self) -> u32 {
        let id = (1..)
            .find(|candidate| self.profiles.iter().all(|p| p.id != *candidate))
            .unwrap_or(u32::MAX);
        self.profiles.push(SpellPowerProfile {
            id,
            label: format!("Profile {}", id),
            ..Default::default()
        });
        id
    }

    /// Remove a profile; the last remaining profile cannot be removed.
    pub fn remove_profile(&mut self, id: u32) -> Result<SpellPowerProfile> {
        let idx = self
            .profiles
            .iter()
            .position(|p| p.id == id)
            .ok_or(EngineError::UnknownProfile(id))?;
        if self.profiles.len() == 1 {
            return Err(EngineError::LastProfile);
        }
        Ok(self.profiles.remove(idx))
    }
}

/// Hit, crit and expected value of one scaling on one source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScalingBreakdown {
    pub profile_id: u32,
    pub spell_power: f64,
    pub hit: f64,
    pub crit: f64,
    pub expected: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceBreakdown {
    pub name: String,
    pub scalings: Vec<ScalingBreakdown>,
    pub per_hit: f64,
    pub hit_count: u32,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpellBreakdown {
    pub sources: Vec<SourceBreakdown>,
    pub components: Vec<DamageComponent>,
    pub total: f64,
}

fn scaling(
    base: &str,
    per_caster_level: &str,
    caster_level: u32,
    profile: &SpellPowerProfile,
    boosts: &SpellBoosts,
) -> ScalingBreakdown {
    let spell_power = profile.spell_power + boosts.spell_power_bonus();
    let dice = evaluate_average(base) + evaluate_average(per_caster_level) * f64::from(caster_level);
    let hit = dice * (1.0 + spell_power / 100.0);
    let crit = hit * (2.0 + profile.crit_damage_bonus + boosts.crit_damage_bonus());
    let crit_chance = profile.crit_chance.clamp(0.0, 1.0);
    ScalingBreakdown {
        profile_id: profile.id,
        spell_power,
        hit,
        crit,
        expected: hit * (1.0 - crit_chance) + crit * crit_chance,
    }
}

pub fn compose(inputs: &SpellBuildInputs) -> SpellBreakdown {
    let sources: Vec<SourceBreakdown> = inputs
        .sources
        .iter()
        .map(|source| {
            let primary = inputs.profile_or_first(PRIMARY_PROFILE_ID);
            let mut scalings = vec![scaling(
                &source.base,
                &source.per_caster_level,
                source.caster_level,
                &primary,
                &inputs.boosts,
            )];
            scalings.extend(source.additional_scalings.iter().map(|extra| {
                let profile = inputs.profile_or_first(extra.profile_id);
                scaling(
                    &extra.base,
                    &extra.per_caster_level,
                    source.caster_level,
                    &profile,
                    &inputs.boosts,
                )
            }));
            let per_hit: f64 = scalings.iter().map(|s| s.expected).sum();
            let hit_count = source.hit_count.max(1);
            SourceBreakdown {
                name: source.name.clone(),
                scalings,
                per_hit,
                hit_count,
                total: per_hit * f64::from(hit_count),
            }
        })
        .collect();

    let components = sources
        .iter()
        .enumerate()
        .map(|(idx, s)| {
            let name = if s.name.trim().is_empty() {
                format!("Source {}", idx + 1)
            } else {
                s.name.clone()
            };
            DamageComponent::new(name, s.total)
        })
        .collect();
    let total = sources.iter().map(|s| s.total).sum();

    SpellBreakdown { sources, components, total }
}
