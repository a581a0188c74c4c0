//! Build profiles, the ordered set being compared, and field-path edits.

use std::collections::HashSet;
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::DamageComponent;
use crate::error::{EngineError, Result};
use crate::spell::{self, AdditionalScaling, SpellBreakdown, SpellBuildInputs, SpellDamageSource};
use crate::weapon::{self, DamageSourceRow, ScaledDiceRow, WeaponBreakdown, WeaponBuildInputs};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildKind {
    #[default]
    Weapon,
    Spell,
}

impl fmt::Display for BuildKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildKind::Weapon => write!(f, "weapon"),
            BuildKind::Spell => write!(f, "spell"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BuildInputs {
    Weapon(WeaponBuildInputs),
    Spell(SpellBuildInputs),
}

impl BuildInputs {
    pub fn new(kind: BuildKind) -> Self {
        match kind {
            BuildKind::Weapon => BuildInputs::Weapon(WeaponBuildInputs::default()),
            BuildKind::Spell => BuildInputs::Spell(SpellBuildInputs::default()),
        }
    }

    pub fn kind(&self) -> BuildKind {
        match self {
            BuildInputs::Weapon(_) => BuildKind::Weapon,
            BuildInputs::Spell(_) => BuildKind::Spell,
        }
    }

    pub fn compose(&self) -> BuildBreakdown {
        match self {
            BuildInputs::Weapon(inputs) => BuildBreakdown::Weapon(weapon::compose(inputs)),
            BuildInputs::Spell(inputs) => BuildBreakdown::Spell(spell::compose(inputs)),
        }
    }

    /// Every keyed collection holds unique positive keys, and a spell build
    /// keeps at least one power profile.
    pub fn validate_keys(&self) -> Result<()> {
        match self {
            BuildInputs::Weapon(w) => {
                unique_keys("damageSources", w.damage_sources.iter().map(|r| r.id))?;
                unique_keys("scaledDice", w.scaled_dice.iter().map(|r| r.id))
            }
            BuildInputs::Spell(s) => {
                if s.profiles.is_empty() {
                    return Err(EngineError::LastProfile);
                }
                unique_keys("profiles", s.profiles.iter().map(|p| p.id))?;
                unique_keys("sources", s.sources.iter().map(|r| r.id))?;
                for source in &s.sources {
                    unique_keys("additionalScalings", source.additional_scalings.iter().map(|r| r.id))?;
                }
                Ok(())
            }
        }
    }

    /// Repair what `validate_keys` rejects: missing, zero or repeated keys
    /// take the lowest free key, and an empty profile list gets profile 1.
    pub fn normalize_keys(&mut self) {
        match self {
            BuildInputs::Weapon(w) => {
                rekey("damageSources", &mut w.damage_sources, |r| &mut r.id);
                rekey("scaledDice", &mut w.scaled_dice, |r| &mut r.id);
            }
            BuildInputs::Spell(s) => {
                if s.profiles.is_empty() {
                    warn!("spell build had no power profiles; added profile 1");
                    s.profiles.push(spell::SpellPowerProfile::default());
                }
                rekey("profiles", &mut s.profiles, |p| &mut p.id);
                rekey("sources", &mut s.sources, |r| &mut r.id);
                for source in &mut s.sources {
                    rekey("additionalScalings", &mut source.additional_scalings, |r| &mut r.id);
                }
            }
        }
    }
}

fn unique_keys(collection: &str, keys: impl Iterator<Item = u32>) -> Result<()> {
    let mut seen = HashSet::new();
    for key in keys {
        if key == 0 {
            return Err(invalid(collection, "row keys must be positive"));
        }
        if !seen.insert(key) {
            return Err(invalid(collection, format!("duplicate row key {}", key)));
        }
    }
    Ok(())
}

fn rekey<T>(collection: &str, rows: &mut [T], key: impl Fn(&mut T) -> &mut u32) {
    let mut used = HashSet::new();
    let mut pending = Vec::new();
    for (idx, row) in rows.iter_mut().enumerate() {
        let k = *key(row);
        if k == 0 || !used.insert(k) {
            pending.push(idx);
        }
    }
    for idx in pending {
        let Some(fresh) = (1..=u32::MAX).find(|k| !used.contains(k)) else {
            break;
        };
        let slot = key(&mut rows[idx]);
        warn!(collection, from = *slot, to = fresh, "reassigned row key");
        *slot = fresh;
        used.insert(fresh);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BuildBreakdown {
    Weapon(WeaponBreakdown),
    Spell(SpellBreakdown),
}

impl BuildBreakdown {
    pub fn total(&self) -> f64 {
        match self {
            BuildBreakdown::Weapon(b) => b.total,
            BuildBreakdown::Spell(b) => b.total,
        }
    }

    pub fn components(&self) -> &[DamageComponent] {
        match self {
            BuildBreakdown::Weapon(b) => &b.components,
            BuildBreakdown::Spell(b) => &b.components,
        }
    }
}

/// One build as persisted and exported: `type`, `setId`, `tabName`, then
/// the inputs of that kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildProfile {
    #[serde(default)]
    pub set_id: u32,
    #[serde(default)]
    pub tab_name: String,
    #[serde(flatten)]
    pub inputs: BuildInputs,
    /// Last computed total; always recomputed after load.
    #[serde(default, skip_deserializing)]
    pub total_damage: f64,
}

impl BuildProfile {
    pub fn new(set_id: u32, kind: BuildKind) -> Self {
        let mut profile = Self {
            set_id,
            tab_name: format!("Build {}", set_id),
            inputs: BuildInputs::new(kind),
            total_damage: 0.0,
        };
        profile.recompute();
        profile
    }

    pub fn kind(&self) -> BuildKind {
        self.inputs.kind()
    }

    pub fn breakdown(&self) -> BuildBreakdown {
        self.inputs.compose()
    }

    /// Refresh the cached total from the current inputs.
    pub fn recompute(&mut self) -> BuildBreakdown {
        let breakdown = self.inputs.compose();
        self.total_damage = breakdown.total();
        debug!(set_id = self.set_id, total = self.total_damage, "recomputed build");
        breakdown
    }

    pub fn totals(&self) -> BuildTotals {
        let breakdown = self.breakdown();
        BuildTotals {
            set_id: self.set_id,
            tab_name: self.tab_name.clone(),
            kind: self.kind(),
            total: breakdown.total(),
            components: breakdown.components().to_vec(),
        }
    }
}

/// What an edit hands back to the host for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildTotals {
    pub set_id: u32,
    pub tab_name: String,
    pub kind: BuildKind,
    pub total: f64,
    pub components: Vec<DamageComponent>,
}

/// A keyed row collection inside a build's inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowCollection {
    DamageSources,
    ScaledDice,
    SpellSources,
    AdditionalScalings { source: u32 },
}

impl RowCollection {
    pub fn name(&self) -> &'static str {
        match self {
            RowCollection::DamageSources => "damageSources",
            RowCollection::ScaledDice => "scaledDice",
            RowCollection::SpellSources => "sources",
            RowCollection::AdditionalScalings { .. } => "additionalScalings",
        }
    }

    pub fn path(&self) -> String {
        match self {
            RowCollection::AdditionalScalings { source } => {
                format!("sources.{}.additionalScalings", source)
            }
            other => other.name().to_string(),
        }
    }

    pub fn kind(&self) -> BuildKind {
        match self {
            RowCollection::DamageSources | RowCollection::ScaledDice => BuildKind::Weapon,
            RowCollection::SpellSources | RowCollection::AdditionalScalings { .. } => {
                BuildKind::Spell
            }
        }
    }

    fn default_row(&self, id: u32) -> Result<Value> {
        let row = match self {
            RowCollection::DamageSources => {
                serde_json::to_value(DamageSourceRow { id, ..Default::default() })?
            }
            RowCollection::ScaledDice => {
                serde_json::to_value(ScaledDiceRow { id, ..Default::default() })?
            }
            RowCollection::SpellSources => serde_json::to_value(SpellDamageSource {
                id,
                name: format!("Source {}", id),
                ..Default::default()
            })?,
            RowCollection::AdditionalScalings { .. } => {
                serde_json::to_value(AdditionalScaling { id, ..Default::default() })?
            }
        };
        Ok(row)
    }

    /// Copy of `rows` with a default row appended under the next free key.
    pub fn with_row_added(&self, rows: &Value) -> Result<(u32, Value)> {
        let mut items = self.items(rows)?;
        let key = match items
            .iter()
            .filter_map(|item| item.get("id").and_then(Value::as_u64))
            .max()
        {
            None => 1,
            Some(max) => u32::try_from(max)
                .ok()
                .and_then(|m| m.checked_add(1))
                .ok_or_else(|| invalid(&self.path(), "no free row key"))?,
        };
        items.push(self.default_row(key)?);
        Ok((key, Value::Array(items)))
    }

    /// Copy of `rows` without the row stored under `key`.
    pub fn with_row_removed(&self, rows: &Value, key: u32) -> Result<Value> {
        let mut items = self.items(rows)?;
        let before = items.len();
        items.retain(|item| item.get("id").and_then(Value::as_u64) != Some(u64::from(key)));
        if items.len() == before {
            return Err(EngineError::UnknownRow { collection: self.name(), key });
        }
        Ok(Value::Array(items))
    }

    fn items(&self, rows: &Value) -> Result<Vec<Value>> {
        rows.as_array().cloned().ok_or_else(|| EngineError::InvalidField {
            path: self.path(),
            reason: "not a row collection".to_string(),
        })
    }
}

/// Walk a dot-separated path. Inside an array the segment is a row key
/// matched against each element's `id`, not a position.
fn locate<'a>(root: &'a mut Value, path: &str) -> Option<&'a mut Value> {
    let mut current = root;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get_mut(segment)?,
            Value::Array(items) => {
                let key: u64 = segment.parse().ok()?;
                items
                    .iter_mut()
                    .find(|item| item.get("id").and_then(Value::as_u64) == Some(key))?
            }
            _ => return None,
        };
    }
    Some(current)
}

fn invalid(path: &str, reason: impl Into<String>) -> EngineError {
    EngineError::InvalidField { path: path.to_string(), reason: reason.into() }
}

/// Builds under comparison, in display order, keyed by `set_id`.
#[derive(Debug, Clone)]
pub struct BuildSet {
    builds: IndexMap<u32, BuildProfile>,
    max_builds: u32,
}

impl BuildSet {
    pub fn new(max_builds: u32) -> Self {
        Self { builds: IndexMap::new(), max_builds: max_builds.max(1) }
    }

    pub fn max_builds(&self) -> u32 {
        self.max_builds
    }

    pub fn len(&self) -> usize {
        self.builds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.builds.is_empty()
    }

    pub fn get(&self, id: u32) -> Result<&BuildProfile> {
        self.builds.get(&id).ok_or(EngineError::UnknownBuild(id))
    }

    pub fn position(&self, id: u32) -> Option<usize> {
        self.builds.get_index_of(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &BuildProfile> {
        self.builds.values()
    }

    pub fn profiles(&self) -> Vec<BuildProfile> {
        self.builds.values().cloned().collect()
    }

    /// Lowest id in `1..=max_builds` not currently in use.
    pub fn next_id(&self) -> Option<u32> {
        (1..=self.max_builds).find(|id| !self.builds.contains_key(id))
    }

    pub fn add(&mut self, kind: BuildKind) -> Result<u32> {
        let id = self
            .next_id()
            .ok_or(EngineError::BuildLimit { max: self.max_builds })?;
        self.builds.insert(id, BuildProfile::new(id, kind));
        info!(set_id = id, %kind, "added build");
        Ok(id)
    }

    /// Put a previously removed build back at its old position.
    pub fn restore(&mut self, position: usize, mut profile: BuildProfile) -> Result<()> {
        let id = profile.set_id;
        if self.builds.contains_key(&id) {
            return Err(invalid("setId", format!("build {} already exists", id)));
        }
        if self.builds.len() as u32 >= self.max_builds {
            return Err(EngineError::BuildLimit { max: self.max_builds });
        }
        profile.recompute();
        let position = position.min(self.builds.len());
        self.builds.shift_insert(position, id, profile);
        info!(set_id = id, position, "restored build");
        Ok(())
    }

    /// Remove a build, returning its display position and last state.
    pub fn remove(&mut self, id: u32) -> Result<(usize, BuildProfile)> {
        if !self.builds.contains_key(&id) {
            return Err(EngineError::UnknownBuild(id));
        }
        if self.builds.len() == 1 {
            return Err(EngineError::LastBuild);
        }
        let (position, _, profile) = self
            .builds
            .shift_remove_full(&id)
            .ok_or(EngineError::UnknownBuild(id))?;
        info!(set_id = id, position, "removed build");
        Ok((position, profile))
    }

    /// Returns the previous name.
    pub fn rename(&mut self, id: u32, name: &str) -> Result<String> {
        let profile = self.builds.get_mut(&id).ok_or(EngineError::UnknownBuild(id))?;
        Ok(std::mem::replace(&mut profile.tab_name, name.to_string()))
    }

    pub fn field(&self, id: u32, path: &str) -> Result<Value> {
        let mut doc = serde_json::to_value(&self.get(id)?.inputs)?;
        locate(&mut doc, path)
            .map(|slot| slot.take())
            .ok_or_else(|| invalid(path, "no such field"))
    }

    /// Write one field, recompute, and return the value it replaced. A value
    /// the inputs cannot hold leaves the build unchanged.
    pub fn set_field(&mut self, id: u32, path: &str, value: Value) -> Result<Value> {
        if path.trim().is_empty() || path == "type" {
            return Err(invalid(path, "field cannot be edited"));
        }
        let profile = self.builds.get_mut(&id).ok_or(EngineError::UnknownBuild(id))?;
        let mut doc = serde_json::to_value(&profile.inputs)?;
        let slot = locate(&mut doc, path).ok_or_else(|| invalid(path, "no such field"))?;
        let old = std::mem::replace(slot, value);
        let inputs: BuildInputs =
            serde_json::from_value(doc).map_err(|e| invalid(path, e.to_string()))?;
        inputs.validate_keys()?;
        profile.inputs = inputs;
        profile.recompute();
        Ok(old)
    }

    /// Replace every build at once, e.g. after an import.
    pub fn replace_all(&mut self, profiles: Vec<BuildProfile>) {
        self.builds = profiles
            .into_iter()
            .map(|mut profile| {
                profile.recompute();
                (profile.set_id, profile)
            })
            .collect();
    }
}
