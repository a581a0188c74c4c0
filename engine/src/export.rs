//! Export formats and import validation.
//!
//! Format 1 is the JSON array of build profiles that is also persisted.
//! Format 2 is a plain-text summary derived from the same builds.

use std::collections::HashSet;
use std::fmt::Write as _;

use serde_json::Value;
use tracing::warn;

use crate::build::{BuildBreakdown, BuildProfile};
use crate::compare::rank;
use crate::error::{EngineError, Result};

pub fn to_json(profiles: &[BuildProfile]) -> Result<String> {
    Ok(serde_json::to_string_pretty(profiles)?)
}

/// Parse an exported or persisted payload. Nothing is applied unless every
/// entry reads cleanly; ids that clash or fall outside `1..=max_builds`
/// are reassigned, as are missing or repeated row keys and profile ids.
pub fn parse_import(text: &str, max_builds: u32) -> Result<Vec<BuildProfile>> {
    let root: Value = serde_json::from_str(text)
        .map_err(|e| EngineError::MalformedImport(format!("not valid JSON: {}", e)))?;
    let Value::Array(entries) = root else {
        return Err(EngineError::MalformedImport("expected an array of builds".to_string()));
    };
    if entries.is_empty() {
        return Err(EngineError::MalformedImport("no builds in payload".to_string()));
    }
    if entries.len() > max_builds as usize {
        return Err(EngineError::MalformedImport(format!(
            "{} builds exceeds the limit of {}",
            entries.len(),
            max_builds
        )));
    }

    let mut profiles = entries
        .into_iter()
        .enumerate()
        .map(|(idx, entry)| {
            serde_json::from_value::<BuildProfile>(entry)
                .map_err(|e| EngineError::MalformedImport(format!("build {}: {}", idx + 1, e)))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut used = HashSet::new();
    let mut pending = Vec::new();
    for (idx, profile) in profiles.iter().enumerate() {
        if (1..=max_builds).contains(&profile.set_id) && used.insert(profile.set_id) {
            continue;
        }
        pending.push(idx);
    }
    for idx in pending {
        let fresh = (1..=max_builds)
            .find(|id| !used.contains(id))
            .ok_or_else(|| EngineError::MalformedImport("ran out of build ids".to_string()))?;
        warn!(from = profiles[idx].set_id, to = fresh, "reassigned imported build id");
        profiles[idx].set_id = fresh;
        used.insert(fresh);
    }

    for profile in &mut profiles {
        if profile.tab_name.trim().is_empty() {
            profile.tab_name = format!("Build {}", profile.set_id);
        }
        profile.inputs.normalize_keys();
        profile.recompute();
    }
    Ok(profiles)
}

/// Human-readable summary of every build and how it ranks.
pub fn text_summary(profiles: &[BuildProfile]) -> String {
    let ranking = rank(profiles);
    let mut out = String::new();
    for (profile, row) in profiles.iter().zip(&ranking) {
        let breakdown = profile.breakdown();
        let _ = writeln!(out, "== [{}] {} ({}) ==", profile.set_id, profile.tab_name, profile.kind());
        let _ = writeln!(out, "Expected damage: {:.2}", breakdown.total());
        match &breakdown {
            BuildBreakdown::Weapon(w) => {
                let _ = writeln!(
                    out,
                    "Odds: hit {:.1}% | crit {:.1}% | graze {:.1}% | miss {:.1}%",
                    w.odds.hit() * 100.0,
                    w.odds.crit() * 100.0,
                    w.odds.graze * 100.0,
                    w.odds.miss * 100.0
                );
            }
            BuildBreakdown::Spell(s) => {
                let _ = writeln!(out, "Sources: {}", s.sources.len());
            }
        }
        for component in breakdown.components() {
            let _ = writeln!(out, "  {}: {:.2}", component.name, component.expected);
        }
        let _ = writeln!(out, "Standing: {}", row.standing.label());
        out.push('\n');
    }
    out
}
