//! Side-by-side ranking of builds by expected damage.

use serde::Serialize;

use crate::build::{BuildKind, BuildProfile};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "standing", content = "percent", rename_all = "snake_case")]
pub enum Standing {
    Best,
    /// Percentage behind the best build; always negative or zero.
    Behind(f64),
    /// No build deals damage, so there is nothing to compare against.
    NotApplicable,
}

impl Standing {
    pub fn label(&self) -> String {
        match self {
            Standing::Best => "best".to_string(),
            Standing::Behind(pct) => format!("{:.1}%", pct),
            Standing::NotApplicable => "N/A".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonRow {
    pub set_id: u32,
    pub tab_name: String,
    pub kind: BuildKind,
    pub total: f64,
    pub standing: Standing,
}

/// Rank builds against the highest total, keeping their display order.
pub fn rank<'a>(profiles: impl IntoIterator<Item = &'a BuildProfile>) -> Vec<ComparisonRow> {
    let totals: Vec<(&BuildProfile, f64)> = profiles
        .into_iter()
        .map(|p| (p, p.breakdown().total()))
        .collect();
    let max = totals.iter().map(|(_, t)| *t).fold(None, |acc: Option<f64>, t| {
        Some(acc.map_or(t, |m| m.max(t)))
    });
    let max = max.unwrap_or(0.0);

    totals
        .into_iter()
        .map(|(profile, total)| {
            let standing = if max == 0.0 {
                Standing::NotApplicable
            } else if total == max && max > 0.0 {
                Standing::Best
            } else {
                Standing::Behind((total - max) / max * 100.0)
            };
            ComparisonRow {
                set_id: profile.set_id,
                tab_name: profile.tab_name.clone(),
                kind: profile.kind(),
                total,
                standing,
            }
        })
        .collect()
}
