//! Scripted sessions: a YAML list of edits replayed through a `Session`.
//!
//! ```yaml
//! steps:
//!   - op: add
//!     kind: spell
//!   - op: edit
//!     build: 1
//!     path: meleePower
//!     value: 120
//!   - op: undo
//! ```

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use engine::{BuildKind, EngineError, RowCollection, Session, SessionConfig, Store};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::read_text_auto;

#[derive(Debug, Deserialize)]
struct Script {
    steps: Vec<Step>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    Add {
        #[serde(default)]
        kind: BuildKind,
    },
    Remove {
        build: u32,
    },
    Rename {
        build: u32,
        name: String,
    },
    Edit {
        build: u32,
        path: String,
        value: Value,
    },
    AddRow {
        build: u32,
        collection: String,
        source: Option<u32>,
    },
    RemoveRow {
        build: u32,
        collection: String,
        source: Option<u32>,
        key: u32,
    },
    AddProfile {
        build: u32,
    },
    RemoveProfile {
        build: u32,
        profile: u32,
    },
    Undo,
    Redo,
}

pub fn load(path: &Path) -> Result<Vec<Step>> {
    let text = read_text_auto(path).with_context(|| format!("failed to read script {}", path.display()))?;
    let script: Script = serde_yaml::from_str(&text)
        .with_context(|| format!("failed to parse script {}", path.display()))?;
    Ok(script.steps)
}

fn collection(name: &str, source: Option<u32>) -> Result<RowCollection> {
    match (name, source) {
        ("damageSources", _) => Ok(RowCollection::DamageSources),
        ("scaledDice", _) => Ok(RowCollection::ScaledDice),
        ("sources", _) => Ok(RowCollection::SpellSources),
        ("additionalScalings", Some(source)) => Ok(RowCollection::AdditionalScalings { source }),
        ("additionalScalings", None) => Err(anyhow!("additionalScalings needs a source key")),
        (other, _) => Err(anyhow!("unknown row collection '{}'", other)),
    }
}

/// Run every step, then return a log of the steps followed by the text
/// summary. Structural refusals (last build, build limit) are reported and
/// the script carries on; anything else stops it.
pub fn run<S: Store>(config: SessionConfig, store: S, steps: &[Step]) -> Result<String> {
    let mut session = Session::init(config, store)?;
    let mut out = String::new();
    info!(steps = steps.len(), "running script");

    for (idx, step) in steps.iter().enumerate() {
        let line = match apply(&mut session, step) {
            Ok(line) => line,
            Err(e) if e.is_structural() => format!("refused: {}", e),
            Err(e) => return Err(e).with_context(|| format!("step {} ({:?}) failed", idx + 1, step)),
        };
        let _ = writeln!(out, "{}. {}", idx + 1, line);
    }

    out.push('\n');
    out.push_str(&session.export_text());
    session.teardown()?;
    Ok(out)
}

fn apply<S: Store>(session: &mut Session<S>, step: &Step) -> Result<String, EngineError> {
    let line = match step {
        Step::Add { kind } => {
            let id = session.add_build(*kind)?;
            format!("added {} build {}", kind, id)
        }
        Step::Remove { build } => {
            session.remove_build(*build)?;
            format!("removed build {}", build)
        }
        Step::Rename { build, name } => {
            session.rename(*build, name)?;
            format!("renamed build {} to {}", build, name)
        }
        Step::Edit { build, path, value } => {
            let totals = session.on_edit(*build, path, value.clone())?;
            format!("set {} on build {}: total {:.2}", path, build, totals.total)
        }
        Step::AddRow { build, collection: name, source } => {
            let rows = collection(name, *source).map_err(|e| EngineError::InvalidField {
                path: name.clone(),
                reason: e.to_string(),
            })?;
            let key = session.add_row(*build, rows)?;
            format!("added row {} to {} on build {}", key, rows.path(), build)
        }
        Step::RemoveRow { build, collection: name, source, key } => {
            let rows = collection(name, *source).map_err(|e| EngineError::InvalidField {
                path: name.clone(),
                reason: e.to_string(),
            })?;
            session.remove_row(*build, rows, *key)?;
            format!("removed row {} from {} on build {}", key, rows.path(), build)
        }
        Step::AddProfile { build } => {
            let id = session.add_spell_profile(*build)?;
            format!("added profile {} to build {}", id, build)
        }
        Step::RemoveProfile { build, profile } => {
            session.remove_spell_profile(*build, *profile)?;
            format!("removed profile {} from build {}", profile, build)
        }
        Step::Undo => {
            if session.undo()? { "undo".to_string() } else { "undo: nothing to undo".to_string() }
        }
        Step::Redo => {
            if session.redo()? { "redo".to_string() } else { "redo: nothing to redo".to_string() }
        }
    };
    Ok(line)
}
