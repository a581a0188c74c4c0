//! The editing session a host drives: builds, history and persistence.
//!
//! Every edit runs write, then recompute, then persist, so no stale total
//! is ever observable. Undo and redo replay records through the same edit
//! methods with recording and persistence held off until the replay ends.

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::build::{
    BuildBreakdown, BuildInputs, BuildKind, BuildProfile, BuildSet, BuildTotals, RowCollection,
};
use crate::compare::{ComparisonRow, rank};
use crate::config::SessionConfig;
use crate::error::{EngineError, Result};
use crate::export;
use crate::history::{ActionLog, ActionRecord, Direction};
use crate::spell::SpellBuildInputs;
use crate::store::Store;

pub struct Session<S: Store> {
    config: SessionConfig,
    builds: BuildSet,
    history: ActionLog,
    store: S,
}

impl<S: Store> Session<S> {
    /// Restore the stored build set, or start with one default build when
    /// nothing usable is stored.
    pub fn init(config: SessionConfig, store: S) -> Result<Self> {
        let mut builds = BuildSet::new(config.max_builds);
        match store.load(&config.storage_key) {
            Ok(Some(text)) => match export::parse_import(&text, config.max_builds) {
                Ok(profiles) => builds.replace_all(profiles),
                Err(e) => warn!(error = %e, "stored builds unreadable; starting fresh"),
            },
            Ok(None) => {}
            Err(e) => warn!(error = %e, "could not read stored builds; starting fresh"),
        }
        if builds.is_empty() {
            builds.add(config.default_kind)?;
        }
        info!(builds = builds.len(), key = %config.storage_key, "session started");
        Ok(Self {
            history: ActionLog::new(config.history_limit),
            config,
            builds,
            store,
        })
    }

    /// Persist one last time and hand the store back.
    pub fn teardown(mut self) -> Result<S> {
        self.persist()?;
        info!("session closed");
        Ok(self.store)
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn builds(&self) -> &BuildSet {
        &self.builds
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn totals(&self, build_id: u32) -> Result<BuildTotals> {
        Ok(self.builds.get(build_id)?.totals())
    }

    pub fn breakdown(&self, build_id: u32) -> Result<BuildBreakdown> {
        Ok(self.builds.get(build_id)?.breakdown())
    }

    pub fn rank(&self) -> Vec<ComparisonRow> {
        rank(self.builds.iter())
    }

    /// Apply one field edit and return the recomputed totals.
    pub fn on_edit(&mut self, build_id: u32, field_path: &str, value: Value) -> Result<BuildTotals> {
        let old_value = self.builds.set_field(build_id, field_path, value.clone())?;
        if old_value != value {
            self.history.record(ActionRecord::ValueChange {
                build_id,
                field_path: field_path.to_string(),
                old_value,
                new_value: value,
            });
        }
        self.persist()?;
        self.totals(build_id)
    }

    pub fn rename(&mut self, build_id: u32, name: &str) -> Result<()> {
        let old_name = self.builds.rename(build_id, name)?;
        if old_name != name {
            self.history.record(ActionRecord::Rename {
                build_id,
                old_name,
                new_name: name.to_string(),
            });
        }
        self.persist()
    }

    pub fn add_build(&mut self, kind: BuildKind) -> Result<u32> {
        let build_id = self.builds.add(kind).inspect_err(|e| warn!(error = %e, "add build rejected"))?;
        self.history.record(ActionRecord::AddBuild { build_id, kind });
        self.persist()?;
        Ok(build_id)
    }

    pub fn remove_build(&mut self, build_id: u32) -> Result<()> {
        let (position, snapshot) = self
            .builds
            .remove(build_id)
            .inspect_err(|e| warn!(error = %e, "remove build rejected"))?;
        self.history.record(ActionRecord::RemoveBuild {
            build_id,
            snapshot: Box::new(snapshot),
            position,
        });
        self.persist()
    }

    /// Append a default row to a keyed collection; returns the row's key.
    pub fn add_row(&mut self, build_id: u32, collection: RowCollection) -> Result<u32> {
        self.expect_kind(build_id, collection.kind())?;
        let path = collection.path();
        let current = self.builds.field(build_id, &path)?;
        let (key, rows) = collection.with_row_added(&current)?;
        self.on_edit(build_id, &path, rows)?;
        Ok(key)
    }

    pub fn remove_row(&mut self, build_id: u32, collection: RowCollection, key: u32) -> Result<()> {
        self.expect_kind(build_id, collection.kind())?;
        let path = collection.path();
        let current = self.builds.field(build_id, &path)?;
        let rows = collection.with_row_removed(&current, key)?;
        self.on_edit(build_id, &path, rows)?;
        Ok(())
    }

    pub fn add_spell_profile(&mut self, build_id: u32) -> Result<u32> {
        let mut inputs = self.spell_inputs(build_id)?.clone();
        let profile_id = inputs.add_profile();
        self.on_edit(build_id, "profiles", serde_json::to_value(&inputs.profiles)?)?;
        Ok(profile_id)
    }

    /// Remove a spell power profile; the last one is always kept.
    pub fn remove_spell_profile(&mut self, build_id: u32, profile_id: u32) -> Result<()> {
        let mut inputs = self.spell_inputs(build_id)?.clone();
        inputs
            .remove_profile(profile_id)
            .inspect_err(|e| warn!(error = %e, build_id, "remove profile rejected"))?;
        self.on_edit(build_id, "profiles", serde_json::to_value(&inputs.profiles)?)?;
        Ok(())
    }

    /// Returns false when there was nothing to undo.
    pub fn undo(&mut self) -> Result<bool> {
        self.replay(Direction::Undo)
    }

    /// Returns false when there was nothing to redo.
    pub fn redo(&mut self) -> Result<bool> {
        self.replay(Direction::Redo)
    }

    pub fn export_json(&self) -> Result<String> {
        export::to_json(&self.builds.profiles())
    }

    pub fn export_text(&self) -> String {
        export::text_summary(&self.builds.profiles())
    }

    /// Replace the whole build set. A malformed payload changes nothing.
    pub fn import_json(&mut self, text: &str) -> Result<usize> {
        let profiles = export::parse_import(text, self.config.max_builds)
            .inspect_err(|e| warn!(error = %e, "import rejected"))?;
        let count = profiles.len();
        self.builds.replace_all(profiles);
        self.history.clear();
        info!(builds = count, "imported builds");
        self.persist()?;
        Ok(count)
    }

    fn replay(&mut self, direction: Direction) -> Result<bool> {
        let Some(action) = self.history.begin(direction) else {
            return Ok(false);
        };
        debug!(?direction, action = %action.describe(), "replaying");
        match self.apply(&action, direction) {
            Ok(()) => {
                self.history.finish(direction, action);
                self.persist()?;
                Ok(true)
            }
            Err(e) => {
                warn!(error = %e, ?direction, "replay failed; history left unchanged");
                self.history.abort(direction, action);
                Err(e)
            }
        }
    }

    fn apply(&mut self, action: &ActionRecord, direction: Direction) -> Result<()> {
        let forward = direction == Direction::Redo;
        match action {
            ActionRecord::ValueChange { build_id, field_path, old_value, new_value } => {
                let value = if forward { new_value } else { old_value };
                self.on_edit(*build_id, field_path, value.clone())?;
            }
            ActionRecord::Rename { build_id, old_name, new_name } => {
                self.rename(*build_id, if forward { new_name } else { old_name })?;
            }
            ActionRecord::AddBuild { build_id, kind } => {
                if forward {
                    let profile = BuildProfile::new(*build_id, *kind);
                    self.builds.restore(usize::MAX, profile)?;
                } else {
                    self.remove_build(*build_id)?;
                }
            }
            ActionRecord::RemoveBuild { build_id, snapshot, position } => {
                if forward {
                    self.remove_build(*build_id)?;
                } else {
                    self.builds.restore(*position, snapshot.as_ref().clone())?;
                }
            }
        }
        Ok(())
    }

    fn expect_kind(&self, build_id: u32, expected: BuildKind) -> Result<()> {
        if self.builds.get(build_id)?.kind() == expected {
            Ok(())
        } else {
            Err(EngineError::WrongBuildKind { id: build_id, expected })
        }
    }

    fn spell_inputs(&self, build_id: u32) -> Result<&SpellBuildInputs> {
        match &self.builds.get(build_id)?.inputs {
            BuildInputs::Spell(inputs) => Ok(inputs),
            BuildInputs::Weapon(_) => Err(EngineError::WrongBuildKind {
                id: build_id,
                expected: BuildKind::Spell,
            }),
        }
    }

    /// Write the build set to the store. Skipped mid-replay; the replay
    /// persists once when it completes.
    fn persist(&mut self) -> Result<()> {
        if self.history.is_replaying() {
            return Ok(());
        }
        let payload = export::to_json(&self.builds.profiles())?;
        self.store.save(&self.config.storage_key, &payload)
    }
}
