//! Linear undo/redo history of build edits.
//!
//! The log only stores records; the owner of the build set applies them.
//! While a record is being replayed the log refuses new records, so the
//! mutations a replay performs never land on either stack.

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::build::{BuildKind, BuildProfile};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ActionRecord {
    ValueChange {
        build_id: u32,
        field_path: String,
        old_value: Value,
        new_value: Value,
    },
    Rename {
        build_id: u32,
        old_name: String,
        new_name: String,
    },
    AddBuild {
        build_id: u32,
        kind: BuildKind,
    },
    RemoveBuild {
        build_id: u32,
        snapshot: Box<BuildProfile>,
        position: usize,
    },
}

impl ActionRecord {
    pub fn build_id(&self) -> u32 {
        match self {
            ActionRecord::ValueChange { build_id, .. }
            | ActionRecord::Rename { build_id, .. }
            | ActionRecord::AddBuild { build_id, .. }
            | ActionRecord::RemoveBuild { build_id, .. } => *build_id,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            ActionRecord::ValueChange { build_id, field_path, .. } => {
                format!("edit {} on build {}", field_path, build_id)
            }
            ActionRecord::Rename { build_id, new_name, .. } => {
                format!("rename build {} to {}", build_id, new_name)
            }
            ActionRecord::AddBuild { build_id, .. } => format!("add build {}", build_id),
            ActionRecord::RemoveBuild { build_id, .. } => format!("remove build {}", build_id),
        }
    }
}

/// Which way a replayed record is being applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Undo,
    Redo,
}

#[derive(Debug, Default)]
pub struct ActionLog {
    undo: Vec<ActionRecord>,
    redo: Vec<ActionRecord>,
    replaying: bool,
    limit: Option<usize>,
}

impl ActionLog {
    pub fn new(limit: Option<usize>) -> Self {
        Self { limit, ..Default::default() }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    pub fn is_replaying(&self) -> bool {
        self.replaying
    }

    /// Push a manual edit and drop the redo branch. Ignored during replay.
    pub fn record(&mut self, action: ActionRecord) {
        if self.replaying {
            debug!(action = %action.describe(), "suppressed record during replay");
            return;
        }
        debug!(action = %action.describe(), "recorded");
        self.undo.push(action);
        self.redo.clear();
        if let Some(limit) = self.limit {
            if self.undo.len() > limit {
                let excess = self.undo.len() - limit;
                self.undo.drain(..excess);
            }
        }
    }

    /// Take the record to replay and enter replay mode.
    pub fn begin(&mut self, direction: Direction) -> Option<ActionRecord> {
        let action = match direction {
            Direction::Undo => self.undo.pop(),
            Direction::Redo => self.redo.pop(),
        }?;
        self.replaying = true;
        Some(action)
    }

    /// Leave replay mode, moving the record to the opposite stack.
    pub fn finish(&mut self, direction: Direction, action: ActionRecord) {
        self.replaying = false;
        match direction {
            Direction::Undo => self.redo.push(action),
            Direction::Redo => self.undo.push(action),
        }
    }

    /// Leave replay mode after a failed replay, putting the record back.
    pub fn abort(&mut self, direction: Direction, action: ActionRecord) {
        self.replaying = false;
        match direction {
            Direction::Undo => self.undo.push(action),
            Direction::Redo => self.redo.push(action),
        }
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
        self.replaying = false;
    }
}
