//! Damage-per-hit modelling for character builds.
//!
//! Text damage expressions are averaged, attack rolls are split into
//! outcome classes, and the two build kinds (weapon and spell) are
//! composed into an expected value per attack or cast. A [`Session`]
//! keeps several builds side by side with undo/redo and persistence.

use serde::{Deserialize, Serialize};

pub mod build;
pub mod compare;
pub mod config;
pub mod content;
pub mod dice;
pub mod error;
pub mod export;
pub mod history;
mod lenient;
pub mod logging;
pub mod roll;
pub mod session;
pub mod simulate;
pub mod spell;
pub mod store;
pub mod weapon;

pub use build::{BuildBreakdown, BuildInputs, BuildKind, BuildProfile, BuildSet, BuildTotals, RowCollection};
pub use compare::{ComparisonRow, Standing, rank};
pub use config::SessionConfig;
pub use dice::{Dice, DiceTerm, evaluate_average};
pub use error::{EngineError, Result};
pub use history::{ActionLog, ActionRecord};
pub use roll::{OutcomeProbabilities, RollOutcome, RollThresholds};
pub use session::Session;
pub use spell::{SpellBuildInputs, SpellDamageSource, SpellPowerProfile};
pub use store::{FileStore, MemoryStore, Store};
pub use weapon::{DamageSourceRow, ScaledDiceRow, WeaponBuildInputs, reaper_multiplier};

/// A named slice of a build's expected damage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DamageComponent {
    pub name: String,
    pub expected: f64,
}

impl DamageComponent {
    pub fn new(name: impl Into<String>, expected: f64) -> Self {
        Self { name: name.into(), expected }
    }
}
