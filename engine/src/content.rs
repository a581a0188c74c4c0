use std::collections::HashMap;

use anyhow::{Context, Result, anyhow};

use crate::build::BuildProfile;
use crate::config::DEFAULT_MAX_BUILDS;
use crate::export::parse_import;

pub fn builtin_builds() -> HashMap<&'static str, &'static str> {
    HashMap::from([
        (
            "repeater_rogue",
            include_str!("../content/builds/repeater_rogue.json"),
        ),
        (
            "twf_imbue",
            include_str!("../content/builds/twf_imbue.json"),
        ),
        (
            "fire_sorcerer",
            include_str!("../content/builds/fire_sorcerer.json"),
        ),
    ])
}

pub fn load_builtin(name: &str) -> Result<Vec<BuildProfile>> {
    let builds = builtin_builds();
    let text = builds
        .get(name)
        .ok_or_else(|| anyhow!("no built-in build named '{}'", name))?;
    parse_import(text, DEFAULT_MAX_BUILDS)
        .with_context(|| format!("built-in build '{}' is malformed", name))
}
