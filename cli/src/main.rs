use clap::{Parser, Subcommand};
use encoding_rs::Encoding;
use engine::content::{builtin_builds, load_builtin};
use engine::export::{parse_import, text_summary};
use engine::roll::RollThresholds;
use engine::simulate::sample_weapon;
use engine::{BuildBreakdown, BuildInputs, BuildProfile, FileStore, MemoryStore, SessionConfig};
use std::{fs, path::Path, path::PathBuf};

mod script;

#[derive(Subcommand)]
enum Cmd {
    /// Average of a damage expression such as "2d6+1d4+3" or "3-5"
    Avg {
        /// Expression to evaluate
        expr: String,
    },
    /// Outcome odds over a d20 for the given thresholds
    Odds {
        /// Faces at or below this miss
        #[arg(long, default_value_t = 1)]
        miss: u8,
        /// Faces at or below this (above the miss threshold) graze
        #[arg(long, default_value_t = 0)]
        graze: u8,
        /// Number of top faces that threaten a critical
        #[arg(long, default_value_t = 1)]
        threat: u8,
    },
    /// Expected damage breakdown for every build in an export file
    Calc {
        /// Path to an exported builds JSON array
        #[arg(long)]
        file: PathBuf,
        /// Also print the per-face damage table for weapon builds
        #[arg(long, default_value_t = false)]
        table: bool,
        /// Print breakdowns as JSON instead of text
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Rank the builds in an export file against the best one
    Compare {
        #[arg(long)]
        file: PathBuf,
    },
    /// Plain-text summary of an export file
    Summary {
        #[arg(long)]
        file: PathBuf,
    },
    /// Monte Carlo cross-check of one weapon build
    Simulate {
        #[arg(long)]
        file: PathBuf,
        /// Build id to sample (defaults to the first build)
        #[arg(long)]
        build: Option<u32>,
        /// Number of attacks to roll
        #[arg(long, default_value_t = 10_000)]
        trials: u32,
        /// RNG seed for determinism
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
    /// Print a built-in build as an export payload
    Preset {
        /// Preset name; omit to list the available presets
        #[arg(long)]
        name: Option<String>,
        /// Pretty-print JSON
        #[arg(long, default_value_t = false)]
        pretty: bool,
    },
    /// Run a YAML script of edits through a session, with undo/redo
    Script {
        /// Path to the script YAML
        #[arg(long)]
        file: PathBuf,
        /// Persist builds in this directory (in-memory when omitted)
        #[arg(long)]
        store: Option<PathBuf>,
        /// Session config (YAML, or JSON by extension)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Override the config's build limit
        #[arg(long)]
        max_builds: Option<u32>,
    },
}

#[derive(Parser)]
#[command(name = "dmgcalc")]
#[command(about = "Expected damage calculator for weapon and spell builds")]
struct Cli {
    /// Log filter used when RUST_LOG is unset (e.g. warn, info, debug)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,
    #[command(subcommand)]
    cmd: Cmd,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    engine::logging::init_tracing(&cli.log_level);

    match cli.cmd {
        Cmd::Avg { expr } => {
            println!("{:.2}", engine::evaluate_average(&expr));
        }
        Cmd::Odds { miss, graze, threat } => {
            let thresholds = RollThresholds::new(miss, graze, threat);
            let odds = thresholds.probabilities();
            for roll in 1..=engine::roll::D20_FACES {
                println!("{:>2}: {}", roll, thresholds.classify(roll).label());
            }
            println!(
                "miss={:.2} graze={:.2} normal={:.2} crit={:.2} (19-20={:.2}) hit={:.2}",
                odds.miss,
                odds.graze,
                odds.normal,
                odds.crit(),
                odds.special_crit,
                odds.hit()
            );
        }
        Cmd::Calc { file, table, json } => {
            let builds = load_builds(&file)?;
            if json {
                let breakdowns: Vec<BuildBreakdown> = builds.iter().map(|b| b.breakdown()).collect();
                println!("{}", serde_json::to_string_pretty(&breakdowns)?);
            } else {
                for build in &builds {
                    print_breakdown(build, table);
                }
            }
        }
        Cmd::Compare { file } => {
            let builds = load_builds(&file)?;
            for row in engine::rank(&builds) {
                println!(
                    "[{}] {:<20} {:>6} {:>10.2} {}",
                    row.set_id,
                    row.tab_name,
                    row.kind.to_string(),
                    row.total,
                    row.standing.label()
                );
            }
        }
        Cmd::Summary { file } => {
            let builds = load_builds(&file)?;
            print!("{}", text_summary(&builds));
        }
        Cmd::Simulate { file, build, trials, seed } => {
            let builds = load_builds(&file)?;
            let chosen = match build {
                Some(id) => builds
                    .iter()
                    .find(|b| b.set_id == id)
                    .ok_or_else(|| anyhow::anyhow!("no build with id {} in {}", id, file.display()))?,
                None => builds
                    .first()
                    .ok_or_else(|| anyhow::anyhow!("no builds in {}", file.display()))?,
            };
            let BuildInputs::Weapon(inputs) = &chosen.inputs else {
                anyhow::bail!("build {} is a spell build; only weapon builds roll a d20", chosen.set_id);
            };
            let s = sample_weapon(inputs, trials, seed);
            println!("Build: [{}] {}", chosen.set_id, chosen.tab_name);
            println!("Trials: {}", s.trials);
            println!("Mean damage: {:.3}", s.mean_damage);
            println!("Expected damage: {:.3}", s.expected_damage);
            println!(
                "Rates: hit {:.3} | crit {:.3} | graze {:.3} | miss {:.3}",
                s.hit_rate, s.crit_rate, s.graze_rate, s.miss_rate
            );
        }
        Cmd::Preset { name, pretty } => match name {
            None => {
                let mut names: Vec<_> = builtin_builds().into_keys().collect();
                names.sort_unstable();
                for name in names {
                    println!("{}", name);
                }
            }
            Some(name) => {
                let builds = load_builtin(&name)?;
                if pretty {
                    println!("{}", serde_json::to_string_pretty(&builds)?);
                } else {
                    println!("{}", serde_json::to_string(&builds)?);
                }
            }
        },
        Cmd::Script { file, store, config, max_builds } => {
            let mut cfg = match config {
                Some(path) => SessionConfig::load(&path)?,
                None => SessionConfig::default(),
            };
            if let Some(max) = max_builds {
                anyhow::ensure!(max >= 1, "--max-builds must be at least 1");
                cfg.max_builds = max;
            }
            let steps = script::load(&file)?;
            let summary = match store {
                Some(dir) => script::run(cfg, FileStore::new(dir), &steps)?,
                None => script::run(cfg, MemoryStore::new(), &steps)?,
            };
            print!("{}", summary);
        }
    }
    Ok(())
}

fn print_breakdown(build: &BuildProfile, table: bool) {
    let breakdown = build.breakdown();
    println!("[{}] {} ({})", build.set_id, build.tab_name, build.kind());
    for component in breakdown.components() {
        println!("  {:<14} {:>10.3}", component.name, component.expected);
    }
    println!("  {:<14} {:>10.3}", "Total", breakdown.total());
    if let BuildBreakdown::Weapon(w) = &breakdown {
        println!(
            "  multi-strike x{:.3}, reaper x{:.3}",
            w.multi_strike_multiplier, w.reaper_multiplier
        );
        if table {
            for row in &w.roll_table {
                println!("  {:>2} {:<12} {:>10.3}", row.roll, row.outcome.label(), row.damage);
            }
        }
    }
}

pub(crate) fn read_text_auto(path: &Path) -> anyhow::Result<String> {
    let bytes = fs::read(path)?;
    if let Some((enc, bom_len)) = Encoding::for_bom(&bytes) {
        let (cow, _, _) = enc.decode(&bytes[bom_len..]);
        Ok(cow.into_owned())
    } else {
        Ok(String::from_utf8(bytes)?)
    }
}

fn load_builds(path: &Path) -> anyhow::Result<Vec<BuildProfile>> {
    use anyhow::Context;
    let text = read_text_auto(path).with_context(|| format!("failed to read {}", path.display()))?;
    // Files on disk may hold more than one session's worth of builds.
    parse_import(&text, u32::MAX).with_context(|| format!("failed to parse {}", path.display()))
}
