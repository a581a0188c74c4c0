//! Dice notation averaging and the seeded d20 used by sampling.
//!
//! Damage fields are free text like `"2d6+3"`, `"1d8-1d4"` or a range such
//! as `"100-300"`. Only the statistical mean is ever needed, so parsing is
//! total: anything unreadable contributes zero instead of failing.

use std::sync::LazyLock;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use regex::Regex;

/// `<number>-<number>`, captured together with the character in front so a
/// die size (`1d8-2`) can be told apart from the low end of a range.
static RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(^|[^0-9.d])([0-9]+(?:\.[0-9]+)?)-([0-9]+(?:\.[0-9]+)?)").expect("valid regex")
});

/// One signed term of a dice sum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DiceTerm {
    /// `count` dice with `sides` faces each; `count` may be negative.
    Dice { count: i64, sides: f64 },
    Flat(f64),
}

impl DiceTerm {
    pub fn average(&self) -> f64 {
        match *self {
            DiceTerm::Dice { count, sides } => count as f64 * (sides + 1.0) / 2.0,
            DiceTerm::Flat(value) => value,
        }
    }
}

/// Parse a damage expression into its signed terms.
///
/// Terms that cannot contribute (a non-positive die size, a number that
/// does not parse) are dropped rather than reported.
pub fn parse_terms(text: &str) -> Vec<DiceTerm> {
    let normalized: String = text
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase();
    if normalized.is_empty() {
        return Vec::new();
    }

    let resolved = resolve_ranges(&normalized);
    split_signed(&resolved)
        .iter()
        .filter_map(|term| parse_term(term))
        .collect()
}

/// Statistical mean of a damage expression. Never fails; malformed input
/// degrades to a partial sum or zero.
pub fn evaluate_average(text: &str) -> f64 {
    parse_terms(text).iter().map(DiceTerm::average).sum()
}

/// Face count of the first die term, if the expression has one.
pub fn first_die_sides(text: &str) -> Option<f64> {
    parse_terms(text).into_iter().find_map(|term| match term {
        DiceTerm::Dice { sides, .. } => Some(sides),
        DiceTerm::Flat(_) => None,
    })
}

fn resolve_ranges(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for caps in RANGE.captures_iter(text) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        // `100-3d6` is a subtraction of dice, not a range.
        if text[whole.end()..].starts_with('d') {
            continue;
        }
        let low: f64 = caps[2].parse().unwrap_or(0.0);
        let high: f64 = caps[3].parse().unwrap_or(0.0);
        out.push_str(&text[last..whole.start()]);
        out.push_str(&caps[1]);
        out.push_str(&format_number((low + high) / 2.0));
        last = whole.end();
    }
    out.push_str(&text[last..]);
    out
}

/// Rewrite subtraction as addition of negative terms and split on `+`.
/// A minus directly after the die letter (`d-3`) stays part of its term.
fn split_signed(text: &str) -> Vec<String> {
    let mut summed = String::with_capacity(text.len() * 2);
    let mut prev = None;
    for c in text.chars() {
        if c == '-' && prev != Some('d') {
            summed.push('+');
        }
        summed.push(c);
        prev = Some(c);
    }
    summed
        .split('+')
        .filter(|term| !term.is_empty())
        .map(str::to_owned)
        .collect()
}

fn parse_term(term: &str) -> Option<DiceTerm> {
    match term.split_once('d') {
        Some((count, sides)) => {
            let count = match count {
                "" => 1,
                "-" => -1,
                other => other.parse::<i64>().unwrap_or(1),
            };
            let sides = finite(sides.parse::<f64>().ok())?;
            if sides <= 0.0 {
                return None;
            }
            Some(DiceTerm::Dice { count, sides })
        }
        None => finite(term.parse::<f64>().ok()).map(DiceTerm::Flat),
    }
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Seeded d20 source for Monte Carlo sampling.
pub struct Dice {
    rng: ChaCha8Rng,
}

impl Dice {
    pub fn from_seed(seed: u64) -> Self {
        Self { rng: ChaCha8Rng::seed_from_u64(seed) }
    }

    pub fn d20(&mut self) -> u8 {
        self.rng.gen_range(1..=20)
    }
}
