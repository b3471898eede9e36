//! # Count Inference
//!
//! Reports give a linear feature's segment count inconsistently: as a
//! parenthetical after the length (`Ridges = 120 ft (4 Ridges)`), as a
//! number before the label (`4 Ridges`), or in parentheses between label and
//! length (`Ridges (4) = 120 ft`). Each form is an independent [`CountRule`];
//! they are tried in [`CountRule::ORDER`] and the first accepted count wins.
//!
//! A candidate is accepted only when it lies in `1..=99`. Larger numbers are
//! almost always areas or percentages sitting nearby, so they are rejected
//! and the next rule is tried. When nothing is accepted the count is `1`.
//!
//! ```rust
//! use takeoff_core::extraction::counts::{infer_count, CountRule};
//!
//! let found = infer_count("Ridges = 120 ft (4 Ridges)", "Ridge", 120.0);
//! assert_eq!((found.count, found.rule), (4, CountRule::TrailingParenthetical));
//!
//! let default = infer_count("Ridges = 120 ft", "Ridge", 120.0);
//! assert_eq!((default.count, default.rule), (1, CountRule::Default));
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::measurements::MAX_SEGMENT_COUNT;

/// Maximum label-to-length distance for the trailing-parenthetical rule
const SHORT_GAP: usize = 24;
/// Maximum gap between a unit suffix and its parenthetical
const PAREN_GAP: usize = 8;
/// How far past a label the wide rule looks for the length (never past the line end)
const WIDE_WINDOW: usize = 160;

static PARENTHETICAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(\s*(\d+)\b[^()]*\)").expect("valid parenthetical pattern"));

static STEP_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bStep[\s-]*$").expect("valid step prefix pattern"));

/// Where a count came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountRule {
    /// `<label> ... <length> (<n>)`
    TrailingParenthetical,
    /// `<n> <label>`
    LeadingInteger,
    /// `<label> (<n>) ... <length>`
    ParentheticalBeforeLength,
    /// Nothing matched; one segment assumed
    Default,
}

impl CountRule {
    /// Matching rules in priority order
    pub const ORDER: [CountRule; 3] = [
        CountRule::TrailingParenthetical,
        CountRule::LeadingInteger,
        CountRule::ParentheticalBeforeLength,
    ];

    /// Run this rule alone. `Default` always yields 1.
    pub fn apply(&self, query: &CountQuery<'_>) -> Option<u32> {
        match self {
            CountRule::TrailingParenthetical => trailing_parenthetical(query),
            CountRule::LeadingInteger => leading_integer(query),
            CountRule::ParentheticalBeforeLength => parenthetical_before_length(query),
            CountRule::Default => Some(1),
        }
    }
}

/// A count together with the rule that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountInference {
    pub count: u32,
    pub rule: CountRule,
}

/// What the rules search for.
#[derive(Debug, Clone)]
pub struct CountQuery<'t> {
    pub text: &'t str,
    /// Label stem, e.g. `Ridge` (plural suffixes are tolerated)
    pub label: &'t str,
    /// The length already extracted for this feature, in feet
    pub length: f64,
}

/// Infer how many segments make up a feature's total length.
pub fn infer_count(text: &str, label: &str, length: f64) -> CountInference {
    let query = CountQuery { text, label, length };
    CountRule::ORDER
        .iter()
        .find_map(|rule| rule.apply(&query).map(|count| CountInference { count, rule: *rule }))
        .unwrap_or(CountInference {
            count: 1,
            rule: CountRule::Default,
        })
}

// ============================================================================
// Rules
// ============================================================================

fn trailing_parenthetical(query: &CountQuery<'_>) -> Option<u32> {
    let pattern = format!(
        r"(?i){label}[^\d\n]{{0,{SHORT_GAP}}}?{length}(?:\s*(?:ft\b|feet\b|'))?\.?[ \t]{{0,{PAREN_GAP}}}\(\s*(\d+)\b[^()]*\)",
        label = label_pattern(query.label),
        length = length_pattern(query.length),
    );
    let re = Regex::new(&pattern).ok()?;
    let found = re
        .captures_iter(query.text)
        .filter(|caps| caps.get(0).is_some_and(|m| !follows_step(query, m.start())))
        .find_map(|caps| accept(&caps[1]));
    found
}

fn leading_integer(query: &CountQuery<'_>) -> Option<u32> {
    // An opening parenthesis belongs to the parenthetical rules
    let pattern = format!(
        r"(?i)(?:^|[^\w.,/(])(\d+)[ \t]+(?P<label>{})",
        label_pattern(query.label)
    );
    let re = Regex::new(&pattern).ok()?;
    let found = re.captures_iter(query.text).find_map(|caps| {
        let number = caps.get(1)?;
        // `Eaves = 12 Rakes` is a value followed by the next label, not a count
        let before = query.text[..number.start()].trim_end();
        if before.ends_with('=') || before.ends_with(':') {
            return None;
        }
        if follows_step(query, caps.name("label")?.start()) {
            return None;
        }
        accept(number.as_str())
    });
    found
}

fn parenthetical_before_length(query: &CountQuery<'_>) -> Option<u32> {
    let label_re = Regex::new(&format!("(?i){}", label_pattern(query.label))).ok()?;
    let length_re = Regex::new(&length_pattern(query.length)).ok()?;

    let found = label_re
        .find_iter(query.text)
        .filter(|label| !follows_step(query, label.start()))
        .find_map(|label| {
            let window = window(query.text, label.end(), WIDE_WINDOW);
            let length = length_re.find(window)?;
            let between = &window[..length.start()];
            PARENTHETICAL
                .captures_iter(between)
                .find_map(|caps| accept(&caps[1]))
        });
    found
}

// ============================================================================
// Helpers
// ============================================================================

/// `Flashing` found inside `Step Flashing` belongs to the other feature.
fn follows_step(query: &CountQuery<'_>, label_start: usize) -> bool {
    STEP_PREFIX.is_match(&query.text[..label_start])
}

/// Accept a count candidate only inside `1..=99`.
fn accept(digits: &str) -> Option<u32> {
    digits
        .parse::<u32>()
        .ok()
        .filter(|n| (1..=MAX_SEGMENT_COUNT).contains(n))
}

/// Label stem as a word, allowing plural or suffix characters (`Ridges`, `Eaves/Starter`).
fn label_pattern(label: &str) -> String {
    let words: Vec<String> = label.split_whitespace().map(regex::escape).collect();
    format!(r"\b{}\w*", words.join(r"[\s-]+"))
}

/// A length value as it may be printed: optional thousands separators and
/// trailing zero decimals, not part of a longer number.
fn length_pattern(length: f64) -> String {
    let printed = format!("{}", length);
    let (whole, fraction) = match printed.split_once('.') {
        Some((whole, fraction)) => (whole.to_string(), Some(fraction.to_string())),
        None => (printed, None),
    };

    let digits: Vec<char> = whole.chars().collect();
    let mut grouped = String::new();
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push_str(",?");
        }
        grouped.push(*c);
    }

    let decimals = match fraction {
        Some(fraction) => format!(r"\.{}0*", fraction),
        None => r"(?:\.0+)?".to_string(),
    };

    format!(r"(?:^|\b){}{}\b", grouped, decimals)
}

/// Up to `max_chars` characters of `text` starting at byte `start`, stopping
/// at the end of the line.
fn window(text: &str, start: usize, max_chars: usize) -> &str {
    let rest = &text[start..];
    let rest = rest.split('\n').next().unwrap_or(rest);
    let end = rest
        .char_indices()
        .nth(max_chars)
        .map(|(i, _)| i)
        .unwrap_or(rest.len());
    &rest[..end]
}
