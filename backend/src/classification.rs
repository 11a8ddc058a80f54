//! Hierarchical classification codes (`1.001.002`).
//!
//! A classification's level is its segment count. Formatting left-pads each
//! segment to the per-level mask: the first segment is one digit, every
//! following segment three digits, nine levels at most.

use std::collections::HashSet;

/// Deepest level a mask exists for.
pub const MAX_LEVEL: usize = 9;

/// Deepest level accepted for cost centers.
pub const MAX_COST_CENTER_LEVEL: usize = 5;

/// First code tried when a plan or cost-center code has to be assigned.
pub const FIRST_ASSIGNED_CODE: u64 = 10;

/// Level of a classification: number of `.` plus one. Blank is level 1.
pub fn level(classification: &str) -> usize {
    if classification.is_empty() {
        return 1;
    }
    classification.matches('.').count() + 1
}

/// Digit width of segment `index` under the mask for `level`.
fn mask_width(level: usize, index: usize) -> Option<usize> {
    if level == 0 || level > MAX_LEVEL || index >= level {
        return None;
    }
    Some(if index == 0 { 1 } else { 3 })
}

/// Pad every segment to its mask width for the given level.
///
/// Levels without a mask return the input untouched, and segments past the
/// mask keep their own width.
pub fn format(classification: &str, level: usize) -> String {
    if classification.is_empty() {
        return String::new();
    }
    if level == 0 || level > MAX_LEVEL {
        return classification.to_string();
    }
    classification
        .split('.')
        .enumerate()
        .map(|(i, part)| match mask_width(level, i) {
            Some(width) => crate::normalize::pad_zeros(part, width),
            None => part.to_string(),
        })
        .collect::<Vec<_>>()
        .join(".")
}

/// Format at the classification's own level.
pub fn normalize(classification: &str) -> String {
    format(classification, level(classification))
}

/// Cost-center variant: anything deeper than level 5 becomes blank.
pub fn normalize_capped(classification: &str, max_level: usize) -> String {
    if classification.is_empty() || level(classification) > max_level {
        return String::new();
    }
    normalize(classification)
}

/// First segment, when it is a single digit 1-9.
pub fn has_valid_first_level(classification: &str) -> bool {
    let first = classification.split('.').next().unwrap_or_default();
    first.len() == 1 && matches!(first.as_bytes()[0], b'1'..=b'9')
}

/// A bare top-level digit such as `3`.
pub fn is_root(classification: &str) -> bool {
    let trimmed = classification.trim();
    trimmed.len() == 1 && matches!(trimmed.as_bytes()[0], b'1'..=b'9')
}

/// Smallest integer `>= start` whose decimal form is not in `used`.
pub fn next_available_code(used: &HashSet<String>, start: u64) -> String {
    (start..)
        .map(|n| n.to_string())
        .find(|code| !used.contains(code))
        .unwrap_or_default()
}
