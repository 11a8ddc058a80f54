//! Per-subject schema registry.
//!
//! A [`Schema`] lists a subject's canonical headers, the fields every accepted
//! row must fill, and the field rules applied to each row. Rules are plain
//! function pointers with a fixed signature: they read the field value, the
//! row as corrected so far and the untouched input rows, and return the
//! corrected value. They never mutate anything.
//!
//! Rules are declared in header order and run in that order, which matters
//! for derived fields (a person's document number is padded after its kind
//! is inferred).

pub mod people;
pub mod plans;
pub mod prices;
pub mod products;
pub mod stock;
pub mod titles;

use crate::error::ValidationError;
use crate::models::{Row, Subject};

/// Field rule: `(value, row so far, all input rows) -> corrected value`.
pub type FieldFn = fn(&str, &Row, &[Row]) -> String;

/// How a subject treats its identifying field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPolicy {
    /// No identity checks.
    None,
    /// First occurrence wins, later repeats are excluded.
    FirstWins {
        field: &'static str,
        /// Blank key excludes the row instead of skipping the check.
        reject_blank: bool,
        /// Prefix of the duplicate exclusion reason.
        duplicate_label: &'static str,
        /// Second identity (digits only) that must also be unique.
        unique_document: Option<&'static str>,
    },
    /// Blank keys and later repeats get the next free code.
    Renumbered { field: &'static str },
}

impl KeyPolicy {
    pub fn field(&self) -> Option<&'static str> {
        match self {
            KeyPolicy::None => None,
            KeyPolicy::FirstWins { field, .. } | KeyPolicy::Renumbered { field } => Some(*field),
        }
    }
}

/// A field whose values are assigned once per run from the whole input.
///
/// `assign` returns one value per input row, by row index.
#[derive(Debug, Clone, Copy)]
pub struct DerivedCodes {
    pub field: &'static str,
    pub assign: fn(&[Row]) -> Vec<String>,
}

/// Structural checks on the classification column of hierarchical subjects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassificationRule {
    pub field: &'static str,
    /// Require a single-digit first segment and reject bare top-level codes.
    pub check_top_level: bool,
    /// Deepest level allowed, when capped.
    pub max_level: Option<usize>,
}

/// Static definition of one subject.
pub struct Schema {
    pub subject: Subject,
    pub headers: &'static [&'static str],
    pub required: &'static [&'static str],
    pub rules: &'static [(&'static str, FieldFn)],
    pub key: KeyPolicy,
    /// Field filled from a whole-input pass before the field rules run.
    pub derived_codes: Option<DerivedCodes>,
    pub classification: Option<ClassificationRule>,
    /// Unit-of-measure columns standardized after the field rules.
    pub unit_fields: &'static [&'static str],
}

impl Schema {
    /// Rule registered for a field, if any.
    pub fn rule(&self, field: &str) -> Option<FieldFn> {
        self.rules
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, rule)| *rule)
    }

    /// Required fields blank on this row.
    pub fn missing_required<'a>(&'a self, row: &Row) -> Vec<&'a str> {
        self.required
            .iter()
            .copied()
            .filter(|field| row.is_blank(field))
            .collect()
    }
}

impl std::fmt::Debug for Schema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Schema")
            .field("subject", &self.subject)
            .field("headers", &self.headers.len())
            .field("required", &self.required)
            .field("rules", &self.rules.iter().map(|(n, _)| *n).collect::<Vec<_>>())
            .field("key", &self.key)
            .finish()
    }
}

/// Schema for a subject. Every subject has one.
pub fn schema(subject: Subject) -> &'static Schema {
    match subject {
        Subject::People => &people::PEOPLE,
        Subject::Products => &products::PRODUCTS,
        Subject::FinancialPlan => &plans::FINANCIAL_PLAN,
        Subject::AccountingPlan => &plans::ACCOUNTING_PLAN,
        Subject::CostCenter => &plans::COST_CENTER,
        Subject::Receivables => &titles::RECEIVABLES,
        Subject::Payables => &titles::PAYABLES,
        Subject::SellPriceTable => &prices::SELL_PRICE_TABLE,
        Subject::BuyPriceTable => &prices::BUY_PRICE_TABLE,
        Subject::OpeningStockBalance => &stock::OPENING_STOCK_BALANCE,
    }
}

/// Schema by subject key (`pessoas`, `produtos`, ...).
pub fn schema_for_name(name: &str) -> Result<&'static Schema, ValidationError> {
    name.parse::<Subject>().map(schema)
}

// =============================================================================
// Rule helpers shared by the subject files
// =============================================================================

/// `value`, or the current value of `fallback` when blank, truncated.
pub(crate) fn or_field(value: &str, row: &Row, fallback: &str, max: usize) -> String {
    let chosen = if value.is_empty() { row.get(fallback) } else { value };
    crate::normalize::truncate(chosen, max)
}

/// `value`, or `default` when blank.
pub(crate) fn or_default(value: &str, default: &str) -> String {
    let chosen = if value.is_empty() { default } else { value };
    chosen.to_string()
}
