//! Run-scoped identity state.
//!
//! A [`RunContext`] is built from the whole input before the row loop starts
//! and is consulted and updated row by row. It lives for exactly one run.

use std::collections::{HashMap, HashSet};

use crate::classification::{next_available_code, FIRST_ASSIGNED_CODE};
use crate::models::Row;
use crate::schema::{KeyPolicy, Schema};

/// Outcome of the first-occurrence identity check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityCheck {
    Fresh,
    DuplicateKey,
    DuplicateDocument,
}

/// Outcome of resolving a renumbered code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeResolution {
    /// First occurrence, kept as is.
    Kept,
    /// Blank code, filled with the next free one.
    Filled(String),
    /// Repeat of a code already kept, replaced with the next free one.
    Replaced(String),
}

#[derive(Debug, Default)]
pub struct RunContext {
    seen_keys: HashSet<String>,
    seen_documents: HashSet<String>,
    used_codes: HashSet<String>,
    /// Codes occurring more than once in the input, with their row indexes.
    duplicate_codes: HashMap<String, Vec<usize>>,
    kept_codes: HashSet<String>,
    /// Whole-input assignments of the schema's derived field, by row index.
    derived: Vec<String>,
}

impl RunContext {
    /// First pass over every input row.
    ///
    /// Derived fields are assigned here, once. Renumbered subjects also seed
    /// the set of codes already present and the codes that repeat.
    pub fn seed(schema: &Schema, rows: &[Row]) -> Self {
        let mut ctx = Self::default();
        if let Some(derived) = schema.derived_codes {
            ctx.derived = (derived.assign)(rows);
        }
        let KeyPolicy::Renumbered { field } = schema.key else {
            return ctx;
        };

        let mut occurrences: HashMap<String, Vec<usize>> = HashMap::new();
        for row in rows {
            let code = row.get(field).trim();
            if code.is_empty() {
                continue;
            }
            ctx.used_codes.insert(code.to_string());
            occurrences.entry(code.to_string()).or_default().push(row.index);
        }
        ctx.duplicate_codes = occurrences
            .into_iter()
            .filter(|(_, indexes)| indexes.len() > 1)
            .collect();
        ctx
    }

    /// Check a first-wins key (and optional document) and claim both when fresh.
    ///
    /// A blank document is never checked.
    pub fn check_identity(&mut self, key: &str, document: Option<&str>) -> IdentityCheck {
        if self.seen_keys.contains(key) {
            return IdentityCheck::DuplicateKey;
        }
        let document = document.filter(|d| !d.is_empty());
        if let Some(doc) = document {
            if self.seen_documents.contains(doc) {
                return IdentityCheck::DuplicateDocument;
            }
            self.seen_documents.insert(doc.to_string());
        }
        self.seen_keys.insert(key.to_string());
        IdentityCheck::Fresh
    }

    /// Resolve a renumbered code.
    ///
    /// Assigned codes are the smallest integer from [`FIRST_ASSIGNED_CODE`]
    /// not used anywhere in the input or by an earlier assignment.
    pub fn resolve_code(&mut self, code: &str) -> CodeResolution {
        let code = code.trim();
        if code.is_empty() {
            return CodeResolution::Filled(self.assign());
        }
        if self.duplicate_codes.contains_key(code) && self.kept_codes.contains(code) {
            return CodeResolution::Replaced(self.assign());
        }
        self.kept_codes.insert(code.to_string());
        CodeResolution::Kept
    }

    fn assign(&mut self) -> String {
        let code = next_available_code(&self.used_codes, FIRST_ASSIGNED_CODE);
        self.used_codes.insert(code.clone());
        code
    }

    /// Derived value for the row at `index`, if the schema has a derived field.
    pub fn derived_code(&self, index: usize) -> Option<&str> {
        self.derived.get(index).map(String::as_str)
    }

    /// Repeated input codes, with the row indexes they occur on.
    pub fn duplicate_codes(&self) -> &HashMap<String, Vec<usize>> {
        &self.duplicate_codes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Subject;
    use crate::schema::schema;

    fn plan_rows(codes: &[&str]) -> Vec<Row> {
        codes
            .iter()
            .enumerate()
            .map(|(i, code)| Row::from_pairs(i, [("codigoconta", *code)]))
            .collect()
    }

    #[test]
    fn test_seed_collects_used_and_duplicates() {
        let rows = plan_rows(&["10", "11", "10", "", "12", "10"]);
        let ctx = RunContext::seed(schema(Subject::FinancialPlan), &rows);
        assert_eq!(ctx.used_codes.len(), 3);
        assert_eq!(ctx.duplicate_codes().len(), 1);
        assert_eq!(ctx.duplicate_codes()["10"], vec![0, 2, 5]);
    }

    #[test]
    fn test_first_wins_subjects_seed_nothing() {
        let rows = vec![Row::from_pairs(0, [("CODIGO", "1")])];
        let ctx = RunContext::seed(schema(Subject::People), &rows);
        assert!(ctx.used_codes.is_empty());
    }

    #[test]
    fn test_resolve_keeps_first_and_renumbers_repeats() {
        let rows = plan_rows(&["10", "11", "10", "", "12"]);
        let mut ctx = RunContext::seed(schema(Subject::FinancialPlan), &rows);

        assert_eq!(ctx.resolve_code("10"), CodeResolution::Kept);
        assert_eq!(ctx.resolve_code("11"), CodeResolution::Kept);
        assert_eq!(ctx.resolve_code("10"), CodeResolution::Replaced("13".into()));
        assert_eq!(ctx.resolve_code(""), CodeResolution::Filled("14".into()));
        assert_eq!(ctx.resolve_code("12"), CodeResolution::Kept);
    }

    #[test]
    fn test_assignment_starts_at_ten() {
        let mut ctx = RunContext::seed(schema(Subject::CostCenter), &[]);
        assert_eq!(ctx.resolve_code(" "), CodeResolution::Filled("10".into()));
        assert_eq!(ctx.resolve_code(""), CodeResolution::Filled("11".into()));
    }

    #[test]
    fn test_people_codes_assigned_once_at_seed() {
        let rows: Vec<Row> = ["7", "x", "7"]
            .iter()
            .enumerate()
            .map(|(i, code)| Row::from_pairs(i, [("CODIGO", *code)]))
            .collect();
        let ctx = RunContext::seed(schema(Subject::People), &rows);
        assert_eq!(ctx.derived_code(0), Some("7"));
        assert_eq!(ctx.derived_code(1), Some("50"));
        assert_eq!(ctx.derived_code(2), Some("51"));
        assert_eq!(ctx.derived_code(3), None);

        let plans = RunContext::seed(schema(Subject::FinancialPlan), &rows);
        assert_eq!(plans.derived_code(0), None);
    }

    #[test]
    fn test_identity_claims_only_fresh_rows() {
        let mut ctx = RunContext::default();
        assert_eq!(ctx.check_identity("7", Some("123")), IdentityCheck::Fresh);
        assert_eq!(ctx.check_identity("7", Some("999")), IdentityCheck::DuplicateKey);
        assert_eq!(ctx.check_identity("8", Some("123")), IdentityCheck::DuplicateDocument);
        // Rejected on its document, so its key stays free.
        assert_eq!(ctx.check_identity("8", None), IdentityCheck::Fresh);
        assert_eq!(ctx.check_identity("9", Some("")), IdentityCheck::Fresh);
    }
}
