//! Row validation and correction pipeline.
//!
//! Every run goes through the same stages:
//!
//! 1. Parse the input (delimited text or workbook) and check its headers
//! 2. Seed the run context from all rows
//! 3. Walk the rows in input order: identity checks, classification checks,
//!    required fields, ERP lookup, field rules, units, then code renumbering
//!    for rows that survived
//! 4. Reassemble the accepted rows and derive the auxiliary tables
//!
//! Rows are processed strictly one at a time. Code assignment depends on
//! which rows came before, so the loop is never parallelized; ERP lookups are
//! awaited before the next row starts.
//!
//! # Example
//!
//! ```rust,ignore
//! use sheetfix::pipeline::{validate_file, ValidateOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let options = ValidateOptions::for_subject("pessoas")?;
//!     let result = validate_file("clientes.csv", &options).await?;
//!     println!("{}", result.summary());
//!     Ok(())
//! }
//! ```

pub mod context;

use std::path::Path;

use crate::api::logs::{log_info, log_success, log_warning};
use crate::classification;
use crate::error::{PipelineResult, ValidationError};
use crate::lookup::{LookupSession, ProductCheck};
use crate::models::{
    CorrectionDetail, ExcludedDetail, ProcessedDetail, Row, Subject, ValidationResult,
};
use crate::normalize::{digits_only, unit_of_measure};
use crate::output::{auxiliary, to_delimited};
use crate::parser::{self, ParsedSheet};
use crate::schema::{products, schema, ClassificationRule, KeyPolicy, Schema};

use context::{CodeResolution, IdentityCheck, RunContext};

const REASON_STANDARDIZED: &str = "padronização";
const REASON_UNIT: &str = "padronização de unidade de medida";
const REASON_CODE_FILLED: &str = "preenchimento automático de código faltante";
const REASON_CODE_REPLACED: &str = "código duplicado substituído por próximo disponível";

/// Options for one validation run
#[derive(Debug, Clone)]
pub struct ValidateOptions {
    /// Which schema applies
    pub subject: Subject,

    /// Force a delimiter instead of detecting it
    pub delimiter: Option<char>,

    /// ERP lookup for products, used only when active
    pub lookup: Option<LookupSession>,
}

impl ValidateOptions {
    pub fn new(subject: Subject) -> Self {
        Self {
            subject,
            delimiter: None,
            lookup: None,
        }
    }

    /// Options for a subject key. Unknown keys fail before any input is read.
    pub fn for_subject(name: &str) -> Result<Self, ValidationError> {
        name.parse().map(Self::new)
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    pub fn with_lookup(mut self, session: LookupSession) -> Self {
        self.lookup = Some(session);
        self
    }

    /// The lookup session, when this run should consult the ERP.
    fn active_lookup(&self) -> Option<&LookupSession> {
        if !self.subject.uses_erp_lookup() {
            return None;
        }
        self.lookup.as_ref().filter(|s| s.is_active())
    }
}

/// Validate already decoded delimited text.
pub async fn validate_text(
    content: &str,
    options: &ValidateOptions,
) -> PipelineResult<ValidationResult> {
    let sheet = parser::parse_text(content, options.delimiter)?;
    validate_sheet(&sheet, options).await
}

/// Validate raw upload bytes.
///
/// Workbooks are recognized by file name; anything else is decoded as text.
pub async fn validate_bytes(
    bytes: &[u8],
    file_name: Option<&str>,
    options: &ValidateOptions,
) -> PipelineResult<ValidationResult> {
    let sheet = parser::parse_upload(bytes, file_name, options.delimiter)?;
    validate_sheet(&sheet, options).await
}

/// Validate a file on disk.
pub async fn validate_file<P: AsRef<Path>>(
    path: P,
    options: &ValidateOptions,
) -> PipelineResult<ValidationResult> {
    let sheet = parser::parse_file(path, options.delimiter)?;
    validate_sheet(&sheet, options).await
}

/// Validate a parsed sheet.
///
/// Fails only when the headers do not match the subject; every per-row
/// problem is recorded in the result instead.
pub async fn validate_sheet(
    sheet: &ParsedSheet,
    options: &ValidateOptions,
) -> PipelineResult<ValidationResult> {
    let schema = schema(options.subject);

    log_info(format!("📖 {}", options.subject.label()));
    log_success(format!("Encoding: {}", sheet.encoding));
    log_success(format!("Delimiter: '{}'", sheet.delimiter));
    log_success(format!("Read {} rows", sheet.rows.len()));

    parser::check_headers(schema.headers, &sheet.headers)?;
    let absent = schema
        .headers
        .iter()
        .filter(|h| !sheet.headers.iter().any(|f| f == *h))
        .count();
    if absent > 0 {
        log_warning(format!("{} template columns missing, written blank", absent));
    } else {
        log_success("Headers match the template");
    }

    let lookup = options.active_lookup();
    if lookup.is_some() {
        log_info("🔎 ERP lookup enabled for product families");
    }

    let mut ctx = RunContext::seed(schema, &sheet.rows);
    for (code, indexes) in ctx.duplicate_codes() {
        log_warning(format!("Code {} repeated on {} rows", code, indexes.len()));
    }

    let mut accepted: Vec<Row> = Vec::new();
    let mut correction_details = Vec::new();
    let mut excluded_details = Vec::new();
    let mut processed_details = Vec::new();

    for row in &sheet.rows {
        match process_row(schema, row, &sheet.rows, &mut ctx, lookup).await {
            RowOutcome::Accepted { row, corrections } => {
                correction_details.extend(corrections);
                processed_details.push(ProcessedDetail {
                    line: row.line,
                    data: row.values().clone(),
                });
                accepted.push(row);
            }
            RowOutcome::Excluded(detail) => excluded_details.push(detail),
        }
    }

    let corrected_csv = to_delimited(schema.headers, &accepted, sheet.delimiter);
    let auxiliary = auxiliary::generate(schema.subject, &accepted);

    let result = ValidationResult {
        subject: schema.subject,
        is_valid: excluded_details.is_empty(),
        total_records: sheet.rows.len(),
        processed_records: accepted.len(),
        corrections: correction_details.len(),
        excluded_records: excluded_details.len(),
        delimiter: sheet.delimiter,
        corrected_csv,
        correction_details,
        excluded_details,
        processed_details,
        auxiliary,
    };

    if result.excluded_records > 0 {
        log_warning(format!("{} rows excluded", result.excluded_records));
    }
    log_success(result.summary());
    Ok(result)
}

enum RowOutcome {
    Accepted {
        row: Row,
        corrections: Vec<CorrectionDetail>,
    },
    Excluded(ExcludedDetail),
}

/// Run one row through every stage. The first exclusion ends it.
async fn process_row(
    schema: &Schema,
    row: &Row,
    all_rows: &[Row],
    ctx: &mut RunContext,
    lookup: Option<&LookupSession>,
) -> RowOutcome {
    if let Some(excluded) = check_identity(schema, row, ctx) {
        return RowOutcome::Excluded(excluded);
    }
    if let Some(excluded) = schema
        .classification
        .and_then(|rule| check_classification(&rule, row))
    {
        return RowOutcome::Excluded(excluded);
    }

    let missing = schema.missing_required(row);
    if !missing.is_empty() {
        return RowOutcome::Excluded(ExcludedDetail::new(
            row.line,
            format!("Campos obrigatórios faltando: {}", missing.join(", ")),
        ));
    }

    if let Some(session) = lookup {
        if let Some(excluded) = check_product(session, row).await {
            log_warning(format!("Line {}: {}", row.line, excluded.reason));
            return RowOutcome::Excluded(excluded);
        }
    }

    let mut corrected = row.clone();
    let mut corrections = Vec::new();

    if let Some(derived) = schema.derived_codes {
        let code = ctx
            .derived_code(row.index)
            .filter(|_| corrected.has(derived.field));
        if let Some(code) = code {
            let original = corrected.get(derived.field).to_string();
            if code != original {
                corrected.set(derived.field, code);
                corrections.push(CorrectionDetail {
                    line: row.line,
                    field: derived.field.to_string(),
                    original,
                    corrected: code.to_string(),
                    reason: REASON_STANDARDIZED.to_string(),
                });
            }
        }
    }

    for (field, rule) in schema.rules {
        if !corrected.has(field) {
            continue;
        }
        let original = corrected.get(field).to_string();
        let value = rule(&original, &corrected, all_rows);
        if value != original {
            corrected.set(field, value.clone());
            corrections.push(CorrectionDetail {
                line: row.line,
                field: field.to_string(),
                original,
                corrected: value,
                reason: REASON_STANDARDIZED.to_string(),
            });
        }
    }

    for field in schema.unit_fields {
        let original = corrected.get(field).to_string();
        if original.is_empty() {
            continue;
        }
        let value = unit_of_measure(&original);
        if value != original {
            corrected.set(field, value.clone());
            corrections.push(CorrectionDetail {
                line: row.line,
                field: field.to_string(),
                original,
                corrected: value,
                reason: REASON_UNIT.to_string(),
            });
        }
    }

    // A rule may have cleared a required value; the row's corrections go with it.
    let emptied = schema.missing_required(&corrected);
    if !emptied.is_empty() {
        return RowOutcome::Excluded(ExcludedDetail::new(
            row.line,
            format!(
                "Campos obrigatórios inválidos após padronização: {}",
                emptied.join(", ")
            ),
        ));
    }

    // Codes are claimed only by accepted rows.
    if let KeyPolicy::Renumbered { field } = schema.key {
        let original = row.get(field).to_string();
        let (code, reason) = match ctx.resolve_code(&original) {
            CodeResolution::Kept => (None, ""),
            CodeResolution::Filled(code) => (Some(code), REASON_CODE_FILLED),
            CodeResolution::Replaced(code) => (Some(code), REASON_CODE_REPLACED),
        };
        if let Some(code) = code {
            corrected.set(field, code.clone());
            corrections.insert(
                0,
                CorrectionDetail {
                    line: row.line,
                    field: field.to_string(),
                    original,
                    corrected: code,
                    reason: reason.to_string(),
                },
            );
        }
    }

    RowOutcome::Accepted {
        row: corrected,
        corrections,
    }
}

/// First-wins key and document checks.
fn check_identity(schema: &Schema, row: &Row, ctx: &mut RunContext) -> Option<ExcludedDetail> {
    let KeyPolicy::FirstWins {
        field,
        reject_blank,
        duplicate_label,
        unique_document,
    } = schema.key
    else {
        return None;
    };

    let key = row.get(field).trim();
    if key.is_empty() {
        return reject_blank.then(|| {
            ExcludedDetail::new(row.line, "Código não preenchido - registro excluído")
                .with_field(field, "")
        });
    }

    let document = unique_document.map(|f| digits_only(row.get(f)));
    match ctx.check_identity(key, document.as_deref()) {
        IdentityCheck::Fresh => None,
        IdentityCheck::DuplicateKey => Some(
            ExcludedDetail::new(
                row.line,
                format!(
                    "{}: {} - mantido apenas o primeiro registro",
                    duplicate_label, key
                ),
            )
            .with_field(field, key),
        ),
        IdentityCheck::DuplicateDocument => {
            let doc_field = unique_document.unwrap_or(field);
            Some(
                ExcludedDetail::new(row.line, "CNPJ/CPF duplicado - registro excluído")
                    .with_field(doc_field, row.get(doc_field)),
            )
        }
    }
}

/// Structural checks on a hierarchical classification.
fn check_classification(rule: &ClassificationRule, row: &Row) -> Option<ExcludedDetail> {
    let raw = row.get(rule.field);
    let value = raw.trim();
    let exclude = |reason: String| Some(ExcludedDetail::new(row.line, reason).with_field(rule.field, raw));

    if value.is_empty() || value == "." {
        return exclude("Classificação não preenchida".to_string());
    }

    if rule.check_top_level {
        if value.contains('.') && !classification::has_valid_first_level(value) {
            let first = value.split('.').next().unwrap_or_default();
            return exclude(format!(
                "Primeiro nível da classificação inválido: \"{}\" - deve ser apenas um dígito (1-9)",
                first
            ));
        }
        if classification::is_root(value) {
            return exclude(format!(
                "Conta nível 1 ({}) excluída - já cadastrada no ERP",
                value
            ));
        }
    }

    if let Some(max) = rule.max_level {
        let level = classification::level(value);
        if level > max {
            return exclude(format!(
                "Classificação inválida: \"{}\" - nível {} excede o máximo permitido ({})",
                value, level, max
            ));
        }
    }
    None
}

/// ERP family check for a product row.
async fn check_product(session: &LookupSession, row: &Row) -> Option<ExcludedDetail> {
    let code = row.get(products::CODE).trim();
    let family = row.get(products::FAMILY).trim();
    let company = row.get(products::COMPANY).trim();
    if code.is_empty() || family.is_empty() || company.is_empty() {
        return None;
    }

    match session.check_product(code, family, company).await {
        ProductCheck::Accepted => None,
        ProductCheck::Rejected(reason) => {
            Some(ExcludedDetail::new(row.line, reason).with_field(products::CODE, code))
        }
    }
}
