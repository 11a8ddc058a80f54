//! Domain models for the Sheetfix validation pipeline.
//!
//! This module contains the core data structures used throughout the pipeline:
//!
//! - [`Subject`] - Which business entity a spreadsheet describes
//! - [`Row`] - One parsed data line, keyed by header, carrying its position
//! - [`CorrectionDetail`] / [`ExcludedDetail`] / [`ProcessedDetail`] - Report entries
//! - [`ValidationResult`] - Everything a run produces

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

// =============================================================================
// Subject
// =============================================================================

/// Business-entity category of a spreadsheet.
///
/// The serialized names are the keys used by the ERP import templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Subject {
    #[serde(rename = "pessoas")]
    People,
    #[serde(rename = "produtos")]
    Products,
    #[serde(rename = "plano_financeiro")]
    FinancialPlan,
    #[serde(rename = "plano_contabil")]
    AccountingPlan,
    #[serde(rename = "centro_custo")]
    CostCenter,
    #[serde(rename = "titulos_receber")]
    Receivables,
    #[serde(rename = "titulos_pagar")]
    Payables,
    #[serde(rename = "tabela_preco_venda")]
    SellPriceTable,
    #[serde(rename = "tabela_preco_compra")]
    BuyPriceTable,
    #[serde(rename = "saldo_inicial_estoque")]
    OpeningStockBalance,
}

impl Subject {
    /// Every subject, in menu order.
    pub const ALL: [Subject; 10] = [
        Subject::People,
        Subject::Products,
        Subject::FinancialPlan,
        Subject::AccountingPlan,
        Subject::CostCenter,
        Subject::Receivables,
        Subject::Payables,
        Subject::SellPriceTable,
        Subject::BuyPriceTable,
        Subject::OpeningStockBalance,
    ];

    /// Template key (`pessoas`, `produtos`, ...).
    pub fn key(&self) -> &'static str {
        match self {
            Subject::People => "pessoas",
            Subject::Products => "produtos",
            Subject::FinancialPlan => "plano_financeiro",
            Subject::AccountingPlan => "plano_contabil",
            Subject::CostCenter => "centro_custo",
            Subject::Receivables => "titulos_receber",
            Subject::Payables => "titulos_pagar",
            Subject::SellPriceTable => "tabela_preco_venda",
            Subject::BuyPriceTable => "tabela_preco_compra",
            Subject::OpeningStockBalance => "saldo_inicial_estoque",
        }
    }

    /// Human-readable name.
    pub fn label(&self) -> &'static str {
        match self {
            Subject::People => "Pessoas",
            Subject::Products => "Produtos",
            Subject::FinancialPlan => "Plano Financeiro",
            Subject::AccountingPlan => "Plano Contábil",
            Subject::CostCenter => "Centro de Custo",
            Subject::Receivables => "Títulos a Receber",
            Subject::Payables => "Títulos a Pagar",
            Subject::SellPriceTable => "Tabela de Preço de Venda",
            Subject::BuyPriceTable => "Tabela de Preço de Compra",
            Subject::OpeningStockBalance => "Saldo Inicial de Estoque",
        }
    }

    /// Subjects whose code field is renumbered instead of deduplicated.
    pub fn is_hierarchical(&self) -> bool {
        matches!(
            self,
            Subject::FinancialPlan | Subject::AccountingPlan | Subject::CostCenter
        )
    }

    /// Only products are checked against the ERP.
    pub fn uses_erp_lookup(&self) -> bool {
        matches!(self, Subject::Products)
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Subject {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Subject::ALL
            .into_iter()
            .find(|subject| subject.key() == wanted)
            .ok_or_else(|| ValidationError::UnknownSubject(s.to_string()))
    }
}

// =============================================================================
// Row
// =============================================================================

/// One data line of the input, keyed by the file's own header names.
///
/// `index` is the position among data rows (0-based) and `line` the line
/// number reported to users (header is line 1). Both are fixed at parse time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    pub index: usize,
    pub line: usize,
    values: HashMap<String, String>,
}

impl Row {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            line: index + 2,
            values: HashMap::new(),
        }
    }

    /// Build a row from `(header, value)` pairs. Later duplicates of a header win.
    pub fn from_pairs<I, K, V>(index: usize, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut row = Self::new(index);
        for (k, v) in pairs {
            row.values.insert(k.into(), v.into());
        }
        row
    }

    /// Value of a field, or `""` when the column is absent.
    pub fn get(&self, field: &str) -> &str {
        self.values.get(field).map(String::as_str).unwrap_or("")
    }

    /// Whether the input file has this column at all.
    pub fn has(&self, field: &str) -> bool {
        self.values.contains_key(field)
    }

    /// Blank after trimming, or absent.
    pub fn is_blank(&self, field: &str) -> bool {
        self.get(field).trim().is_empty()
    }

    pub fn set(&mut self, field: &str, value: impl Into<String>) {
        self.values.insert(field.to_string(), value.into());
    }

    pub fn values(&self) -> &HashMap<String, String> {
        &self.values
    }
}

// =============================================================================
// Report entries
// =============================================================================

/// One field value changed during processing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrectionDetail {
    pub line: usize,
    pub field: String,
    pub original: String,
    pub corrected: String,
    pub reason: String,
}

/// One row removed from the output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExcludedDetail {
    pub line: usize,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original: Option<String>,
}

impl ExcludedDetail {
    pub fn new(line: usize, reason: impl Into<String>) -> Self {
        Self {
            line,
            reason: reason.into(),
            field: None,
            original: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>, original: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self.original = Some(original.into());
        self
    }
}

/// One accepted row, as written to the corrected file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedDetail {
    pub line: usize,
    pub data: HashMap<String, String>,
}

// =============================================================================
// Validation result
// =============================================================================

/// Secondary tables derived from the accepted rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuxiliaryOutputs {
    /// Products: unique NCM codes with status.
    #[serde(rename = "situacaoNCM", skip_serializing_if = "Option::is_none")]
    pub situacao_ncm: Option<String>,
    /// Products: complementary product sheet.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complementar_produto: Option<String>,
    /// People: client specialization sheet.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cliente_especializacao: Option<String>,
    /// People: sales representative sheet.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub representante_comercial: Option<String>,
}

impl AuxiliaryOutputs {
    /// `(file stem, content)` for every table present.
    pub fn files(&self) -> Vec<(&'static str, &str)> {
        [
            ("situacao_ncm", &self.situacao_ncm),
            ("complementar_produto", &self.complementar_produto),
            ("cliente_especializacao", &self.cliente_especializacao),
            ("representante_comercial", &self.representante_comercial),
        ]
        .into_iter()
        .filter_map(|(name, content)| content.as_deref().map(|c| (name, c)))
        .collect()
    }
}

/// Outcome of one validation run. Built once, never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub subject: Subject,
    pub is_valid: bool,
    pub total_records: usize,
    pub processed_records: usize,
    pub corrections: usize,
    pub excluded_records: usize,
    pub delimiter: char,
    pub corrected_csv: String,
    pub correction_details: Vec<CorrectionDetail>,
    pub excluded_details: Vec<ExcludedDetail>,
    pub processed_details: Vec<ProcessedDetail>,
    #[serde(flatten)]
    pub auxiliary: AuxiliaryOutputs,
}

impl ValidationResult {
    /// Get summary statistics
    pub fn summary(&self) -> String {
        format!(
            "{} records: {} processed, {} corrections, {} excluded",
            self.total_records, self.processed_records, self.corrections, self.excluded_records
        )
    }
}
