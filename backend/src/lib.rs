//! # Sheetfix - ERP migration spreadsheet validation and correction
//!
//! Sheetfix checks CSV and Excel files prepared for an ERP import against a
//! fixed per-subject template (people, products, financial plans, titles,
//! price tables, stock, ...), standardizes every field it recognizes,
//! excludes rows that cannot be imported and reports each decision.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ CSV / XLSX  │────▶│   Parser    │────▶│  Pipeline   │────▶│ Corrected   │
//! │  (ISO/UTF8) │     │  (auto-enc) │     │ (rules+ERP) │     │ CSV + aux   │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sheetfix::{validate_file, ValidateOptions};
//!
//! #[tokio::main]
//! async fn main() {
//!     let options = ValidateOptions::for_subject("pessoas").unwrap();
//!     let result = validate_file("pessoas.csv", &options).await.unwrap();
//!     println!("{}", result.summary());
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Subjects, rows and the validation report
//! - [`parser`] - CSV/Excel parsing with auto-detection
//! - [`normalize`] - Field standardization primitives
//! - [`classification`] - Dotted hierarchy codes
//! - [`schema`] - Per-subject templates and rules
//! - [`lookup`] - ERP product family lookups
//! - [`pipeline`] - The row-by-row validation run
//! - [`output`] - Corrected file and auxiliary tables
//! - [`api`] - HTTP API server

// Core modules
pub mod error;
pub mod models;

// Parsing
pub mod parser;

// Rules
pub mod classification;
pub mod normalize;
pub mod schema;

// ERP
pub mod lookup;

// Validation
pub mod output;
pub mod pipeline;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{CsvError, LookupError, PipelineError, ServerError, ValidationError};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    AuxiliaryOutputs, CorrectionDetail, ExcludedDetail, ProcessedDetail, Row, Subject,
    ValidationResult,
};

// =============================================================================
// Re-exports - Parsing
// =============================================================================

pub use parser::{
    decode_content, detect_delimiter, detect_encoding, parse_bytes, parse_file, parse_text,
    parse_upload, ParsedSheet,
};

// =============================================================================
// Re-exports - Schema
// =============================================================================

pub use schema::{schema, schema_for_name, Schema};

// =============================================================================
// Re-exports - ERP lookup
// =============================================================================

pub use lookup::{erp::ErpClient, Credential, FamilyInfo, FamilyLookup, LookupSession};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use pipeline::{validate_bytes, validate_file, validate_sheet, validate_text, ValidateOptions};

// =============================================================================
// Re-exports - API
// =============================================================================

pub use api::types::{
    error_response, subject_catalogue, InputMetadata, SubjectInfo, ValidateResponse,
};

// Server
pub mod server {
    pub use crate::api::server::start_server;
}
