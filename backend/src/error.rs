//! Error types for the Sheetfix validation pipeline.
//!
//! This module defines a hierarchy of error types:
//!
//! - [`CsvError`] - Reading, decoding and parsing input files
//! - [`ValidationError`] - Fatal preconditions of a validation run
//! - [`LookupError`] - External ERP lookup failures
//! - [`PipelineError`] - Top-level orchestration errors
//! - [`ServerError`] - HTTP surface errors
//!
//! Only [`ValidationError`] and [`CsvError`] abort a run. A [`LookupError`]
//! is always turned into a row exclusion by the pipeline.

use thiserror::Error;

// =============================================================================
// CSV / Input Errors
// =============================================================================

/// Errors while reading or decoding an input file.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to decode the file content.
    #[error("Failed to decode content: {0}")]
    Encoding(String),

    /// Empty file.
    #[error("Input file is empty")]
    EmptyFile,

    /// No header line found.
    #[error("No header line found")]
    NoHeaders,

    /// Spreadsheet could not be read.
    #[error("Invalid spreadsheet: {0}")]
    Excel(String),

    /// File extension not handled.
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),
}

// =============================================================================
// Validation Errors (fatal preconditions)
// =============================================================================

/// Fatal errors raised before any row is processed.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// No schema registered under this subject name.
    #[error("Template não encontrado para o assunto: {0}")]
    UnknownSubject(String),

    /// Fewer than half of the schema headers were found in the file.
    #[error("Cabeçalhos obrigatórios faltando: {}", missing.join(", "))]
    SchemaMismatch { missing: Vec<String> },
}

// =============================================================================
// Lookup Errors
// =============================================================================

/// Errors from the external family lookup.
#[derive(Debug, Error)]
pub enum LookupError {
    /// No bearer token available.
    #[error("Missing ERP credential")]
    MissingCredential,

    /// Transport failure.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Non-success status other than "not found".
    #[error("ERP responded with status {0}")]
    Status(u16),

    /// Body could not be understood.
    #[error("Invalid ERP response: {0}")]
    InvalidResponse(String),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline errors.
///
/// This is the error type returned by [`crate::pipeline::validate_text`] and
/// friends. Per-row problems never show up here, they are recorded in the
/// [`crate::models::ValidationResult`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Input reading/decoding error.
    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    /// Fatal validation precondition.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Lookup configuration error (never raised for a single row).
    #[error("Lookup error: {0}")]
    Lookup(#[from] LookupError),

    /// IO error while writing outputs.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Pipeline error.
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Server internal error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for input operations.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for lookup operations.
pub type LookupResult<T> = Result<T, LookupError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
