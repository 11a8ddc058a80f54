//! REST API types for frontend integration.
//!
//! The validation report is returned as-is; the frontend paginates the
//! detail lists and offers the corrected and auxiliary files for download.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::models::{Subject, ValidationResult};
use crate::parser::ParsedSheet;
use crate::schema::schema;

/// Response sent to the frontend after a validation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateResponse {
    /// Unique job identifier
    pub job_id: String,

    /// Status: "ready" when nothing was excluded, "warning" otherwise
    pub status: String,

    /// Whether the ERP family lookup ran for this job
    pub erp_checked: bool,

    /// Metadata about the input
    pub metadata: InputMetadata,

    /// Full report
    pub result: ValidationResult,
}

/// Input file metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputMetadata {
    pub file_name: Option<String>,
    pub encoding: String,
    pub delimiter: String,
    pub row_count: usize,
    pub columns: Vec<String>,
}

impl InputMetadata {
    pub fn from_sheet(sheet: &ParsedSheet, file_name: Option<String>) -> Self {
        Self {
            file_name,
            encoding: sheet.encoding.clone(),
            delimiter: sheet.delimiter.to_string(),
            row_count: sheet.rows.len(),
            columns: sheet.headers.clone(),
        }
    }
}

impl ValidateResponse {
    pub fn new(result: ValidationResult, metadata: InputMetadata, erp_checked: bool) -> Self {
        Self {
            job_id: Uuid::new_v4().to_string(),
            status: if result.is_valid { "ready" } else { "warning" }.to_string(),
            erp_checked,
            metadata,
            result,
        }
    }
}

/// One entry of the subject catalogue.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectInfo {
    pub key: String,
    pub label: String,
    pub headers: Vec<String>,
    pub required: Vec<String>,
    /// Only products consult the ERP
    pub uses_erp_lookup: bool,
}

impl From<Subject> for SubjectInfo {
    fn from(subject: Subject) -> Self {
        let schema = schema(subject);
        SubjectInfo {
            key: subject.key().to_string(),
            label: subject.label().to_string(),
            headers: schema.headers.iter().map(|h| h.to_string()).collect(),
            required: schema.required.iter().map(|h| h.to_string()).collect(),
            uses_erp_lookup: subject.uses_erp_lookup(),
        }
    }
}

/// Every subject, in menu order.
pub fn subject_catalogue() -> Vec<SubjectInfo> {
    Subject::ALL.into_iter().map(SubjectInfo::from).collect()
}

/// Create an error response
pub fn error_response(error: &str) -> Value {
    json!({
        "jobId": Uuid::new_v4().to_string(),
        "status": "error",
        "error": error,
        "result": null
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_text;
    use crate::pipeline::{validate_sheet, ValidateOptions};

    #[tokio::test]
    async fn test_response_shape() {
        let headers = schema(Subject::SellPriceTable).headers.join(";");
        let content = format!("{}\nVP;P1;UN;;;10;;;\nXX;P2;UN;;;10;;;", headers);
        let sheet = parse_text(&content, None).unwrap();
        let result = validate_sheet(&sheet, &ValidateOptions::new(Subject::SellPriceTable))
            .await
            .unwrap();

        let metadata = InputMetadata::from_sheet(&sheet, Some("precos.csv".into()));
        let response = ValidateResponse::new(result, metadata, false);
        assert_eq!(response.status, "warning");

        let json = serde_json::to_value(&response).unwrap();
        assert!(json["jobId"].as_str().is_some());
        assert_eq!(json["metadata"]["delimiter"], ";");
        assert_eq!(json["metadata"]["rowCount"], 2);
        assert_eq!(json["result"]["subject"], "tabela_preco_venda");
        assert_eq!(json["result"]["processedRecords"], 1);
        assert_eq!(json["result"]["excludedRecords"], 1);
        assert!(json["result"]["correctedCsv"].as_str().unwrap().contains("VP;P1"));
    }

    #[test]
    fn test_subject_catalogue() {
        let catalogue = subject_catalogue();
        assert_eq!(catalogue.len(), Subject::ALL.len());
        let products = catalogue.iter().find(|s| s.key == "produtos").unwrap();
        assert!(products.uses_erp_lookup);
        assert!(products.required.contains(&"Código".to_string()));
        assert_eq!(catalogue.iter().filter(|s| s.uses_erp_lookup).count(), 1);
    }

    #[test]
    fn test_error_response() {
        let err = error_response("Template não encontrado para o assunto: x");
        assert_eq!(err["status"], "error");
        assert!(err["result"].is_null());
        assert!(err["jobId"].as_str().unwrap().len() > 10);
    }
}
