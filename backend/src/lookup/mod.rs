//! External ERP lookup for product families.
//!
//! The pipeline only needs one question answered: does this family exist
//! for this company, and how long may its product codes be? [`FamilyLookup`]
//! is that capability; [`erp::ErpClient`] answers it over HTTP.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use sheetfix::lookup::{erp::ErpClient, LookupSession};
//!
//! let client = ErpClient::from_env();
//! let credential = ErpClient::credential_from_env()?;
//! let session = LookupSession::new(Arc::new(client), credential);
//! ```

pub mod erp;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::api::logs::{log_info_indent, log_warning};
use crate::error::LookupResult;

/// Product code length allowed when the family does not say otherwise.
pub const DEFAULT_MAX_CODE_LENGTH: usize = 23;

/// Bearer token plus the tenant client id some deployments require.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    pub token: String,
    #[serde(default)]
    pub client_id: Option<String>,
}

impl Credential {
    pub fn new(token: impl Into<String>, client_id: Option<String>) -> Self {
        Self {
            token: token.into(),
            client_id,
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"***")
            .field("client_id", &self.client_id)
            .finish()
    }
}

/// Answer for one family/company pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyInfo {
    pub exists: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_code_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_reason: Option<String>,
}

impl FamilyInfo {
    pub fn found(max_code_length: usize, company_code: Option<String>) -> Self {
        Self {
            exists: true,
            max_code_length: Some(max_code_length),
            company_code,
            error_reason: None,
        }
    }

    pub fn not_found(reason: impl Into<String>) -> Self {
        Self {
            exists: false,
            error_reason: Some(reason.into()),
            ..Default::default()
        }
    }
}

/// Family lookup against a system of record.
///
/// `Ok` with `exists == false` is a definite "no"; `Err` means the question
/// could not be answered and callers must not assume either way.
#[async_trait]
pub trait FamilyLookup: Send + Sync {
    async fn lookup_family(
        &self,
        family: &str,
        company: &str,
        credential: &Credential,
    ) -> LookupResult<FamilyInfo>;
}

/// Check a product code against its family's constraints.
///
/// Returns the exclusion reason when the code is not acceptable.
pub fn validate_code_with_family(
    code: &str,
    family: &str,
    company: &str,
    max_len: usize,
    expected_company: Option<&str>,
) -> Result<(), String> {
    if code.trim().is_empty() {
        return Err("Código não preenchido".to_string());
    }
    if let Some(expected) = expected_company.filter(|e| !e.is_empty()) {
        if company != expected {
            return Err(format!(
                "Código da empresa divergente (planilha: {}, ERP: {})",
                company, expected
            ));
        }
    }
    let len = code.chars().count();
    if len > max_len {
        return Err(format!(
            "Código excede o limite de caracteres da família {} (código: {} caracteres, máximo: {})",
            family, len, max_len
        ));
    }
    Ok(())
}

/// Outcome of checking one product row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductCheck {
    Accepted,
    Rejected(String),
}

/// A lookup collaborator bound to the credential of the current user.
#[derive(Clone)]
pub struct LookupSession {
    lookup: Arc<dyn FamilyLookup>,
    credential: Credential,
}

impl LookupSession {
    pub fn new(lookup: Arc<dyn FamilyLookup>, credential: Credential) -> Self {
        Self { lookup, credential }
    }

    /// Lookups only run with a token.
    pub fn is_active(&self) -> bool {
        !self.credential.token.trim().is_empty()
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// Check one product. Lookup failures reject the product.
    pub async fn check_product(&self, code: &str, family: &str, company: &str) -> ProductCheck {
        match self.lookup.lookup_family(family, company, &self.credential).await {
            Ok(info) if info.exists => {
                let max_len = info.max_code_length.unwrap_or(DEFAULT_MAX_CODE_LENGTH);
                match validate_code_with_family(
                    code,
                    family,
                    company,
                    max_len,
                    info.company_code.as_deref(),
                ) {
                    Ok(()) => {
                        log_info_indent(
                            format!(
                                "Código {} válido para família {} ({} caracteres, máximo: {})",
                                code,
                                family,
                                code.chars().count(),
                                max_len
                            ),
                            1,
                        );
                        ProductCheck::Accepted
                    }
                    Err(reason) => ProductCheck::Rejected(reason),
                }
            }
            Ok(info) => {
                let mut reason = format!(
                    "Família {} não encontrada no ERP para empresa {}",
                    family, company
                );
                if let Some(detail) = info.error_reason.filter(|d| !d.is_empty()) {
                    reason.push_str(&format!(" ({})", detail));
                }
                ProductCheck::Rejected(reason)
            }
            Err(e) => {
                log_warning(format!("Falha na consulta ao ERP para o código {}: {}", code, e));
                ProductCheck::Rejected(format!(
                    "Erro na validação do código {} - produto excluído por segurança",
                    code
                ))
            }
        }
    }
}

impl fmt::Debug for LookupSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LookupSession")
            .field("credential", &self.credential)
            .field("active", &self.is_active())
            .finish()
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{session, FakeLookup};
    use super::*;

    #[test]
    fn test_validate_code_with_family() {
        assert!(validate_code_with_family("ABC123", "F1", "1", 6, Some("1")).is_ok());
        assert_eq!(
            validate_code_with_family("ABC1234", "F1", "1", 6, None).unwrap_err(),
            "Código excede o limite de caracteres da família F1 (código: 7 caracteres, máximo: 6)"
        );
        assert_eq!(
            validate_code_with_family("ABC", "F1", "1", 6, Some("2")).unwrap_err(),
            "Código da empresa divergente (planilha: 1, ERP: 2)"
        );
        assert!(validate_code_with_family(" ", "F1", "1", 6, None).is_err());
    }

    #[test]
    fn test_session_activity_and_debug_hides_token() {
        let (active, _) = session(FakeLookup::default());
        assert!(active.is_active());
        assert!(!format!("{:?}", active).contains("secret"));

        let inactive = LookupSession::new(Arc::new(FakeLookup::default()), Credential::default());
        assert!(!inactive.is_active());
    }

    #[tokio::test]
    async fn test_check_product_outcomes() {
        let fake = FakeLookup::default()
            .with_family("F1", "1", 5)
            .failing_for("BROKEN");
        let (session, fake) = session(fake);

        assert_eq!(session.check_product("AB12", "F1", "1").await, ProductCheck::Accepted);
        assert!(matches!(
            session.check_product("AB1234", "F1", "1").await,
            ProductCheck::Rejected(r) if r.contains("máximo: 5")
        ));
        assert!(matches!(
            session.check_product("AB", "F9", "1").await,
            ProductCheck::Rejected(r) if r.starts_with("Família F9 não encontrada no ERP para empresa 1")
        ));
        assert_eq!(
            session.check_product("AB", "BROKEN", "1").await,
            ProductCheck::Rejected(
                "Erro na validação do código AB - produto excluído por segurança".to_string()
            )
        );
        assert_eq!(fake.call_count(), 4);
    }
}
