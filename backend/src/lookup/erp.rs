//! HTTP client for the ERP family entity (`e012fam`).
//!
//! Configuration comes from the environment (a `.env` file is honored):
//!
//! | Variable        | Meaning                                   |
//! |-----------------|-------------------------------------------|
//! | `ERP_BASE_URL`  | REST root, defaults to the public bridge  |
//! | `ERP_TOKEN`     | Bearer token for CLI runs                 |
//! | `ERP_CLIENT_ID` | Tenant client id sent as `client_id`      |

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use std::env;

use super::{Credential, FamilyInfo, FamilyLookup, DEFAULT_MAX_CODE_LENGTH};
use crate::error::{LookupError, LookupResult};

/// Public REST bridge of the ERP platform.
pub const DEFAULT_BASE_URL: &str = "https://platform.senior.com.br/t/senior.com.br/bridge/1.0/rest";

const FAMILY_ENTITY_PATH: &str = "erpx_fnd/produto/entities/e012fam";

/// Family entity client.
#[derive(Debug, Clone)]
pub struct ErpClient {
    base_url: String,
    http: reqwest::Client,
}

/// Paged entity listing.
#[derive(Debug, Deserialize)]
struct EntityPage {
    #[serde(default)]
    contents: Vec<FamilyEntity>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FamilyEntity {
    #[serde(default)]
    pos_pro: Option<u64>,
    #[serde(default)]
    e070emp: Option<CompanyEntity>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompanyEntity {
    #[serde(default)]
    cod_emp: Option<Value>,
}

impl ErpClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    /// Client for `ERP_BASE_URL`, or the public bridge when unset.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let base = env::var("ERP_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::new(base)
    }

    /// Credential from `ERP_TOKEN` / `ERP_CLIENT_ID`.
    pub fn credential_from_env() -> LookupResult<Credential> {
        dotenvy::dotenv().ok();
        let token = env::var("ERP_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty())
            .ok_or(LookupError::MissingCredential)?;
        let client_id = env::var("ERP_CLIENT_ID").ok().filter(|c| !c.is_empty());
        Ok(Credential::new(token, client_id))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn family_url(&self) -> String {
        format!("{}/{}", self.base_url, FAMILY_ENTITY_PATH)
    }
}

/// Filter expression selecting a family inside a company.
pub fn family_filter(family: &str, company: &str) -> String {
    format!("codFam='{}' and e070emp.codEmp={}", family.replace('\'', "''"), company)
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Interpret an `e012fam` listing body.
pub fn parse_family_response(body: &str) -> LookupResult<FamilyInfo> {
    let page: EntityPage =
        serde_json::from_str(body).map_err(|e| LookupError::InvalidResponse(e.to_string()))?;

    let Some(family) = page.contents.into_iter().next() else {
        return Ok(FamilyInfo::not_found("Família não encontrada para esta empresa"));
    };
    let Some(company) = family.e070emp else {
        return Ok(FamilyInfo::not_found("Dados da empresa não encontrados"));
    };

    let max_len = family
        .pos_pro
        .filter(|p| *p > 0)
        .map(|p| p as usize)
        .unwrap_or(DEFAULT_MAX_CODE_LENGTH);
    Ok(FamilyInfo::found(
        max_len,
        company.cod_emp.as_ref().map(value_text),
    ))
}

#[async_trait]
impl FamilyLookup for ErpClient {
    async fn lookup_family(
        &self,
        family: &str,
        company: &str,
        credential: &Credential,
    ) -> LookupResult<FamilyInfo> {
        if credential.token.trim().is_empty() {
            return Err(LookupError::MissingCredential);
        }

        let mut request = self
            .http
            .get(self.family_url())
            .query(&[("filter", family_filter(family, company))])
            .bearer_auth(&credential.token)
            .header("Content-Type", "application/json");
        if let Some(client_id) = &credential.client_id {
            request = request.header("client_id", client_id);
        }

        let response = request
            .send()
            .await
            .map_err(|e| LookupError::Http(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(FamilyInfo::not_found(format!(
                "Erro ao consultar família: {}",
                status.as_u16()
            )));
        }
        if !status.is_success() {
            return Err(LookupError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| LookupError::Http(e.to_string()))?;
        parse_family_response(&body)
    }
}
