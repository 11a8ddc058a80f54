//! HTTP Server for the sheetfix API.
//!
//! Provides REST endpoints for spreadsheet upload and validation.
//! Login to the ERP is handled by the frontend; requests only forward the
//! bearer token it obtained.
//!
//! # API Endpoints
//!
//! | Method | Path              | Description                          |
//! |--------|-------------------|--------------------------------------|
//! | GET    | `/health`         | Health check                         |
//! | GET    | `/api/subjects`   | Subjects with headers and required   |
//! | POST   | `/api/validate`   | Upload a file for validation         |
//! | GET    | `/api/logs`       | SSE stream for real-time logs        |

use axum::{
    extract::{Multipart, State},
    http::{header, HeaderMap, HeaderName, Method, StatusCode},
    response::{sse::Event, Json, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::{log_info, LOG_BROADCASTER};
use super::types::{error_response, subject_catalogue, InputMetadata, SubjectInfo, ValidateResponse};
use crate::error::{PipelineError, ServerError, ServerResult, ValidationError};
use crate::lookup::{erp::ErpClient, Credential, LookupSession};
use crate::parser::parse_upload;
use crate::pipeline::{validate_sheet, ValidateOptions};

/// Header carrying the ERP tenant client id.
const CLIENT_ID_HEADER: &str = "client-id";

/// Shared handler state.
#[derive(Clone)]
struct AppState {
    erp: Arc<ErpClient>,
}

/// Start the HTTP server
pub async fn start_server(port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::AUTHORIZATION,
            HeaderName::from_static(CLIENT_ID_HEADER),
        ])
        .expose_headers([header::CONTENT_TYPE]);

    let erp = ErpClient::from_env();
    let state = AppState {
        erp: Arc::new(erp),
    };

    let app = Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/subjects", get(subjects))
        .route("/api/validate", post(validate_upload))
        .route("/api/logs", get(sse_logs))
        .layer(cors)
        .with_state(state.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    println!("🚀 Sheetfix server running on http://localhost:{}", port);
    println!("   POST /api/validate - Upload file + subject");
    println!("   GET  /api/subjects - Subject catalogue");
    println!("   GET  /api/logs     - SSE log stream");
    println!("   GET  /health       - Health check");
    println!();
    println!("🔎 ERP lookups against {}", state.erp.base_url());

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "sheetfix",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "validate": "POST /api/validate",
            "subjects": "GET /api/subjects",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

async fn subjects() -> Json<Vec<SubjectInfo>> {
    Json(subject_catalogue())
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(entry) => {
            let json = serde_json::to_string(&entry).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Bearer token and client id forwarded by the frontend, if any.
fn credential_from_headers(headers: &HeaderMap) -> Option<Credential> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())?;
    let client_id = headers
        .get(CLIENT_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .filter(|c| !c.is_empty());
    Some(Credential::new(token, client_id))
}

fn status_for(err: &ServerError) -> StatusCode {
    match err {
        ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
        ServerError::Pipeline(PipelineError::Validation(ValidationError::UnknownSubject(_))) => {
            StatusCode::BAD_REQUEST
        }
        ServerError::Pipeline(PipelineError::Validation(ValidationError::SchemaMismatch {
            ..
        })) => StatusCode::UNPROCESSABLE_ENTITY,
        ServerError::Pipeline(PipelineError::Csv(_)) => StatusCode::BAD_REQUEST,
        ServerError::Pipeline(_) | ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn reject(err: ServerError) -> (StatusCode, Json<Value>) {
    eprintln!("❌ Validation error: {}", err);
    let message = match &err {
        ServerError::Pipeline(PipelineError::Validation(inner)) => inner.to_string(),
        other => other.to_string(),
    };
    (status_for(&err), Json(error_response(&message)))
}

/// Fields of the validation form.
#[derive(Default)]
struct ValidateForm {
    file: Option<Vec<u8>>,
    file_name: Option<String>,
    subject: Option<String>,
}

async fn read_form(mut multipart: Multipart) -> ServerResult<ValidateForm> {
    let mut form = ValidateForm::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Multipart error: {}", e)))?
    {
        match field.name().unwrap_or("") {
            "file" => {
                form.file_name = field.file_name().map(|s| s.to_string());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?;
                form.file = Some(bytes.to_vec());
            }
            "subject" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?;
                form.subject = Some(text);
            }
            _ => {}
        }
    }
    Ok(form)
}

/// Upload and validate endpoint
async fn validate_upload(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Json<ValidateResponse>, (StatusCode, Json<Value>)> {
    run_validation(&state, &headers, multipart).await.map(Json).map_err(reject)
}

async fn run_validation(
    state: &AppState,
    headers: &HeaderMap,
    multipart: Multipart,
) -> ServerResult<ValidateResponse> {
    let form = read_form(multipart).await?;
    let subject = form
        .subject
        .ok_or_else(|| ServerError::BadRequest("No subject provided".to_string()))?;
    let bytes = form
        .file
        .ok_or_else(|| ServerError::BadRequest("No file provided".to_string()))?;

    let mut options = ValidateOptions::for_subject(&subject).map_err(PipelineError::from)?;
    if let Some(credential) = credential_from_headers(headers) {
        options = options.with_lookup(LookupSession::new(state.erp.clone(), credential));
    }

    println!("\n{}", "=".repeat(70));
    println!(
        "📄 NEW UPLOAD: {} ({} bytes) as {}",
        form.file_name.as_deref().unwrap_or("unknown"),
        bytes.len(),
        options.subject.label()
    );
    println!("{}\n", "=".repeat(70));

    let sheet = parse_upload(&bytes, form.file_name.as_deref(), None).map_err(PipelineError::from)?;
    let metadata = InputMetadata::from_sheet(&sheet, form.file_name);
    let erp_checked = options.lookup.is_some() && options.subject.uses_erp_lookup();
    if options.lookup.is_some() && !erp_checked {
        log_info("ERP credential ignored for this subject");
    }

    let result = validate_sheet(&sheet, &options).await?;
    Ok(ValidateResponse::new(result, metadata, erp_checked))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_credential_from_headers() {
        let mut headers = HeaderMap::new();
        assert!(credential_from_headers(&headers).is_none());

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(credential_from_headers(&headers).is_none());

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer tok-123"));
        headers.insert(CLIENT_ID_HEADER, HeaderValue::from_static("tenant-9"));
        let credential = credential_from_headers(&headers).unwrap();
        assert_eq!(credential.token, "tok-123");
        assert_eq!(credential.client_id.as_deref(), Some("tenant-9"));
    }

    #[test]
    fn test_error_statuses() {
        let unknown: ServerError =
            PipelineError::from(ValidationError::UnknownSubject("x".into())).into();
        assert_eq!(status_for(&unknown), StatusCode::BAD_REQUEST);

        let mismatch: ServerError = PipelineError::from(ValidationError::SchemaMismatch {
            missing: vec!["CODIGO".into()],
        })
        .into();
        assert_eq!(status_for(&mismatch), StatusCode::UNPROCESSABLE_ENTITY);

        let (status, Json(body)) = reject(mismatch);
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "Cabeçalhos obrigatórios faltando: CODIGO");

        let missing = ServerError::BadRequest("No file provided".into());
        assert_eq!(status_for(&missing), StatusCode::BAD_REQUEST);
    }
}
