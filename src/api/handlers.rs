//! API request handlers
//!
//! Handlers for all REST API endpoints. Parser and store failures are
//! translated here into HTTP statuses and stable error codes; nothing below
//! this layer retries or crashes the process.

use std::sync::Arc;

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::excel::{self, check_signature, MAX_UPLOAD_SIZE};
use crate::error::RowcastError;
use crate::types::{Row, StoreInfo};

use super::server::AppState;

/// Standard API response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            request_id: Uuid::new_v4().to_string(),
            data: Some(data),
            message: None,
            error: None,
            code: None,
        }
    }

    pub fn ok_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::ok(data)
        }
    }
}

impl ApiResponse<()> {
    /// Success response carrying a message but no data payload.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            request_id: Uuid::new_v4().to_string(),
            data: None,
            message: Some(message.into()),
            error: None,
            code: None,
        }
    }
}

/// Build an error response with an HTTP status and a stable machine code.
fn error_response(
    status: StatusCode,
    error: impl Into<String>,
    message: impl Into<String>,
    code: &str,
) -> Response {
    let body: ApiResponse<()> = ApiResponse {
        success: false,
        request_id: Uuid::new_v4().to_string(),
        data: None,
        message: Some(message.into()),
        error: Some(error.into()),
        code: Some(code.to_string()),
    };
    (status, Json(body)).into_response()
}

/// Root endpoint response
#[derive(Serialize)]
pub struct RootResponse {
    pub name: String,
    pub version: String,
    pub description: String,
    pub endpoints: Vec<EndpointInfo>,
}

#[derive(Serialize)]
pub struct EndpointInfo {
    pub path: String,
    pub method: String,
    pub description: String,
}

fn endpoint(path: &str, method: &str, description: &str) -> EndpointInfo {
    EndpointInfo {
        path: path.to_string(),
        method: method.to_string(),
        description: description.to_string(),
    }
}

/// GET / - Root info
pub async fn root(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let response = RootResponse {
        name: "Rowcast Server".to_string(),
        version: state.version.clone(),
        description: "Spreadsheet ingestion backend for broadcast overlays".to_string(),
        endpoints: vec![
            endpoint("/health", "GET", "Health check endpoint"),
            endpoint("/version", "GET", "Get server version"),
            endpoint("/api/v1/upload", "POST", "Upload an Excel file (multipart field 'excel')"),
            endpoint("/api/v1/elements", "GET", "List all imported rows"),
            endpoint("/api/v1/element/select/{id}", "PUT", "Select a row by id"),
            endpoint("/api/v1/element/selected", "GET", "Get the selected row (overlay feed)"),
            endpoint("/api/v1/status", "GET", "Server and store status"),
            endpoint("/api/v1/reset", "DELETE", "Clear the row store"),
        ],
    };
    Json(ApiResponse::ok(response))
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

/// GET /health - Health check
pub async fn health() -> impl IntoResponse {
    Json(ApiResponse::ok(HealthResponse {
        status: "ok".to_string(),
        timestamp: Utc::now(),
    }))
}

/// Version response
#[derive(Serialize)]
pub struct VersionResponse {
    pub version: String,
    pub features: Vec<String>,
}

/// GET /version - Server version
pub async fn version(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(ApiResponse::ok(VersionResponse {
        version: state.version.clone(),
        features: vec![
            "upload".to_string(),
            "elements".to_string(),
            "select".to_string(),
            "selected".to_string(),
            "status".to_string(),
            "reset".to_string(),
        ],
    }))
}

/// Elements listing response
#[derive(Serialize)]
pub struct ElementsResponse {
    pub elements: Vec<Row>,
    pub info: StoreInfo,
}

/// GET /api/v1/elements - All imported rows plus store info
pub async fn elements(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(ApiResponse::ok(ElementsResponse {
        elements: state.store.list(),
        info: state.store.info(),
    }))
}

/// Upload response
#[derive(Serialize)]
pub struct UploadResponse {
    pub filename: String,
    pub row_count: usize,
    pub columns: Vec<String>,
    pub file_size: usize,
}

/// POST /api/v1/upload - Upload and import an Excel file
///
/// Pipeline: multipart field `excel` → signature check → parse → validate →
/// store import. Any failure short-circuits with 400 before the store is
/// touched, so a failed upload never leaves the store mid-update.
pub async fn upload(State(state): State<Arc<AppState>>, mut multipart: Multipart) -> Response {
    let mut file_bytes = None;
    let mut filename = String::from("upload.xlsx");

    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                if field.name() == Some("excel") {
                    if let Some(name) = field.file_name() {
                        filename = name.to_string();
                    }
                    match field.bytes().await {
                        Ok(bytes) => file_bytes = Some(bytes),
                        Err(e) => {
                            return error_response(
                                StatusCode::BAD_REQUEST,
                                "upload failed",
                                e.to_string(),
                                "UPLOAD_ERROR",
                            )
                        }
                    }
                }
            }
            Ok(None) => break,
            Err(e) => {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    "malformed multipart body",
                    e.to_string(),
                    "UPLOAD_ERROR",
                )
            }
        }
    }

    let Some(bytes) = file_bytes else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "no file provided",
            "select an Excel file and send it as the multipart field 'excel'",
            "NO_FILE_PROVIDED",
        );
    };
    if bytes.is_empty() {
        return error_response(
            StatusCode::BAD_REQUEST,
            "empty file",
            "the uploaded file has no content",
            "EMPTY_FILE",
        );
    }

    info!(filename, size = bytes.len(), "processing upload");

    let check = check_signature(&bytes);
    if !check.ok {
        let reason = check
            .reason
            .unwrap_or_else(|| "invalid file".to_string());
        let code = if bytes.len() > MAX_UPLOAD_SIZE {
            "FILE_TOO_LARGE"
        } else {
            "INVALID_FILE_FORMAT"
        };
        warn!(filename, reason, "upload rejected by signature check");
        let err = RowcastError::Security(reason.clone());
        return error_response(StatusCode::BAD_REQUEST, err.to_string(), reason, code);
    }

    let rows = match excel::parse(&bytes, &filename) {
        Ok(rows) => rows,
        Err(e) => {
            warn!(filename, error = %e, "spreadsheet parse failed");
            return parse_error_response(&e);
        }
    };

    if !excel::validate(&rows) {
        let err = RowcastError::Validation("batch has no usable data columns".to_string());
        return error_response(
            StatusCode::BAD_REQUEST,
            err.to_string(),
            "the file contains no usable data columns",
            "INVALID_EXCEL_DATA",
        );
    }

    let columns: Vec<String> = rows[0].columns().map(str::to_string).collect();
    let row_count = rows.len();
    let file_size = bytes.len();
    state.store.import(rows, &filename);

    Json(ApiResponse::ok_with_message(
        UploadResponse {
            filename,
            row_count,
            columns,
            file_size,
        },
        format!("{row_count} rows imported"),
    ))
    .into_response()
}

/// Map a parse failure to the upload error vocabulary.
fn parse_error_response(err: &RowcastError) -> Response {
    let reason = err.to_string();
    let (message, code) = if reason.contains("password") {
        (
            "the file is password-protected; upload an unprotected workbook",
            "ENCRYPTED_EXCEL_FILE",
        )
    } else if reason.contains("no data")
        || reason.contains("no header")
        || reason.contains("no worksheet")
    {
        ("the file contains no data rows", "EMPTY_EXCEL_FILE")
    } else {
        (
            "the file could not be read as a spreadsheet",
            "CORRUPTED_EXCEL_FILE",
        )
    };
    error_response(StatusCode::BAD_REQUEST, reason, message, code)
}

/// PUT /api/v1/element/select/{id} - Select a row by id
pub async fn select_element(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    match state.store.select(&id) {
        Some(row) => {
            Json(ApiResponse::ok_with_message(row, "element selected")).into_response()
        }
        None => {
            let err = RowcastError::NotFound(id);
            error_response(
                StatusCode::NOT_FOUND,
                err.to_string(),
                "pick an id from /api/v1/elements",
                "ELEMENT_NOT_FOUND",
            )
        }
    }
}

/// GET /api/v1/element/selected - Current selection (polled by the overlay)
pub async fn selected_element(State(state): State<Arc<AppState>>) -> Response {
    match state.store.selected() {
        Some(row) => Json(ApiResponse::ok(row)).into_response(),
        None => error_response(
            StatusCode::NOT_FOUND,
            RowcastError::NoSelection.to_string(),
            "select an element from the list first",
            "NO_ELEMENT_SELECTED",
        ),
    }
}

/// Status response
#[derive(Serialize)]
pub struct StatusResponse {
    pub server: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub uptime_seconds: u64,
    pub database: StoreInfo,
}

/// GET /api/v1/status - Server and store status
pub async fn status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(ApiResponse::ok(StatusResponse {
        server: "Rowcast Server".to_string(),
        version: state.version.clone(),
        timestamp: Utc::now(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        database: state.store.info(),
    }))
}

/// DELETE /api/v1/reset - Clear the row store
pub async fn reset(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.store.reset();
    Json(ApiResponse::message("row store reset"))
}
