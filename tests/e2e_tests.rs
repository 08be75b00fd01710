//! End-to-end flow tests
//!
//! Upload a generated workbook through the router, browse the rows, select
//! one, poll the selection like the overlay tool would, then reset.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use rowcast::api::server::{build_router, ApiConfig, AppState};
use rust_xlsxwriter::Workbook;
use serde_json::Value;
use tower::ServiceExt;

const BOUNDARY: &str = "rowcast-e2e-boundary";

fn test_router() -> Router {
    build_router(Arc::new(AppState::new()), &ApiConfig::default()).unwrap()
}

/// 2 columns, 3 data rows.
fn roster_workbook() -> Vec<u8> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.write_string(0, 0, "Name").unwrap();
    sheet.write_string(0, 1, "Team").unwrap();
    sheet.write_string(1, 0, "Alice").unwrap();
    sheet.write_string(1, 1, "Blue").unwrap();
    sheet.write_string(2, 0, "Bob").unwrap();
    sheet.write_string(2, 1, "Red").unwrap();
    sheet.write_string(3, 0, "Carol").unwrap();
    sheet.write_string(3, 1, "Green").unwrap();
    workbook.save_to_buffer().unwrap()
}

fn upload_request(bytes: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"excel\"; filename=\"roster.xlsx\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/api/v1/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_upload_select_poll_reset_flow() {
    let router = test_router();

    // Upload
    let response = router
        .clone()
        .oneshot(upload_request(&roster_workbook()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let upload = body_json(response).await;
    assert_eq!(upload["success"], true);
    assert_eq!(upload["data"]["filename"], "roster.xlsx");
    assert_eq!(upload["data"]["row_count"], 3);
    assert_eq!(
        upload["data"]["columns"],
        serde_json::json!(["Name", "Team"])
    );

    // List and pick the second row
    let response = router.clone().oneshot(get("/api/v1/elements")).await.unwrap();
    let listing = body_json(response).await;
    let elements = listing["data"]["elements"].as_array().unwrap();
    assert_eq!(elements.len(), 3);
    assert_eq!(listing["data"]["info"]["columns"], serde_json::json!(["Name", "Team"]));

    let second_id = elements[1]["id"].as_str().unwrap().to_string();
    assert_eq!(elements[1]["Name"], "Bob");

    // Select it
    let request = Request::builder()
        .method("PUT")
        .uri(format!("/api/v1/element/select/{second_id}"))
        .body(Body::empty())
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let selected = body_json(response).await;
    assert_eq!(selected["data"]["id"], second_id.as_str());
    assert_eq!(selected["data"]["Name"], "Bob");
    assert_eq!(selected["data"]["Team"], "Red");

    // Poll the selection like the overlay tool
    let response = router
        .clone()
        .oneshot(get("/api/v1/element/selected"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let polled = body_json(response).await;
    assert_eq!(polled["data"]["id"], second_id.as_str());
    assert_eq!(polled["data"]["Name"], "Bob");

    // Status reflects the selection
    let response = router.clone().oneshot(get("/api/v1/status")).await.unwrap();
    let status = body_json(response).await;
    assert_eq!(status["data"]["database"]["count"], 3);
    assert_eq!(status["data"]["database"]["has_selection"], true);
    assert_eq!(status["data"]["database"]["filename"], "roster.xlsx");

    // Reset clears everything
    let request = Request::builder()
        .method("DELETE")
        .uri("/api/v1/reset")
        .body(Body::empty())
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = router.clone().oneshot(get("/api/v1/elements")).await.unwrap();
    let listing = body_json(response).await;
    assert_eq!(listing["data"]["elements"].as_array().unwrap().len(), 0);

    let response = router
        .oneshot(get("/api/v1/element/selected"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_second_upload_replaces_batch_and_clears_selection() {
    let router = test_router();

    // First upload and select
    let response = router
        .clone()
        .oneshot(upload_request(&roster_workbook()))
        .await
        .unwrap();
    let upload = body_json(response).await;
    assert_eq!(upload["success"], true);

    let response = router.clone().oneshot(get("/api/v1/elements")).await.unwrap();
    let listing = body_json(response).await;
    let first_id = listing["data"]["elements"][0]["id"].as_str().unwrap().to_string();

    let request = Request::builder()
        .method("PUT")
        .uri(format!("/api/v1/element/select/{first_id}"))
        .body(Body::empty())
        .unwrap();
    router.clone().oneshot(request).await.unwrap();

    // Second upload replaces the batch wholesale
    let response = router
        .clone()
        .oneshot(upload_request(&roster_workbook()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = router
        .clone()
        .oneshot(get("/api/v1/element/selected"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Old ids are gone: every import generates fresh ones
    let request = Request::builder()
        .method("PUT")
        .uri(format!("/api/v1/element/select/{first_id}"))
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
