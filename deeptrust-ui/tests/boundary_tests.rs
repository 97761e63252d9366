//! HTTP boundary tests against a local stand-in for deeptrust-ai

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use deeptrust_common::api::AnalyzeImageRequest;
use deeptrust_common::Verdict;
use deeptrust_ui::config::ClientConfig;
use deeptrust_ui::{AnalysisBoundary, BoundaryError, HttpBoundary};
use serde_json::{json, Value};

async fn spawn(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn boundary(server_url: String) -> HttpBoundary {
    HttpBoundary::new(&ClientConfig {
        server_url,
        ..Default::default()
    })
    .unwrap()
}

/// Echoes the request body inside the summary so tests can inspect it
async fn analyze_ok(Json(body): Json<Value>) -> impl IntoResponse {
    Json(json!({
        "verdict": "Likely Real",
        "confidence": 64,
        "summary": body.to_string(),
        "issues": [{ "name": "Soft edges", "description": "Hair outline", "severity": "LOW" }],
        "clear": []
    }))
}

async fn analyze_no_image() -> impl IntoResponse {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": "No image provided" })))
}

async fn analyze_bare_500() -> impl IntoResponse {
    StatusCode::INTERNAL_SERVER_ERROR
}

#[tokio::test]
async fn test_success_decodes_result_and_sends_camel_case() {
    let url = spawn(Router::new().route("/analyze-image", post(analyze_ok))).await;

    let result = boundary(url)
        .analyze(AnalyzeImageRequest::inline("QUJD", Some("image/png".to_string())))
        .await
        .unwrap();

    assert_eq!(result.verdict, Verdict::LikelyReal);
    assert_eq!(result.issues.len(), 1);
    let sent: Value = serde_json::from_str(&result.summary).unwrap();
    assert_eq!(sent, json!({ "imageBase64": "QUJD", "imageMimeType": "image/png" }));
}

#[tokio::test]
async fn test_error_body_message_is_surfaced() {
    let url = spawn(Router::new().route("/analyze-image", post(analyze_no_image))).await;

    let err = boundary(url)
        .analyze(AnalyzeImageRequest::default())
        .await
        .unwrap_err();

    assert_eq!(
        err,
        BoundaryError::Service {
            status: 400,
            message: "No image provided".to_string()
        }
    );
}

#[tokio::test]
async fn test_bodyless_failure_falls_back_to_generic_message() {
    let url = spawn(Router::new().route("/analyze-image", post(analyze_bare_500))).await;

    let err = boundary(url)
        .analyze(AnalyzeImageRequest::remote("https://example.com/a.jpg"))
        .await
        .unwrap_err();

    assert_eq!(err.user_message(), "Something went wrong. Please try again.");
}

#[tokio::test]
async fn test_unreachable_service_is_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = boundary(format!("http://{addr}"))
        .analyze(AnalyzeImageRequest::remote("https://example.com/a.jpg"))
        .await
        .unwrap_err();

    assert!(matches!(err, BoundaryError::Transport(_)));
}
