//! Request ID middleware tests.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use service_logger::http::{HttpServer, X_REQUEST_ID};
use service_logger::LoggingConfig;

mod common;

#[tokio::test]
async fn test_generated_request_id_tags_log_records() {
    let (logger, stdout) = common::capture_logger(&LoggingConfig::default());
    let _guard = logger.set_default();
    let app = HttpServer::new().router();

    let response = app
        .oneshot(Request::builder().uri("/hello").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let req_id = response
        .headers()
        .get(X_REQUEST_ID)
        .expect("response carries request id")
        .to_str()
        .unwrap()
        .to_string();
    assert_eq!(req_id.len(), 36);

    let lines = stdout.json_lines();
    let handled = lines.iter().find(|l| l["msg"] == "Handled request").unwrap();
    assert_eq!(handled["reqId"], req_id.as_str());
    assert_eq!(handled["path"], "/hello");
    assert!(handled["elapsed"].is_f64());
}

#[tokio::test]
async fn test_client_request_id_is_kept() {
    let (logger, stdout) = common::capture_logger(&LoggingConfig::default());
    let _guard = logger.set_default();
    let app = HttpServer::new().router();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/orders")
                .header(X_REQUEST_ID, "abc-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.headers()[X_REQUEST_ID], "abc-123");
    let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
    assert_eq!(&body[..], b"POST /orders\n");

    let lines = stdout.json_lines();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["reqId"], "abc-123");
    assert_eq!(lines[0]["method"], "POST");
}
