use axum::body::Body;
use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, UploadReceipt};
use serde_json::{json, Value};
use tower::ServiceExt;

const BOUNDARY: &str = "test-boundary";

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn multipart_request(parts: &[(&str, Option<&str>, &str)]) -> Request<Body> {
    let mut body = String::new();
    for (name, filename, value) in parts {
        body.push_str(&format!("--{BOUNDARY}\r\n"));
        match filename {
            Some(filename) => body.push_str(&format!(
                "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n"
            )),
            None => body.push_str(&format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n")),
        }
        body.push_str(value);
        body.push_str("\r\n");
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));

    Request::builder()
        .method("POST")
        .uri("/api/upload")
        .header(
            http::header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

// --- index / echo ---

#[tokio::test]
async fn get_index_returns_json() {
    let resp = app()
        .oneshot(Request::builder().uri("/api/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = body_json(resp).await;
    assert_eq!(body["method"], "GET");
}

#[tokio::test]
async fn post_json_is_echoed() {
    let resp = app()
        .oneshot(json_request("POST", "/api/", r#"{"action":"drop_table"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = body_json(resp).await;
    assert_eq!(body["received"], json!({"action": "drop_table"}));
}

#[tokio::test]
async fn post_text_is_echoed_verbatim() {
    let resp = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/")
                .header(http::header::CONTENT_TYPE, "text/plain")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = body_json(resp).await;
    assert_eq!(body["received_text"], "{not json");
}

#[tokio::test]
async fn post_malformed_json_returns_400() {
    let resp = app()
        .oneshot(json_request("POST", "/api/", "{broken"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn text_endpoint_is_plain() {
    let resp = app()
        .oneshot(Request::builder().uri("/api/text").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_bytes(resp).await, "plain text body");
}

// --- upload ---

#[tokio::test]
async fn upload_reports_fields_in_order() {
    let resp = app()
        .oneshot(multipart_request(&[
            ("file", Some("TEST.jpg"), "jpeg"),
            ("file_name", None, "TEST.jpg"),
            ("upload_directory", None, "../../"),
        ]))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let receipt: UploadReceipt = body_json(resp).await;
    assert_eq!(receipt.fields, vec!["file", "file_name", "upload_directory"]);
    assert_eq!(receipt.original_name.as_deref(), Some("TEST.jpg"));
    assert_eq!(receipt.file_name.as_deref(), Some("TEST.jpg"));
    assert_eq!(receipt.upload_directory.as_deref(), Some("../../"));
    assert_eq!(receipt.size, 4);
}

#[tokio::test]
async fn upload_without_file_part_returns_400() {
    let resp = app()
        .oneshot(multipart_request(&[("file_name", None, "x.txt")]))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn upload_requires_multipart_content_type() {
    let resp = app()
        .oneshot(json_request("POST", "/api/upload", "{}"))
        .await
        .unwrap();

    assert!(resp.status().is_client_error());
}

// --- status ---

#[tokio::test]
async fn status_endpoint_uses_requested_code() {
    for code in [200u16, 201, 404, 503] {
        let resp = app()
            .oneshot(
                Request::builder()
                    .uri(format!("/api/status/{code}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), code);
        let body: Value = body_json(resp).await;
        assert_eq!(body["status"], code);
    }
}

#[tokio::test]
async fn status_endpoint_rejects_invalid_code() {
    let resp = app()
        .oneshot(
            Request::builder()
                .uri("/api/status/42")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_route_is_404() {
    let resp = app()
        .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
