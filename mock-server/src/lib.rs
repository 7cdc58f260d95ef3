use axum::{
    body::Bytes,
    extract::{multipart::MultipartError, Multipart, Path},
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use uuid::Uuid;

/// What the upload endpoint saw, returned as the response body.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UploadReceipt {
    pub id: Uuid,
    /// Part names in the order they arrived.
    pub fields: Vec<String>,
    /// `filename` parameter of the `file` part.
    pub original_name: Option<String>,
    pub file_name: Option<String>,
    pub upload_directory: Option<String>,
    pub size: usize,
}

/// Port used when `PORT` is unset.
pub const DEFAULT_PORT: u16 = 4000;

/// Loopback address for `port`, or for `DEFAULT_PORT` when it is absent
/// or not a number.
pub fn bind_addr(port: Option<&str>) -> String {
    let port = port.and_then(|p| p.trim().parse::<u16>().ok()).unwrap_or(DEFAULT_PORT);
    format!("127.0.0.1:{port}")
}

pub fn app() -> Router {
    Router::new()
        .route("/api/", get(index).post(echo))
        .route("/api/text", get(plain_text))
        .route("/api/upload", post(upload))
        .route("/api/status/{code}", get(with_status).post(with_status))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "mock server listening");
    }
    axum::serve(listener, app()).await
}

async fn index() -> Json<Value> {
    Json(json!({ "method": "GET", "ok": true }))
}

async fn plain_text() -> &'static str {
    "plain text body"
}

/// Echo a POST body: parsed JSON under `received`, anything else as text
/// under `received_text`.
async fn echo(headers: HeaderMap, body: Bytes) -> Result<Json<Value>, (StatusCode, String)> {
    let is_json = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"));

    if is_json {
        let value: Value =
            serde_json::from_slice(&body).map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
        tracing::debug!(%value, "echoing json body");
        Ok(Json(json!({ "received": value })))
    } else {
        let text = String::from_utf8_lossy(&body);
        Ok(Json(json!({ "received_text": text })))
    }
}

async fn upload(mut multipart: Multipart) -> Result<Json<UploadReceipt>, (StatusCode, String)> {
    let mut receipt = UploadReceipt {
        id: Uuid::new_v4(),
        fields: Vec::new(),
        original_name: None,
        file_name: None,
        upload_directory: None,
        size: 0,
    };

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                receipt.original_name = field.file_name().map(str::to_string);
                receipt.size = field.bytes().await.map_err(multipart_error)?.len();
            }
            "file_name" => receipt.file_name = Some(field.text().await.map_err(multipart_error)?),
            "upload_directory" => {
                receipt.upload_directory = Some(field.text().await.map_err(multipart_error)?)
            }
            _ => {
                field.bytes().await.map_err(multipart_error)?;
            }
        }
        receipt.fields.push(name);
    }

    if !receipt.fields.iter().any(|f| f == "file") {
        return Err((StatusCode::BAD_REQUEST, "missing file part".to_string()));
    }
    tracing::info!(id = %receipt.id, size = receipt.size, "upload received");
    Ok(Json(receipt))
}

async fn with_status(Path(code): Path<u16>) -> Result<(StatusCode, Json<Value>), StatusCode> {
    let status = StatusCode::from_u16(code).map_err(|_| StatusCode::BAD_REQUEST)?;
    Ok((status, Json(json!({ "status": code }))))
}

fn multipart_error(err: MultipartError) -> (StatusCode, String) {
    (err.status(), err.body_text())
}
