//! Request payloads, response bodies and client options.
//!
//! # Design
//! `RequestData` makes the body shape explicit instead of sniffing it at
//! send time: structured JSON is serialized by the client, text and forms
//! are sent as given. `ResponseBody` is the decoded counterpart, chosen by
//! the client's `ResponseType`.

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::form::MultipartForm;

/// How a response body is decoded, named after the native `responseType`
/// values. `Default` (the empty string) behaves like `Text`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    #[default]
    #[serde(rename = "")]
    Default,
    Text,
    Json,
    Document,
    Blob,
    #[serde(rename = "arraybuffer")]
    ArrayBuffer,
}

impl ResponseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseType::Default => "",
            ResponseType::Text => "text",
            ResponseType::Json => "json",
            ResponseType::Document => "document",
            ResponseType::Blob => "blob",
            ResponseType::ArrayBuffer => "arraybuffer",
        }
    }

    /// Decode a raw body the way the native transport would for this type.
    pub fn decode(&self, bytes: Vec<u8>) -> Result<ResponseBody, ApiError> {
        match self {
            ResponseType::Default | ResponseType::Text => {
                Ok(ResponseBody::Text(String::from_utf8_lossy(&bytes).into_owned()))
            }
            ResponseType::Json => {
                if bytes.iter().all(u8::is_ascii_whitespace) {
                    return Ok(ResponseBody::Json(serde_json::Value::Null));
                }
                serde_json::from_slice(&bytes)
                    .map(ResponseBody::Json)
                    .map_err(|e| ApiError::DeserializationError(e.to_string()))
            }
            ResponseType::Document => {
                Ok(ResponseBody::Document(String::from_utf8_lossy(&bytes).into_owned()))
            }
            ResponseType::Blob | ResponseType::ArrayBuffer => Ok(ResponseBody::Binary(bytes)),
        }
    }
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResponseType {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" => Ok(ResponseType::Default),
            "text" => Ok(ResponseType::Text),
            "json" => Ok(ResponseType::Json),
            "document" => Ok(ResponseType::Document),
            "blob" => Ok(ResponseType::Blob),
            "arraybuffer" => Ok(ResponseType::ArrayBuffer),
            other => Err(ApiError::UnsupportedResponseType(other.to_string())),
        }
    }
}

/// Payload handed to `RequestClient::request`.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestData {
    #[default]
    Empty,
    /// Serialized to JSON text with `Content-Type: application/json`.
    Json(serde_json::Value),
    /// Sent verbatim; the caller owns the `Content-Type`.
    Text(String),
    /// Sent as a multipart form container.
    Form(MultipartForm),
}

impl RequestData {
    /// Structured payload from any serializable value.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, ApiError> {
        serde_json::to_value(value)
            .map(RequestData::Json)
            .map_err(|e| ApiError::SerializationError(e.to_string()))
    }
}

impl From<serde_json::Value> for RequestData {
    fn from(value: serde_json::Value) -> Self {
        RequestData::Json(value)
    }
}

impl From<String> for RequestData {
    fn from(text: String) -> Self {
        RequestData::Text(text)
    }
}

impl From<&str> for RequestData {
    fn from(text: &str) -> Self {
        RequestData::Text(text.to_string())
    }
}

impl From<MultipartForm> for RequestData {
    fn from(form: MultipartForm) -> Self {
        RequestData::Form(form)
    }
}

/// A successful response body, typed by the client's `ResponseType`.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Text(String),
    Json(serde_json::Value),
    Document(String),
    Binary(Vec<u8>),
}

impl ResponseBody {
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            ResponseBody::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResponseBody::Text(text) | ResponseBody::Document(text) => Some(text),
            _ => None,
        }
    }

    /// Deserialize a JSON body into `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        match self {
            ResponseBody::Json(value) => serde_json::from_value(value.clone())
                .map_err(|e| ApiError::DeserializationError(e.to_string())),
            ResponseBody::Text(text) | ResponseBody::Document(text) => serde_json::from_str(text)
                .map_err(|e| ApiError::DeserializationError(e.to_string())),
            ResponseBody::Binary(bytes) => serde_json::from_slice(bytes)
                .map_err(|e| ApiError::DeserializationError(e.to_string())),
        }
    }
}

/// Input for `RequestClient::upload_file`. Not retained after the form is
/// built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUploadSpec {
    pub file: Vec<u8>,
    pub file_name: String,
    pub upload_directory: String,
}

impl FileUploadSpec {
    /// The upload form: `file`, `file_name`, `upload_directory`, in that
    /// order.
    pub fn to_form(&self) -> MultipartForm {
        let mut form = MultipartForm::new();
        form.append_file("file", self.file_name.clone(), self.file.clone())
            .append_text("file_name", self.file_name.clone())
            .append_text("upload_directory", self.upload_directory.clone());
        form
    }
}

/// Constructor options, shaped like `{ "url": ..., "response_type": ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientOptions {
    pub url: String,
    #[serde(default)]
    pub response_type: ResponseType,
}

impl ClientOptions {
    pub fn from_json(raw: &str) -> Result<Self, ApiError> {
        serde_json::from_str(raw).map_err(|e| ApiError::DeserializationError(e.to_string()))
    }
}
