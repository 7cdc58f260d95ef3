//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! These types describe HTTP requests and responses as plain data. The core
//! builds `HttpRequest` values and interprets `HttpResponse` values; the
//! actual round trip belongs to a `Transport` supplied by the host (a browser
//! request object, a native HTTP library, a C caller behind the FFI).
//!
//! Every dispatch hands the transport a fresh, owned completion closure.
//! Nothing about an in-flight request lives on the client, so two requests
//! issued from the same client never overwrite each other's handlers.

use std::fmt;
use std::str::FromStr;

use crate::error::ApiError;
use crate::form::MultipartForm;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            _ => Err(ApiError::UnsupportedMethod(s.to_string())),
        }
    }
}

/// Body of an outgoing request.
///
/// `Multipart` is handed to the transport as a form container: the
/// transport picks the boundary and writes the matching `Content-Type`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    Text(String),
    Multipart(MultipartForm),
}

impl RequestBody {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            RequestBody::Text(text) => Some(text),
            RequestBody::Multipart(_) => None,
        }
    }

    pub fn as_form(&self) -> Option<&MultipartForm> {
        match self {
            RequestBody::Multipart(form) => Some(form),
            RequestBody::Text(_) => None,
        }
    }
}

/// An HTTP request described as plain data.
///
/// Built by `RequestClient::build_*` and `OpenRequest::build`. The caller (or
/// a `Transport`) executes it and reports back an `HttpResponse`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<RequestBody>,
}

impl HttpRequest {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// An HTTP response described as plain data.
///
/// The body stays raw bytes; how it is decoded depends on the client's
/// `ResponseType`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }
}

/// Transport-level failure: the request never produced an HTTP status
/// (connection refused, DNS failure, aborted by the host).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct TransportError {
    message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Completion handler handed to a transport for exactly one request.
pub type Completion = Box<dyn FnOnce(Result<HttpResponse, TransportError>) + Send + 'static>;

/// The native request primitive that performs the network I/O.
///
/// `dispatch` must not block waiting for the response when the host has an
/// event loop; it sends and later invokes `on_complete` exactly once, either
/// with the full response or with a transport error.
pub trait Transport {
    fn dispatch(&self, request: HttpRequest, on_complete: Completion);
}

/// Blocking executors: any `Fn(HttpRequest) -> Result<HttpResponse, _>`
/// completes inline on the calling thread.
impl<F> Transport for F
where
    F: Fn(HttpRequest) -> Result<HttpResponse, TransportError>,
{
    fn dispatch(&self, request: HttpRequest, on_complete: Completion) {
        on_complete(self(request));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_parses_case_insensitively() {
        assert_eq!("get".parse::<HttpMethod>().unwrap(), HttpMethod::Get);
        assert_eq!("POST".parse::<HttpMethod>().unwrap(), HttpMethod::Post);
        assert!(matches!(
            "PATCH".parse::<HttpMethod>(),
            Err(ApiError::UnsupportedMethod(m)) if m == "PATCH"
        ));
    }

    #[test]
    fn header_lookup_ignores_case() {
        let req = HttpRequest {
            method: HttpMethod::Post,
            url: "http://x/api/".to_string(),
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: None,
        };
        assert_eq!(req.header("content-type"), Some("application/json"));
        assert_eq!(req.header("accept"), None);
    }

    #[test]
    fn closure_transport_completes_inline() {
        let transport = |req: HttpRequest| -> Result<HttpResponse, TransportError> {
            assert_eq!(req.method, HttpMethod::Get);
            Ok(HttpResponse::new(204, ""))
        };
        let (tx, rx) = std::sync::mpsc::channel();
        transport.dispatch(
            HttpRequest {
                method: HttpMethod::Get,
                url: "http://x/".to_string(),
                headers: Vec::new(),
                body: None,
            },
            Box::new(move |result| tx.send(result).unwrap()),
        );
        assert_eq!(rx.try_recv().unwrap().unwrap().status, 204);
    }
}
