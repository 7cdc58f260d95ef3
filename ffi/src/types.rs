//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type with C-compatible representations:
//! `*mut c_char` for strings, pointer + length for byte buffers and arrays,
//! and tagged enums with explicit discriminants. Byte buffers are boxed
//! slices so their length is the only thing needed to free them.
//! Conversion functions live here to keep `lib.rs` focused on the
//! `extern "C"` surface.

use std::ffi::CString;
use std::os::raw::c_char;

use requestx_core::{ApiError, HttpMethod, HttpRequest, MultipartForm, RequestBody, ResponseBody};

/// Opaque handle to a `RequestClient`. C callers receive a pointer to this
/// and pass it back into every FFI function.
pub struct FfiRequestClient {
    pub(crate) inner: requestx_core::RequestClient,
}

// ---------------------------------------------------------------------------
// Buffers
// ---------------------------------------------------------------------------

/// Convert a Rust string into an owned C string, dropping interior NULs.
pub(crate) fn into_c_string(s: String) -> *mut c_char {
    let c = CString::new(s).unwrap_or_else(|e| {
        let mut bytes = e.into_vec();
        bytes.retain(|&b| b != 0);
        CString::new(bytes).unwrap_or_default()
    });
    c.into_raw()
}

/// Leak a byte vector as `(ptr, len)`; null for an empty buffer.
pub(crate) fn into_raw_bytes(bytes: Vec<u8>) -> (*mut u8, usize) {
    if bytes.is_empty() {
        return (std::ptr::null_mut(), 0);
    }
    let len = bytes.len();
    let ptr = Box::into_raw(bytes.into_boxed_slice()) as *mut u8;
    (ptr, len)
}

/// Reclaim a buffer produced by `into_raw_bytes`.
///
/// # Safety
/// `ptr`/`len` must come from `into_raw_bytes` and not have been freed.
pub(crate) unsafe fn free_raw_bytes(ptr: *mut u8, len: usize) {
    if !ptr.is_null() && len > 0 {
        drop(unsafe { Box::from_raw(std::ptr::slice_from_raw_parts_mut(ptr, len)) });
    }
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// HTTP method as a C enum.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiHttpMethod {
    Get = 0,
    Post = 1,
}

impl From<HttpMethod> for FfiHttpMethod {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => FfiHttpMethod::Get,
            HttpMethod::Post => FfiHttpMethod::Post,
        }
    }
}

/// A single HTTP header as a key-value pair of C strings.
#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// An HTTP request described as C-compatible plain data.
///
/// Built by `rqx_build_*` functions. The C caller sends `body_len` bytes of
/// `body` with the listed headers, then passes the response back through
/// `rqx_parse_*`. Multipart bodies arrive already encoded, with the
/// boundary carried in the `Content-Type` header.
#[repr(C)]
pub struct FfiHttpRequest {
    pub method: FfiHttpMethod,
    pub url: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
    pub body: *mut u8,
    pub body_len: usize,
}

impl FfiHttpRequest {
    /// Convert a core `HttpRequest` into a heap-allocated `FfiHttpRequest`.
    pub(crate) fn from_core(req: HttpRequest) -> *mut Self {
        let HttpRequest {
            method,
            url,
            mut headers,
            body,
        } = req;

        let body = match body {
            None => Vec::new(),
            Some(RequestBody::Text(text)) => text.into_bytes(),
            Some(RequestBody::Multipart(form)) => {
                let boundary = MultipartForm::random_boundary();
                headers.push(("Content-Type".to_string(), MultipartForm::content_type(&boundary)));
                form.encode(&boundary)
            }
        };
        let (body, body_len) = into_raw_bytes(body);

        let headers_len = headers.len() as u32;
        let headers = if headers.is_empty() {
            std::ptr::null_mut()
        } else {
            let ffi_headers: Box<[FfiHeader]> = headers
                .into_iter()
                .map(|(k, v)| FfiHeader {
                    key: into_c_string(k),
                    value: into_c_string(v),
                })
                .collect();
            Box::into_raw(ffi_headers) as *mut FfiHeader
        };

        Box::into_raw(Box::new(FfiHttpRequest {
            method: method.into(),
            url: into_c_string(url),
            headers,
            headers_len,
            body,
            body_len,
        }))
    }
}

// ---------------------------------------------------------------------------
// Response input (caller-provided, not heap-allocated by us)
// ---------------------------------------------------------------------------

/// An HTTP response described as C-compatible plain data.
///
/// The C caller constructs this on the stack after executing a request and
/// passes a pointer to `rqx_parse_*`. The FFI layer reads but does not free
/// these fields. `body` may be null when `body_len` is 0.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: u16,
    pub body: *const u8,
    pub body_len: usize,
}

// ---------------------------------------------------------------------------
// Outcome types
// ---------------------------------------------------------------------------

/// Error codes returned in `FfiOutcome`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    Http = 1,
    Network = 2,
    Deserialization = 3,
    Serialization = 4,
    InvalidArgument = 5,
    Panic = 6,
    NullArg = 7,
}

/// Tells the caller how to read `FfiOutcome::body`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiBodyTag {
    None = 0,
    Text = 1,
    /// JSON text, re-serialized from the decoded value.
    Json = 2,
    Document = 3,
    Binary = 4,
}

/// Result envelope for all parse operations.
///
/// On success `error_code` is `Ok`, `error_message` is null, and `body`
/// holds `body_len` bytes tagged by `body_tag`. On failure `error_code`
/// describes the category, `error_message` is a human-readable C string,
/// `http_status` is set for HTTP errors, and `body` is null.
#[repr(C)]
pub struct FfiOutcome {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub http_status: u16,
    pub body_tag: FfiBodyTag,
    pub body: *mut u8,
    pub body_len: usize,
}

impl FfiOutcome {
    fn boxed(error_code: FfiErrorCode, message: Option<String>, http_status: u16) -> *mut Self {
        Box::into_raw(Box::new(FfiOutcome {
            error_code,
            error_message: message.map(into_c_string).unwrap_or(std::ptr::null_mut()),
            http_status,
            body_tag: FfiBodyTag::None,
            body: std::ptr::null_mut(),
            body_len: 0,
        }))
    }

    /// Build a success result carrying a decoded body.
    pub(crate) fn ok(body: ResponseBody, http_status: u16) -> *mut Self {
        let (body_tag, bytes) = match body {
            ResponseBody::Text(text) => (FfiBodyTag::Text, text.into_bytes()),
            ResponseBody::Json(value) => (FfiBodyTag::Json, value.to_string().into_bytes()),
            ResponseBody::Document(markup) => (FfiBodyTag::Document, markup.into_bytes()),
            ResponseBody::Binary(bytes) => (FfiBodyTag::Binary, bytes),
        };
        let (body, body_len) = into_raw_bytes(bytes);
        Box::into_raw(Box::new(FfiOutcome {
            error_code: FfiErrorCode::Ok,
            error_message: std::ptr::null_mut(),
            http_status,
            body_tag,
            body,
            body_len,
        }))
    }

    /// Build an error result from an `ApiError`.
    pub(crate) fn from_error(err: ApiError) -> *mut Self {
        let (error_code, http_status) = match &err {
            ApiError::HttpError { status, .. } => (FfiErrorCode::Http, *status),
            ApiError::NetworkError(_) => (FfiErrorCode::Network, 0),
            ApiError::DeserializationError(_) => (FfiErrorCode::Deserialization, 0),
            ApiError::SerializationError(_) => (FfiErrorCode::Serialization, 0),
            ApiError::UnsupportedResponseType(_)
            | ApiError::UnsupportedMethod(_)
            | ApiError::InvalidHeader { .. } => (FfiErrorCode::InvalidArgument, 0),
        };
        Self::boxed(error_code, Some(err.to_string()), http_status)
    }

    /// Build an error result for a null argument.
    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::boxed(FfiErrorCode::NullArg, Some(format!("null argument: {name}")), 0)
    }

    /// Build an error result for a caught panic.
    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::boxed(FfiErrorCode::Panic, Some(msg.to_string()), 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interior_nul_is_dropped() {
        let ptr = into_c_string("a\0b".to_string());
        let s = unsafe { CString::from_raw(ptr) };
        assert_eq!(s.to_str().unwrap(), "ab");
    }

    #[test]
    fn empty_buffer_is_null() {
        let (ptr, len) = into_raw_bytes(Vec::new());
        assert!(ptr.is_null());
        assert_eq!(len, 0);
    }

    #[test]
    fn buffer_roundtrips() {
        let (ptr, len) = into_raw_bytes(vec![1, 2, 3]);
        assert_eq!(unsafe { std::slice::from_raw_parts(ptr, len) }, &[1, 2, 3]);
        unsafe { free_raw_bytes(ptr, len) };
    }
}
