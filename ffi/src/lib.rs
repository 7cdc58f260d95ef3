//! C-ABI wrapper around `requestx-core`.
//!
//! # Overview
//! Exposes the request client through `extern "C"` functions so a host
//! written in any language with a C FFI can build requests, run them on its
//! own network stack, and hand the responses back for interpretation.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - `rqx_build_*` / `rqx_parse_*` mirror the core's build/parse API 1:1.
//! - Upload requests come out fully encoded: the multipart boundary is
//!   chosen here and carried in the `Content-Type` header.
//! - A single `FfiOutcome` envelope conveys success bodies and errors.
//! - The C caller owns all returned pointers and must call the matching
//!   `rqx_free_*` function to release them.

pub mod types;

use std::ffi::CStr;
use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};

use requestx_core::{FileUploadSpec, HttpResponse, RequestClient, RequestData, StatusPolicy, TransportError};

use types::*;

/// Run `f`, turning a panic into `Err`. The client handle holds an error
/// handler trait object, so closures touching it are asserted unwind safe.
fn guard<T>(f: impl FnOnce() -> T) -> std::thread::Result<T> {
    catch_unwind(AssertUnwindSafe(f))
}

/// Borrow a C string, `None` for null or invalid UTF-8.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string.
unsafe fn str_arg<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

// ---------------------------------------------------------------------------
// Client lifecycle
// ---------------------------------------------------------------------------

/// Create a new `RequestClient` bound to `url`.
///
/// `response_type` is one of `""`, `"text"`, `"json"`, `"document"`,
/// `"blob"`, `"arraybuffer"`; null means `""`. Returns null if `url` is
/// null, if the response type is unknown, or if an internal panic occurs.
/// The caller must free the returned pointer with `rqx_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn rqx_client_new(url: *const c_char, response_type: *const c_char) -> *mut FfiRequestClient {
    guard(|| {
        let Some(url) = (unsafe { str_arg(url) }) else {
            return std::ptr::null_mut();
        };
        let response_type = if response_type.is_null() {
            ""
        } else {
            match unsafe { str_arg(response_type) } {
                Some(rt) => rt,
                None => return std::ptr::null_mut(),
            }
        };
        match RequestClient::create(url, response_type) {
            Ok(client) => Box::into_raw(Box::new(FfiRequestClient { inner: client })),
            Err(_) => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a `RequestClient` created by `rqx_client_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn rqx_client_free(client: *mut FfiRequestClient) {
    if !client.is_null() {
        let _ = guard(|| {
            drop(unsafe { Box::from_raw(client) });
        });
    }
}

// ---------------------------------------------------------------------------
// Build request functions
// ---------------------------------------------------------------------------

/// Build a GET request against the client's URL.
///
/// Returns null if `client` is null.
/// The caller must free the returned pointer with `rqx_free_request`.
#[unsafe(no_mangle)]
pub extern "C" fn rqx_build_get(client: *const FfiRequestClient) -> *mut FfiHttpRequest {
    guard(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        FfiHttpRequest::from_core(client.inner.build_get())
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Build a POST whose body is the JSON document `json`, with
/// `Content-Type: application/json`.
///
/// Returns null if `client` or `json` is null, or if `json` does not parse.
#[unsafe(no_mangle)]
pub extern "C" fn rqx_build_post_json(client: *const FfiRequestClient, json: *const c_char) -> *mut FfiHttpRequest {
    guard(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        let Some(json) = (unsafe { str_arg(json) }) else {
            return std::ptr::null_mut();
        };
        let Ok(value) = serde_json::from_str::<serde_json::Value>(json) else {
            return std::ptr::null_mut();
        };
        match client.inner.build_post(RequestData::Json(value)) {
            Ok(req) => FfiHttpRequest::from_core(req),
            Err(_) => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Build a POST whose body is `text`, sent verbatim with no headers.
///
/// Returns null if `client` or `text` is null.
#[unsafe(no_mangle)]
pub extern "C" fn rqx_build_post_text(client: *const FfiRequestClient, text: *const c_char) -> *mut FfiHttpRequest {
    guard(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        let Some(text) = (unsafe { str_arg(text) }) else {
            return std::ptr::null_mut();
        };
        match client.inner.build_post(text) {
            Ok(req) => FfiHttpRequest::from_core(req),
            Err(_) => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Build a multipart upload of `file_len` bytes at `file`, with the
/// `file`, `file_name` and `upload_directory` fields in that order.
///
/// `file` may be null only when `file_len` is 0. Returns null if `client`,
/// `file_name` or `upload_directory` is null.
#[unsafe(no_mangle)]
pub extern "C" fn rqx_build_upload(
    client: *const FfiRequestClient,
    file: *const u8,
    file_len: usize,
    file_name: *const c_char,
    upload_directory: *const c_char,
) -> *mut FfiHttpRequest {
    guard(|| {
        if client.is_null() || (file.is_null() && file_len > 0) {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        let (Some(file_name), Some(upload_directory)) =
            (unsafe { str_arg(file_name) }, unsafe { str_arg(upload_directory) })
        else {
            return std::ptr::null_mut();
        };
        let file = if file_len == 0 {
            Vec::new()
        } else {
            unsafe { std::slice::from_raw_parts(file, file_len) }.to_vec()
        };
        let spec = FileUploadSpec {
            file,
            file_name: file_name.to_string(),
            upload_directory: upload_directory.to_string(),
        };
        FfiHttpRequest::from_core(client.inner.build_upload(&spec))
    })
    .unwrap_or(std::ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Parse response functions
// ---------------------------------------------------------------------------

/// Convert an `FfiHttpResponse` to a core `HttpResponse`.
fn ffi_response_to_core(resp: &FfiHttpResponse) -> HttpResponse {
    let body = if resp.body.is_null() || resp.body_len == 0 {
        Vec::new()
    } else {
        unsafe { std::slice::from_raw_parts(resp.body, resp.body_len) }.to_vec()
    };
    HttpResponse::new(resp.status, body)
}

fn parse_with(
    client: *const FfiRequestClient,
    response: *const FfiHttpResponse,
    policy: StatusPolicy,
    context: &str,
) -> *mut FfiOutcome {
    guard(|| {
        if client.is_null() {
            return FfiOutcome::null_arg("client");
        }
        if response.is_null() {
            return FfiOutcome::null_arg("response");
        }
        let client = unsafe { &*client };
        let resp = unsafe { &*response };
        let status = resp.status;
        match client.inner.settle(Ok(ffi_response_to_core(resp)), policy) {
            Ok(body) => FfiOutcome::ok(body, status),
            Err(e) => FfiOutcome::from_error(e),
        }
    })
    .unwrap_or_else(|_| FfiOutcome::panic(&format!("panic in {context}")))
}

/// Parse the response to a GET or POST request. Success is any 2xx status.
#[unsafe(no_mangle)]
pub extern "C" fn rqx_parse_response(
    client: *const FfiRequestClient,
    response: *const FfiHttpResponse,
) -> *mut FfiOutcome {
    parse_with(client, response, StatusPolicy::AnySuccess, "rqx_parse_response")
}

/// Parse the response to an upload request. Success is status 200 only.
#[unsafe(no_mangle)]
pub extern "C" fn rqx_parse_upload_response(
    client: *const FfiRequestClient,
    response: *const FfiHttpResponse,
) -> *mut FfiOutcome {
    parse_with(client, response, StatusPolicy::ExactlyOk, "rqx_parse_upload_response")
}

/// Report that the host's transport failed before receiving a status.
///
/// Returns an outcome with `error_code = Network` carrying `message`
/// (null is reported as an unknown error).
#[unsafe(no_mangle)]
pub extern "C" fn rqx_network_error(client: *const FfiRequestClient, message: *const c_char) -> *mut FfiOutcome {
    guard(|| {
        if client.is_null() {
            return FfiOutcome::null_arg("client");
        }
        let client = unsafe { &*client };
        let message = unsafe { str_arg(message) }.unwrap_or("unknown transport error");
        match client
            .inner
            .settle(Err(TransportError::new(message)), StatusPolicy::AnySuccess)
        {
            Ok(body) => FfiOutcome::ok(body, 0),
            Err(e) => FfiOutcome::from_error(e),
        }
    })
    .unwrap_or_else(|_| FfiOutcome::panic("panic in rqx_network_error"))
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiHttpRequest` returned by any `rqx_build_*` function.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn rqx_free_request(req: *mut FfiHttpRequest) {
    if req.is_null() {
        return;
    }
    let _ = guard(|| {
        let req = unsafe { Box::from_raw(req) };
        if !req.url.is_null() {
            drop(unsafe { std::ffi::CString::from_raw(req.url) });
        }
        unsafe { free_raw_bytes(req.body, req.body_len) };
        if !req.headers.is_null() && req.headers_len > 0 {
            let headers = unsafe {
                Box::from_raw(std::ptr::slice_from_raw_parts_mut(
                    req.headers,
                    req.headers_len as usize,
                ))
            };
            for h in headers.iter() {
                if !h.key.is_null() {
                    drop(unsafe { std::ffi::CString::from_raw(h.key) });
                }
                if !h.value.is_null() {
                    drop(unsafe { std::ffi::CString::from_raw(h.value) });
                }
            }
        }
    });
}

/// Free an `FfiOutcome` returned by any `rqx_parse_*` function or
/// `rqx_network_error`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn rqx_free_outcome(outcome: *mut FfiOutcome) {
    if outcome.is_null() {
        return;
    }
    let _ = guard(|| {
        let outcome = unsafe { Box::from_raw(outcome) };
        if !outcome.error_message.is_null() {
            drop(unsafe { std::ffi::CString::from_raw(outcome.error_message) });
        }
        unsafe { free_raw_bytes(outcome.body, outcome.body_len) };
    });
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
