//! Request client core: GET, POST and multipart upload shorthands over a
//! host-provided transport.
//!
//! # Overview
//! `RequestClient` is bound to one URL and one response type. It builds
//! `HttpRequest` values and interprets `HttpResponse` values; the round trip
//! itself belongs to the host, either driven by the caller (`build_*` /
//! `parse_*`) or through a `Transport` that reports completion by callback.
//!
//! # Design
//! - Each request owns its own completion closure. A client can have any
//!   number of requests in flight without their callbacks interfering.
//! - Failures come back as `ApiError` (HTTP status, network, decode) and are
//!   logged through `tracing`; success callbacks only ever see 2xx bodies
//!   (exactly 200 for uploads).
//! - Multipart bodies travel as a `MultipartForm` so the transport can pick
//!   the boundary; `MultipartForm::encode` covers hosts that cannot.

pub mod client;
pub mod error;
pub mod form;
pub mod http;
pub mod types;

pub use client::{ErrorHandler, OpenRequest, RequestClient, RequestOutcome, StatusPolicy};
pub use error::ApiError;
pub use form::{FormPart, FormValue, MultipartForm};
pub use http::{Completion, HttpMethod, HttpRequest, HttpResponse, RequestBody, Transport, TransportError};
pub use types::{ClientOptions, FileUploadSpec, RequestData, ResponseBody, ResponseType};
