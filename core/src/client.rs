//! Request client bound to one URL and one response type.
//!
//! # Design
//! `RequestClient` holds only its URL, response type and an optional error
//! handler. It never owns an in-flight request: every call either builds an
//! `HttpRequest` value (`build_*`) for the caller to execute and hand back to
//! `parse_*`, or dispatches that value through a `Transport` together with a
//! completion closure owned by that single call.
//!
//! Headers can only be set on an `OpenRequest`, the state between choosing a
//! method and sending, which is where the native transport accepts them.
//!
//! Generic requests succeed on any 2xx status. Uploads succeed on 200 only;
//! the two thresholds are kept distinct per operation as `StatusPolicy`.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, warn};

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, RequestBody, Transport, TransportError};
use crate::types::{ClientOptions, FileUploadSpec, RequestData, ResponseBody, ResponseType};

const CONTENT_TYPE: &str = "Content-Type";
const APPLICATION_JSON: &str = "application/json";

/// Result of one request: the decoded body, or why there is none.
pub type RequestOutcome = Result<ResponseBody, ApiError>;

/// Handler registered through `RequestClient::error`.
pub type ErrorHandler = Arc<dyn Fn(&ApiError) + Send + Sync + 'static>;

/// Which status codes count as success for an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusPolicy {
    /// Any status in `200..300`.
    AnySuccess,
    /// Status `200` only.
    ExactlyOk,
}

impl StatusPolicy {
    pub fn accepts(&self, status: u16) -> bool {
        match self {
            StatusPolicy::AnySuccess => (200..300).contains(&status),
            StatusPolicy::ExactlyOk => status == 200,
        }
    }
}

#[derive(Clone)]
pub struct RequestClient {
    url: String,
    response_type: ResponseType,
    on_error: Option<ErrorHandler>,
}

impl fmt::Debug for RequestClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestClient")
            .field("url", &self.url)
            .field("response_type", &self.response_type)
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

impl RequestClient {
    pub fn new(url: &str, response_type: ResponseType) -> Self {
        Self {
            url: url.to_string(),
            response_type,
            on_error: None,
        }
    }

    /// Construct from a response type name (`"json"`, `"text"`, ...).
    pub fn create(url: &str, response_type: &str) -> Result<Self, ApiError> {
        Ok(Self::new(url, response_type.parse()?))
    }

    pub fn from_options(options: ClientOptions) -> Self {
        Self {
            url: options.url,
            response_type: options.response_type,
            on_error: None,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn response_type(&self) -> ResponseType {
        self.response_type
    }

    /// Register a handler called with every failure of requests dispatched
    /// by this client. Undecodable 2xx bodies only count as failures on
    /// `send` and `dispatch`.
    /// Replaces any previously registered handler.
    pub fn error<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(&ApiError) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(handler));
        self
    }

    /// Start a request: the returned value accepts headers until it is built
    /// or sent.
    pub fn open(&self, method: HttpMethod) -> OpenRequest<'_> {
        OpenRequest {
            client: self,
            method,
            headers: Vec::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Build / parse
    // -----------------------------------------------------------------------

    pub fn build_request(&self, method: HttpMethod, data: RequestData) -> Result<HttpRequest, ApiError> {
        self.open(method).build(data)
    }

    pub fn build_get(&self) -> HttpRequest {
        self.open(HttpMethod::Get).finish(None)
    }

    pub fn build_post(&self, data: impl Into<RequestData>) -> Result<HttpRequest, ApiError> {
        self.open(HttpMethod::Post).build(data.into())
    }

    /// POST carrying the `file`, `file_name`, `upload_directory` form. No
    /// `Content-Type` is set here; the transport writes it with the boundary.
    pub fn build_upload(&self, spec: &FileUploadSpec) -> HttpRequest {
        self.open(HttpMethod::Post)
            .finish(Some(RequestBody::Multipart(spec.to_form())))
    }

    /// Interpret the response to a `build_request` / `build_get` /
    /// `build_post` request. Success is any 2xx status.
    pub fn parse_response(&self, response: HttpResponse) -> RequestOutcome {
        self.settle(Ok(response), StatusPolicy::AnySuccess)
    }

    /// Interpret the response to a `build_upload` request. Success is
    /// status 200 only.
    pub fn parse_upload_response(&self, response: HttpResponse) -> RequestOutcome {
        self.settle(Ok(response), StatusPolicy::ExactlyOk)
    }

    /// Interpret whatever the host's transport reported, a response or a
    /// transport error. Failures are logged; the error handler is not called.
    pub fn settle(&self, result: Result<HttpResponse, TransportError>, policy: StatusPolicy) -> RequestOutcome {
        interpret(&self.url, self.response_type, policy, result)
    }

    // -----------------------------------------------------------------------
    // Callback surface
    // -----------------------------------------------------------------------

    /// Issue `method` against the bound URL and call `on_success` with the
    /// decoded body if the status is 2xx. A 2xx body that does not decode as
    /// JSON arrives as `Json(Null)`. Failures are logged and passed to the
    /// registered error handler, never to `on_success`.
    pub fn request<T, F>(
        &self,
        transport: &T,
        method: HttpMethod,
        data: impl Into<RequestData>,
        on_success: F,
    ) -> Result<(), ApiError>
    where
        T: Transport + ?Sized,
        F: FnOnce(ResponseBody) + Send + 'static,
    {
        self.open(method).send(transport, data, on_success)
    }

    pub fn post<T, F>(&self, transport: &T, data: impl Into<RequestData>, on_success: F) -> Result<(), ApiError>
    where
        T: Transport + ?Sized,
        F: FnOnce(ResponseBody) + Send + 'static,
    {
        self.request(transport, HttpMethod::Post, data, on_success)
    }

    pub fn get<T, F>(&self, transport: &T, on_success: F)
    where
        T: Transport + ?Sized,
        F: FnOnce(ResponseBody) + Send + 'static,
    {
        let request = self.build_get();
        self.route(
            transport,
            request,
            StatusPolicy::AnySuccess,
            UndecodableBody::AsNull,
            success_only(on_success),
        );
    }

    /// Upload `spec` as a multipart POST. `on_success` fires on status 200
    /// only.
    pub fn upload_file<T, F>(&self, transport: &T, spec: &FileUploadSpec, on_success: F)
    where
        T: Transport + ?Sized,
        F: FnOnce(ResponseBody) + Send + 'static,
    {
        let request = self.build_upload(spec);
        self.route(
            transport,
            request,
            StatusPolicy::ExactlyOk,
            UndecodableBody::AsNull,
            success_only(on_success),
        );
    }

    /// Like `request`, but delivers the full outcome, failures included.
    pub fn send<T, F>(
        &self,
        transport: &T,
        method: HttpMethod,
        data: impl Into<RequestData>,
        on_complete: F,
    ) -> Result<(), ApiError>
    where
        T: Transport + ?Sized,
        F: FnOnce(RequestOutcome) + Send + 'static,
    {
        let request = self.build_request(method, data.into())?;
        self.dispatch(transport, request, StatusPolicy::AnySuccess, on_complete);
        Ok(())
    }

    /// Hand a built request to `transport`. `on_complete` is owned by this
    /// request alone and runs exactly once, after the error handler.
    pub fn dispatch<T, F>(&self, transport: &T, request: HttpRequest, policy: StatusPolicy, on_complete: F)
    where
        T: Transport + ?Sized,
        F: FnOnce(RequestOutcome) + Send + 'static,
    {
        self.route(transport, request, policy, UndecodableBody::Fail, on_complete);
    }

    fn route<T, F>(
        &self,
        transport: &T,
        request: HttpRequest,
        policy: StatusPolicy,
        undecodable: UndecodableBody,
        on_complete: F,
    ) where
        T: Transport + ?Sized,
        F: FnOnce(RequestOutcome) + Send + 'static,
    {
        let url = self.url.clone();
        let response_type = self.response_type;
        let on_error = self.on_error.clone();

        debug!(method = %request.method, url = %url, "dispatching request");
        transport.dispatch(
            request,
            Box::new(move |result| {
                let mut outcome = interpret(&url, response_type, policy, result);
                if undecodable == UndecodableBody::AsNull
                    && matches!(outcome, Err(ApiError::DeserializationError(_)))
                {
                    outcome = Ok(ResponseBody::Json(Value::Null));
                }
                if let (Err(err), Some(handler)) = (&outcome, &on_error) {
                    handler(err);
                }
                on_complete(outcome);
            }),
        );
    }
}

/// A request whose method is chosen but which has not been sent yet.
#[derive(Debug)]
pub struct OpenRequest<'c> {
    client: &'c RequestClient,
    method: HttpMethod,
    headers: Vec<(String, String)>,
}

impl<'c> OpenRequest<'c> {
    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Set a request header. Setting a name that is already present appends
    /// the value to the existing one, comma separated.
    pub fn set_header(&mut self, name: &str, value: &str) -> Result<&mut Self, ApiError> {
        validate_header(name, value)?;
        match self.headers.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(name)) {
            Some((_, existing)) => {
                existing.push_str(", ");
                existing.push_str(value);
            }
            None => self.headers.push((name.to_string(), value.to_string())),
        }
        Ok(self)
    }

    /// Produce the request. GET never carries a body; POST bodies follow
    /// the shape of `data`.
    pub fn build(mut self, data: RequestData) -> Result<HttpRequest, ApiError> {
        let body = match (self.method, data) {
            (HttpMethod::Get, RequestData::Empty) => None,
            (HttpMethod::Get, _) => {
                debug!(url = %self.client.url, "ignoring payload on GET request");
                None
            }
            (HttpMethod::Post, RequestData::Empty) => None,
            (HttpMethod::Post, RequestData::Json(value)) => {
                let text =
                    serde_json::to_string(&value).map_err(|e| ApiError::SerializationError(e.to_string()))?;
                if !self.has_header(CONTENT_TYPE) {
                    self.headers
                        .push((CONTENT_TYPE.to_string(), APPLICATION_JSON.to_string()));
                }
                Some(RequestBody::Text(text))
            }
            (HttpMethod::Post, RequestData::Text(text)) => Some(RequestBody::Text(text)),
            (HttpMethod::Post, RequestData::Form(form)) => Some(RequestBody::Multipart(form)),
        };
        Ok(self.finish(body))
    }

    /// Build and dispatch, calling `on_success` only on a 2xx status.
    pub fn send<T, F>(self, transport: &T, data: impl Into<RequestData>, on_success: F) -> Result<(), ApiError>
    where
        T: Transport + ?Sized,
        F: FnOnce(ResponseBody) + Send + 'static,
    {
        let client = self.client;
        let request = self.build(data.into())?;
        client.route(
            transport,
            request,
            StatusPolicy::AnySuccess,
            UndecodableBody::AsNull,
            success_only(on_success),
        );
        Ok(())
    }

    fn has_header(&self, name: &str) -> bool {
        self.headers.iter().any(|(k, _)| k.eq_ignore_ascii_case(name))
    }

    fn finish(self, body: Option<RequestBody>) -> HttpRequest {
        HttpRequest {
            method: self.method,
            url: self.client.url.clone(),
            headers: self.headers,
            body,
        }
    }
}

/// What a 2xx body that fails to decode turns into. The success callbacks
/// receive JSON null, as the native transport hands `onload` a null
/// `response`; the outcome surface reports it as `DeserializationError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UndecodableBody {
    Fail,
    AsNull,
}

/// Adapt a success-only callback to the outcome callback shape.
fn success_only<F>(on_success: F) -> impl FnOnce(RequestOutcome) + Send + 'static
where
    F: FnOnce(ResponseBody) + Send + 'static,
{
    move |outcome| {
        if let Ok(body) = outcome {
            on_success(body);
        }
    }
}

/// Turn what the transport reported into an outcome, logging every failure.
fn interpret(
    url: &str,
    response_type: ResponseType,
    policy: StatusPolicy,
    result: Result<HttpResponse, TransportError>,
) -> RequestOutcome {
    let response = match result {
        Ok(response) => response,
        Err(err) => {
            error!(url, error = %err, "request failed before a response was received");
            return Err(err.into());
        }
    };

    if !policy.accepts(response.status) {
        warn!(url, status = response.status, "request completed with non-success status");
        return Err(ApiError::HttpError {
            status: response.status,
            body: String::from_utf8_lossy(&response.body).into_owned(),
        });
    }

    response_type.decode(response.body).inspect_err(|err| {
        warn!(url, error = %err, "response body could not be decoded");
    })
}

/// Reject names that are not HTTP tokens and values that could split the
/// header block.
fn validate_header(name: &str, value: &str) -> Result<(), ApiError> {
    let invalid = |reason| ApiError::InvalidHeader {
        name: name.to_string(),
        reason,
    };
    if name.is_empty() {
        return Err(invalid("empty name"));
    }
    let is_token = |c: char| c.is_ascii_alphanumeric() || "!#$%&'*+-.^_`|~".contains(c);
    if !name.chars().all(is_token) {
        return Err(invalid("name is not a token"));
    }
    if value.contains(['\r', '\n', '\0']) {
        return Err(invalid("value contains a line break or NUL"));
    }
    Ok(())
}
