//! HTTP response types.
//!
//! [`HttpResponse`] is what every handler returns; [`JsonResponse`] builds
//! one from a serializable value. Both convert into an axum response.

use axum::response::IntoResponse;
use http::{HeaderMap, HeaderValue, StatusCode};

use exchange_core::ExchangeError;

/// An HTTP response: status, headers, content type, and a body.
///
/// # Examples
///
/// ```
/// use exchange_http::HttpResponse;
///
/// let response = HttpResponse::ok("Hello, World!");
/// assert_eq!(response.status(), http::StatusCode::OK);
/// assert_eq!(response.text(), Some("Hello, World!"));
/// ```
#[derive(Clone)]
pub struct HttpResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
    charset: String,
    content_type: String,
}

impl std::fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .field("content_type", &self.content_type)
            .field("body_len", &self.body.len())
            .finish_non_exhaustive()
    }
}

impl HttpResponse {
    /// Creates a new `HttpResponse` with the given status code and text body.
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into().into_bytes(),
            charset: "utf-8".to_string(),
            content_type: "text/html".to_string(),
        }
    }

    /// Creates a 200 OK response with the given body.
    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(StatusCode::OK, body)
    }

    /// Creates a 404 Not Found response.
    pub fn not_found(body: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, body)
    }

    /// Creates a 400 Bad Request response.
    pub fn bad_request(body: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, body)
    }

    /// Creates a 500 Internal Server Error response.
    pub fn server_error(body: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, body)
    }

    /// Creates the 405 for `method`, listing `permitted_methods` in the
    /// `Allow` header.
    pub fn not_allowed(method: &str, permitted_methods: &[&str]) -> Self {
        let allow = permitted_methods.join(", ");
        let mut response = Self::from_error(&ExchangeError::MethodNotAllowed(format!(
            "{method} (permitted: {allow})"
        )));
        if let Ok(value) = HeaderValue::from_str(&allow) {
            response.headers.insert(http::header::ALLOW, value);
        }
        response
    }

    /// Builds the response for an error, using its status code and message.
    pub fn from_error(error: &ExchangeError) -> Self {
        let status = StatusCode::from_u16(error.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut response = Self::new(status, error.to_string());
        response.set_content_type("text/plain");
        response
    }

    /// Returns the status code.
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Sets the status code.
    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    /// Returns a reference to the headers.
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a mutable reference to the headers.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Returns the content type (without charset).
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Sets the content type.
    pub fn set_content_type(&mut self, content_type: impl Into<String>) {
        self.content_type = content_type.into();
    }

    /// Returns the raw body.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Drops the body, keeping status and headers.
    pub fn clear_body(&mut self) {
        self.body.clear();
    }

    /// Returns the body as UTF-8 text, if it is valid UTF-8.
    pub fn text(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }

    fn full_content_type(&self) -> String {
        if self.content_type.starts_with("text/") || self.content_type.contains("json") {
            format!("{}; charset={}", self.content_type, self.charset)
        } else {
            self.content_type.clone()
        }
    }
}

impl IntoResponse for HttpResponse {
    fn into_response(self) -> axum::response::Response {
        let content_type = self.full_content_type();
        let mut response = (self.status, self.body).into_response();

        if let Ok(ct) = HeaderValue::from_str(&content_type) {
            response.headers_mut().insert(http::header::CONTENT_TYPE, ct);
        }
        for (key, value) in &self.headers {
            response.headers_mut().insert(key, value.clone());
        }
        response
    }
}

/// A JSON response.
pub struct JsonResponse;

impl JsonResponse {
    /// Creates a 200 OK JSON response from a serializable value.
    ///
    /// Serialization failures produce a 500 response instead.
    pub fn new<T: serde::Serialize>(data: &T) -> HttpResponse {
        Self::with_status(StatusCode::OK, data)
    }

    /// Creates a JSON response with a custom status code.
    pub fn with_status<T: serde::Serialize>(status: StatusCode, data: &T) -> HttpResponse {
        match serde_json::to_string(data) {
            Ok(json) => {
                let mut response = HttpResponse::new(status, json);
                response.set_content_type("application/json");
                response
            }
            Err(e) => HttpResponse::server_error(format!("JSON serialization error: {e}")),
        }
    }
}
