//! HTTP request type.
//!
//! [`HttpRequest`] carries what a handler needs from an incoming request:
//! method, path, query string, headers, body, and the [`ResolverMatch`]
//! the router attached after resolving the path.

use http::{HeaderMap, Method};

use crate::urls::resolver::ResolverMatch;

/// An HTTP request as seen by route handlers.
///
/// # Examples
///
/// ```
/// use exchange_http::HttpRequest;
///
/// let request = HttpRequest::builder()
///     .method(http::Method::GET)
///     .path("/token/bitcoin-classic")
///     .query_string("currency=usd")
///     .build();
///
/// assert_eq!(request.method(), &http::Method::GET);
/// assert_eq!(request.path(), "/token/bitcoin-classic");
/// assert_eq!(request.get_full_path(), "/token/bitcoin-classic?currency=usd");
/// ```
#[derive(Debug)]
pub struct HttpRequest {
    method: Method,
    path: String,
    query_string: String,
    headers: HeaderMap,
    body: Vec<u8>,
    resolver_match: Option<ResolverMatch>,
}

impl HttpRequest {
    /// Creates a new [`HttpRequestBuilder`].
    pub fn builder() -> HttpRequestBuilder {
        HttpRequestBuilder::default()
    }

    /// Creates an `HttpRequest` from axum request parts and the collected body.
    pub fn from_axum(parts: http::request::Parts, body: Vec<u8>) -> Self {
        Self {
            method: parts.method,
            path: parts.uri.path().to_string(),
            query_string: parts.uri.query().unwrap_or("").to_string(),
            headers: parts.headers,
            body,
            resolver_match: None,
        }
    }

    /// Returns the HTTP method.
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request path (without query string).
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the raw query string (without the leading `?`).
    pub fn query_string(&self) -> &str {
        &self.query_string
    }

    /// Returns the request headers.
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the raw request body bytes.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Returns the resolver match, once the router has resolved the path.
    pub const fn resolver_match(&self) -> Option<&ResolverMatch> {
        self.resolver_match.as_ref()
    }

    /// Sets the resolver match on this request.
    pub fn set_resolver_match(&mut self, resolver_match: ResolverMatch) {
        self.resolver_match = Some(resolver_match);
    }

    /// Returns a keyword argument captured from the URL path.
    pub fn url_kwarg(&self, name: &str) -> Option<&str> {
        self.resolver_match
            .as_ref()
            .and_then(|m| m.kwargs.get(name))
            .map(String::as_str)
    }

    /// Returns the value of the `Host` header, or `None` when absent.
    ///
    /// `X-Forwarded-Host` is not consulted.
    pub fn get_host(&self) -> Option<&str> {
        self.headers
            .get(http::header::HOST)
            .and_then(|v| v.to_str().ok())
    }

    /// Returns the full path including the query string.
    pub fn get_full_path(&self) -> String {
        if self.query_string.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{}", self.path, self.query_string)
        }
    }
}

/// Builder for constructing [`HttpRequest`] instances in tests.
#[derive(Debug)]
pub struct HttpRequestBuilder {
    method: Method,
    path: String,
    query_string: String,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl Default for HttpRequestBuilder {
    fn default() -> Self {
        Self {
            method: Method::GET,
            path: "/".to_string(),
            query_string: String::new(),
            headers: HeaderMap::new(),
            body: Vec::new(),
        }
    }
}

impl HttpRequestBuilder {
    /// Sets the HTTP method.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Sets the request path.
    #[must_use]
    pub fn path(mut self, path: &str) -> Self {
        self.path = path.to_string();
        self
    }

    /// Sets the query string (without leading `?`).
    #[must_use]
    pub fn query_string(mut self, qs: &str) -> Self {
        self.query_string = qs.to_string();
        self
    }

    /// Adds a header. Invalid names or values are ignored.
    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            http::header::HeaderName::from_bytes(name.as_bytes()),
            http::header::HeaderValue::from_str(value),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Sets the request body.
    #[must_use]
    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    /// Builds the [`HttpRequest`].
    pub fn build(self) -> HttpRequest {
        HttpRequest {
            method: self.method,
            path: self.path,
            query_string: self.query_string,
            headers: self.headers,
            body: self.body,
            resolver_match: None,
        }
    }
}
