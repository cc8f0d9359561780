//! HTTP server integration.
//!
//! [`ExchangeApp`] ties settings, system checks, and the URL table together
//! and serves them through axum. Every request runs inside a tracing span
//! tagged with a fresh request id, has its `Host` checked against
//! `ALLOWED_HOSTS`, and is then resolved against the URL table.
//!
//! # Examples
//!
//! ```no_run
//! use exchange_views::server::ExchangeApp;
//! use exchange_core::Settings;
//! use exchange_http::urls::{path, root};
//! use exchange_http::{HttpRequest, HttpResponse};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let handler = Arc::new(|_req: HttpRequest| -> exchange_http::BoxFuture {
//!     Box::pin(async { HttpResponse::ok("Hello!") })
//! });
//! let urls = root(vec![path("", handler, Some("home"))?.into()])?;
//!
//! let app = ExchangeApp::new(Settings::default()).urls(urls);
//! app.run("127.0.0.1:8000").await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::extract::Request;
use axum::response::IntoResponse;
use axum::routing::any;
use http::HeaderValue;
use percent_encoding::percent_decode_str;
use tracing::Instrument;

use exchange_core::checks::{raise_on_errors, CheckFn};
use exchange_core::logging::request_span;
use exchange_core::{CheckMessage, CheckRegistry, ExchangeError, ExchangeResult, Settings};
use exchange_http::urls::checks::check_url_config;
use exchange_http::urls::URLResolver;
use exchange_http::{HttpRequest, HttpResponse};

use crate::hosts::{effective_allowed_hosts, split_domain_port, validate_host, DEFAULT_HOST};

/// Response header carrying the request id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// The exchange application: settings, checks, and the URL table.
pub struct ExchangeApp {
    url_conf: Option<URLResolver>,
    settings: Settings,
    checks: CheckRegistry,
}

impl ExchangeApp {
    /// Creates an app with the built-in settings checks registered.
    pub fn new(settings: Settings) -> Self {
        Self {
            url_conf: None,
            settings,
            checks: CheckRegistry::with_builtins(),
        }
    }

    /// Sets the URL table.
    #[must_use]
    pub fn urls(mut self, url_conf: URLResolver) -> Self {
        self.url_conf = Some(url_conf);
        self
    }

    /// Registers an additional settings check.
    #[must_use]
    pub fn with_check(mut self, check: CheckFn, tags: &[&str]) -> Self {
        self.checks.register(check, tags);
        self
    }

    /// Returns the settings.
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Returns the URL table, if set.
    pub const fn url_conf(&self) -> Option<&URLResolver> {
        self.url_conf.as_ref()
    }

    /// Returns `true` if a URL table has been set.
    pub const fn has_urls(&self) -> bool {
        self.url_conf.is_some()
    }

    /// Runs the settings checks and the URL checks.
    pub fn check(&self) -> Vec<CheckMessage> {
        let mut messages = self.checks.run_checks(None, &self.settings);
        if let Some(url_conf) = &self.url_conf {
            messages.extend(check_url_config(url_conf));
        }
        messages
    }

    /// Converts the app into an axum router that answers every path.
    pub fn into_axum_router(self) -> axum::Router {
        let state = Arc::new(AppState {
            allowed_hosts: effective_allowed_hosts(&self.settings),
            url_conf: self.url_conf,
        });

        let handler = move |req: Request<Body>| {
            let state = Arc::clone(&state);
            async move { state.handle(req).await }
        };

        axum::Router::new()
            .route("/{*path}", any(handler.clone()))
            .route("/", any(handler))
    }

    /// Serves the app on `addr` until the server stops.
    ///
    /// # Errors
    ///
    /// Returns [`ExchangeError::ImproperlyConfigured`] when the system
    /// checks report errors or the address cannot be bound, and
    /// [`ExchangeError::InternalServerError`] if the server fails.
    pub async fn run(self, addr: &str) -> ExchangeResult<()> {
        raise_on_errors(&self.check())?;

        let debug = self.settings.debug;
        let router = self.into_axum_router();
        let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
            ExchangeError::ImproperlyConfigured(format!("Failed to bind to {addr}: {e}"))
        })?;

        if debug {
            tracing::info!("Starting development server at http://{addr}/");
        } else {
            tracing::info!(%addr, "Listening");
        }

        axum::serve(listener, router)
            .await
            .map_err(|e| ExchangeError::InternalServerError(format!("Server error: {e}")))
    }
}

impl std::fmt::Debug for ExchangeApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExchangeApp")
            .field("has_urls", &self.url_conf.is_some())
            .field("checks", &self.checks.len())
            .field("debug", &self.settings.debug)
            .finish()
    }
}

/// What each request task shares.
struct AppState {
    url_conf: Option<URLResolver>,
    allowed_hosts: Vec<String>,
}

impl AppState {
    async fn handle(&self, req: Request<Body>) -> axum::response::Response {
        let request_id = uuid::Uuid::new_v4().to_string();
        let span = request_span(&request_id, req.method().as_str(), req.uri().path());

        async move {
            let started = Instant::now();
            let mut response = self.respond(req).await;
            tracing::info!(
                status = response.status().as_u16(),
                elapsed = ?started.elapsed(),
                "request finished"
            );
            if let Ok(value) = HeaderValue::from_str(&request_id) {
                response.headers_mut().insert(REQUEST_ID_HEADER, value);
            }
            response.into_response()
        }
        .instrument(span)
        .await
    }

    async fn respond(&self, req: Request<Body>) -> HttpResponse {
        let (parts, body) = req.into_parts();
        let body = match axum::body::to_bytes(body, usize::MAX).await {
            Ok(bytes) => bytes.to_vec(),
            Err(e) => return HttpResponse::bad_request(format!("Unreadable request body: {e}")),
        };
        let mut request = HttpRequest::from_axum(parts, body);

        let host = request.get_host().unwrap_or(DEFAULT_HOST);
        if !validate_host(host, &self.allowed_hosts) {
            let (domain, _) = split_domain_port(host);
            let message = if domain.is_empty() {
                format!("Invalid HTTP_HOST header: '{host}'. The domain name provided is not valid.")
            } else {
                format!(
                    "Invalid HTTP_HOST header: '{host}'. You may need to add '{domain}' to ALLOWED_HOSTS."
                )
            };
            tracing::warn!("{message}");
            return HttpResponse::bad_request(message);
        }

        let Some(url_conf) = self.url_conf.as_ref() else {
            tracing::error!("No URL configuration provided");
            return HttpResponse::server_error("No URL configuration provided");
        };

        let path = match percent_decode_str(request.path()).decode_utf8() {
            Ok(decoded) => decoded.into_owned(),
            Err(_) => {
                tracing::warn!(path = request.path(), "request path is not valid UTF-8");
                return HttpResponse::bad_request("Request path is not valid UTF-8");
            }
        };
        // Routes are written without the leading slash.
        let path = path.strip_prefix('/').unwrap_or(&path);
        match url_conf.resolve(path) {
            Ok(resolver_match) => {
                tracing::debug!(view = %resolver_match.view_name(), "resolved");
                let handler = Arc::clone(&resolver_match.func);
                request.set_resolver_match(resolver_match);
                handler(request).await
            }
            Err(ExchangeError::NotFound(msg)) => HttpResponse::not_found(msg),
            Err(e) => HttpResponse::from_error(&e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exchange_core::CheckLevel;
    use exchange_http::urls::{path, root};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn echo_urls() -> URLResolver {
        let handler: exchange_http::RouteHandler = Arc::new(|req: HttpRequest| -> exchange_http::BoxFuture {
            Box::pin(async move {
                let slug = req.url_kwarg("slug").unwrap_or_default().to_string();
                HttpResponse::ok(slug)
            })
        });
        root(vec![path("token/<slug:slug>", handler, Some("token-detail")).unwrap().into()])
            .unwrap()
    }

    async fn send(router: axum::Router, uri: &str, host: Option<&str>) -> (u16, String) {
        let mut builder = http::Request::builder().uri(uri);
        if let Some(host) = host {
            builder = builder.header("host", host);
        }
        let response = router.oneshot(builder.body(Body::empty()).unwrap()).await.unwrap();
        let status = response.status().as_u16();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[test]
    fn test_app_new() {
        let app = ExchangeApp::new(Settings::default());
        assert!(!app.has_urls());
        assert!(app.url_conf().is_none());
        assert!(app.settings().debug);
        assert!(format!("{app:?}").contains("ExchangeApp"));
    }

    #[test]
    fn test_check_includes_url_checks() {
        let settings = Settings {
            debug: false,
            allowed_hosts: Vec::new(),
            ..Settings::default()
        };
        let app = ExchangeApp::new(settings).urls(echo_urls());
        let messages = app.check();
        assert!(messages.iter().any(|m| m.id.as_deref() == Some("security.E001")));
        assert!(messages.iter().any(|m| m.level >= CheckLevel::Error));
    }

    #[test]
    fn test_with_check() {
        let app = ExchangeApp::new(Settings::default()).with_check(
            |_| vec![CheckMessage::warning("custom", None, None, Some("trading.W001"))],
            &["trading"],
        );
        assert!(app.check().iter().any(|m| m.id.as_deref() == Some("trading.W001")));
    }

    #[tokio::test]
    async fn test_router_resolves_and_passes_slug() {
        let router = ExchangeApp::new(Settings::default()).urls(echo_urls()).into_axum_router();
        let (status, body) = send(router, "/token/bitcoin-classic", None).await;
        assert_eq!(status, 200);
        assert_eq!(body, "bitcoin-classic");
    }

    #[tokio::test]
    async fn test_router_404() {
        let router = ExchangeApp::new(Settings::default()).urls(echo_urls()).into_axum_router();
        assert_eq!(send(router.clone(), "/token/a/b", None).await.0, 404);
        assert_eq!(send(router, "/", None).await.0, 404);
    }

    #[tokio::test]
    async fn test_router_sets_request_id() {
        let router = ExchangeApp::new(Settings::default()).urls(echo_urls()).into_axum_router();
        let request = http::Request::builder().uri("/token/eth").body(Body::empty()).unwrap();
        let response = router.oneshot(request).await.unwrap();
        let id = response.headers().get(REQUEST_ID_HEADER).unwrap().to_str().unwrap();
        assert!(uuid::Uuid::parse_str(id).is_ok());
    }

    #[tokio::test]
    async fn test_router_decodes_path() {
        let router = ExchangeApp::new(Settings::default()).urls(echo_urls()).into_axum_router();
        let (status, body) = send(router.clone(), "/token/%65th", None).await;
        assert_eq!(status, 200);
        assert_eq!(body, "eth");
        assert_eq!(send(router.clone(), "/token/a%2Fb", None).await.0, 404);
        assert_eq!(send(router, "/token/%FF", None).await.0, 400);
    }

    #[tokio::test]
    async fn test_router_rejects_disallowed_host() {
        let settings = Settings {
            debug: false,
            allowed_hosts: vec!["exchange.example".to_string()],
            ..Settings::default()
        };
        let router = ExchangeApp::new(settings).urls(echo_urls()).into_axum_router();
        let (status, body) = send(router.clone(), "/token/eth", Some("evil.example")).await;
        assert_eq!(status, 400);
        assert!(body.contains("evil.example"));
        assert_eq!(send(router, "/token/eth", Some("exchange.example:443")).await.0, 200);
    }

    #[tokio::test]
    async fn test_router_without_urls_is_500() {
        let router = ExchangeApp::new(Settings::default()).into_axum_router();
        assert_eq!(send(router, "/token/eth", None).await.0, 500);
    }

    #[tokio::test]
    async fn test_run_refuses_to_start_on_check_errors() {
        let settings = Settings {
            debug: false,
            allowed_hosts: Vec::new(),
            ..Settings::default()
        };
        let err = ExchangeApp::new(settings)
            .urls(echo_urls())
            .run("127.0.0.1:0")
            .await
            .unwrap_err();
        assert!(matches!(err, ExchangeError::ImproperlyConfigured(_)));
        assert!(err.to_string().contains("security.E001"));
    }

    #[tokio::test]
    async fn test_run_invalid_address() {
        let result = ExchangeApp::new(Settings::default()).run("invalid-address").await;
        assert!(result.is_err());
    }
}
