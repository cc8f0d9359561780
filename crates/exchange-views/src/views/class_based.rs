//! Class-based views.
//!
//! A type implementing [`View`] overrides the handlers for the HTTP methods
//! it supports; everything else answers 405. [`View::as_view`] turns the
//! view into a [`RouteHandler`] that a URL pattern can point at.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use http::Method;

use exchange_http::{HttpRequest, HttpResponse, RouteHandler};

/// The base trait for class-based views.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use exchange_views::views::class_based::View;
/// use exchange_http::{HttpRequest, HttpResponse};
///
/// struct Ping;
///
/// #[async_trait]
/// impl View for Ping {
///     async fn get(&self, _request: HttpRequest) -> HttpResponse {
///         HttpResponse::ok("pong")
///     }
/// }
///
/// let handler = Ping.as_view();
/// ```
#[async_trait]
pub trait View: Send + Sync {
    /// The methods this view answers. Requests with any other method get
    /// a 405 before reaching a handler.
    ///
    /// Views that override `post`, `put`, and so on must list those methods
    /// here as well.
    fn allowed_methods(&self) -> Vec<Method> {
        vec![Method::GET, Method::HEAD, Method::OPTIONS]
    }

    /// Routes the request to the handler for its method.
    async fn dispatch(&self, request: HttpRequest) -> HttpResponse {
        if !self.allowed_methods().contains(request.method()) {
            return self.http_method_not_allowed(request).await;
        }
        match *request.method() {
            Method::GET => self.get(request).await,
            Method::POST => self.post(request).await,
            Method::PUT => self.put(request).await,
            Method::PATCH => self.patch(request).await,
            Method::DELETE => self.delete(request).await,
            Method::HEAD => self.head(request).await,
            Method::OPTIONS => self.options(request).await,
            _ => self.http_method_not_allowed(request).await,
        }
    }

    /// Handles GET requests. Returns 405 by default.
    async fn get(&self, request: HttpRequest) -> HttpResponse {
        self.http_method_not_allowed(request).await
    }

    /// Handles POST requests. Returns 405 by default.
    async fn post(&self, request: HttpRequest) -> HttpResponse {
        self.http_method_not_allowed(request).await
    }

    /// Handles PUT requests. Returns 405 by default.
    async fn put(&self, request: HttpRequest) -> HttpResponse {
        self.http_method_not_allowed(request).await
    }

    /// Handles PATCH requests. Returns 405 by default.
    async fn patch(&self, request: HttpRequest) -> HttpResponse {
        self.http_method_not_allowed(request).await
    }

    /// Handles DELETE requests. Returns 405 by default.
    async fn delete(&self, request: HttpRequest) -> HttpResponse {
        self.http_method_not_allowed(request).await
    }

    /// Handles HEAD requests: the GET response without its body.
    async fn head(&self, request: HttpRequest) -> HttpResponse {
        let mut response = self.get(request).await;
        response.clear_body();
        response
    }

    /// Answers with an empty 200 and the `Allow` header.
    async fn options(&self, _request: HttpRequest) -> HttpResponse {
        let mut response = HttpResponse::ok("");
        if let Ok(value) = http::header::HeaderValue::from_str(&self.allow_header()) {
            response.headers_mut().insert(http::header::ALLOW, value);
        }
        response
    }

    /// Returns a 405 with the `Allow` header.
    async fn http_method_not_allowed(&self, request: HttpRequest) -> HttpResponse {
        tracing::warn!(
            method = %request.method(),
            path = request.path(),
            "Method Not Allowed"
        );
        let methods = self.allowed_methods();
        let names: Vec<&str> = methods.iter().map(Method::as_str).collect();
        HttpResponse::not_allowed(request.method().as_str(), &names)
    }

    /// The `Allow` header value for this view.
    fn allow_header(&self) -> String {
        self.allowed_methods()
            .iter()
            .map(Method::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Wraps the view in a [`RouteHandler`] for use in a URL pattern.
    #[allow(clippy::wrong_self_convention)]
    fn as_view(self) -> RouteHandler
    where
        Self: Sized + 'static,
    {
        let view = Arc::new(self);
        Arc::new(move |request: HttpRequest| -> exchange_http::BoxFuture {
            let view = Arc::clone(&view);
            Box::pin(async move { view.dispatch(request).await })
        })
    }
}

/// Supplies extra context for a view's response.
pub trait ContextMixin {
    /// Returns context entries. `kwargs` are the keyword arguments the URL
    /// resolver captured.
    fn get_context_data(&self, kwargs: &HashMap<String, String>) -> HashMap<String, serde_json::Value> {
        let _ = kwargs;
        HashMap::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Ping;

    #[async_trait]
    impl View for Ping {
        async fn get(&self, _request: HttpRequest) -> HttpResponse {
            HttpResponse::ok("pong")
        }
    }

    struct Echo;

    #[async_trait]
    impl View for Echo {
        fn allowed_methods(&self) -> Vec<Method> {
            vec![Method::GET, Method::POST]
        }

        async fn get(&self, _request: HttpRequest) -> HttpResponse {
            HttpResponse::ok("get")
        }

        async fn post(&self, request: HttpRequest) -> HttpResponse {
            HttpResponse::ok(String::from_utf8_lossy(request.body()).into_owned())
        }
    }

    fn request(method: Method) -> HttpRequest {
        HttpRequest::builder().method(method).path("/ping").build()
    }

    #[tokio::test]
    async fn test_get() {
        let response = Ping.dispatch(request(Method::GET)).await;
        assert_eq!(response.status(), http::StatusCode::OK);
        assert_eq!(response.text(), Some("pong"));
    }

    #[tokio::test]
    async fn test_head_drops_body() {
        let response = Ping.dispatch(request(Method::HEAD)).await;
        assert_eq!(response.status(), http::StatusCode::OK);
        assert!(response.body().is_empty());
    }

    #[tokio::test]
    async fn test_options_lists_methods() {
        let response = Ping.dispatch(request(Method::OPTIONS)).await;
        assert_eq!(response.status(), http::StatusCode::OK);
        assert_eq!(
            response.headers().get(http::header::ALLOW).unwrap(),
            "GET, HEAD, OPTIONS"
        );
    }

    #[tokio::test]
    async fn test_unlisted_method_is_405() {
        for method in [Method::POST, Method::DELETE, Method::TRACE] {
            let response = Ping.dispatch(request(method.clone())).await;
            assert_eq!(response.status(), http::StatusCode::METHOD_NOT_ALLOWED);
            assert!(response.text().unwrap().starts_with(&format!("Method not allowed: {method}")));
            assert_eq!(
                response.headers().get(http::header::ALLOW).unwrap(),
                "GET, HEAD, OPTIONS"
            );
        }
    }

    #[tokio::test]
    async fn test_custom_allowed_methods() {
        let response = Echo
            .dispatch(
                HttpRequest::builder()
                    .method(Method::POST)
                    .body(b"hello".to_vec())
                    .build(),
            )
            .await;
        assert_eq!(response.text(), Some("hello"));

        let response = Echo.dispatch(request(Method::OPTIONS)).await;
        assert_eq!(response.status(), http::StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(Echo.allow_header(), "GET, POST");
    }

    #[tokio::test]
    async fn test_as_view() {
        let handler = Ping.as_view();
        let response = handler(request(Method::GET)).await;
        assert_eq!(response.text(), Some("pong"));

        let response = handler(request(Method::PUT)).await;
        assert_eq!(response.status(), http::StatusCode::METHOD_NOT_ALLOWED);
    }

    #[test]
    fn test_context_mixin_default_is_empty() {
        struct Plain;
        impl ContextMixin for Plain {}
        assert!(Plain.get_context_data(&HashMap::new()).is_empty());
    }
}
