//! Views of the trading app.
//!
//! [`TokenDetailView`] answers `token/<slug>` with the token the slug names.
//! Tokens come from a [`TokenSource`]; the app ships no token model of its
//! own, so the default [`EchoTokenSource`] just reflects the slug back.

use std::sync::Arc;

use async_trait::async_trait;

use exchange_core::{ExchangeError, ExchangeResult};
use exchange_http::{HttpRequest, HttpResponse};
use exchange_views::views::{ContextMixin, DetailView, ObjectLookup, View};

/// Where token data comes from.
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Returns the token matching `lookup`.
    ///
    /// # Errors
    ///
    /// [`ExchangeError::NotFound`] when no token matches; anything else is
    /// reported as a server error.
    async fn fetch(&self, lookup: &ObjectLookup) -> ExchangeResult<serde_json::Value>;
}

/// Answers every lookup with `{"slug": <slug>}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoTokenSource;

#[async_trait]
impl TokenSource for EchoTokenSource {
    async fn fetch(&self, lookup: &ObjectLookup) -> ExchangeResult<serde_json::Value> {
        lookup
            .slug
            .as_ref()
            .map(|slug| serde_json::json!({ lookup.slug_field.as_str(): slug }))
            .ok_or_else(|| ExchangeError::NotFound("No token slug in the URL".to_string()))
    }
}

/// Detail view for one token, looked up by slug.
#[derive(Clone)]
pub struct TokenDetailView {
    source: Arc<dyn TokenSource>,
}

impl std::fmt::Debug for TokenDetailView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenDetailView").finish_non_exhaustive()
    }
}

impl Default for TokenDetailView {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenDetailView {
    /// Creates the view over [`EchoTokenSource`].
    pub fn new() -> Self {
        Self::with_source(Arc::new(EchoTokenSource))
    }

    /// Creates the view over a custom token source.
    pub fn with_source(source: Arc<dyn TokenSource>) -> Self {
        Self { source }
    }
}

impl ContextMixin for TokenDetailView {}

#[async_trait]
impl View for TokenDetailView {
    async fn get(&self, request: HttpRequest) -> HttpResponse {
        self.detail(&request).await
    }
}

#[async_trait]
impl DetailView for TokenDetailView {
    fn context_object_name(&self) -> Option<&str> {
        Some("token")
    }

    async fn get_object(&self, lookup: &ObjectLookup) -> ExchangeResult<serde_json::Value> {
        self.source.fetch(lookup).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn slug_lookup(slug: &str) -> ObjectLookup {
        ObjectLookup {
            pk: None,
            slug_field: "slug".to_string(),
            slug: Some(slug.to_string()),
        }
    }

    #[tokio::test]
    async fn test_echo_source() {
        let token = EchoTokenSource.fetch(&slug_lookup("bitcoin-classic")).await.unwrap();
        assert_eq!(token, serde_json::json!({"slug": "bitcoin-classic"}));
    }

    #[tokio::test]
    async fn test_echo_source_without_slug() {
        let lookup = ObjectLookup {
            pk: Some("1".to_string()),
            slug_field: "slug".to_string(),
            slug: None,
        };
        let err = EchoTokenSource.fetch(&lookup).await.unwrap_err();
        assert!(matches!(err, ExchangeError::NotFound(_)));
    }

    #[test]
    fn test_view_reads_slug_kwarg() {
        let view = TokenDetailView::new();
        let kwargs = HashMap::from([("slug".to_string(), "eth".to_string())]);
        let lookup = view.object_lookup(&kwargs).unwrap();
        assert_eq!(lookup, slug_lookup("eth"));
        assert_eq!(view.allow_header(), "GET, HEAD, OPTIONS");
    }

    struct Listed;

    #[async_trait]
    impl TokenSource for Listed {
        async fn fetch(&self, lookup: &ObjectLookup) -> ExchangeResult<serde_json::Value> {
            match lookup.slug.as_deref() {
                Some("eth") => Ok(serde_json::json!({"slug": "eth", "name": "Ether"})),
                other => Err(ExchangeError::NotFound(format!("token {other:?}"))),
            }
        }
    }

    #[tokio::test]
    async fn test_custom_source() {
        let view = TokenDetailView::with_source(Arc::new(Listed));
        assert_eq!(view.get_object(&slug_lookup("eth")).await.unwrap()["name"], "Ether");
        assert!(view.get_object(&slug_lookup("doge")).await.is_err());
    }
}
