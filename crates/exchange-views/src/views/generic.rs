//! Generic detail view.
//!
//! [`DetailView`] looks one object up by the `pk` or `slug` keyword the URL
//! captured and answers with it as JSON. Where the object comes from is up
//! to the implementor's [`get_object`](DetailView::get_object).

use std::collections::HashMap;

use async_trait::async_trait;

use exchange_core::{ExchangeError, ExchangeResult};
use exchange_http::{HttpRequest, HttpResponse, JsonResponse};

use super::class_based::{ContextMixin, View};

/// What a detail view should look its object up by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectLookup {
    /// The primary key captured under `pk_url_kwarg`, if any.
    pub pk: Option<String>,
    /// The field the slug is matched against.
    pub slug_field: String,
    /// The slug captured under `slug_url_kwarg`, if it takes part.
    pub slug: Option<String>,
}

/// A view that displays a single object.
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
/// use async_trait::async_trait;
/// use exchange_core::ExchangeResult;
/// use exchange_http::{HttpRequest, HttpResponse};
/// use exchange_views::views::{ContextMixin, DetailView, ObjectLookup, View};
///
/// struct CoinView;
///
/// impl ContextMixin for CoinView {}
///
/// #[async_trait]
/// impl View for CoinView {
///     async fn get(&self, request: HttpRequest) -> HttpResponse {
///         self.detail(&request).await
///     }
/// }
///
/// #[async_trait]
/// impl DetailView for CoinView {
///     async fn get_object(&self, lookup: &ObjectLookup) -> ExchangeResult<serde_json::Value> {
///         Ok(serde_json::json!({ "slug": lookup.slug }))
///     }
/// }
/// ```
#[async_trait]
pub trait DetailView: View + ContextMixin + Send + Sync {
    /// The URL keyword holding the primary key.
    fn pk_url_kwarg(&self) -> &str {
        "pk"
    }

    /// The URL keyword holding the slug.
    fn slug_url_kwarg(&self) -> &str {
        "slug"
    }

    /// The object field the slug is matched against.
    fn slug_field(&self) -> &str {
        "slug"
    }

    /// Whether the slug still applies when a primary key was captured.
    fn query_pk_and_slug(&self) -> bool {
        false
    }

    /// An extra context key the object is also published under.
    fn context_object_name(&self) -> Option<&str> {
        None
    }

    /// Builds the lookup from the captured URL keywords.
    ///
    /// # Errors
    ///
    /// Returns [`ExchangeError::ImproperlyConfigured`] when the route
    /// captured neither a primary key nor a slug.
    fn object_lookup(&self, kwargs: &HashMap<String, String>) -> ExchangeResult<ObjectLookup> {
        let pk = kwargs.get(self.pk_url_kwarg()).cloned();
        let slug = kwargs
            .get(self.slug_url_kwarg())
            .filter(|_| pk.is_none() || self.query_pk_and_slug())
            .cloned();

        if pk.is_none() && slug.is_none() {
            return Err(ExchangeError::ImproperlyConfigured(format!(
                "Generic detail view {} must be called with either an object pk or a slug in the URLconf.",
                std::any::type_name::<Self>()
            )));
        }

        Ok(ObjectLookup {
            pk,
            slug_field: self.slug_field().to_string(),
            slug,
        })
    }

    /// Fetches the object.
    ///
    /// # Errors
    ///
    /// Whatever the data source reports; [`ExchangeError::NotFound`]
    /// becomes a 404.
    async fn get_object(&self, lookup: &ObjectLookup) -> ExchangeResult<serde_json::Value>;

    /// Looks up the object for `request` and answers with
    /// `{"object": …}` merged over the view's context.
    async fn detail(&self, request: &HttpRequest) -> HttpResponse {
        let empty = HashMap::new();
        let kwargs = request.resolver_match().map_or(&empty, |m| &m.kwargs);

        let result = match self.object_lookup(kwargs) {
            Ok(lookup) => self.get_object(&lookup).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(object) => {
                let mut context = self.get_context_data(kwargs);
                if let Some(name) = self.context_object_name() {
                    context.insert(name.to_string(), object.clone());
                }
                context.insert("object".to_string(), object);
                JsonResponse::new(&context)
            }
            Err(e) => {
                if e.status_code() >= 500 {
                    tracing::error!(path = request.path(), error = %e, "detail view failed");
                } else {
                    tracing::debug!(path = request.path(), error = %e, "object lookup failed");
                }
                HttpResponse::from_error(&e)
            }
        }
    }
}
