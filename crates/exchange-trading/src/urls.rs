//! URL configuration of the trading app.
//!
//! | Route               | Name           | View               |
//! |---------------------|----------------|--------------------|
//! | `token/<slug:slug>` | `token-detail` | [`TokenDetailView`] |

use std::sync::Arc;

use exchange_core::{ExchangeError, ExchangeResult, Settings};
use exchange_http::urls::{path, root, URLEntry, URLResolver};
use exchange_views::views::View;

use crate::views::{TokenDetailView, TokenSource};

/// The label this app is installed under.
pub const APP_LABEL: &str = "trading";

/// The dotted name settings use to point at this module.
pub const URLCONF_NAME: &str = "trading.urls";

/// The trading routes, with tokens served by the default source.
///
/// # Errors
///
/// Returns [`ExchangeError::ImproperlyConfigured`] if a route fails to
/// compile.
pub fn urlpatterns() -> ExchangeResult<Vec<URLEntry>> {
    urlpatterns_with(TokenDetailView::new())
}

/// The trading routes, with tokens served by `source`.
///
/// # Errors
///
/// Same as [`urlpatterns`].
pub fn urlpatterns_with_source(source: Arc<dyn TokenSource>) -> ExchangeResult<Vec<URLEntry>> {
    urlpatterns_with(TokenDetailView::with_source(source))
}

fn urlpatterns_with(token_detail: TokenDetailView) -> ExchangeResult<Vec<URLEntry>> {
    Ok(vec![path(
        "token/<slug:slug>",
        token_detail.as_view(),
        Some("token-detail"),
    )?
    .into()])
}

/// The finished URL table. Fails if the routes do not pass the URL checks,
/// for instance when two of them share a name.
///
/// # Errors
///
/// Returns [`ExchangeError::ImproperlyConfigured`] on a check failure.
pub fn urlconf() -> ExchangeResult<URLResolver> {
    root(urlpatterns()?)
}

/// Loads the URL table named by `settings.root_urlconf`.
///
/// # Errors
///
/// Returns [`ExchangeError::ImproperlyConfigured`] for names other than
/// [`URLCONF_NAME`], or when [`APP_LABEL`] is not in `installed_apps`.
pub fn load_urlconf(settings: &Settings) -> ExchangeResult<URLResolver> {
    if settings.root_urlconf != URLCONF_NAME {
        return Err(ExchangeError::ImproperlyConfigured(format!(
            "ROOT_URLCONF '{}' is not a known URL configuration (expected '{URLCONF_NAME}')",
            settings.root_urlconf
        )));
    }
    if !settings.installed_apps.iter().any(|app| app == APP_LABEL) {
        return Err(ExchangeError::ImproperlyConfigured(format!(
            "ROOT_URLCONF '{URLCONF_NAME}' belongs to the '{APP_LABEL}' app, which is not in INSTALLED_APPS"
        )));
    }
    urlconf()
}
