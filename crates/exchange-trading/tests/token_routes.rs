//! End-to-end tests of the `token-detail` route through the axum router.

use std::collections::HashMap;
use std::io::Write as _;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use http_body_util::BodyExt;
use tower::ServiceExt;

use exchange_core::{settings_loader, ExchangeError, ExchangeResult, Settings};
use exchange_http::urls::{reverse, reverse_with_prefix, root};
use exchange_trading::commands::build_app;
use exchange_trading::urls::{urlconf, urlpatterns, urlpatterns_with_source};
use exchange_trading::TokenSource;
use exchange_views::views::ObjectLookup;
use exchange_views::ExchangeApp;

async fn request(
    app: ExchangeApp,
    method: &str,
    uri: &str,
    host: Option<&str>,
) -> (u16, Option<serde_json::Value>) {
    let mut builder = http::Request::builder().method(method).uri(uri);
    if let Some(host) = host {
        builder = builder.header("host", host);
    }
    let response = app
        .into_axum_router()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status().as_u16();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).ok())
}

fn app() -> ExchangeApp {
    ExchangeApp::new(Settings::default()).urls(urlconf().unwrap())
}

#[tokio::test]
async fn test_token_detail_serves_slug() {
    let (status, body) = request(app(), "GET", "/token/bitcoin-classic", None).await;
    assert_eq!(status, 200);
    let body = body.unwrap();
    assert_eq!(body["object"]["slug"], "bitcoin-classic");
    assert_eq!(body["token"]["slug"], "bitcoin-classic");
}

#[tokio::test]
async fn test_percent_encoded_slug_is_decoded() {
    let (status, body) = request(app(), "GET", "/token/%65th", None).await;
    assert_eq!(status, 200);
    assert_eq!(body.unwrap()["object"]["slug"], "eth");
}

#[tokio::test]
async fn test_non_slug_paths_are_404() {
    for uri in ["/token/a/b", "/token/", "/token/bit.coin", "/tokens/eth", "/"] {
        assert_eq!(request(app(), "GET", uri, None).await.0, 404, "{uri}");
    }
}

#[tokio::test]
async fn test_method_gating() {
    assert_eq!(request(app(), "POST", "/token/eth", None).await.0, 405);
    assert_eq!(request(app(), "DELETE", "/token/eth", None).await.0, 405);
    assert_eq!(request(app(), "HEAD", "/token/eth", None).await.0, 200);
    assert_eq!(request(app(), "OPTIONS", "/token/eth", None).await.0, 200);
}

#[tokio::test]
async fn test_host_validation() {
    let settings = Settings {
        debug: false,
        allowed_hosts: vec![".exchange.example".to_string()],
        ..Settings::default()
    };
    let app = || ExchangeApp::new(settings.clone()).urls(urlconf().unwrap());

    assert_eq!(request(app(), "GET", "/token/eth", Some("api.exchange.example")).await.0, 200);
    assert_eq!(request(app(), "GET", "/token/eth", Some("exchange.example")).await.0, 200);
    assert_eq!(request(app(), "GET", "/token/eth", Some("evil.example")).await.0, 400);
}

struct Listed;

#[async_trait]
impl TokenSource for Listed {
    async fn fetch(&self, lookup: &ObjectLookup) -> ExchangeResult<serde_json::Value> {
        match lookup.slug.as_deref() {
            Some("eth") => Ok(serde_json::json!({"slug": "eth", "name": "Ether"})),
            Some("broken") => Err(ExchangeError::InternalServerError("source down".to_string())),
            other => Err(ExchangeError::NotFound(format!("token {other:?}"))),
        }
    }
}

#[tokio::test]
async fn test_custom_token_source() {
    let urls = || root(urlpatterns_with_source(Arc::new(Listed)).unwrap()).unwrap();
    let app = || ExchangeApp::new(Settings::default()).urls(urls());

    let (status, body) = request(app(), "GET", "/token/eth", None).await;
    assert_eq!(status, 200);
    assert_eq!(body.unwrap()["object"]["name"], "Ether");
    assert_eq!(request(app(), "GET", "/token/doge", None).await.0, 404);
    assert_eq!(request(app(), "GET", "/token/broken", None).await.0, 500);
}

#[test]
fn test_reverse_token_detail() {
    let urls = urlconf().unwrap();
    let kwargs = HashMap::from([("slug", "abc")]);
    assert_eq!(reverse("token-detail", &[], &kwargs, &urls).unwrap(), "/token/abc");
    assert_eq!(
        reverse_with_prefix("token-detail", &[], &kwargs, &urls, "").unwrap(),
        "token/abc"
    );

    let bad = HashMap::from([("slug", "not a slug")]);
    assert!(matches!(
        reverse("token-detail", &[], &bad, &urls),
        Err(ExchangeError::NotFound(_))
    ));
}

#[test]
fn test_reversed_url_resolves() {
    let urls = urlconf().unwrap();
    let kwargs = HashMap::from([("slug", "usdc-e")]);
    let url = reverse_with_prefix("token-detail", &[], &kwargs, &urls, "").unwrap();
    let matched = urls.resolve(&url).unwrap();
    assert_eq!(matched.url_name.as_deref(), Some("token-detail"));
    assert_eq!(matched.kwargs["slug"], "usdc-e");
}

#[test]
fn test_duplicate_route_name_is_rejected() {
    let mut patterns = urlpatterns().unwrap();
    patterns.extend(urlpatterns().unwrap());
    let err = root(patterns).unwrap_err();
    assert!(err.to_string().contains("urls.E010"));
}

#[tokio::test]
async fn test_app_from_settings_file() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(
        file,
        "debug = false\nallowed_hosts = [\"exchange.example\"]\nroot_urlconf = \"trading.urls\""
    )
    .unwrap();

    let settings = settings_loader::from_file(file.path()).unwrap();
    assert!(!settings.debug);
    let app = build_app(settings).unwrap();
    assert!(app.check().is_empty());

    let (status, body) = request(app, "GET", "/token/eth", Some("exchange.example")).await;
    assert_eq!(status, 200);
    assert_eq!(body.unwrap()["object"]["slug"], "eth");
}
