//! # exchange-http
//!
//! HTTP layer for the exchange. Provides the request and response types
//! handlers work with and the URL routing engine that maps request paths
//! to handlers and route names back to paths.

pub mod request;
pub mod response;
pub mod urls;

use std::future::Future;
use std::pin::Pin;

pub use request::{HttpRequest, HttpRequestBuilder};
pub use response::{HttpResponse, JsonResponse};
pub use urls::RouteHandler;

/// The future returned by a route handler.
pub type BoxFuture = Pin<Box<dyn Future<Output = HttpResponse> + Send>>;
