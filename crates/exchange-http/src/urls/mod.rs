//! URL routing and resolution.
//!
//! - [`pattern`]: route templates via `path()`
//! - [`converters`]: typed placeholders (`int`, `str`, `slug`, `uuid`, `path`)
//! - [`resolver`]: nested resolution with namespaces, `include()` and `root()`
//! - [`reverse`]: URL generation from route names
//! - [`checks`]: configuration checks run when the table is built
//!
//! # Examples
//!
//! ```
//! use exchange_http::urls::pattern::path;
//! use exchange_http::urls::resolver::{root, URLEntry};
//! use exchange_http::urls::reverse::reverse;
//! use exchange_http::{HttpRequest, HttpResponse};
//! use std::collections::HashMap;
//! use std::sync::Arc;
//!
//! let handler = Arc::new(|_req: HttpRequest| -> exchange_http::BoxFuture {
//!     Box::pin(async { HttpResponse::ok("ok") })
//! });
//!
//! let urls = root(vec![
//!     URLEntry::Pattern(path("token/<slug:slug>", handler, Some("token-detail")).unwrap()),
//! ])
//! .unwrap();
//!
//! let m = urls.resolve("token/bitcoin-classic").unwrap();
//! assert_eq!(m.kwargs["slug"], "bitcoin-classic");
//!
//! let kwargs = HashMap::from([("slug", "abc")]);
//! assert_eq!(reverse("token-detail", &[], &kwargs, &urls).unwrap(), "/token/abc");
//! ```

pub mod checks;
pub mod converters;
pub mod pattern;
pub mod resolver;
pub mod reverse;

pub use pattern::{path, RouteHandler};
pub use resolver::{include, root, ResolverMatch, URLEntry, URLResolver};
pub use reverse::{reverse, reverse_with_prefix};
