//! URL resolver and namespace support.
//!
//! A [`URLResolver`] strips its prefix from the path and hands the rest to
//! its children in declaration order; the first match wins. [`include`]
//! nests a resolver under a prefix and [`root`] builds the top of the tree,
//! validating it and indexing every named route for [`reverse`].
//!
//! [`reverse`]: super::reverse::reverse

use std::collections::HashMap;
use std::fmt;

use exchange_core::checks::raise_on_errors;
use exchange_core::{ExchangeError, ExchangeResult};

use super::checks::check_url_config;
use super::pattern::{self, RouteHandler, RouteParam, RoutePrefix, URLPattern};

/// The result of resolving a path to a handler.
#[derive(Clone)]
pub struct ResolverMatch {
    /// The handler to call.
    pub func: RouteHandler,
    /// Positional arguments. Typed routes capture by keyword, so this stays
    /// empty for routes built with `path()`.
    pub args: Vec<String>,
    /// Keyword arguments captured from the path.
    pub kwargs: HashMap<String, String>,
    /// The matched route's name, if it has one.
    pub url_name: Option<String>,
    /// Application namespaces along the match, outermost first.
    pub app_names: Vec<String>,
    /// Instance namespaces along the match, outermost first.
    pub namespaces: Vec<String>,
    /// The full route template that matched, prefixes included.
    pub route: String,
}

impl fmt::Debug for ResolverMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolverMatch")
            .field("args", &self.args)
            .field("kwargs", &self.kwargs)
            .field("url_name", &self.url_name)
            .field("app_names", &self.app_names)
            .field("namespaces", &self.namespaces)
            .field("route", &self.route)
            .finish_non_exhaustive()
    }
}

impl ResolverMatch {
    /// Returns the namespace-qualified view name, e.g. `"api:token-detail"`.
    pub fn view_name(&self) -> String {
        let mut parts: Vec<&str> = self.namespaces.iter().map(String::as_str).collect();
        if let Some(name) = &self.url_name {
            parts.push(name);
        }
        parts.join(":")
    }

    /// Prepends an enclosing resolver's prefix, kwargs, and namespaces.
    fn nest_under(&mut self, resolver: &URLResolver, prefix_kwargs: &HashMap<String, String>) {
        for (k, v) in prefix_kwargs {
            self.kwargs.entry(k.clone()).or_insert_with(|| v.clone());
        }
        if let Some(ns) = &resolver.namespace {
            self.namespaces.insert(0, ns.clone());
        }
        if let Some(app) = &resolver.app_name {
            self.app_names.insert(0, app.clone());
        }
        self.route.insert_str(0, resolver.prefix.route());
    }
}

/// A named route as seen from the root: its qualified name, the full
/// template, and every parameter along the way.
#[derive(Debug, Clone)]
pub struct NamedRoute {
    qualified_name: String,
    route: String,
    params: Vec<RouteParam>,
}

impl NamedRoute {
    /// The namespace-qualified name (`"ns:name"`, or just `"name"`).
    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    /// The full route template, prefixes included.
    pub fn route(&self) -> &str {
        &self.route
    }

    /// Parameters in template order, prefix parameters first.
    pub fn params(&self) -> &[RouteParam] {
        &self.params
    }

    /// Looks up a parameter by keyword.
    pub fn param(&self, name: &str) -> Option<&RouteParam> {
        self.params.iter().find(|p| p.name() == name)
    }
}

/// An entry in a URL configuration.
pub enum URLEntry {
    /// A leaf route bound to a handler.
    Pattern(URLPattern),
    /// A nested resolver, usually built with [`include`].
    Resolver(URLResolver),
}

impl fmt::Debug for URLEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pattern(p) => f.debug_tuple("Pattern").field(p).finish(),
            Self::Resolver(r) => f.debug_tuple("Resolver").field(r).finish(),
        }
    }
}

impl From<URLPattern> for URLEntry {
    fn from(pattern: URLPattern) -> Self {
        Self::Pattern(pattern)
    }
}

impl From<URLResolver> for URLEntry {
    fn from(resolver: URLResolver) -> Self {
        Self::Resolver(resolver)
    }
}

/// Matches a prefix and delegates the rest of the path to its children.
pub struct URLResolver {
    prefix: RoutePrefix,
    url_patterns: Vec<URLEntry>,
    namespace: Option<String>,
    app_name: Option<String>,
    reverse_index: Option<HashMap<String, NamedRoute>>,
}

impl fmt::Debug for URLResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("URLResolver")
            .field("prefix", &self.prefix)
            .field("url_patterns", &self.url_patterns)
            .field("namespace", &self.namespace)
            .field("app_name", &self.app_name)
            .finish_non_exhaustive()
    }
}

impl URLResolver {
    /// Creates a resolver without validating or indexing it.
    pub fn new(
        prefix: RoutePrefix,
        url_patterns: Vec<URLEntry>,
        namespace: Option<&str>,
        app_name: Option<&str>,
    ) -> Self {
        Self {
            prefix,
            url_patterns,
            namespace: namespace.map(String::from),
            app_name: app_name.map(String::from),
            reverse_index: None,
        }
    }

    /// Returns the prefix.
    pub const fn prefix(&self) -> &RoutePrefix {
        &self.prefix
    }

    /// Returns the child entries in declaration order.
    pub fn url_patterns(&self) -> &[URLEntry] {
        &self.url_patterns
    }

    /// Returns the instance namespace, if set.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Returns the application namespace, if set.
    pub fn app_name(&self) -> Option<&str> {
        self.app_name.as_deref()
    }

    /// Resolves a path (without its leading `/`) to a [`ResolverMatch`].
    ///
    /// # Errors
    ///
    /// Returns [`ExchangeError::NotFound`] if no route matches.
    pub fn resolve(&self, path: &str) -> ExchangeResult<ResolverMatch> {
        self.try_resolve(path)
            .ok_or_else(|| ExchangeError::NotFound(format!("No URL pattern matches '{path}'")))
    }

    fn try_resolve(&self, path: &str) -> Option<ResolverMatch> {
        let (prefix_kwargs, remaining) = self.prefix.match_path(path)?;

        self.url_patterns.iter().find_map(|entry| {
            let mut resolver_match = match entry {
                URLEntry::Pattern(child) => {
                    let kwargs = child.full_match(remaining)?;
                    ResolverMatch {
                        func: child.callback().clone(),
                        args: Vec::new(),
                        kwargs,
                        url_name: child.name().map(String::from),
                        app_names: Vec::new(),
                        namespaces: Vec::new(),
                        route: child.route().to_string(),
                    }
                }
                URLEntry::Resolver(child) => child.try_resolve(remaining)?,
            };
            resolver_match.nest_under(self, &prefix_kwargs);
            Some(resolver_match)
        })
    }

    /// Looks up a named route by its qualified name.
    ///
    /// Resolvers built with [`root`] answer from their index; others walk
    /// the tree.
    pub fn named_route(&self, qualified_name: &str) -> Option<NamedRoute> {
        match &self.reverse_index {
            Some(index) => index.get(qualified_name).cloned(),
            None => self
                .collect_named_patterns()
                .into_iter()
                .find(|r| r.qualified_name == qualified_name),
        }
    }

    /// Collects every named route in the tree, in declaration order.
    pub fn collect_named_patterns(&self) -> Vec<NamedRoute> {
        let mut result = Vec::new();
        self.walk(&mut Vec::new(), "", &[], &mut |namespaces, route, params, pattern| {
            if let Some(name) = pattern.name() {
                let qualified_name = if namespaces.is_empty() {
                    name.to_string()
                } else {
                    format!("{}:{name}", namespaces.join(":"))
                };
                result.push(NamedRoute {
                    qualified_name,
                    route: route.to_string(),
                    params: params.to_vec(),
                });
            }
        });
        result
    }

    /// Lists every leaf route as `(full_route, qualified_name)`.
    pub fn all_routes(&self) -> Vec<(String, Option<String>)> {
        let mut result = Vec::new();
        self.walk(&mut Vec::new(), "", &[], &mut |namespaces, route, _, pattern| {
            let name = pattern.name().map(|name| {
                let mut parts = namespaces.to_vec();
                parts.push(name);
                parts.join(":")
            });
            result.push((route.to_string(), name));
        });
        result
    }

    /// Visits each leaf with its enclosing namespaces, full route, and the
    /// accumulated parameters.
    fn walk<'a, F>(
        &'a self,
        namespaces: &mut Vec<&'a str>,
        parent_route: &str,
        parent_params: &[RouteParam],
        visit: &mut F,
    ) where
        F: FnMut(&[&'a str], &str, &[RouteParam], &'a URLPattern),
    {
        if let Some(ns) = self.namespace.as_deref() {
            namespaces.push(ns);
        }
        let route = format!("{parent_route}{}", self.prefix.route());
        let mut params = parent_params.to_vec();
        params.extend_from_slice(self.prefix.params());

        for entry in &self.url_patterns {
            match entry {
                URLEntry::Pattern(child) => {
                    let full_route = format!("{route}{}", child.route());
                    let mut full_params = params.clone();
                    full_params.extend_from_slice(child.params());
                    visit(namespaces, &full_route, &full_params, child);
                }
                URLEntry::Resolver(child) => child.walk(namespaces, &route, &params, visit),
            }
        }

        if self.namespace.is_some() {
            namespaces.pop();
        }
    }
}

/// Nests `patterns` under `prefix`, optionally inside a namespace.
///
/// # Examples
///
/// ```
/// use exchange_http::urls::pattern::path;
/// use exchange_http::urls::resolver::{include, root, URLEntry};
/// use exchange_http::{HttpRequest, HttpResponse};
/// use std::sync::Arc;
///
/// let handler = Arc::new(|_req: HttpRequest| -> exchange_http::BoxFuture {
///     Box::pin(async { HttpResponse::ok("token") })
/// });
/// let trading = vec![
///     URLEntry::Pattern(path("token/<slug:slug>", handler, Some("token-detail")).unwrap()),
/// ];
/// let api = include("api/", trading, Some("trading"), Some("trading")).unwrap();
/// let urls = root(vec![URLEntry::Resolver(api)]).unwrap();
///
/// let m = urls.resolve("api/token/eth").unwrap();
/// assert_eq!(m.view_name(), "trading:token-detail");
/// ```
///
/// # Errors
///
/// Returns [`ExchangeError::ImproperlyConfigured`] if the prefix is invalid
/// or a namespace is given without an app name.
pub fn include(
    prefix: &str,
    patterns: Vec<URLEntry>,
    namespace: Option<&str>,
    app_name: Option<&str>,
) -> ExchangeResult<URLResolver> {
    if namespace.is_some() && app_name.is_none() {
        return Err(ExchangeError::ImproperlyConfigured(format!(
            "Specifying a namespace in include('{prefix}') without an app_name is not supported"
        )));
    }
    Ok(URLResolver::new(
        pattern::path_prefix(prefix)?,
        patterns,
        namespace,
        app_name,
    ))
}

/// Builds the root resolver for a URL configuration.
///
/// Runs the URL checks first. Warnings are logged; any error-level finding,
/// such as two routes sharing a qualified name, fails the build. The
/// result carries an index of every named route.
///
/// # Errors
///
/// Returns [`ExchangeError::ImproperlyConfigured`] when a check fails.
pub fn root(patterns: Vec<URLEntry>) -> ExchangeResult<URLResolver> {
    let mut resolver = URLResolver::new(pattern::path_prefix("")?, patterns, None, None);

    raise_on_errors(&check_url_config(&resolver))?;

    let named = resolver.collect_named_patterns();
    let mut index = HashMap::with_capacity(named.len());
    for route in named {
        index.entry(route.qualified_name.clone()).or_insert(route);
    }
    tracing::debug!(named_routes = index.len(), "URL configuration loaded");
    resolver.reverse_index = Some(index);

    Ok(resolver)
}
