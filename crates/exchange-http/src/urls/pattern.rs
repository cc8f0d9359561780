//! URL route templates and matching.
//!
//! A route template such as `token/<slug:slug>` is compiled once into an
//! anchored regex plus the list of its typed parameters. [`path`] builds a
//! leaf [`URLPattern`] bound to a handler; [`path_prefix`] builds the
//! unanchored [`RoutePrefix`] used by `include`.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fmt::Write as _;
use std::sync::Arc;

use regex::Regex;

use exchange_core::{ExchangeError, ExchangeResult};

use super::converters::{self, PathConverter};

/// The handler reference a route dispatches to.
///
/// A handler is an async function from [`HttpRequest`](crate::HttpRequest)
/// to [`HttpResponse`](crate::HttpResponse), shared behind an `Arc` so one
/// route table can serve every request task.
pub type RouteHandler = Arc<dyn Fn(crate::HttpRequest) -> crate::BoxFuture + Send + Sync>;

/// One `<type:name>` placeholder of a route template.
#[derive(Clone)]
pub struct RouteParam {
    name: String,
    converter: Arc<dyn PathConverter>,
    matcher: Regex,
}

impl fmt::Debug for RouteParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}:{}>", self.converter.name(), self.name)
    }
}

impl RouteParam {
    fn new(name: &str, converter: Arc<dyn PathConverter>) -> ExchangeResult<Self> {
        let matcher = Regex::new(&format!("^(?:{})$", converter.regex())).map_err(|e| {
            ExchangeError::ImproperlyConfigured(format!(
                "Invalid regex for converter '{}': {e}",
                converter.name()
            ))
        })?;
        Ok(Self {
            name: name.to_string(),
            converter,
            matcher,
        })
    }

    /// The keyword the captured value is stored under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The converter that validates this parameter.
    pub fn converter(&self) -> &Arc<dyn PathConverter> {
        &self.converter
    }

    /// Returns `true` if `value` is text this parameter would have matched.
    pub fn accepts(&self, value: &str) -> bool {
        self.matcher.is_match(value) && self.converter.to_rust(value).is_ok()
    }
}

/// A compiled route template.
#[derive(Clone)]
struct CompiledRoute {
    route: String,
    regex: Regex,
    params: Vec<RouteParam>,
}

impl CompiledRoute {
    fn compile(route: &str, anchored: bool) -> ExchangeResult<Self> {
        let (regex_str, params) = parse_route(route, anchored)?;
        let regex = Regex::new(&regex_str).map_err(|e| {
            ExchangeError::ImproperlyConfigured(format!("Invalid route '{route}': {e}"))
        })?;
        Ok(Self {
            route: route.to_string(),
            regex,
            params,
        })
    }

    /// Matches the start of `path`. Returns the converted kwargs and the
    /// unmatched rest.
    fn match_start<'p>(&self, path: &'p str) -> Option<(HashMap<String, String>, &'p str)> {
        let captures = self.regex.captures(path)?;
        let whole = captures.get(0)?;

        let mut kwargs = HashMap::with_capacity(self.params.len());
        for param in &self.params {
            let raw = captures.name(&param.name)?.as_str();
            if param.converter.to_rust(raw).is_err() {
                return None;
            }
            kwargs.insert(param.name.clone(), raw.to_string());
        }

        Some((kwargs, &path[whole.end()..]))
    }
}

/// A leaf route: template, optional name, and the handler it dispatches to.
pub struct URLPattern {
    compiled: CompiledRoute,
    name: Option<String>,
    callback: RouteHandler,
}

impl fmt::Debug for URLPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("URLPattern")
            .field("route", &self.compiled.route)
            .field("name", &self.name)
            .field("params", &self.compiled.params)
            .finish_non_exhaustive()
    }
}

impl URLPattern {
    /// Returns the route template.
    pub fn route(&self) -> &str {
        &self.compiled.route
    }

    /// Returns the compiled regex.
    pub const fn regex(&self) -> &Regex {
        &self.compiled.regex
    }

    /// Returns the route name, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the typed parameters in template order.
    pub fn params(&self) -> &[RouteParam] {
        &self.compiled.params
    }

    /// Returns the handler.
    pub const fn callback(&self) -> &RouteHandler {
        &self.callback
    }

    /// Matches the whole of `path`, returning the captured kwargs.
    ///
    /// Returns `None` when the template does not match, when trailing text
    /// is left over, or when a converter rejects its segment.
    pub fn full_match(&self, path: &str) -> Option<HashMap<String, String>> {
        match self.compiled.match_start(path)? {
            (kwargs, "") => Some(kwargs),
            _ => None,
        }
    }
}

/// The prefix a nested resolver strips before handing the rest of the
/// path to its children.
#[derive(Clone)]
pub struct RoutePrefix {
    compiled: CompiledRoute,
}

impl fmt::Debug for RoutePrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RoutePrefix").field(&self.compiled.route).finish()
    }
}

impl RoutePrefix {
    /// Returns the prefix template.
    pub fn route(&self) -> &str {
        &self.compiled.route
    }

    /// Returns the typed parameters of the prefix.
    pub fn params(&self) -> &[RouteParam] {
        &self.compiled.params
    }

    /// Matches the start of `path`, returning the kwargs and the remainder.
    pub fn match_path<'p>(&self, path: &'p str) -> Option<(HashMap<String, String>, &'p str)> {
        self.compiled.match_start(path)
    }
}

/// Splits `inner` (the text between `<` and `>`) into `(type, name)`.
/// The type defaults to `str`.
fn parse_type_and_name(inner: &str) -> (&str, &str) {
    inner
        .find(':')
        .map_or(("str", inner), |pos| (&inner[..pos], &inner[pos + 1..]))
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Compiles a route template into a regex string and its parameters.
fn parse_route(route: &str, anchored: bool) -> ExchangeResult<(String, Vec<RouteParam>)> {
    let mut regex_str = String::from("^");
    let mut params: Vec<RouteParam> = Vec::new();
    let mut seen = HashSet::new();
    let mut remaining = route;

    while let Some(start) = remaining.find('<') {
        regex_str.push_str(&regex::escape(&remaining[..start]));

        let end = remaining[start..].find('>').ok_or_else(|| {
            ExchangeError::ImproperlyConfigured(format!("Unclosed angle bracket in route: {route}"))
        })? + start;

        let inner = &remaining[start + 1..end];
        if inner.chars().any(char::is_whitespace) {
            return Err(ExchangeError::ImproperlyConfigured(format!(
                "URL route '{route}' cannot contain whitespace in angle brackets <...>"
            )));
        }

        let (type_name, param_name) = parse_type_and_name(inner);
        if !is_identifier(param_name) {
            return Err(ExchangeError::ImproperlyConfigured(format!(
                "URL route '{route}' uses parameter name '{param_name}' which isn't a valid identifier"
            )));
        }
        if !seen.insert(param_name) {
            return Err(ExchangeError::ImproperlyConfigured(format!(
                "URL route '{route}' uses parameter name '{param_name}' more than once"
            )));
        }

        let converter = converters::get_converter(type_name)?;
        write!(regex_str, "(?P<{param_name}>{})", converter.regex()).ok();
        params.push(RouteParam::new(param_name, converter)?);

        remaining = &remaining[end + 1..];
    }

    regex_str.push_str(&regex::escape(remaining));
    if anchored {
        regex_str.push('$');
    }
    Ok((regex_str, params))
}

/// Creates a named route bound to `callback`.
///
/// The template may contain `<type:name>` placeholders; see
/// [`converters`] for the available types.
///
/// # Examples
///
/// ```
/// use exchange_http::urls::pattern::path;
/// use exchange_http::{HttpRequest, HttpResponse};
/// use std::sync::Arc;
///
/// let handler = Arc::new(|_req: HttpRequest| -> exchange_http::BoxFuture {
///     Box::pin(async { HttpResponse::ok("token") })
/// });
///
/// let pattern = path("token/<slug:slug>", handler, Some("token-detail")).unwrap();
/// assert_eq!(pattern.name(), Some("token-detail"));
/// let kwargs = pattern.full_match("token/bitcoin-classic").unwrap();
/// assert_eq!(kwargs["slug"], "bitcoin-classic");
/// ```
///
/// # Errors
///
/// Returns [`ExchangeError::ImproperlyConfigured`] for malformed templates,
/// unknown converter types, and repeated parameter names.
pub fn path(route: &str, callback: RouteHandler, name: Option<&str>) -> ExchangeResult<URLPattern> {
    Ok(URLPattern {
        compiled: CompiledRoute::compile(route, true)?,
        name: name.map(String::from),
        callback,
    })
}

/// Creates the unanchored prefix used by nested resolvers.
///
/// # Errors
///
/// Same as [`path`].
pub fn path_prefix(route: &str) -> ExchangeResult<RoutePrefix> {
    Ok(RoutePrefix {
        compiled: CompiledRoute::compile(route, false)?,
    })
}
