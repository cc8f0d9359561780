//! Reverse URL resolution.
//!
//! [`reverse`] turns a route name plus parameter values back into a path.
//! Values are checked against each parameter's converter before they are
//! substituted, so a reversed URL always resolves to the route it names.

use std::collections::HashMap;
use std::hash::BuildHasher;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use exchange_core::{ExchangeError, ExchangeResult};

use super::resolver::{NamedRoute, URLResolver};

/// Characters left unescaped in a reversed path: RFC 3986 unreserved
/// characters, sub-delimiters, and `/ : @`.
const PATH_SAFE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'!')
    .remove(b'$')
    .remove(b'&')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'*')
    .remove(b'+')
    .remove(b',')
    .remove(b';')
    .remove(b'=')
    .remove(b'/')
    .remove(b':')
    .remove(b'@');

/// Generates the `/`-rooted URL for a named route.
///
/// Pass either positional `args` (in template order) or `kwargs`, not
/// both. Namespaced names use `:` separators (`"trading:token-detail"`).
///
/// # Errors
///
/// Returns [`ExchangeError::NotFound`] when the name is unknown, when the
/// supplied values do not cover the route's parameters exactly, or when a
/// value would not match its converter. Mixing `args` and `kwargs` is an
/// [`ExchangeError::BadRequest`].
///
/// # Examples
///
/// ```
/// use exchange_http::urls::reverse::reverse;
/// use exchange_http::urls::resolver::{root, URLEntry};
/// use exchange_http::urls::pattern::path;
/// use exchange_http::{HttpRequest, HttpResponse};
/// use std::collections::HashMap;
/// use std::sync::Arc;
///
/// let handler = Arc::new(|_req: HttpRequest| -> exchange_http::BoxFuture {
///     Box::pin(async { HttpResponse::ok("ok") })
/// });
/// let urls = root(vec![
///     URLEntry::Pattern(path("token/<slug:slug>", handler, Some("token-detail")).unwrap()),
/// ])
/// .unwrap();
///
/// let kwargs = HashMap::from([("slug", "abc")]);
/// assert_eq!(reverse("token-detail", &[], &kwargs, &urls).unwrap(), "/token/abc");
/// ```
pub fn reverse<S: BuildHasher>(
    viewname: &str,
    args: &[&str],
    kwargs: &HashMap<&str, &str, S>,
    urlconf: &URLResolver,
) -> ExchangeResult<String> {
    reverse_with_prefix(viewname, args, kwargs, urlconf, "/")
}

/// Like [`reverse`], but roots the path at `prefix` instead of `/`.
///
/// An empty prefix yields the bare route path (`token/abc`).
///
/// # Errors
///
/// Same as [`reverse`].
pub fn reverse_with_prefix<S: BuildHasher>(
    viewname: &str,
    args: &[&str],
    kwargs: &HashMap<&str, &str, S>,
    urlconf: &URLResolver,
    prefix: &str,
) -> ExchangeResult<String> {
    if !args.is_empty() && !kwargs.is_empty() {
        return Err(ExchangeError::BadRequest(format!(
            "Don't mix positional and keyword arguments in reverse('{viewname}')"
        )));
    }

    let route = urlconf.named_route(viewname).ok_or_else(|| {
        ExchangeError::NotFound(format!(
            "Reverse for '{viewname}' not found. '{viewname}' is not a valid view or pattern name."
        ))
    })?;

    let values = bind_values(&route, args, kwargs)?;
    let path = substitute(route.route(), &values);

    let mut url = format!("{prefix}{path}");
    // A leading "//" would be read as a scheme-relative URL.
    if url.starts_with("//") {
        url.replace_range(..2, "/%2F");
    }
    Ok(url)
}

/// Pairs each route parameter with a validated, encoded value.
fn bind_values<S: BuildHasher>(
    route: &NamedRoute,
    args: &[&str],
    kwargs: &HashMap<&str, &str, S>,
) -> ExchangeResult<HashMap<String, String>> {
    let no_match = |detail: String| {
        ExchangeError::NotFound(format!(
            "Reverse for '{}' with {detail} not found. Tried route '{}'.",
            route.qualified_name(),
            route.route()
        ))
    };

    let params = route.params();
    let supplied: Vec<(&str, &str)> = if kwargs.is_empty() {
        if args.len() != params.len() {
            return Err(no_match(format!("arguments {args:?}")));
        }
        params.iter().map(|p| p.name()).zip(args.iter().copied()).collect()
    } else {
        let unexpected = kwargs.keys().any(|k| route.param(k).is_none());
        if unexpected || kwargs.len() != params.len() {
            let mut keys: Vec<&&str> = kwargs.keys().collect();
            keys.sort();
            return Err(no_match(format!("keyword arguments {keys:?}")));
        }
        params
            .iter()
            .filter_map(|p| kwargs.get(p.name()).map(|v| (p.name(), *v)))
            .collect()
    };

    let mut values = HashMap::with_capacity(supplied.len());
    for (name, value) in supplied {
        let accepted = route.param(name).is_some_and(|p| p.accepts(value));
        if !accepted {
            return Err(no_match(format!("value '{value}' for '{name}'")));
        }
        values.insert(
            name.to_string(),
            utf8_percent_encode(value, PATH_SAFE).to_string(),
        );
    }
    Ok(values)
}

/// Replaces each `<type:name>` placeholder in `route` with its value.
fn substitute(route: &str, values: &HashMap<String, String>) -> String {
    let mut result = String::with_capacity(route.len());
    let mut remaining = route;

    while let Some(start) = remaining.find('<') {
        result.push_str(&remaining[..start]);
        let Some(len) = remaining[start..].find('>') else {
            break;
        };
        let inner = &remaining[start + 1..start + len];
        let name = inner.find(':').map_or(inner, |pos| &inner[pos + 1..]);
        if let Some(value) = values.get(name) {
            result.push_str(value);
        }
        remaining = &remaining[start + len + 1..];
    }

    result.push_str(remaining);
    result
}
