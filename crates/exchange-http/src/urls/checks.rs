//! System checks for a URL configuration.
//!
//! [`check_url_config`] is run by [`root`](super::resolver::root) before the
//! table is used, and again by the server's `check()` command.

use std::collections::HashMap;

use exchange_core::CheckMessage;

use super::resolver::{URLEntry, URLResolver};

/// Inspects a URL tree and reports problems.
///
/// | Id         | Level   | Finding                                        |
/// |------------|---------|------------------------------------------------|
/// | `urls.E010`| error   | two routes share a fully qualified name        |
/// | `urls.W002`| warning | a route or prefix starts with `/`              |
/// | `urls.W003`| warning | a route name contains `:`                      |
/// | `urls.W005`| warning | the same namespace is used by several includes |
pub fn check_url_config(resolver: &URLResolver) -> Vec<CheckMessage> {
    let mut messages = Vec::new();
    let mut namespaces: HashMap<String, usize> = HashMap::new();
    check_entries(resolver, "", &mut namespaces, &mut messages);

    let mut names: HashMap<String, Vec<String>> = HashMap::new();
    for named in resolver.collect_named_patterns() {
        names
            .entry(named.qualified_name().to_string())
            .or_default()
            .push(named.route().to_string());
    }
    let mut duplicates: Vec<_> = names.into_iter().filter(|(_, r)| r.len() > 1).collect();
    duplicates.sort();
    for (name, routes) in duplicates {
        messages.push(CheckMessage::error(
            format!(
                "URL name '{name}' is used by {} routes: {}",
                routes.len(),
                routes.join(", ")
            ),
            Some("Give each route a unique name within its namespace."),
            Some(name.as_str()),
            Some("urls.E010"),
        ));
    }

    let mut shared: Vec<_> = namespaces.into_iter().filter(|(_, n)| *n > 1).collect();
    shared.sort();
    for (namespace, _) in shared {
        messages.push(CheckMessage::warning(
            format!(
                "URL namespace '{namespace}' isn't unique. You may not be able to reverse all URLs in this namespace."
            ),
            None,
            Some(namespace.as_str()),
            Some("urls.W005"),
        ));
    }

    messages
}

fn check_entries(
    resolver: &URLResolver,
    parent_namespace: &str,
    namespaces: &mut HashMap<String, usize>,
    messages: &mut Vec<CheckMessage>,
) {
    for entry in resolver.url_patterns() {
        match entry {
            URLEntry::Pattern(pattern) => {
                check_leading_slash(pattern.route(), messages);
                if let Some(name) = pattern.name().filter(|n| n.contains(':')) {
                    messages.push(CheckMessage::warning(
                        format!(
                            "Your URL pattern '{}' [name='{name}'] has a name including a ':'. \
                             Remove the colon, to avoid ambiguous namespace references.",
                            pattern.route()
                        ),
                        None,
                        Some(name),
                        Some("urls.W003"),
                    ));
                }
            }
            URLEntry::Resolver(child) => {
                check_leading_slash(child.prefix().route(), messages);
                let namespace = match child.namespace() {
                    Some(ns) if parent_namespace.is_empty() => ns.to_string(),
                    Some(ns) => format!("{parent_namespace}:{ns}"),
                    None => parent_namespace.to_string(),
                };
                if child.namespace().is_some() {
                    *namespaces.entry(namespace.clone()).or_insert(0) += 1;
                }
                check_entries(child, &namespace, namespaces, messages);
            }
        }
    }
}

fn check_leading_slash(route: &str, messages: &mut Vec<CheckMessage>) {
    if route.starts_with('/') {
        messages.push(CheckMessage::warning(
            format!(
                "Your URL pattern '{route}' has a route beginning with a '/'. \
                 Remove this slash as it is unnecessary."
            ),
            None,
            Some(route),
            Some("urls.W002"),
        ));
    }
}
