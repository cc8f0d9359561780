//! `Host` header validation against `ALLOWED_HOSTS`.
//!
//! Patterns follow the usual rules: `*` matches any host, a leading dot
//! (`.example.com`) matches the domain and every subdomain, anything else
//! must match exactly (case-insensitive). The port is ignored.

use exchange_core::Settings;

/// Hosts accepted in debug mode when `ALLOWED_HOSTS` is empty.
const DEBUG_HOSTS: &[&str] = &[".localhost", "127.0.0.1", "[::1]"];

/// The host a request without a `Host` header is checked as.
pub const DEFAULT_HOST: &str = "localhost";

/// The host patterns in force for `settings`.
///
/// An empty list means the local development hosts in debug mode and
/// nothing at all otherwise.
pub fn effective_allowed_hosts(settings: &Settings) -> Vec<String> {
    if settings.allowed_hosts.is_empty() && settings.debug {
        DEBUG_HOSTS.iter().map(ToString::to_string).collect()
    } else {
        settings.allowed_hosts.clone()
    }
}

/// Splits `host` into lowercase domain and port.
///
/// Returns an empty domain for hosts that are not syntactically valid.
pub fn split_domain_port(host: &str) -> (String, String) {
    let host = host.to_ascii_lowercase();
    if !is_valid_host(&host) {
        return (String::new(), String::new());
    }
    if host.ends_with(']') {
        return (host, String::new());
    }
    let (domain, port) = host.rsplit_once(':').unwrap_or((host.as_str(), ""));
    let domain = domain.strip_suffix('.').unwrap_or(domain);
    (domain.to_string(), port.to_string())
}

/// `name[:port]` where name is a DNS name or a bracketed IPv6 literal.
fn is_valid_host(host: &str) -> bool {
    let (name_ok, port) = if let Some(rest) = host.strip_prefix('[') {
        let Some((addr, after)) = rest.split_once(']') else {
            return false;
        };
        let addr_ok = !addr.is_empty()
            && addr
                .bytes()
                .all(|b| b.is_ascii_hexdigit() || b == b':' || b == b'.');
        if after.is_empty() {
            (addr_ok, None)
        } else if let Some(port) = after.strip_prefix(':') {
            (addr_ok, Some(port))
        } else {
            return false;
        }
    } else {
        match host.rsplit_once(':') {
            Some((name, port)) => (is_dns_name(name), Some(port)),
            None => (is_dns_name(host), None),
        }
    };
    name_ok && port.map_or(true, is_port)
}

fn is_dns_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'.' || b == b'_')
}

fn is_port(port: &str) -> bool {
    !port.is_empty() && port.len() <= 5 && port.bytes().all(|b| b.is_ascii_digit())
}

/// Returns `true` if `domain` matches one of `allowed`.
pub fn is_host_allowed(domain: &str, allowed: &[String]) -> bool {
    if domain.is_empty() {
        return false;
    }
    allowed.iter().any(|pattern| {
        let pattern = pattern.to_ascii_lowercase();
        if pattern == "*" {
            return true;
        }
        pattern.strip_prefix('.').map_or_else(
            || domain == pattern,
            |suffix| domain == suffix || domain.ends_with(&pattern),
        )
    })
}

/// Checks a raw `Host` header value against `allowed`.
///
/// # Examples
///
/// ```
/// use exchange_views::hosts::validate_host;
///
/// let allowed = vec![".exchange.example".to_string()];
/// assert!(validate_host("api.exchange.example:8443", &allowed));
/// assert!(!validate_host("exchange.example.evil", &allowed));
/// ```
pub fn validate_host(host: &str, allowed: &[String]) -> bool {
    let (domain, _port) = split_domain_port(host);
    is_host_allowed(&domain, allowed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hosts(list: &[&str]) -> Vec<String> {
        list.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_exact_match_ignores_case_and_port() {
        let allowed = hosts(&["exchange.example"]);
        assert!(validate_host("exchange.example", &allowed));
        assert!(validate_host("Exchange.EXAMPLE:8000", &allowed));
        assert!(validate_host("exchange.example.", &allowed));
        assert!(!validate_host("api.exchange.example", &allowed));
        assert!(!validate_host("evil.example", &allowed));
    }

    #[test]
    fn test_wildcard() {
        let allowed = hosts(&["*"]);
        assert!(validate_host("anything.example", &allowed));
        assert!(!validate_host("bad host", &allowed));
    }

    #[test]
    fn test_subdomain_pattern() {
        let allowed = hosts(&[".exchange.example"]);
        assert!(validate_host("exchange.example", &allowed));
        assert!(validate_host("api.exchange.example", &allowed));
        assert!(!validate_host("fakeexchange.example", &allowed));
    }

    #[test]
    fn test_ipv6() {
        let allowed = hosts(&["[::1]"]);
        assert!(validate_host("[::1]", &allowed));
        assert!(validate_host("[::1]:8000", &allowed));
        assert!(!validate_host("[::2]", &allowed));
        assert_eq!(split_domain_port("[::1]:8000"), ("[::1]".to_string(), "8000".to_string()));
    }

    #[test]
    fn test_invalid_hosts() {
        let allowed = hosts(&["*"]);
        for host in ["", "a b", "host:port", "exchange.example:123456", "[::1", "a/b"] {
            assert!(!validate_host(host, &allowed), "{host:?}");
        }
    }

    #[test]
    fn test_effective_allowed_hosts() {
        let mut settings = Settings::default();
        assert!(settings.allowed_hosts.is_empty());
        let debug_hosts = effective_allowed_hosts(&settings);
        assert!(validate_host("localhost:8000", &debug_hosts));
        assert!(validate_host("app.localhost", &debug_hosts));
        assert!(validate_host("127.0.0.1", &debug_hosts));
        assert!(!validate_host("exchange.example", &debug_hosts));

        settings.debug = false;
        assert!(effective_allowed_hosts(&settings).is_empty());

        settings.allowed_hosts = hosts(&["exchange.example"]);
        assert_eq!(effective_allowed_hosts(&settings), hosts(&["exchange.example"]));
    }
}
