//! Management commands behind the `exchange-trading` binary.
//!
//! Each command returns its output instead of printing it, so the binary
//! stays a thin clap front end.

use std::collections::HashMap;
use std::fmt::Write as _;

use exchange_core::{CheckLevel, CheckMessage, ExchangeError, ExchangeResult, Settings};
use exchange_http::urls::{reverse_with_prefix, URLResolver};
use exchange_views::ExchangeApp;

use crate::urls::load_urlconf;

/// Builds the app for `settings`, loading the URL table `ROOT_URLCONF` names.
///
/// # Errors
///
/// Propagates URL configuration errors, including an uninstalled app.
pub fn build_app(settings: Settings) -> ExchangeResult<ExchangeApp> {
    let urls = load_urlconf(&settings)?;
    Ok(ExchangeApp::new(settings).urls(urls))
}

/// Runs the system checks and renders the report.
///
/// # Errors
///
/// Returns [`ExchangeError::ImproperlyConfigured`] carrying the report when
/// any finding is an error.
pub fn check(app: &ExchangeApp) -> ExchangeResult<String> {
    let messages = app.check();
    let report = render_check_report(&messages);
    if messages.iter().any(CheckMessage::is_error) {
        Err(ExchangeError::ImproperlyConfigured(report))
    } else {
        Ok(report)
    }
}

fn render_check_report(messages: &[CheckMessage]) -> String {
    if messages.is_empty() {
        return "System check identified no issues.".to_string();
    }

    let mut report = String::new();
    let errors: Vec<_> = messages.iter().filter(|m| m.is_error()).collect();
    let warnings: Vec<_> = messages
        .iter()
        .filter(|m| m.level == CheckLevel::Warning)
        .collect();
    for (title, group) in [("ERRORS", errors), ("WARNINGS", warnings)] {
        if group.is_empty() {
            continue;
        }
        let _ = writeln!(report, "{title}:");
        for message in group {
            let _ = writeln!(report, "{message}");
        }
        report.push('\n');
    }
    let _ = write!(
        report,
        "System check identified {} issue(s).",
        messages.iter().filter(|m| m.is_serious()).count()
    );
    report
}

/// Lists every route as `route<TAB>name`, one per line.
pub fn show_urls(urls: &URLResolver) -> String {
    urls.all_routes()
        .into_iter()
        .map(|(route, name)| format!("{route}\t{}", name.unwrap_or_default()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Reverses `name`, rooting the path at the settings' script prefix.
///
/// # Errors
///
/// Propagates reverse lookup errors.
pub fn reverse(
    urls: &URLResolver,
    settings: &Settings,
    name: &str,
    args: &[String],
    kwargs: &[(String, String)],
) -> ExchangeResult<String> {
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    let kwargs: HashMap<&str, &str> = kwargs
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    reverse_with_prefix(name, &args, &kwargs, urls, &settings.script_prefix())
}

/// Parses a `key=value` command line argument.
///
/// # Errors
///
/// Returns a message when the `=` or the key is missing.
pub fn parse_kwarg(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got '{raw}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::urls::urlconf;
    use exchange_core::settings_loader;

    #[test]
    fn test_build_app() {
        let app = build_app(Settings::default()).unwrap();
        assert!(app.has_urls());

        let settings = Settings {
            root_urlconf: "missing.urls".to_string(),
            ..Settings::default()
        };
        assert!(build_app(settings).is_err());

        let settings = Settings {
            installed_apps: Vec::new(),
            ..Settings::default()
        };
        assert!(build_app(settings).is_err());
    }

    #[test]
    fn test_check_clean() {
        let settings = Settings {
            debug: false,
            allowed_hosts: vec!["exchange.example".to_string()],
            ..Settings::default()
        };
        let app = build_app(settings).unwrap();
        assert_eq!(check(&app).unwrap(), "System check identified no issues.");
    }

    #[test]
    fn test_check_warning_only() {
        let settings = Settings {
            allowed_hosts: vec!["exchange.example".to_string()],
            ..Settings::default()
        };
        let report = check(&build_app(settings).unwrap()).unwrap();
        assert!(report.starts_with("WARNINGS:"));
        assert!(report.contains("security.W003"));
        assert!(report.ends_with("System check identified 1 issue(s)."));
    }

    #[test]
    fn test_check_errors() {
        let settings = Settings {
            debug: false,
            ..Settings::default()
        };
        let err = check(&build_app(settings).unwrap()).unwrap_err();
        assert!(err.to_string().contains("ERRORS:"));
        assert!(err.to_string().contains("security.E001"));
    }

    #[test]
    fn test_show_urls() {
        assert_eq!(show_urls(&urlconf().unwrap()), "token/<slug:slug>\ttoken-detail");
    }

    #[test]
    fn test_reverse_with_settings_prefix() {
        let urls = urlconf().unwrap();
        let mut settings = Settings::default();
        let kwargs = vec![("slug".to_string(), "abc".to_string())];
        assert_eq!(
            reverse(&urls, &settings, "token-detail", &[], &kwargs).unwrap(),
            "/token/abc"
        );

        settings.force_script_name = Some("/exchange/".to_string());
        assert_eq!(
            reverse(&urls, &settings, "token-detail", &["eth".to_string()], &[]).unwrap(),
            "/exchange/token/eth"
        );

        settings_loader::apply_overrides_from(&mut settings, |key| {
            (key == "EXCHANGE_FORCE_SCRIPT_NAME").then(|| "/exchange".to_string())
        });
        assert_eq!(
            reverse(&urls, &settings, "token-detail", &[], &kwargs).unwrap(),
            "/exchange/token/abc"
        );
    }

    #[test]
    fn test_parse_kwarg() {
        assert_eq!(parse_kwarg("slug=eth").unwrap(), ("slug".to_string(), "eth".to_string()));
        assert_eq!(parse_kwarg("q=a=b").unwrap(), ("q".to_string(), "a=b".to_string()));
        assert!(parse_kwarg("slug").is_err());
        assert!(parse_kwarg("=eth").is_err());
    }
}
