//! Settings loading from configuration files and the environment.
//!
//! ## Loading Order
//!
//! 1. Start with [`Settings::default`].
//! 2. Merge a TOML or JSON document over the defaults.
//! 3. Apply environment variable overrides (highest priority).
//!
//! ## Environment Variable Mapping
//!
//! | Env Var | Setting |
//! |---|---|
//! | `EXCHANGE_DEBUG` | `debug` ("true"/"1"/"yes" => true) |
//! | `EXCHANGE_ALLOWED_HOSTS` | `allowed_hosts` (comma-separated) |
//! | `EXCHANGE_LOG_LEVEL` | `log_level` |
//! | `EXCHANGE_ROOT_URLCONF` | `root_urlconf` |
//! | `EXCHANGE_FORCE_SCRIPT_NAME` | `force_script_name` |
//!
//! ## Examples
//!
//! ```rust,no_run
//! use exchange_core::settings_loader;
//!
//! let settings = settings_loader::from_file_with_env("config/exchange.toml").unwrap();
//! ```

use std::path::Path;

use crate::error::ExchangeError;
use crate::settings::Settings;

/// Loads settings from a TOML string, keeping defaults for absent keys.
pub fn from_toml_str(toml_str: &str) -> Result<Settings, ExchangeError> {
    let toml_value: toml::Value = toml::from_str(toml_str)
        .map_err(|e| ExchangeError::ConfigurationError(format!("Failed to parse TOML: {e}")))?;

    merge_over_defaults(toml_to_json(toml_value), "TOML")
}

/// Loads settings from a JSON string, keeping defaults for absent keys.
pub fn from_json_str(json_str: &str) -> Result<Settings, ExchangeError> {
    let json_value: serde_json::Value = serde_json::from_str(json_str)
        .map_err(|e| ExchangeError::ConfigurationError(format!("Failed to parse JSON: {e}")))?;

    merge_over_defaults(json_value, "JSON")
}

/// Loads settings from a file, choosing the format from its extension.
///
/// `.json` files are parsed as JSON; everything else is parsed as TOML.
pub fn from_file(path: impl AsRef<Path>) -> Result<Settings, ExchangeError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| {
        ExchangeError::ConfigurationError(format!(
            "Failed to read settings file '{}': {e}",
            path.display()
        ))
    })?;

    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        from_json_str(&content)
    } else {
        from_toml_str(&content)
    }
}

/// Loads settings from a file and then applies environment overrides.
pub fn from_file_with_env(path: impl AsRef<Path>) -> Result<Settings, ExchangeError> {
    let mut settings = from_file(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Loads settings from just environment variables (starting from defaults).
pub fn from_env() -> Settings {
    let mut settings = Settings::default();
    apply_env_overrides(&mut settings);
    settings
}

/// Applies `EXCHANGE_*` environment variable overrides to `settings`.
pub fn apply_env_overrides(settings: &mut Settings) {
    apply_overrides_from(settings, |key| std::env::var(key).ok());
}

/// Applies overrides read through `lookup`, which maps an `EXCHANGE_*`
/// variable name to its value.
pub fn apply_overrides_from<F>(settings: &mut Settings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(val) = lookup("EXCHANGE_DEBUG") {
        settings.debug = matches!(val.to_lowercase().as_str(), "true" | "1" | "yes");
    }

    if let Some(val) = lookup("EXCHANGE_ALLOWED_HOSTS") {
        settings.allowed_hosts = val
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }

    if let Some(val) = lookup("EXCHANGE_LOG_LEVEL") {
        settings.log_level = val;
    }

    if let Some(val) = lookup("EXCHANGE_ROOT_URLCONF") {
        settings.root_urlconf = val;
    }

    if let Some(val) = lookup("EXCHANGE_FORCE_SCRIPT_NAME") {
        settings.force_script_name = if val.is_empty() { None } else { Some(val) };
    }
}

// ============================================================
// Helpers
// ============================================================

fn merge_over_defaults(
    value: serde_json::Value,
    format: &str,
) -> Result<Settings, ExchangeError> {
    let default_json = serde_json::to_value(Settings::default()).map_err(|e| {
        ExchangeError::ConfigurationError(format!("Failed to serialize default settings: {e}"))
    })?;

    let merged = merge_json(default_json, value);
    serde_json::from_value(merged).map_err(|e| {
        ExchangeError::ConfigurationError(format!(
            "Failed to deserialize settings from {format}: {e}"
        ))
    })
}

/// Converts a TOML value to a `serde_json::Value`.
fn toml_to_json(value: toml::Value) -> serde_json::Value {
    match value {
        toml::Value::String(s) => serde_json::Value::String(s),
        toml::Value::Integer(i) => serde_json::json!(i),
        toml::Value::Float(f) => serde_json::json!(f),
        toml::Value::Boolean(b) => serde_json::Value::Bool(b),
        toml::Value::Datetime(dt) => serde_json::Value::String(dt.to_string()),
        toml::Value::Array(arr) => {
            serde_json::Value::Array(arr.into_iter().map(toml_to_json).collect())
        }
        toml::Value::Table(table) => {
            let map: serde_json::Map<String, serde_json::Value> = table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect();
            serde_json::Value::Object(map)
        }
    }
}

/// Deep-merges two JSON values. The `override_val` takes precedence.
fn merge_json(base: serde_json::Value, override_val: serde_json::Value) -> serde_json::Value {
    match (base, override_val) {
        (serde_json::Value::Object(mut base_map), serde_json::Value::Object(override_map)) => {
            for (key, override_v) in override_map {
                let merged = if let Some(base_v) = base_map.remove(&key) {
                    merge_json(base_v, override_v)
                } else {
                    override_v
                };
                base_map.insert(key, merged);
            }
            serde_json::Value::Object(base_map)
        }
        (_, override_val) => override_val,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use super::*;

    fn lookup_in(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    // ── TOML / JSON ─────────────────────────────────────────────────

    #[test]
    fn test_from_toml_str_basic() {
        let toml = r#"
            debug = false
            allowed_hosts = ["exchange.example", ".api.exchange.example"]
        "#;

        let settings = from_toml_str(toml).unwrap();
        assert!(!settings.debug);
        assert_eq!(settings.allowed_hosts.len(), 2);
        // Defaults preserved
        assert_eq!(settings.root_urlconf, "trading.urls");
        assert_eq!(settings.log_level, "info");
    }

    #[test]
    fn test_from_toml_str_script_name() {
        let settings = from_toml_str(r#"force_script_name = "/exchange/""#).unwrap();
        assert_eq!(settings.script_prefix(), "/exchange/");
    }

    #[test]
    fn test_from_toml_str_empty() {
        let settings = from_toml_str("").unwrap();
        assert!(settings.debug);
        assert!(settings.allowed_hosts.is_empty());
    }

    #[test]
    fn test_from_toml_str_invalid() {
        assert!(from_toml_str("[[invalid toml content").is_err());
    }

    #[test]
    fn test_from_toml_str_wrong_type() {
        let err = from_toml_str("debug = \"maybe\"").unwrap_err();
        assert!(err.to_string().contains("TOML"));
    }

    #[test]
    fn test_from_json_str_basic() {
        let json = r#"{ "debug": false, "log_level": "debug" }"#;
        let settings = from_json_str(json).unwrap();
        assert!(!settings.debug);
        assert_eq!(settings.log_level, "debug");
        assert_eq!(settings.root_urlconf, "trading.urls");
    }

    #[test]
    fn test_from_json_str_extra() {
        let json = r#"{ "extra": { "quote_currency": "USDT" } }"#;
        let settings = from_json_str(json).unwrap();
        assert_eq!(
            settings.extra.get("quote_currency"),
            Some(&serde_json::json!("USDT"))
        );
    }

    #[test]
    fn test_from_json_str_invalid() {
        assert!(from_json_str("{not json").is_err());
    }

    // ── Files ───────────────────────────────────────────────────────

    #[test]
    fn test_from_file_toml() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "log_level = \"warn\"").unwrap();

        let settings = from_file(file.path()).unwrap();
        assert_eq!(settings.log_level, "warn");
    }

    #[test]
    fn test_from_file_json() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{ "installed_apps": ["trading", "wallet"] }}"#).unwrap();

        let settings = from_file(file.path()).unwrap();
        assert_eq!(settings.installed_apps, vec!["trading", "wallet"]);
    }

    #[test]
    fn test_from_file_missing() {
        let err = from_file("/nonexistent/exchange.toml").unwrap_err();
        assert!(matches!(err, ExchangeError::ConfigurationError(_)));
    }

    // ── Overrides ───────────────────────────────────────────────────

    #[test]
    fn test_override_debug() {
        for (raw, expected) in [("true", true), ("1", true), ("YES", true), ("false", false)] {
            let mut settings = Settings::default();
            settings.debug = !expected;
            apply_overrides_from(&mut settings, lookup_in(&[("EXCHANGE_DEBUG", raw)]));
            assert_eq!(settings.debug, expected, "EXCHANGE_DEBUG={raw}");
        }
    }

    #[test]
    fn test_override_allowed_hosts() {
        let mut settings = Settings::default();
        apply_overrides_from(
            &mut settings,
            lookup_in(&[("EXCHANGE_ALLOWED_HOSTS", "exchange.example, ,api.exchange.example")]),
        );
        assert_eq!(
            settings.allowed_hosts,
            vec!["exchange.example", "api.exchange.example"]
        );
    }

    #[test]
    fn test_override_log_level_and_urlconf() {
        let mut settings = Settings::default();
        apply_overrides_from(
            &mut settings,
            lookup_in(&[
                ("EXCHANGE_LOG_LEVEL", "debug"),
                ("EXCHANGE_ROOT_URLCONF", "wallet.urls"),
            ]),
        );
        assert_eq!(settings.log_level, "debug");
        assert_eq!(settings.root_urlconf, "wallet.urls");
    }

    #[test]
    fn test_override_script_name_empty_clears() {
        let mut settings = Settings {
            force_script_name: Some("/old/".to_string()),
            ..Settings::default()
        };
        apply_overrides_from(&mut settings, lookup_in(&[("EXCHANGE_FORCE_SCRIPT_NAME", "")]));
        assert!(settings.force_script_name.is_none());
    }

    #[test]
    fn test_no_overrides_keeps_settings() {
        let mut settings = Settings::default();
        apply_overrides_from(&mut settings, lookup_in(&[]));
        assert!(settings.debug);
        assert_eq!(settings.log_level, "info");
    }

    #[test]
    fn test_merge_json_nested() {
        let base = serde_json::json!({"a": {"b": 1, "c": 2}});
        let over = serde_json::json!({"a": {"c": 3}});
        let merged = merge_json(base, over);
        assert_eq!(merged, serde_json::json!({"a": {"b": 1, "c": 3}}));
    }
}
