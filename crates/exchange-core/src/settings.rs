//! Application settings.
//!
//! [`Settings`] holds the configuration the exchange reads at startup, and
//! [`SETTINGS`] is the process-wide cell it is stored in once loaded.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

/// The complete set of application settings.
///
/// # Examples
///
/// ```
/// use exchange_core::settings::Settings;
///
/// let settings = Settings::default();
/// assert!(settings.debug);
/// assert_eq!(settings.root_urlconf, "trading.urls");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Whether debug mode is enabled.
    pub debug: bool,
    /// Hostnames that this application can serve.
    ///
    /// Entries are exact hostnames, `*`, or `.example.com` to match a
    /// domain and all of its subdomains.
    pub allowed_hosts: Vec<String>,
    /// Installed application labels.
    pub installed_apps: Vec<String>,
    /// Label of the root URL configuration.
    pub root_urlconf: String,
    /// Script prefix prepended by reverse lookups, with a trailing `/` added
    /// when missing. `None` means `/`.
    pub force_script_name: Option<String>,
    /// The log level filter (e.g. "info", "debug", "exchange_http=trace").
    pub log_level: String,
    /// Custom settings that don't fit into the above fields.
    pub extra: HashMap<String, serde_json::Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: true,
            allowed_hosts: Vec::new(),
            installed_apps: vec!["trading".to_string()],
            root_urlconf: "trading.urls".to_string(),
            force_script_name: None,
            log_level: "info".to_string(),
            extra: HashMap::new(),
        }
    }
}

impl Settings {
    /// Returns the prefix reverse lookups should root their paths at,
    /// always ending in `/`.
    pub fn script_prefix(&self) -> Cow<'_, str> {
        match self.force_script_name.as_deref() {
            None => Cow::Borrowed("/"),
            Some(prefix) if prefix.ends_with('/') => Cow::Borrowed(prefix),
            Some(prefix) => Cow::Owned(format!("{prefix}/")),
        }
    }
}

/// A lazily-initialized, globally-accessible settings container.
///
/// Call [`configure`](LazySettings::configure) once at startup to set the
/// settings, then use [`get`](LazySettings::get) to access them.
pub struct LazySettings {
    inner: OnceLock<Settings>,
}

impl Default for LazySettings {
    fn default() -> Self {
        Self::new()
    }
}

impl LazySettings {
    /// Creates a new, unconfigured `LazySettings`.
    pub const fn new() -> Self {
        Self {
            inner: OnceLock::new(),
        }
    }

    /// Configures the global settings. Must be called exactly once.
    ///
    /// # Panics
    ///
    /// Panics if settings have already been configured.
    pub fn configure(&self, settings: Settings) {
        self.inner
            .set(settings)
            .expect("Settings have already been configured");
    }

    /// Returns a reference to the configured settings.
    ///
    /// # Panics
    ///
    /// Panics if settings have not been configured.
    pub fn get(&self) -> &Settings {
        self.inner
            .get()
            .expect("Settings have not been configured. Call SETTINGS.configure() first.")
    }

    /// Returns the settings if they have been configured.
    pub fn try_get(&self) -> Option<&Settings> {
        self.inner.get()
    }

    /// Returns `true` if settings have been configured.
    pub fn is_configured(&self) -> bool {
        self.inner.get().is_some()
    }
}

/// The global settings instance.
pub static SETTINGS: LazySettings = LazySettings::new();
