//! System checks run before the exchange starts serving.
//!
//! - [`CheckMessage`]: a diagnostic with level, message, hint, object, and id.
//! - [`CheckLevel`]: severity. `Error` and above stop startup.
//! - [`CheckRegistry`]: tagged settings checks.
//! - [`raise_on_errors`]: turns error-level findings into an
//!   [`ExchangeError::ImproperlyConfigured`].
//!
//! Other crates produce messages of their own (the URL checks in
//! `exchange-http`, for one) and feed them through the same helpers.
//!
//! ## Examples
//!
//! ```
//! use exchange_core::checks::{CheckMessage, CheckRegistry};
//!
//! let mut registry = CheckRegistry::new();
//! registry.register(
//!     |_settings| {
//!         vec![CheckMessage::warning(
//!             "Custom check warning",
//!             Some("Consider fixing this."),
//!             None,
//!             Some("trading.W001"),
//!         )]
//!     },
//!     &["trading"],
//! );
//!
//! let settings = exchange_core::settings::Settings::default();
//! let messages = registry.run_checks(None, &settings);
//! assert_eq!(messages.len(), 1);
//! ```

use crate::error::{ExchangeError, ExchangeResult};
use crate::settings::Settings;

/// Severity level for a check message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CheckLevel {
    /// Debugging information.
    Debug = 0,
    /// Informational message.
    Info = 1,
    /// A potential problem.
    Warning = 2,
    /// A definite problem that should be fixed.
    Error = 3,
    /// A critical error that prevents the application from running.
    Critical = 4,
}

impl std::fmt::Display for CheckLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Debug => write!(f, "DEBUG"),
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARNING"),
            Self::Error => write!(f, "ERROR"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// A diagnostic message produced by a system check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckMessage {
    /// The severity level.
    pub level: CheckLevel,
    /// The human-readable message describing the issue.
    pub msg: String,
    /// An optional hint on how to fix the issue.
    pub hint: Option<String>,
    /// The object (setting, route, etc.) that has the issue.
    pub obj: Option<String>,
    /// A unique identifier for this check message (e.g. "urls.E010").
    pub id: Option<String>,
}

impl CheckMessage {
    /// Creates a new `CheckMessage` with the given level and details.
    pub fn new(
        level: CheckLevel,
        msg: impl Into<String>,
        hint: Option<&str>,
        obj: Option<&str>,
        id: Option<&str>,
    ) -> Self {
        Self {
            level,
            msg: msg.into(),
            hint: hint.map(String::from),
            obj: obj.map(String::from),
            id: id.map(String::from),
        }
    }

    /// Creates an info-level message.
    pub fn info(msg: impl Into<String>, hint: Option<&str>, obj: Option<&str>, id: Option<&str>) -> Self {
        Self::new(CheckLevel::Info, msg, hint, obj, id)
    }

    /// Creates a warning-level message.
    pub fn warning(msg: impl Into<String>, hint: Option<&str>, obj: Option<&str>, id: Option<&str>) -> Self {
        Self::new(CheckLevel::Warning, msg, hint, obj, id)
    }

    /// Creates an error-level message.
    pub fn error(msg: impl Into<String>, hint: Option<&str>, obj: Option<&str>, id: Option<&str>) -> Self {
        Self::new(CheckLevel::Error, msg, hint, obj, id)
    }

    /// Creates a critical-level message.
    pub fn critical(msg: impl Into<String>, hint: Option<&str>, obj: Option<&str>, id: Option<&str>) -> Self {
        Self::new(CheckLevel::Critical, msg, hint, obj, id)
    }

    /// Returns `true` if this is a warning or higher severity.
    pub fn is_serious(&self) -> bool {
        self.level >= CheckLevel::Warning
    }

    /// Returns `true` if this message must stop the application from starting.
    pub fn is_error(&self) -> bool {
        self.level >= CheckLevel::Error
    }
}

impl std::fmt::Display for CheckMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref id) = self.id {
            write!(f, "({id}) ")?;
        }
        write!(f, "{}: {}", self.level, self.msg)?;
        if let Some(ref hint) = self.hint {
            write!(f, "\n\tHINT: {hint}")?;
        }
        if let Some(ref obj) = self.obj {
            write!(f, "\n\tObject: {obj}")?;
        }
        Ok(())
    }
}

/// Logs every message at a matching tracing level and returns an
/// `ImproperlyConfigured` error listing the error-level ones, if any.
pub fn raise_on_errors(messages: &[CheckMessage]) -> ExchangeResult<()> {
    for message in messages {
        match message.level {
            CheckLevel::Debug => tracing::debug!("{message}"),
            CheckLevel::Info => tracing::info!("{message}"),
            CheckLevel::Warning => tracing::warn!("{message}"),
            CheckLevel::Error | CheckLevel::Critical => tracing::error!("{message}"),
        }
    }

    let errors: Vec<String> = messages
        .iter()
        .filter(|m| m.is_error())
        .map(ToString::to_string)
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ExchangeError::ImproperlyConfigured(format!(
            "System check identified {} error(s):\n{}",
            errors.len(),
            errors.join("\n")
        )))
    }
}

/// A check function that receives settings and returns diagnostic messages.
pub type CheckFn = fn(&Settings) -> Vec<CheckMessage>;

struct RegisteredCheck {
    func: CheckFn,
    tags: Vec<String>,
}

/// Registry for settings check functions, filterable by tag.
pub struct CheckRegistry {
    checks: Vec<RegisteredCheck>,
}

impl CheckRegistry {
    /// Creates a new empty check registry.
    pub const fn new() -> Self {
        Self { checks: Vec::new() }
    }

    /// Creates a new check registry pre-loaded with the built-in checks.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(check_debug_production, &["security"]);
        registry.register(check_allowed_hosts, &["security"]);
        registry
    }

    /// Registers a check function with the given tags.
    pub fn register(&mut self, func: CheckFn, tags: &[&str]) {
        self.checks.push(RegisteredCheck {
            func,
            tags: tags.iter().map(|t| (*t).to_string()).collect(),
        });
    }

    /// Runs all registered checks, or only those carrying one of `tags`.
    pub fn run_checks(&self, tags: Option<&[&str]>, settings: &Settings) -> Vec<CheckMessage> {
        let mut messages = Vec::new();

        for check in &self.checks {
            let should_run = tags.map_or(true, |filter_tags| {
                filter_tags.iter().any(|t| check.tags.iter().any(|own| own == t))
            });

            if should_run {
                messages.extend((check.func)(settings));
            }
        }

        messages
    }

    /// Returns the number of registered checks.
    pub fn len(&self) -> usize {
        self.checks.len()
    }

    /// Returns `true` if no checks are registered.
    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }
}

impl Default for CheckRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================
// Built-in checks
// ============================================================

/// `DEBUG` with `ALLOWED_HOSTS` set looks like production with debug on.
fn check_debug_production(settings: &Settings) -> Vec<CheckMessage> {
    let mut messages = Vec::new();

    if settings.debug && !settings.allowed_hosts.is_empty() {
        messages.push(CheckMessage::warning(
            "DEBUG is True with ALLOWED_HOSTS set. This looks like a production configuration with debug enabled.",
            Some("Set DEBUG to false for production deployments."),
            Some("settings.debug"),
            Some("security.W003"),
        ));
    }

    messages
}

/// Without `DEBUG`, an empty `ALLOWED_HOSTS` rejects every request.
fn check_allowed_hosts(settings: &Settings) -> Vec<CheckMessage> {
    let mut messages = Vec::new();

    if !settings.debug && settings.allowed_hosts.is_empty() {
        messages.push(CheckMessage::error(
            "ALLOWED_HOSTS is empty with DEBUG=false. The exchange will not serve any requests.",
            Some("Set ALLOWED_HOSTS to a list of allowed hostnames."),
            Some("settings.allowed_hosts"),
            Some("security.E001"),
        ));
    }

    messages
}
