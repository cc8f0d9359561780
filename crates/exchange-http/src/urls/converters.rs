//! Path converters for URL pattern matching.
//!
//! A converter decides which text a `<type:name>` placeholder accepts and
//! how that text maps to a typed value and back.
//!
//! | Name   | Regex                                  | Value             |
//! |--------|----------------------------------------|-------------------|
//! | `int`  | `[0-9]+`                               | `PathValue::Int`  |
//! | `str`  | `[^/]+`                                | `PathValue::Str`  |
//! | `slug` | `[-a-zA-Z0-9_]+`                       | `PathValue::Slug` |
//! | `uuid` | `[0-9a-f]{8}-...-[0-9a-f]{12}`         | `PathValue::Uuid` |
//! | `path` | `.+`                                   | `PathValue::Path` |
//!
//! Only `path` can span a `/`.

use std::fmt;
use std::sync::Arc;

use exchange_core::{ExchangeError, ExchangeResult};

/// A typed value extracted from a URL path segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathValue {
    /// An integer value, produced by [`IntConverter`].
    Int(u64),
    /// A string value (no slashes), produced by [`StrConverter`].
    Str(String),
    /// A slug value, produced by [`SlugConverter`].
    Slug(String),
    /// A UUID value, produced by [`UuidConverter`].
    Uuid(uuid::Uuid),
    /// A path value (may contain slashes), produced by [`PathSegmentConverter`].
    Path(String),
}

impl fmt::Display for PathValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Str(v) | Self::Slug(v) | Self::Path(v) => write!(f, "{v}"),
            Self::Uuid(v) => write!(f, "{v}"),
        }
    }
}

/// Converts URL path segments to typed values and back.
pub trait PathConverter: Send + Sync + fmt::Debug {
    /// The name used in route templates (`slug` in `<slug:slug>`).
    fn name(&self) -> &'static str;

    /// Returns the regex fragment that matches valid values.
    fn regex(&self) -> &'static str;

    /// Converts a matched segment into a typed [`PathValue`].
    fn to_rust(&self, value: &str) -> ExchangeResult<PathValue>;

    /// Converts a [`PathValue`] back into its URL text.
    fn to_url(&self, value: &PathValue) -> ExchangeResult<String>;
}

fn wrong_value(converter: &str, value: &PathValue) -> ExchangeError {
    ExchangeError::BadRequest(format!("{converter} converter cannot format {value:?}"))
}

/// Matches one or more ASCII digits.
#[derive(Debug, Clone, Copy)]
pub struct IntConverter;

impl PathConverter for IntConverter {
    fn name(&self) -> &'static str {
        "int"
    }

    fn regex(&self) -> &'static str {
        "[0-9]+"
    }

    fn to_rust(&self, value: &str) -> ExchangeResult<PathValue> {
        value
            .parse::<u64>()
            .map(PathValue::Int)
            .map_err(|_| ExchangeError::BadRequest(format!("Invalid integer value: {value}")))
    }

    fn to_url(&self, value: &PathValue) -> ExchangeResult<String> {
        match value {
            PathValue::Int(v) => Ok(v.to_string()),
            other => Err(wrong_value("int", other)),
        }
    }
}

/// Matches any non-empty segment without `/`. The default converter.
#[derive(Debug, Clone, Copy)]
pub struct StrConverter;

impl PathConverter for StrConverter {
    fn name(&self) -> &'static str {
        "str"
    }

    fn regex(&self) -> &'static str {
        "[^/]+"
    }

    fn to_rust(&self, value: &str) -> ExchangeResult<PathValue> {
        if value.is_empty() || value.contains('/') {
            return Err(ExchangeError::BadRequest(format!(
                "Invalid string segment: {value:?}"
            )));
        }
        Ok(PathValue::Str(value.to_string()))
    }

    fn to_url(&self, value: &PathValue) -> ExchangeResult<String> {
        match value {
            PathValue::Str(v) => Ok(v.clone()),
            other => Err(wrong_value("str", other)),
        }
    }
}

/// Matches slugs: ASCII letters, digits, hyphens, and underscores.
#[derive(Debug, Clone, Copy)]
pub struct SlugConverter;

impl SlugConverter {
    /// Returns `true` if `value` is a non-empty slug.
    pub fn is_slug(value: &str) -> bool {
        !value.is_empty()
            && value
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    }
}

impl PathConverter for SlugConverter {
    fn name(&self) -> &'static str {
        "slug"
    }

    fn regex(&self) -> &'static str {
        "[-a-zA-Z0-9_]+"
    }

    fn to_rust(&self, value: &str) -> ExchangeResult<PathValue> {
        if !Self::is_slug(value) {
            return Err(ExchangeError::BadRequest(format!("Invalid slug: {value:?}")));
        }
        Ok(PathValue::Slug(value.to_string()))
    }

    fn to_url(&self, value: &PathValue) -> ExchangeResult<String> {
        match value {
            PathValue::Slug(v) if Self::is_slug(v) => Ok(v.clone()),
            other => Err(wrong_value("slug", other)),
        }
    }
}

/// Matches lowercase hyphenated UUIDs.
#[derive(Debug, Clone, Copy)]
pub struct UuidConverter;

impl PathConverter for UuidConverter {
    fn name(&self) -> &'static str {
        "uuid"
    }

    fn regex(&self) -> &'static str {
        "[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}"
    }

    fn to_rust(&self, value: &str) -> ExchangeResult<PathValue> {
        value
            .parse::<uuid::Uuid>()
            .map(PathValue::Uuid)
            .map_err(|_| ExchangeError::BadRequest(format!("Invalid UUID: {value}")))
    }

    fn to_url(&self, value: &PathValue) -> ExchangeResult<String> {
        match value {
            PathValue::Uuid(v) => Ok(v.hyphenated().to_string()),
            other => Err(wrong_value("uuid", other)),
        }
    }
}

/// Matches any non-empty string, including `/`.
#[derive(Debug, Clone, Copy)]
pub struct PathSegmentConverter;

impl PathConverter for PathSegmentConverter {
    fn name(&self) -> &'static str {
        "path"
    }

    fn regex(&self) -> &'static str {
        ".+"
    }

    fn to_rust(&self, value: &str) -> ExchangeResult<PathValue> {
        if value.is_empty() {
            return Err(ExchangeError::BadRequest(
                "Path converter requires a non-empty value".to_string(),
            ));
        }
        Ok(PathValue::Path(value.to_string()))
    }

    fn to_url(&self, value: &PathValue) -> ExchangeResult<String> {
        match value {
            PathValue::Path(v) => Ok(v.clone()),
            other => Err(wrong_value("path", other)),
        }
    }
}

/// Returns the shared converter registered under `type_name`.
///
/// # Errors
///
/// Returns [`ExchangeError::ImproperlyConfigured`] for unknown names.
pub fn get_converter(type_name: &str) -> ExchangeResult<Arc<dyn PathConverter>> {
    match type_name {
        "int" => Ok(Arc::new(IntConverter)),
        "str" => Ok(Arc::new(StrConverter)),
        "slug" => Ok(Arc::new(SlugConverter)),
        "uuid" => Ok(Arc::new(UuidConverter)),
        "path" => Ok(Arc::new(PathSegmentConverter)),
        _ => Err(ExchangeError::ImproperlyConfigured(format!(
            "Unknown path converter type: {type_name}"
        ))),
    }
}
