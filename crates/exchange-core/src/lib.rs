//! # exchange-core
//!
//! Core types shared by every exchange crate. Nothing in here knows about
//! HTTP; the other crates build on these pieces.
//!
//! ## Modules
//!
//! - [`error`] - Error type and result alias
//! - [`settings`] - Application settings and the global settings cell
//! - [`settings_loader`] - Loading settings from TOML, JSON, and the environment
//! - [`logging`] - Tracing-based logging setup
//! - [`checks`] - System checks run before the server starts

pub mod checks;
pub mod error;
pub mod logging;
pub mod settings;
pub mod settings_loader;

pub use checks::{CheckLevel, CheckMessage, CheckRegistry};
pub use error::{ExchangeError, ExchangeResult};
pub use settings::{Settings, SETTINGS};
