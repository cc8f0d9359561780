//! # exchange-trading
//!
//! The `trading` app of the exchange: the `token/<slug:slug>` route named
//! `token-detail`, the [`TokenDetailView`](views::TokenDetailView) it
//! dispatches to, and the management commands of the `exchange-trading`
//! binary.

pub mod commands;
pub mod urls;
pub mod views;

pub use urls::{urlconf, urlpatterns};
pub use views::{EchoTokenSource, TokenDetailView, TokenSource};
