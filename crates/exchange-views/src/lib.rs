//! # exchange-views
//!
//! View layer for the exchange: class-based views, the generic
//! [`DetailView`](views::DetailView), `Host` validation, and the axum
//! server that dispatches resolved requests to views.

pub mod hosts;
pub mod server;
pub mod views;

pub use server::ExchangeApp;
