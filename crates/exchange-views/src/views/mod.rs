//! Views.
//!
//! - [`class_based`] - the [`View`] trait and [`ContextMixin`]
//! - [`generic`] - [`DetailView`] for single-object lookups

pub mod class_based;
pub mod generic;

pub use class_based::{ContextMixin, View};
pub use generic::{DetailView, ObjectLookup};
