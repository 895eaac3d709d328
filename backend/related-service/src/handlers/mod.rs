//! HTTP surface of the ranking engine.

pub mod related;

pub use related::{flush_cache, get_related, health, RelatedHandlerState};
