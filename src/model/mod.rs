//! Entity model - field values, conversions, identity cache and persistence
//!
//! [`Entity`] is implemented by application types. [`Model`] persists them
//! through a compiled type definition.

pub mod cache;
pub mod convert;
pub mod engine;
pub mod entity;
pub mod value;

pub use cache::{CacheGuard, IdentityCache};
pub use engine::Model;
pub use entity::Entity;
pub use value::{FromValue, Record, Value};
