//! The entity contract between application types and the persistence engine.

use crate::Result;
use crate::model::value::{Record, Value};
use crate::schema::EntityDeclaration;

/// An application type persisted by a [`Model`](crate::model::Model).
///
/// The engine reads field values through [`Entity::value`] when binding
/// statements and rebuilds instances from rows through
/// [`Entity::from_record`]. Field names are the declared field names.
pub trait Entity: Send + Sync + Sized + 'static {
    /// Name under which the type is registered
    const TYPE_NAME: &'static str;

    /// Declaration compiled into the type's table definition
    fn declaration() -> EntityDeclaration;

    /// Row id; zero or negative means the entity was never inserted.
    fn id(&self) -> i64;

    /// Optimistic version; ignored for types without a version column.
    fn version(&self) -> i64 {
        0
    }

    /// Current value of a persisted field, or `None` for unknown fields.
    fn value(&self, field: &str) -> Option<Value>;

    fn from_record(record: &Record) -> Result<Self>;

    fn is_new(&self) -> bool {
        self.id() <= 0
    }
}
