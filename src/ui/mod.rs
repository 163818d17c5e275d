//! Terminal output for the `tablemap` binary

pub mod output;
pub mod table;
pub mod theme;

pub use output::{
    banner, caution, definition, failure, field, heading, note, success, table_created,
};
pub use table::{EntityRow, entity_table};
pub use theme::{Theme, Tone, paint, theme};
