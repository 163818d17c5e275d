//! Storage Layer - SQLite execution engine
//!
//! The persistence engine needs four things from the store: execute a
//! statement, run a query, compile a statement and bracket work in a
//! transaction. [`Database`] provides them over one `rusqlite` connection.

pub mod database;
pub mod statement;

pub use database::Database;
pub use statement::{CompiledStatement, StatementSlot};
