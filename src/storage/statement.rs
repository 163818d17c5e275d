//! Compiled statements and lazily compiled statement slots.

use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, params_from_iter};

use crate::{Error, Result};

/// SQL text validated by the engine.
///
/// Execution goes through the connection's prepared statement cache, so the
/// engine-side handle is reused across calls.
#[derive(Debug, Clone)]
pub struct CompiledStatement {
    sql: String,
    parameter_count: usize,
}

impl CompiledStatement {
    pub fn compile(conn: &Connection, sql: &str) -> Result<Self> {
        let statement = conn.prepare_cached(sql)?;
        let parameter_count = statement.parameter_count();
        tracing::debug!("Compiled statement ({} parameter(s)): {}", parameter_count, sql);
        Ok(Self {
            sql: sql.to_string(),
            parameter_count,
        })
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn parameter_count(&self) -> usize {
        self.parameter_count
    }

    /// Bind `values` positionally and execute, returning the changed row count.
    pub fn execute(&self, conn: &Connection, values: &[SqlValue]) -> Result<usize> {
        if values.len() != self.parameter_count {
            return Err(Error::State(format!(
                "statement expects {} parameter(s), got {}: {}",
                self.parameter_count,
                values.len(),
                self.sql
            )));
        }
        let mut statement = conn.prepare_cached(&self.sql)?;
        Ok(statement.execute(params_from_iter(values.iter()))?)
    }
}

/// A statement that is compiled on first use.
#[derive(Debug, Default)]
pub enum StatementSlot {
    #[default]
    Uncompiled,
    Compiled(CompiledStatement),
}

impl StatementSlot {
    pub fn is_compiled(&self) -> bool {
        matches!(self, StatementSlot::Compiled(_))
    }

    pub fn get_or_compile(&mut self, conn: &Connection, sql: &str) -> Result<&CompiledStatement> {
        if let StatementSlot::Uncompiled = self {
            *self = StatementSlot::Compiled(CompiledStatement::compile(conn, sql)?);
        }
        match self {
            StatementSlot::Compiled(statement) => Ok(statement),
            StatementSlot::Uncompiled => Err(Error::State(format!("statement not compiled: {}", sql))),
        }
    }
}
