//! Generic persistence engine for one entity type
//!
//! A [`Model`] binds one compiled [`TypeDefinition`] to a [`Database`]. It
//! owns one lazily compiled statement per write kind, each behind its own
//! lock, and an identity cache for `load_by_id`.
//!
//! Locks are always taken in the same order: connection, then statement
//! slot, then identity cache. Writes are serialized by the connection lock;
//! the slot lock is always taken under it and only makes the compile-once
//! transition of the slot safe, so it never contends on its own.

use std::sync::Arc;

use parking_lot::Mutex;
use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, Row, params_from_iter};

use crate::model::cache::IdentityCache;
use crate::model::convert;
use crate::model::entity::Entity;
use crate::model::value::Record;
use crate::query::{Query, RawQuery};
use crate::schema::{PropertyDefinition, TypeDefinition};
use crate::sql::{self, SelectClauses};
use crate::storage::{Database, StatementSlot};
use crate::{Error, Result};

pub struct Model<T: Entity> {
    definition: Arc<TypeDefinition>,
    db: Arc<Database>,
    insert: Mutex<StatementSlot>,
    update: Mutex<StatementSlot>,
    delete: Mutex<StatementSlot>,
    cache: IdentityCache<T>,
}

impl<T: Entity> Model<T> {
    pub fn new(definition: Arc<TypeDefinition>, db: Arc<Database>) -> Self {
        Self {
            definition,
            db,
            insert: Mutex::new(StatementSlot::Uncompiled),
            update: Mutex::new(StatementSlot::Uncompiled),
            delete: Mutex::new(StatementSlot::Uncompiled),
            cache: IdentityCache::new(),
        }
    }

    pub fn definition(&self) -> &TypeDefinition {
        &self.definition
    }

    pub fn table_name(&self) -> &str {
        self.definition.table_name()
    }

    pub fn is_version_enabled(&self) -> bool {
        self.definition.version().is_some()
    }

    pub fn cache(&self) -> &IdentityCache<T> {
        &self.cache
    }

    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }

    // ========== Insert ==========

    /// Insert a new entity and return the assigned id.
    ///
    /// Returns `-1` when a conflict policy skipped the row. The entity itself
    /// is not updated with the new id.
    pub fn insert(&self, entity: &T) -> Result<i64> {
        let conn = self.db.lock();
        let mut slot = self.insert.lock();
        self.insert_with(&conn, &mut slot, entity)
    }

    /// Insert every entity in one transaction, returning ids in input order.
    pub fn insert_in_tx<'a, I>(&self, entities: I) -> Result<Vec<i64>>
    where
        I: IntoIterator<Item = &'a T>,
    {
        self.db.transaction(|conn| {
            let mut slot = self.insert.lock();
            entities
                .into_iter()
                .map(|entity| self.insert_with(conn, &mut slot, entity))
                .collect()
        })
    }

    fn insert_with(&self, conn: &Connection, slot: &mut StatementSlot, entity: &T) -> Result<i64> {
        if !entity.is_new() {
            return Err(Error::State(format!(
                "entity is not new: {} with id {}",
                T::TYPE_NAME,
                entity.id()
            )));
        }
        let values = self.bind(entity, self.definition.insert_properties())?;
        let statement = slot.get_or_compile(conn, &self.definition.dml().insert)?;
        if statement.execute(conn, &values)? == 0 {
            return Ok(-1);
        }
        Ok(conn.last_insert_rowid())
    }

    // ========== Update ==========

    /// Update an entity, checking its version when the type is versioned.
    ///
    /// Returns `false` when no row matched (stale version or missing row);
    /// the cache entry is kept in that case. On success the cached instance
    /// is evicted.
    pub fn update(&self, entity: &T) -> Result<bool> {
        let conn = self.db.lock();
        let mut slot = self.update.lock();
        self.update_with(&conn, &mut slot, entity)
    }

    /// Update every entity in one transaction, returning how many rows changed.
    pub fn update_in_tx<'a, I>(&self, entities: I) -> Result<usize>
    where
        I: IntoIterator<Item = &'a T>,
    {
        self.db.transaction(|conn| {
            let mut slot = self.update.lock();
            let mut updated = 0;
            for entity in entities {
                if self.update_with(conn, &mut slot, entity)? {
                    updated += 1;
                }
            }
            Ok(updated)
        })
    }

    fn update_with(&self, conn: &Connection, slot: &mut StatementSlot, entity: &T) -> Result<bool> {
        let sql = self.definition.dml().update.as_deref().ok_or_else(|| {
            Error::State(format!("{} has no updatable columns", T::TYPE_NAME))
        })?;
        let mut values = self.bind(entity, self.definition.update_properties())?;
        values.push(SqlValue::Integer(entity.id()));
        if self.is_version_enabled() {
            values.push(SqlValue::Integer(entity.version()));
        }

        let statement = slot.get_or_compile(conn, sql)?;
        if statement.execute(conn, &values)? == 1 {
            self.cache.remove(entity.id());
            Ok(true)
        } else {
            tracing::debug!(
                "Update of {} {} matched no row (version {})",
                T::TYPE_NAME,
                entity.id(),
                entity.version()
            );
            Ok(false)
        }
    }

    // ========== Delete ==========

    /// Delete the entity's row by id. The version is not checked.
    pub fn delete(&self, entity: &T) -> Result<bool> {
        self.delete_by_id(entity.id())
    }

    pub fn delete_by_id(&self, id: i64) -> Result<bool> {
        let conn = self.db.lock();
        let mut slot = self.delete.lock();
        self.delete_with(&conn, &mut slot, id)
    }

    /// Delete every entity in one transaction, returning how many rows were removed.
    pub fn delete_in_tx<'a, I>(&self, entities: I) -> Result<usize>
    where
        I: IntoIterator<Item = &'a T>,
    {
        self.delete_by_id_in_tx(entities.into_iter().map(|entity| entity.id()))
    }

    pub fn delete_by_id_in_tx<I>(&self, ids: I) -> Result<usize>
    where
        I: IntoIterator<Item = i64>,
    {
        self.db.transaction(|conn| {
            let mut slot = self.delete.lock();
            let mut deleted = 0;
            for id in ids {
                if self.delete_with(conn, &mut slot, id)? {
                    deleted += 1;
                }
            }
            Ok(deleted)
        })
    }

    fn delete_with(&self, conn: &Connection, slot: &mut StatementSlot, id: i64) -> Result<bool> {
        let statement = slot.get_or_compile(conn, &self.definition.dml().delete)?;
        let deleted = statement.execute(conn, &[SqlValue::Integer(id)])? == 1;
        if deleted {
            self.cache.remove(id);
        }
        Ok(deleted)
    }

    // ========== Queries ==========

    /// Load one entity by id, going through the identity cache.
    pub fn load_by_id(&self, id: i64) -> Result<Option<Arc<T>>> {
        if let Some(hit) = self.cache.get(id) {
            tracing::debug!("Cache hit for {} {}", T::TYPE_NAME, id);
            return Ok(Some(hit));
        }

        let loaded = self.db.with_connection(|conn| {
            let mut statement = conn.prepare_cached(&self.definition.dml().select_by_id)?;
            let mut rows = statement.query([id])?;
            match rows.next()? {
                Some(row) => Ok(Some(self.materialize(row)?)),
                None => Ok(None),
            }
        })?;
        let Some(entity) = loaded else {
            return Ok(None);
        };

        let mut cache = self.cache.lock();
        // another thread may have loaded the same row meanwhile
        if let Some(existing) = cache.get(id) {
            return Ok(Some(existing));
        }
        let entity = Arc::new(entity);
        cache.put(id, &entity);
        tracing::debug!("Cached {} {}", T::TYPE_NAME, id);
        Ok(Some(entity))
    }

    /// Run a SELECT over the type's table. Results never touch the cache.
    pub fn raw_query(&self, query: &RawQuery) -> Result<Vec<T>> {
        let columns = self.definition.query_columns();
        let sql = sql::build_select(self.table_name(), &columns, &query.clauses());
        self.db.with_connection(|conn| {
            let mut statement = conn.prepare(&sql)?;
            let mut rows = statement.query(params_from_iter(query.args.iter()))?;
            let mut entities = Vec::new();
            while let Some(row) = rows.next()? {
                entities.push(self.materialize(row)?);
            }
            Ok(entities)
        })
    }

    /// First result of `query`, forcing `LIMIT 1`.
    pub fn raw_query_single(&self, query: &RawQuery) -> Result<Option<T>> {
        let single = RawQuery {
            limit: Some(1),
            ..query.clone()
        };
        Ok(self.raw_query(&single)?.into_iter().next())
    }

    /// Run a criteria query.
    pub fn query(&self, query: &Query) -> Result<Vec<T>> {
        self.raw_query(&query.to_raw(&self.definition)?)
    }

    /// Count rows matching the query's selection.
    pub fn count(&self, query: &RawQuery) -> Result<i64> {
        let clauses = SelectClauses {
            selection: query.selection.as_deref(),
            ..SelectClauses::default()
        };
        let sql = sql::build_count(self.table_name(), &clauses);
        self.db.with_connection(|conn| {
            Ok(conn.query_row(&sql, params_from_iter(query.args.iter()), |row| row.get(0))?)
        })
    }

    // ========== Helpers ==========

    fn bind<'a>(
        &self,
        entity: &T,
        properties: impl Iterator<Item = &'a PropertyDefinition>,
    ) -> Result<Vec<SqlValue>> {
        properties
            .map(|property| {
                let value = entity.value(property.field_name()).ok_or_else(|| {
                    Error::UnknownField(format!("{}.{}", T::TYPE_NAME, property.field_name()))
                })?;
                convert::to_sql(property, value)
            })
            .collect()
    }

    fn materialize(&self, row: &Row<'_>) -> Result<T> {
        let mut record = Record::new();
        for (i, property) in self.definition.query_properties().enumerate() {
            let value = convert::from_sql(property, row.get_ref(i)?)?;
            record.push(property.field_name(), value);
        }
        T::from_record(&record)
    }
}
