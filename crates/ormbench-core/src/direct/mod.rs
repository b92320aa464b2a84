//! Direct-SQL engine.
//!
//! Hand-written SQL over one SQLite connection, without any mapping layer.
//! The fixed-shape statements (insert, update, delete, count) are compiled
//! lazily into [`StatementSlots`]; variable-arity statements (batch insert,
//! multi-id lookup, paging) are composed and compiled on every call.
//!
//! # Batch ids
//!
//! `insert_batch` issues a single multi-row `INSERT` and derives every id
//! from the rowid SQLite reports for that statement. SQLite reports the rowid
//! of the *last* row, and `AUTOINCREMENT` hands out contiguous, increasing
//! rowids in `VALUES` order, so the first id is `last - (n - 1)` and record
//! `i` receives `first + i`. This only holds while no other writer can
//! insert between the statement and the rowid read; the engine owns exactly
//! one connection and is never shared without external serialization.

mod statements;

pub use statements::{Slot, StatementKind, StatementSlots};

use rusqlite::types::ToSql;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use tracing::{debug, trace};

use crate::contract::Orm;
use crate::error::{Error, Result};
use crate::model::User;
use crate::sql;

/// Direct-SQL backend.
#[derive(Debug, Default)]
pub struct DirectEngine {
    conn: Option<Connection>,
    statements: StatementSlots,
}

impl DirectEngine {
    /// Registry name of this backend.
    pub const NAME: &'static str = "direct";

    /// Create an engine with no connection. Call [`Orm::init`] before use.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine and open `dsn`.
    pub fn open(dsn: &str) -> Result<Self> {
        let mut engine = Self::new();
        engine.init(dsn)?;
        Ok(engine)
    }

    /// Create an engine over a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        Self::open(":memory:")
    }

    /// Check whether the connection is open.
    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    /// Compilation state of the cached statements.
    pub fn statements(&self) -> &StatementSlots {
        &self.statements
    }

    fn conn(&self) -> Result<&Connection> {
        self.conn.as_ref().ok_or_else(Error::not_initialized)
    }

    /// Split borrow of the connection and the statement slots.
    fn parts(&mut self) -> Result<(&Connection, &mut StatementSlots)> {
        let Self { conn, statements } = self;
        let conn = conn.as_ref().ok_or_else(Error::not_initialized)?;
        Ok((conn, statements))
    }
}

impl Orm for DirectEngine {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn init(&mut self, dsn: &str) -> Result<()> {
        if self.conn.is_some() {
            return Err(Error::Connection("connection already initialized".to_string()));
        }

        let conn = Connection::open(dsn)
            .map_err(|e| Error::Connection(format!("failed to open {}: {}", dsn, e)))?;
        conn.set_prepared_statement_cache_capacity(StatementKind::ALL.len());

        debug!(backend = Self::NAME, dsn, "opened connection");
        self.conn = Some(conn);
        self.statements.clear();
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.statements.clear();
        let Some(conn) = self.conn.take() else {
            return Ok(());
        };

        conn.flush_prepared_statement_cache();
        conn.close()
            .map_err(|(_, e)| Error::Connection(format!("failed to close connection: {}", e)))?;
        debug!(backend = Self::NAME, "closed connection");
        Ok(())
    }

    fn create_schema(&mut self) -> Result<()> {
        let conn = self.conn()?;
        for stmt in sql::CREATE_SCHEMA {
            conn.execute_batch(stmt)?;
        }
        Ok(())
    }

    fn drop_schema(&mut self) -> Result<()> {
        let conn = self.conn()?;
        for stmt in sql::DROP_SCHEMA {
            conn.execute_batch(stmt)?;
        }
        Ok(())
    }

    fn insert(&mut self, user: &mut User) -> Result<()> {
        let (conn, statements) = self.parts()?;
        let mut stmt = statements.prepare(conn, StatementKind::Insert)?;
        user.id = stmt.insert(params![user.name, user.email, user.age])?;
        Ok(())
    }

    fn insert_batch(&mut self, users: &mut [User]) -> Result<()> {
        if users.is_empty() {
            return Ok(());
        }

        let conn = self.conn()?;
        let last_id = {
            let mut values: Vec<&dyn ToSql> = Vec::with_capacity(users.len() * 3);
            for user in users.iter() {
                values.push(&user.name);
                values.push(&user.email);
                values.push(&user.age);
            }

            let mut stmt = conn.prepare(&sql::insert_users(users.len()))?;
            stmt.execute(values.as_slice())?;
            conn.last_insert_rowid()
        };

        let first_id = last_id - (users.len() as i64 - 1);
        for (offset, user) in users.iter_mut().enumerate() {
            user.id = first_id + offset as i64;
        }

        trace!(rows = users.len(), first_id, "inserted batch");
        Ok(())
    }

    fn get_by_id(&mut self, id: i64) -> Result<User> {
        self.conn()?
            .query_row(sql::SELECT_USER_BY_ID, [id], User::from_row)
            .optional()?
            .ok_or(Error::NotFound(id))
    }

    fn get_by_ids(&mut self, ids: &[i64]) -> Result<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql::select_users_in(ids.len()))?;
        let users = stmt
            .query_map(params_from_iter(ids), User::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(users)
    }

    fn update(&mut self, user: &User) -> Result<()> {
        let (conn, statements) = self.parts()?;
        let mut stmt = statements.prepare(conn, StatementKind::Update)?;
        let affected = stmt.execute(params![user.name, user.email, user.age, user.id])?;
        if affected == 0 {
            trace!(id = user.id, "update matched no rows");
        }
        Ok(())
    }

    fn delete(&mut self, id: i64) -> Result<()> {
        let (conn, statements) = self.parts()?;
        let mut stmt = statements.prepare(conn, StatementKind::Delete)?;
        let affected = stmt.execute([id])?;
        if affected == 0 {
            trace!(id, "delete matched no rows");
        }
        Ok(())
    }

    fn count(&mut self) -> Result<i64> {
        let (conn, statements) = self.parts()?;
        let mut stmt = statements.prepare(conn, StatementKind::Count)?;
        Ok(stmt.query_row([], |row| row.get(0))?)
    }

    fn list(&mut self, limit: usize, offset: usize) -> Result<Vec<User>> {
        let conn = self.conn()?;
        let (limit, offset) = (sql::page_bound(limit), sql::page_bound(offset));
        let mut stmt = conn.prepare(sql::LIST_USERS)?;
        let users = stmt
            .query_map(params![limit, offset], User::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> DirectEngine {
        let mut engine = DirectEngine::open_in_memory().unwrap();
        engine.create_schema().unwrap();
        engine
    }

    fn user(i: usize) -> User {
        User::new(format!("user{}", i), format!("user{}@example.com", i), 20 + (i % 50) as i32)
    }

    #[test]
    fn test_statements_compile_lazily() {
        let mut engine = engine();
        assert_eq!(engine.statements().compiled_count(), 0);

        engine.count().unwrap();
        assert!(engine.statements().is_compiled(StatementKind::Count));
        assert_eq!(engine.statements().compiled_count(), 1);

        engine.insert(&mut user(0)).unwrap();
        assert!(engine.statements().is_compiled(StatementKind::Insert));
        assert!(!engine.statements().is_compiled(StatementKind::Update));
        assert!(!engine.statements().is_compiled(StatementKind::Delete));
    }

    #[test]
    fn test_variable_arity_statements_bypass_slots() {
        let mut engine = engine();
        let mut users: Vec<User> = (0..5).map(user).collect();
        engine.insert_batch(&mut users).unwrap();
        engine.get_by_ids(&[users[0].id, users[1].id]).unwrap();
        engine.list(10, 0).unwrap();

        assert_eq!(engine.statements().compiled_count(), 0);
    }

    #[test]
    fn test_statements_reused_across_calls() {
        let mut engine = engine();
        for i in 0..500 {
            let mut u = user(i);
            engine.insert(&mut u).unwrap();
            assert_eq!(u.id, i as i64 + 1);
        }
        for _ in 0..500 {
            assert_eq!(engine.count().unwrap(), 500);
        }

        assert_eq!(engine.statements().compilations(), 2);
    }

    #[test]
    fn test_compile_failure_is_retried() {
        let mut engine = DirectEngine::open_in_memory().unwrap();

        let err = engine.count().unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
        assert_eq!(engine.statements().slot(StatementKind::Count), Slot::Empty);

        engine.create_schema().unwrap();
        assert_eq!(engine.count().unwrap(), 0);
        assert_eq!(engine.statements().slot(StatementKind::Count), Slot::Compiled);
    }

    #[test]
    fn test_batch_ids_follow_existing_rows() {
        let mut engine = engine();
        for i in 0..9 {
            engine.insert(&mut user(i)).unwrap();
        }

        let mut users: Vec<User> = ["a", "b", "c"]
            .iter()
            .map(|name| User::new(*name, format!("{}@example.com", name), 30))
            .collect();
        engine.insert_batch(&mut users).unwrap();

        let ids: Vec<i64> = users.iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![10, 11, 12]);
        assert_eq!(engine.get_by_id(11).unwrap().name, "b");
    }

    #[test]
    fn test_batch_ids_after_deleting_tail() {
        // AUTOINCREMENT never reuses ids, even after the highest row is gone.
        let mut engine = engine();
        let mut first: Vec<User> = (0..3).map(user).collect();
        engine.insert_batch(&mut first).unwrap();
        engine.delete(first[2].id).unwrap();

        let mut second: Vec<User> = (3..5).map(user).collect();
        engine.insert_batch(&mut second).unwrap();

        assert_eq!(second[0].id, first[2].id + 1);
        assert_eq!(engine.get_by_id(second[0].id).unwrap().name, "user3");
        assert_eq!(engine.get_by_id(second[1].id).unwrap().name, "user4");
    }

    #[test]
    fn test_failed_batch_assigns_no_ids() {
        let mut engine = DirectEngine::open_in_memory().unwrap();
        let mut users: Vec<User> = (0..3).map(user).collect();

        assert!(engine.insert_batch(&mut users).is_err());
        assert!(users.iter().all(|u| !u.is_persisted()));
    }

    #[test]
    fn test_operations_before_init_fail() {
        let mut engine = DirectEngine::new();
        assert!(matches!(engine.count(), Err(Error::Connection(_))));
        assert!(matches!(engine.create_schema(), Err(Error::Connection(_))));
        assert!(matches!(engine.get_by_id(1), Err(Error::Connection(_))));
    }

    #[test]
    fn test_double_init_fails() {
        let mut engine = DirectEngine::open_in_memory().unwrap();
        assert!(matches!(engine.init(":memory:"), Err(Error::Connection(_))));
    }

    #[test]
    fn test_close_resets_slots() {
        let mut engine = engine();
        engine.count().unwrap();
        engine.close().unwrap();

        assert!(!engine.is_open());
        assert_eq!(engine.statements().compiled_count(), 0);
        assert!(matches!(engine.count(), Err(Error::Connection(_))));
        engine.close().unwrap();
    }

    #[test]
    fn test_open_unreachable_target() {
        let err = DirectEngine::open("/nonexistent-dir/ormbench/test.db").unwrap_err();
        assert!(matches!(err, Error::Connection(_)));
    }
}
