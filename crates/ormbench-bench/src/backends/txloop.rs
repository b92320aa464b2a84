//! Transaction-loop backend.
//!
//! Hand-written SQL like [`DirectEngine`](ormbench_core::DirectEngine), but
//! statement reuse is left to the driver's keyed statement cache and batch
//! inserts run one prepared single-row insert per record inside a
//! transaction, reading each id back individually. This is the shape most
//! struct-scanning SQL helpers produce.

use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use tracing::debug;

use ormbench_core::{sql, Error, Orm, Result, User};

/// Statement cache capacity; fixed-shape statements plus headroom.
const STATEMENT_CACHE_CAPACITY: usize = 16;

/// Transaction-loop backend over one SQLite connection.
#[derive(Debug, Default)]
pub struct TxLoopBackend {
    conn: Option<Connection>,
}

impl TxLoopBackend {
    /// Registry name of this backend.
    pub const NAME: &'static str = "txloop";

    /// Create a backend with no connection.
    pub fn new() -> Self {
        Self::default()
    }

    fn conn(&self) -> Result<&Connection> {
        self.conn.as_ref().ok_or_else(Error::not_initialized)
    }

    fn conn_mut(&mut self) -> Result<&mut Connection> {
        self.conn.as_mut().ok_or_else(Error::not_initialized)
    }
}

impl Orm for TxLoopBackend {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn init(&mut self, dsn: &str) -> Result<()> {
        if self.conn.is_some() {
            return Err(Error::Connection("connection already initialized".to_string()));
        }
        let conn = Connection::open(dsn)
            .map_err(|e| Error::Connection(format!("failed to open {}: {}", dsn, e)))?;
        conn.set_prepared_statement_cache_capacity(STATEMENT_CACHE_CAPACITY);
        debug!(backend = Self::NAME, dsn, "opened connection");
        self.conn = Some(conn);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        let Some(conn) = self.conn.take() else {
            return Ok(());
        };
        conn.close()
            .map_err(|(_, e)| Error::Connection(format!("failed to close connection: {}", e)))?;
        debug!(backend = Self::NAME, "closed connection");
        Ok(())
    }

    fn create_schema(&mut self) -> Result<()> {
        let conn = self.conn()?;
        for stmt in sql::CREATE_SCHEMA {
            conn.execute(stmt, [])?;
        }
        Ok(())
    }

    fn drop_schema(&mut self) -> Result<()> {
        let conn = self.conn()?;
        for stmt in sql::DROP_SCHEMA {
            conn.execute(stmt, [])?;
        }
        Ok(())
    }

    fn insert(&mut self, user: &mut User) -> Result<()> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(sql::INSERT_USER)?;
        user.id = stmt.insert(params![user.name, user.email, user.age])?;
        Ok(())
    }

    fn insert_batch(&mut self, users: &mut [User]) -> Result<()> {
        if users.is_empty() {
            return Ok(());
        }

        let conn = self.conn_mut()?;
        let tx = conn.transaction()?;
        let mut ids = Vec::with_capacity(users.len());
        {
            let mut stmt = tx.prepare_cached(sql::INSERT_USER)?;
            for user in users.iter() {
                ids.push(stmt.insert(params![user.name, user.email, user.age])?);
            }
        }
        tx.commit()?;

        // Ids are only handed out once the transaction is durable.
        for (user, id) in users.iter_mut().zip(ids) {
            user.id = id;
        }
        Ok(())
    }

    fn get_by_id(&mut self, id: i64) -> Result<User> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(sql::SELECT_USER_BY_ID)?;
        stmt.query_row([id], User::from_row)
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
        let conn = self.conn()?;
        conn.prepare_cached(sql::UPDATE_USER)?
            .execute(params![user.name, user.email, user.age, user.id])?;
        Ok(())
    }

    fn delete(&mut self, id: i64) -> Result<()> {
        let conn = self.conn()?;
        conn.prepare_cached(sql::DELETE_USER)?.execute([id])?;
        Ok(())
    }

    fn count(&mut self) -> Result<i64> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(sql::COUNT_USERS)?;
        Ok(stmt.query_row([], |row| row.get(0))?)
    }

    fn list(&mut self, limit: usize, offset: usize) -> Result<Vec<User>> {
        let conn = self.conn()?;
        let (limit, offset) = (sql::page_bound(limit), sql::page_bound(offset));
        let mut stmt = conn.prepare_cached(sql::LIST_USERS)?;
        let users = stmt
            .query_map(params![limit, offset], User::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> TxLoopBackend {
        let mut backend = TxLoopBackend::new();
        backend.init(":memory:").unwrap();
        backend.create_schema().unwrap();
        backend
    }

    #[test]
    fn test_batch_insert_assigns_sequential_ids() {
        let mut backend = backend();
        let mut users: Vec<User> = (0..10)
            .map(|i| User::new(format!("user{}", i), format!("user{}@example.com", i), 25))
            .collect();
        backend.insert_batch(&mut users).unwrap();

        let ids: Vec<i64> = users.iter().map(|u| u.id).collect();
        assert_eq!(ids, (1..=10).collect::<Vec<_>>());
        assert_eq!(backend.get_by_id(7).unwrap().name, "user6");
    }

    #[test]
    fn test_failed_batch_rolls_back() {
        let mut backend = backend();
        backend.insert(&mut User::new("kept", "kept@example.com", 1)).unwrap();
        backend
            .conn()
            .unwrap()
            .execute_batch(
                "CREATE TRIGGER reject_bad BEFORE INSERT ON users
                 WHEN NEW.name = 'bad' BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
            )
            .unwrap();

        let mut users = vec![
            User::new("good", "good@example.com", 1),
            User::new("bad", "bad@example.com", 1),
        ];
        assert!(backend.insert_batch(&mut users).is_err());
        assert!(users.iter().all(|u| !u.is_persisted()));
        assert_eq!(backend.count().unwrap(), 1);
    }
}
