//! sqlx struct-scanning backend.
//!
//! Rows are decoded with `#[derive(FromRow)]`; variable-arity statements
//! reuse the shared SQL builders and bind their values in a loop. Batch
//! inserts read their ids back through `RETURNING` instead of deriving them
//! from the last rowid.
//!
//! Enable with `--features sqlx`.

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use tokio::runtime::{Builder, Runtime};
use tracing::debug;

use ormbench_core::{sql, Error, Orm, Result, User};

#[derive(Debug, FromRow)]
struct UserRow {
    id: i64,
    name: String,
    email: String,
    age: i32,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            name: row.name,
            email: row.email,
            age: row.age,
        }
    }
}

/// sqlx backend over a single-connection pool.
pub struct SqlxBackend {
    pool: Option<SqlitePool>,
    rt: Runtime,
}

impl SqlxBackend {
    /// Registry name of this backend.
    pub const NAME: &'static str = "sqlx";

    /// Create a backend with its own current-thread runtime.
    pub fn new() -> Result<Self> {
        let rt = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| Error::Runtime(e.to_string()))?;
        Ok(Self { pool: None, rt })
    }

    fn pool(&self) -> Result<&SqlitePool> {
        self.pool.as_ref().ok_or_else(Error::not_initialized)
    }
}

impl Orm for SqlxBackend {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn init(&mut self, dsn: &str) -> Result<()> {
        if self.pool.is_some() {
            return Err(Error::Connection("connection already initialized".to_string()));
        }

        let options = SqliteConnectOptions::from_str(dsn)
            .map_err(|e| Error::Connection(format!("invalid connection string {}: {}", dsn, e)))?
            .create_if_missing(true);

        // One connection, kept alive for the whole run so a shared-cache
        // in-memory database is never dropped between calls.
        let pool = self
            .rt
            .block_on(
                SqlitePoolOptions::new()
                    .max_connections(1)
                    .min_connections(1)
                    .idle_timeout(None)
                    .max_lifetime(None)
                    .connect_with(options),
            )
            .map_err(|e| Error::Connection(format!("failed to open {}: {}", dsn, e)))?;

        debug!(backend = Self::NAME, dsn, "opened connection");
        self.pool = Some(pool);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if let Some(pool) = self.pool.take() {
            self.rt.block_on(pool.close());
            debug!(backend = Self::NAME, "closed connection");
        }
        Ok(())
    }

    fn create_schema(&mut self) -> Result<()> {
        let pool = self.pool()?;
        self.rt.block_on(async {
            for stmt in sql::CREATE_SCHEMA {
                sqlx::query(stmt).execute(pool).await?;
            }
            Ok::<_, Error>(())
        })
    }

    fn drop_schema(&mut self) -> Result<()> {
        let pool = self.pool()?;
        self.rt.block_on(async {
            for stmt in sql::DROP_SCHEMA {
                sqlx::query(stmt).execute(pool).await?;
            }
            Ok::<_, Error>(())
        })
    }

    fn insert(&mut self, user: &mut User) -> Result<()> {
        let pool = self.pool()?;
        let result = self.rt.block_on(
            sqlx::query(sql::INSERT_USER)
                .bind(&user.name)
                .bind(&user.email)
                .bind(user.age)
                .execute(pool),
        )?;
        user.id = result.last_insert_rowid();
        Ok(())
    }

    fn insert_batch(&mut self, users: &mut [User]) -> Result<()> {
        if users.is_empty() {
            return Ok(());
        }

        let pool = self.pool()?;
        let stmt = format!("{} RETURNING id", sql::insert_users(users.len()));
        let mut query = sqlx::query_scalar::<_, i64>(&stmt);
        for user in users.iter() {
            query = query.bind(&user.name).bind(&user.email).bind(user.age);
        }
        let mut ids = self.rt.block_on(query.fetch_all(pool))?;

        if ids.len() != users.len() {
            return Err(Error::Sqlx(sqlx::Error::Protocol(format!(
                "batch insert returned {} ids for {} rows",
                ids.len(),
                users.len()
            ))));
        }

        // RETURNING order is unspecified; rowids grow in VALUES order.
        ids.sort_unstable();
        for (user, id) in users.iter_mut().zip(ids) {
            user.id = id;
        }
        Ok(())
    }

    fn get_by_id(&mut self, id: i64) -> Result<User> {
        let pool = self.pool()?;
        let row = self.rt.block_on(
            sqlx::query_as::<_, UserRow>(sql::SELECT_USER_BY_ID)
                .bind(id)
                .fetch_optional(pool),
        )?;
        row.map(User::from).ok_or(Error::NotFound(id))
    }

    fn get_by_ids(&mut self, ids: &[i64]) -> Result<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let pool = self.pool()?;
        let stmt = sql::select_users_in(ids.len());
        let mut query = sqlx::query_as::<_, UserRow>(&stmt);
        for id in ids {
            query = query.bind(*id);
        }

        let rows = self.rt.block_on(query.fetch_all(pool))?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    fn update(&mut self, user: &User) -> Result<()> {
        let pool = self.pool()?;
        self.rt.block_on(
            sqlx::query(sql::UPDATE_USER)
                .bind(&user.name)
                .bind(&user.email)
                .bind(user.age)
                .bind(user.id)
                .execute(pool),
        )?;
        Ok(())
    }

    fn delete(&mut self, id: i64) -> Result<()> {
        let pool = self.pool()?;
        self.rt
            .block_on(sqlx::query(sql::DELETE_USER).bind(id).execute(pool))?;
        Ok(())
    }

    fn count(&mut self) -> Result<i64> {
        let pool = self.pool()?;
        let count = self
            .rt
            .block_on(sqlx::query_scalar::<_, i64>(sql::COUNT_USERS).fetch_one(pool))?;
        Ok(count)
    }

    fn list(&mut self, limit: usize, offset: usize) -> Result<Vec<User>> {
        let pool = self.pool()?;
        let rows = self.rt.block_on(
            sqlx::query_as::<_, UserRow>(sql::LIST_USERS)
                .bind(sql::page_bound(limit))
                .bind(sql::page_bound(offset))
                .fetch_all(pool),
        )?;
        Ok(rows.into_iter().map(User::from).collect())
    }
}
