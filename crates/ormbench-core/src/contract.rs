//! The operation contract every backend implements.

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use crate::error::Result;
use crate::model::User;

/// Normalized data-access interface driven by the benchmark harness.
///
/// Backends are single-threaded: every operation takes `&mut self` and runs
/// to completion before returning. `init` must succeed before any other
/// operation; operations issued earlier fail with
/// [`Error::Connection`](crate::Error::Connection). Dropping a backend
/// releases its connection, so `close` is only needed to observe close
/// errors.
pub trait Orm: Send {
    /// Registry name of the backend.
    fn name(&self) -> &'static str;

    /// Open the underlying connection.
    fn init(&mut self, dsn: &str) -> Result<()>;

    /// Release compiled statements and the connection.
    fn close(&mut self) -> Result<()>;

    /// Create the `users` and `posts` tables if they do not exist.
    fn create_schema(&mut self) -> Result<()>;

    /// Drop the `users` and `posts` tables if they exist.
    fn drop_schema(&mut self) -> Result<()>;

    /// Persist one user and write the assigned id into `user.id`.
    fn insert(&mut self, user: &mut User) -> Result<()>;

    /// Persist all users at once and write their ids in input order.
    ///
    /// An empty slice succeeds without touching storage.
    fn insert_batch(&mut self, users: &mut [User]) -> Result<()>;

    /// Fetch one user, failing with [`Error::NotFound`](crate::Error::NotFound)
    /// when no row has `id`.
    fn get_by_id(&mut self, id: i64) -> Result<User>;

    /// Fetch every user whose id is in `ids`, in storage order.
    fn get_by_ids(&mut self, ids: &[i64]) -> Result<Vec<User>>;

    /// Overwrite name, email and age of the row with `user.id`.
    ///
    /// Matching zero rows is not an error.
    fn update(&mut self, user: &User) -> Result<()>;

    /// Delete the row with `id`. Matching zero rows is not an error.
    fn delete(&mut self, id: i64) -> Result<()>;

    /// Total number of users.
    fn count(&mut self) -> Result<i64>;

    /// One page of users in storage order.
    fn list(&mut self, limit: usize, offset: usize) -> Result<Vec<User>>;
}

/// A backend shared between threads.
///
/// Backends do no locking of their own; this wrapper serializes every call
/// behind one mutex.
#[derive(Clone)]
pub struct SharedOrm {
    inner: Arc<Mutex<Box<dyn Orm>>>,
}

impl SharedOrm {
    /// Wrap a backend.
    pub fn new(orm: Box<dyn Orm>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(orm)),
        }
    }

    /// Lock the backend for a sequence of calls.
    pub fn lock(&self) -> MutexGuard<'_, Box<dyn Orm>> {
        self.inner.lock()
    }

    /// Run one closure with exclusive access to the backend.
    pub fn with<R>(&self, f: impl FnOnce(&mut dyn Orm) -> R) -> R {
        let mut guard = self.inner.lock();
        f(guard.as_mut())
    }
}

impl std::fmt::Debug for SharedOrm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedOrm").finish_non_exhaustive()
    }
}
