//! The benchmark record type.

use rusqlite::Row;

/// Maximum length of `name` and `email`, as declared by the schema.
///
/// Not validated here; SQLite does not enforce `VARCHAR` lengths either.
pub const MAX_TEXT_LEN: usize = 100;

/// A row of the `users` table.
///
/// `id` is `0` until a backend assigns one during `insert` or `insert_batch`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub age: i32,
}

impl User {
    /// Create an unsaved user.
    pub fn new(name: impl Into<String>, email: impl Into<String>, age: i32) -> Self {
        Self {
            id: 0,
            name: name.into(),
            email: email.into(),
            age,
        }
    }

    /// Check whether a backend has assigned an id.
    pub fn is_persisted(&self) -> bool {
        self.id != 0
    }

    /// Map a row selected with [`USER_COLUMNS`](crate::sql::USER_COLUMNS).
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            age: row.get(3)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_is_unsaved() {
        let user = User::new("alice", "alice@example.com", 30);
        assert_eq!(user.id, 0);
        assert!(!user.is_persisted());
        assert_eq!(user.name, "alice");
    }
}
