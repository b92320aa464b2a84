//! SQL text shared by the hand-written backends.
//!
//! The schema is identical across backends so benchmark numbers stay
//! comparable.

/// Columns selected for every `User` read, in [`User::from_row`](crate::User::from_row) order.
pub const USER_COLUMNS: &str = "id, name, email, age";

pub const CREATE_USERS: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name VARCHAR(100) NOT NULL,
        email VARCHAR(100) NOT NULL,
        age INTEGER NOT NULL
    )
"#;

/// Created for parity with the other suites; no operation touches it.
pub const CREATE_POSTS: &str = r#"
    CREATE TABLE IF NOT EXISTS posts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL,
        title VARCHAR(200) NOT NULL,
        body TEXT NOT NULL
    )
"#;

pub const DROP_USERS: &str = "DROP TABLE IF EXISTS users";
pub const DROP_POSTS: &str = "DROP TABLE IF EXISTS posts";

/// Schema creation, one statement per entry.
pub const CREATE_SCHEMA: [&str; 2] = [CREATE_USERS, CREATE_POSTS];

/// Schema removal, one statement per entry.
pub const DROP_SCHEMA: [&str; 2] = [DROP_USERS, DROP_POSTS];

pub const INSERT_USER: &str = "INSERT INTO users (name, email, age) VALUES (?, ?, ?)";
pub const UPDATE_USER: &str = "UPDATE users SET name = ?, email = ?, age = ? WHERE id = ?";
pub const DELETE_USER: &str = "DELETE FROM users WHERE id = ?";
pub const COUNT_USERS: &str = "SELECT COUNT(*) FROM users";
pub const SELECT_USER_BY_ID: &str = "SELECT id, name, email, age FROM users WHERE id = ?";
pub const LIST_USERS: &str = "SELECT id, name, email, age FROM users LIMIT ? OFFSET ?";

/// Highest parameter number SQLite accepts in one statement.
pub const MAX_VARIABLES: usize = 32_766;

/// Bound parameters per row of a `users` insert.
pub const INSERT_USER_VARIABLES: usize = 3;

/// Most rows one multi-row `users` insert can carry.
pub const MAX_INSERT_ROWS: usize = MAX_VARIABLES / INSERT_USER_VARIABLES;

/// `LIMIT`/`OFFSET` value for a page bound, saturating at `i64::MAX`.
pub fn page_bound(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

/// Build `?, ?, ...` with `n` placeholders.
pub fn placeholders(n: usize) -> String {
    let mut out = String::with_capacity(n * 3);
    for i in 0..n {
        if i > 0 {
            out.push_str(", ");
        }
        out.push('?');
    }
    out
}

/// Multi-row insert with `rows` value groups.
pub fn insert_users(rows: usize) -> String {
    let group = "(?, ?, ?)";
    let groups = vec![group; rows].join(", ");
    format!("INSERT INTO users (name, email, age) VALUES {}", groups)
}

/// Lookup of `n` ids through an `IN` list.
pub fn select_users_in(n: usize) -> String {
    format!(
        "SELECT {} FROM users WHERE id IN ({})",
        USER_COLUMNS,
        placeholders(n)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders() {
        assert_eq!(placeholders(0), "");
        assert_eq!(placeholders(1), "?");
        assert_eq!(placeholders(3), "?, ?, ?");
    }

    #[test]
    fn test_insert_users_groups() {
        assert_eq!(
            insert_users(2),
            "INSERT INTO users (name, email, age) VALUES (?, ?, ?), (?, ?, ?)"
        );
        assert_eq!(insert_users(100).matches('?').count(), 300);
    }

    #[test]
    fn test_page_bound_saturates() {
        assert_eq!(page_bound(0), 0);
        assert_eq!(page_bound(100), 100);
        assert_eq!(page_bound(usize::MAX), i64::MAX);
    }

    #[test]
    fn test_max_insert_rows() {
        assert_eq!(MAX_INSERT_ROWS, 10_922);
        assert!(MAX_INSERT_ROWS * INSERT_USER_VARIABLES <= MAX_VARIABLES);
    }

    #[test]
    fn test_select_users_in() {
        assert_eq!(
            select_users_in(2),
            "SELECT id, name, email, age FROM users WHERE id IN (?, ?)"
        );
    }
}
