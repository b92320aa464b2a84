//! Lazily compiled statement slots.
//!
//! The four fixed-shape statements are compiled on first use and reused for
//! the lifetime of the connection. The compiled handles live in the
//! connection's statement cache, sized to exactly these four entries; the
//! slots record which of them have been compiled so that compilation
//! happens at most once per statement. Variable-arity statements never go
//! through here.

use rusqlite::{CachedStatement, Connection};
use tracing::debug;

use crate::error::Result;
use crate::sql;

/// One of the fixed-shape statements cached by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    Insert,
    Update,
    Delete,
    Count,
}

impl StatementKind {
    /// Every cached statement, in slot order.
    pub const ALL: [StatementKind; 4] = [
        StatementKind::Insert,
        StatementKind::Update,
        StatementKind::Delete,
        StatementKind::Count,
    ];

    /// SQL text of the statement.
    pub fn sql(self) -> &'static str {
        match self {
            StatementKind::Insert => sql::INSERT_USER,
            StatementKind::Update => sql::UPDATE_USER,
            StatementKind::Delete => sql::DELETE_USER,
            StatementKind::Count => sql::COUNT_USERS,
        }
    }

    /// Short name used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            StatementKind::Insert => "insert",
            StatementKind::Update => "update",
            StatementKind::Delete => "delete",
            StatementKind::Count => "count",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Compilation state of one statement slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Slot {
    /// Not compiled yet, or the last compile attempt failed.
    #[default]
    Empty,
    /// Compiled once. The handle is owned by the connection's statement
    /// cache; the slot only records that compilation happened.
    Compiled,
}

/// Per-engine compilation state of the fixed-shape statements.
#[derive(Debug, Default)]
pub struct StatementSlots {
    slots: [Slot; 4],
    compilations: u64,
}

impl StatementSlots {
    /// Create a set of empty slots.
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrow the compiled statement for `kind`, compiling it on first use.
    ///
    /// A failed compilation leaves the slot empty so the next call retries.
    pub fn prepare<'conn>(
        &mut self,
        conn: &'conn Connection,
        kind: StatementKind,
    ) -> Result<CachedStatement<'conn>> {
        let slot = &mut self.slots[kind.index()];
        match *slot {
            Slot::Compiled => Ok(conn.prepare_cached(kind.sql())?),
            Slot::Empty => {
                let stmt = conn.prepare_cached(kind.sql())?;
                *slot = Slot::Compiled;
                self.compilations += 1;
                debug!(statement = kind.as_str(), "compiled statement");
                Ok(stmt)
            }
        }
    }

    /// State of the slot for `kind`.
    pub fn slot(&self, kind: StatementKind) -> Slot {
        self.slots[kind.index()]
    }

    /// Check whether `kind` has been compiled.
    pub fn is_compiled(&self, kind: StatementKind) -> bool {
        self.slot(kind) == Slot::Compiled
    }

    /// Number of slots currently compiled.
    pub fn compiled_count(&self) -> usize {
        self.slots.iter().filter(|s| **s == Slot::Compiled).count()
    }

    /// Total compilations performed since the slots were created.
    pub fn compilations(&self) -> u64 {
        self.compilations
    }

    /// Mark every slot empty. Called when the connection goes away.
    pub fn clear(&mut self) {
        self.slots = [Slot::Empty; 4];
    }
}
