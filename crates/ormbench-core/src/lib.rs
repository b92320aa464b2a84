//! ormbench core - record type, operation contract, and the direct-SQL engine.
//!
//! Every backend in the benchmark suite implements [`Orm`], so the harness can
//! drive identical workloads through `Box<dyn Orm>` and compare the results.
//! [`DirectEngine`] is the reference backend: hand-written SQL over a single
//! SQLite connection with lazily compiled statements.

pub mod contract;
pub mod direct;
pub mod error;
pub mod model;
pub mod sql;

pub use contract::{Orm, SharedOrm};
pub use direct::{DirectEngine, Slot, StatementKind, StatementSlots};
pub use error::{Error, Result};
pub use model::User;
