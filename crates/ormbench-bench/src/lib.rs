//! ormbench benchmark suite.
//!
//! Runs the same CRUD and batch workloads against every registered backend
//! of the [`Orm`](ormbench_core::Orm) contract.
//!
//! # Components
//!
//! - **Backends**: registry of contract implementations, selected by name
//! - **Provisioning**: one private temp-file target per run
//! - **Harness**: prepares data, times each workload, always tears down
//! - **Fixtures**: deterministic user generation

pub mod backends;
pub mod config;
pub mod error;
pub mod fixtures;
pub mod harness;
pub mod histogram;
pub mod provision;

pub use backends::{BackendKind, TxLoopBackend};
#[cfg(feature = "sqlx")]
pub use backends::SqlxBackend;
pub use config::BenchConfig;
pub use error::{BenchError, Result};
pub use harness::{Harness, RunResult, Workload};
pub use histogram::{LatencyHistogram, LatencySummary};
pub use provision::{Provisioner, StorageMode, Target};
