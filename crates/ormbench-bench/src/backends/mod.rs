//! Backend registry.
//!
//! Every backend implements [`Orm`] so the harness can drive them through one
//! interface. Backends are selected by name and know how to render a
//! connection string for a provisioned target.

pub mod txloop;

#[cfg(feature = "sqlx")]
pub mod structscan;

pub use txloop::TxLoopBackend;

#[cfg(feature = "sqlx")]
pub use structscan::SqlxBackend;

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use ormbench_core::{DirectEngine, Orm};

use crate::error::BenchError;
use crate::provision::StorageMode;

/// A registered backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// Hand-written SQL with four lazily compiled statements.
    Direct,
    /// Hand-written SQL through the driver's statement cache, batch inserts
    /// as one transaction of single-row inserts.
    TxLoop,
    /// Struct-scanning query helper on sqlx.
    #[cfg(feature = "sqlx")]
    Sqlx,
}

impl BackendKind {
    /// Every backend compiled into this build.
    pub const ALL: &'static [BackendKind] = &[
        BackendKind::Direct,
        BackendKind::TxLoop,
        #[cfg(feature = "sqlx")]
        BackendKind::Sqlx,
    ];

    /// Registry name.
    pub fn name(self) -> &'static str {
        match self {
            BackendKind::Direct => DirectEngine::NAME,
            BackendKind::TxLoop => TxLoopBackend::NAME,
            #[cfg(feature = "sqlx")]
            BackendKind::Sqlx => SqlxBackend::NAME,
        }
    }

    /// Construct an uninitialized backend.
    pub fn create(self) -> ormbench_core::Result<Box<dyn Orm>> {
        let orm: Box<dyn Orm> = match self {
            BackendKind::Direct => Box::new(DirectEngine::new()),
            BackendKind::TxLoop => Box::new(TxLoopBackend::new()),
            #[cfg(feature = "sqlx")]
            BackendKind::Sqlx => Box::new(SqlxBackend::new()?),
        };
        Ok(orm)
    }

    /// Connection string for a database named after `path`.
    pub fn connection_string(self, path: &Path, mode: StorageMode) -> String {
        match (self, mode) {
            (BackendKind::Direct | BackendKind::TxLoop, StorageMode::SharedMemory) => {
                format!("file:{}?cache=shared&mode=memory", path.display())
            }
            (BackendKind::Direct | BackendKind::TxLoop, StorageMode::File) => {
                path.display().to_string()
            }
            #[cfg(feature = "sqlx")]
            (BackendKind::Sqlx, StorageMode::SharedMemory) => {
                format!("sqlite://{}?mode=memory&cache=shared", path.display())
            }
            #[cfg(feature = "sqlx")]
            (BackendKind::Sqlx, StorageMode::File) => {
                format!("sqlite://{}?mode=rwc", path.display())
            }
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BackendKind {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BackendKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| BenchError::UnknownBackend(s.to_string()))
    }
}
