//! Harness error types.

use thiserror::Error;

use crate::backends::BackendKind;

/// Result type for harness operations.
pub type Result<T> = std::result::Result<T, BenchError>;

/// Errors raised while provisioning or running a benchmark.
#[derive(Debug, Error)]
pub enum BenchError {
    /// No backend is registered under this name.
    #[error("unknown backend: {0}")]
    UnknownBackend(String),

    /// No workload is registered under this name.
    #[error("unknown workload: {0}")]
    UnknownWorkload(String),

    /// Invalid harness configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// The temp-file target could not be created.
    #[error("provisioning error: {0}")]
    Provision(#[from] std::io::Error),

    /// Backend construction, connection, or schema setup failed.
    #[error("{backend}: setup failed: {source}")]
    Setup {
        backend: &'static str,
        #[source]
        source: ormbench_core::Error,
    },

    /// A contract operation failed during a run.
    #[error("{backend}: {operation} failed: {source}")]
    Operation {
        backend: &'static str,
        operation: &'static str,
        #[source]
        source: ormbench_core::Error,
    },
}

impl BenchError {
    pub(crate) fn setup(backend: BackendKind, source: ormbench_core::Error) -> Self {
        BenchError::Setup {
            backend: backend.name(),
            source,
        }
    }

    pub(crate) fn operation(
        backend: BackendKind,
        operation: &'static str,
        source: ormbench_core::Error,
    ) -> Self {
        BenchError::Operation {
            backend: backend.name(),
            operation,
            source,
        }
    }

    /// Name of the backend involved, if any.
    pub fn backend(&self) -> Option<&'static str> {
        match self {
            BenchError::Setup { backend, .. } | BenchError::Operation { backend, .. } => {
                Some(*backend)
            }
            _ => None,
        }
    }
}
