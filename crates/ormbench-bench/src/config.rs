//! Harness configuration.

use ormbench_core::sql::{MAX_INSERT_ROWS, MAX_VARIABLES};

use crate::backends::BackendKind;
use crate::error::{BenchError, Result};
use crate::harness::Workload;
use crate::provision::StorageMode;

/// Default number of timed operations per run.
pub const DEFAULT_ITERATIONS: usize = 1000;

/// Default number of users inserted before a read or update workload.
pub const DEFAULT_PRELOAD: usize = 1000;

/// Default number of users per batch insert.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Default number of ids per multi-id lookup.
pub const DEFAULT_IDS_BATCH: usize = 10;

/// Default page size for list workloads.
pub const DEFAULT_LIST_LIMIT: usize = 100;

/// Benchmark configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchConfig {
    /// Backends to run, in order.
    pub backends: Vec<BackendKind>,
    /// Workloads to run against each backend, in order.
    pub workloads: Vec<Workload>,
    /// Timed operations per run.
    pub iterations: usize,
    /// Users inserted before read and update workloads.
    pub preload: usize,
    /// Users per batch insert.
    pub batch_size: usize,
    /// Ids per multi-id lookup.
    pub ids_batch: usize,
    /// Page size for list workloads.
    pub list_limit: usize,
    /// Where provisioned databases live.
    pub storage_mode: StorageMode,
}

impl BenchConfig {
    /// Every registered backend and workload with default sizes.
    pub fn new() -> Self {
        Self {
            backends: BackendKind::ALL.to_vec(),
            workloads: Workload::ALL.to_vec(),
            iterations: DEFAULT_ITERATIONS,
            preload: DEFAULT_PRELOAD,
            batch_size: DEFAULT_BATCH_SIZE,
            ids_batch: DEFAULT_IDS_BATCH,
            list_limit: DEFAULT_LIST_LIMIT,
            storage_mode: StorageMode::default(),
        }
    }

    /// Restrict the run to `backends`.
    pub fn with_backends(mut self, backends: Vec<BackendKind>) -> Self {
        self.backends = backends;
        self
    }

    /// Restrict the run to `workloads`.
    pub fn with_workloads(mut self, workloads: Vec<Workload>) -> Self {
        self.workloads = workloads;
        self
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_preload(mut self, preload: usize) -> Self {
        self.preload = preload;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_ids_batch(mut self, ids_batch: usize) -> Self {
        self.ids_batch = ids_batch;
        self
    }

    pub fn with_list_limit(mut self, list_limit: usize) -> Self {
        self.list_limit = list_limit;
        self
    }

    pub fn with_storage_mode(mut self, mode: StorageMode) -> Self {
        self.storage_mode = mode;
        self
    }

    /// Check that every selected workload can run with these sizes.
    pub fn validate(&self) -> Result<()> {
        if self.backends.is_empty() {
            return Err(BenchError::Config("no backends selected".to_string()));
        }
        if self.workloads.is_empty() {
            return Err(BenchError::Config("no workloads selected".to_string()));
        }
        if self.iterations == 0 {
            return Err(BenchError::Config("iterations must be positive".to_string()));
        }
        if self.batch_size == 0 {
            return Err(BenchError::Config("batch size must be positive".to_string()));
        }
        if self.batch_size > MAX_INSERT_ROWS {
            return Err(BenchError::Config(format!(
                "batch size {} exceeds {} rows per insert",
                self.batch_size, MAX_INSERT_ROWS
            )));
        }
        if self.ids_batch == 0 {
            return Err(BenchError::Config("ids batch must be positive".to_string()));
        }
        if self.ids_batch > MAX_VARIABLES {
            return Err(BenchError::Config(format!(
                "ids batch {} exceeds {} ids per lookup",
                self.ids_batch, MAX_VARIABLES
            )));
        }
        if self.list_limit == 0 {
            return Err(BenchError::Config("list limit must be positive".to_string()));
        }

        let needs_preload = self.workloads.iter().any(|w| w.needs_preload());
        if needs_preload && self.preload == 0 {
            return Err(BenchError::Config(
                "read and update workloads need a positive preload".to_string(),
            ));
        }
        if self.workloads.contains(&Workload::GetByIds) && self.ids_batch > self.preload {
            return Err(BenchError::Config(format!(
                "ids batch {} exceeds preload {}",
                self.ids_batch, self.preload
            )));
        }
        Ok(())
    }
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self::new()
    }
}
