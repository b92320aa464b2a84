//! Benchmark harness.
//!
//! A run drives one workload against one backend on a freshly provisioned
//! target: init, create schema, prepare data, time the loop, drop schema,
//! close. Teardown runs even when preparation or the timed loop fails.
//! Only the contract call itself is timed; fixture construction happens
//! outside the measured span.

use std::fmt;
use std::hint::black_box;
use std::str::FromStr;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{error, info, warn};

use ormbench_core::{Orm, User};

use crate::backends::BackendKind;
use crate::config::BenchConfig;
use crate::error::{BenchError, Result};
use crate::fixtures;
use crate::histogram::{LatencyHistogram, LatencySummary};
use crate::provision::{Provisioner, Target};

/// A timed operation pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Workload {
    InsertSingle,
    InsertBatch,
    GetById,
    GetByIds,
    Update,
    Delete,
    Count,
    List,
}

impl Workload {
    pub const ALL: [Workload; 8] = [
        Workload::InsertSingle,
        Workload::InsertBatch,
        Workload::GetById,
        Workload::GetByIds,
        Workload::Update,
        Workload::Delete,
        Workload::Count,
        Workload::List,
    ];

    /// Name used on the command line and in reports.
    pub fn name(self) -> &'static str {
        match self {
            Workload::InsertSingle => "insert-single",
            Workload::InsertBatch => "insert-batch",
            Workload::GetById => "get-by-id",
            Workload::GetByIds => "get-by-ids",
            Workload::Update => "update",
            Workload::Delete => "delete",
            Workload::Count => "count",
            Workload::List => "list",
        }
    }

    /// Contract operation timed by this workload.
    pub fn operation(self) -> &'static str {
        match self {
            Workload::InsertSingle => "insert",
            Workload::InsertBatch => "insert_batch",
            Workload::GetById => "get_by_id",
            Workload::GetByIds => "get_by_ids",
            Workload::Update => "update",
            Workload::Delete => "delete",
            Workload::Count => "count",
            Workload::List => "list",
        }
    }

    /// Whether the workload reads or mutates preloaded rows.
    pub fn needs_preload(self) -> bool {
        !matches!(self, Workload::InsertSingle | Workload::InsertBatch)
    }
}

impl fmt::Display for Workload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Workload {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self> {
        Workload::ALL
            .into_iter()
            .find(|w| w.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| BenchError::UnknownWorkload(s.to_string()))
    }
}

/// Outcome of one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub backend: &'static str,
    pub workload: Workload,
    pub iterations: usize,
    /// Sum of the timed spans.
    pub elapsed_ns: u64,
    pub ops_per_sec: f64,
    pub latency: LatencySummary,
}

impl RunResult {
    fn new(backend: BackendKind, workload: Workload, histogram: &LatencyHistogram) -> Self {
        let elapsed = histogram.total();
        let iterations = histogram.count() as usize;
        let ops_per_sec = if elapsed.is_zero() {
            0.0
        } else {
            iterations as f64 / elapsed.as_secs_f64()
        };

        Self {
            backend: backend.name(),
            workload,
            iterations,
            elapsed_ns: u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX),
            ops_per_sec,
            latency: histogram.summary(),
        }
    }

    /// Total timed duration.
    pub fn elapsed(&self) -> Duration {
        Duration::from_nanos(self.elapsed_ns)
    }
}

/// An initialized backend with its schema, torn down on drop.
struct Session {
    kind: BackendKind,
    orm: Box<dyn Orm>,
    // Dropped after `orm` so the connection closes before the file goes.
    _target: Target,
    live: bool,
}

impl Session {
    fn open(kind: BackendKind, provisioner: &Provisioner) -> Result<Self> {
        let target = provisioner.provision(kind)?;
        let mut orm = kind.create().map_err(|e| BenchError::setup(kind, e))?;
        orm.init(target.dsn())
            .map_err(|e| BenchError::setup(kind, e))?;

        let mut session = Session {
            kind,
            orm,
            _target: target,
            live: true,
        };
        session
            .orm
            .create_schema()
            .map_err(|e| BenchError::setup(kind, e))?;
        Ok(session)
    }

    /// Tear down and report the first failure.
    fn finish(mut self) -> Result<()> {
        self.live = false;
        let dropped = self.orm.drop_schema();
        let closed = self.orm.close();
        dropped.map_err(|e| BenchError::operation(self.kind, "drop_schema", e))?;
        closed.map_err(|e| BenchError::operation(self.kind, "close", e))?;
        Ok(())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if !self.live {
            return;
        }
        if let Err(e) = self.orm.drop_schema() {
            warn!(backend = self.kind.name(), error = %e, "failed to drop schema");
        }
        if let Err(e) = self.orm.close() {
            warn!(backend = self.kind.name(), error = %e, "failed to close connection");
        }
    }
}

/// Runs workloads against backends.
#[derive(Debug, Clone)]
pub struct Harness {
    config: BenchConfig,
    provisioner: Provisioner,
}

impl Harness {
    /// Create a harness after validating `config`.
    pub fn new(config: BenchConfig) -> Result<Self> {
        config.validate()?;
        let provisioner = Provisioner::new(config.storage_mode);
        Ok(Self {
            config,
            provisioner,
        })
    }

    /// Provision targets with `provisioner` instead of the default.
    pub fn with_provisioner(mut self, provisioner: Provisioner) -> Self {
        self.provisioner = provisioner;
        self
    }

    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    /// Run every configured workload against every configured backend.
    ///
    /// Stops at the first failed run.
    pub fn run_all(&self) -> Result<Vec<RunResult>> {
        let runs = self.config.backends.len() * self.config.workloads.len();
        let mut results = Vec::with_capacity(runs);
        for &kind in &self.config.backends {
            for &workload in &self.config.workloads {
                results.push(self.run(kind, workload)?);
            }
        }
        Ok(results)
    }

    /// Run one workload against one backend on a fresh target.
    pub fn run(&self, kind: BackendKind, workload: Workload) -> Result<RunResult> {
        info!(
            backend = kind.name(),
            workload = workload.name(),
            iterations = self.config.iterations,
            "starting run"
        );

        let outcome = Session::open(kind, &self.provisioner).and_then(|mut session| {
            let histogram = self.execute(kind, session.orm.as_mut(), workload)?;
            session.finish()?;
            Ok(histogram)
        });

        match outcome {
            Ok(histogram) => {
                let result = RunResult::new(kind, workload, &histogram);
                info!(
                    backend = result.backend,
                    workload = workload.name(),
                    iterations = result.iterations,
                    elapsed_ms = result.elapsed().as_millis() as u64,
                    ops_per_sec = result.ops_per_sec as u64,
                    "run finished"
                );
                Ok(result)
            }
            Err(e) => {
                error!(
                    backend = kind.name(),
                    workload = workload.name(),
                    error = %e,
                    "run failed"
                );
                Err(e)
            }
        }
    }

    /// Prepare data for `workload` on an initialized backend and time it.
    pub fn execute(
        &self,
        kind: BackendKind,
        orm: &mut dyn Orm,
        workload: Workload,
    ) -> Result<LatencyHistogram> {
        let iterations = self.config.iterations;
        let op = |e: ormbench_core::Error| BenchError::operation(kind, workload.operation(), e);
        let mut histogram = LatencyHistogram::new();

        match workload {
            Workload::InsertSingle => {
                for i in 0..iterations {
                    let mut user = fixtures::user(i);
                    let start = Instant::now();
                    orm.insert(&mut user).map_err(op)?;
                    histogram.observe(start.elapsed());
                }
            }
            Workload::InsertBatch => {
                for i in 0..iterations {
                    let mut users = fixtures::batch(i, self.config.batch_size);
                    let start = Instant::now();
                    orm.insert_batch(&mut users).map_err(op)?;
                    histogram.observe(start.elapsed());
                }
            }
            Workload::GetById => {
                let ids = self.preload(kind, orm, self.config.preload)?;
                for i in 0..iterations {
                    let id = ids[i % ids.len()];
                    let start = Instant::now();
                    black_box(orm.get_by_id(id).map_err(op)?);
                    histogram.observe(start.elapsed());
                }
            }
            Workload::GetByIds => {
                let ids = self.preload(kind, orm, self.config.preload)?;
                let window = self.config.ids_batch;
                for i in 0..iterations {
                    let first = (i * window) % ids.len();
                    let batch: Vec<i64> = (0..window)
                        .map(|j| ids[(first + j) % ids.len()])
                        .collect();
                    let start = Instant::now();
                    black_box(orm.get_by_ids(&batch).map_err(op)?);
                    histogram.observe(start.elapsed());
                }
            }
            Workload::Update => {
                let ids = self.preload(kind, orm, self.config.preload)?;
                for i in 0..iterations {
                    let mut user = fixtures::user(i % ids.len());
                    user.id = ids[i % ids.len()];
                    user.name = format!("updated_user{}", i);
                    user.age = 30 + (i % 50) as i32;
                    let start = Instant::now();
                    orm.update(&user).map_err(op)?;
                    histogram.observe(start.elapsed());
                }
            }
            Workload::Delete => {
                // One distinct row per iteration, leaving `preload` behind.
                let ids = self.preload(kind, orm, iterations + self.config.preload)?;
                for &id in ids.iter().take(iterations) {
                    let start = Instant::now();
                    orm.delete(id).map_err(op)?;
                    histogram.observe(start.elapsed());
                }
            }
            Workload::Count => {
                self.preload(kind, orm, self.config.preload)?;
                for _ in 0..iterations {
                    let start = Instant::now();
                    black_box(orm.count().map_err(op)?);
                    histogram.observe(start.elapsed());
                }
            }
            Workload::List => {
                self.preload(kind, orm, self.config.preload)?;
                let limit = self.config.list_limit;
                let span = self.config.preload.saturating_sub(limit).max(1);
                for i in 0..iterations {
                    let offset = (i * limit) % span;
                    let start = Instant::now();
                    black_box(orm.list(limit, offset).map_err(op)?);
                    histogram.observe(start.elapsed());
                }
            }
        }

        Ok(histogram)
    }

    /// Insert `count` fixture users in batches and return their ids.
    fn preload(&self, kind: BackendKind, orm: &mut dyn Orm, count: usize) -> Result<Vec<i64>> {
        let mut users: Vec<User> = fixtures::generate_users(count);
        for chunk in users.chunks_mut(self.config.batch_size) {
            orm.insert_batch(chunk)
                .map_err(|e| BenchError::operation(kind, "insert_batch", e))?;
        }
        Ok(users.into_iter().map(|u| u.id).collect())
    }
}
