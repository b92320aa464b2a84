//! ormbench command-line runner
//!
//! Runs the selected workloads against the selected backends and prints one
//! row per run.

mod formatter;

use clap::Parser;
use formatter::OutputFormat;
use ormbench_bench::config::{
    DEFAULT_BATCH_SIZE, DEFAULT_IDS_BATCH, DEFAULT_ITERATIONS, DEFAULT_LIST_LIMIT, DEFAULT_PRELOAD,
};
use ormbench_bench::{BackendKind, BenchConfig, Harness, StorageMode, Workload};
use tracing::debug;

/// ormbench benchmark runner
#[derive(Parser, Debug)]
#[command(name = "ormbench")]
#[command(version, about = "Compare data-access backends over SQLite")]
pub struct Args {
    /// Backend to run (repeatable, default: all registered)
    #[arg(short, long = "backend", value_name = "NAME")]
    pub backends: Vec<BackendKind>,

    /// Workload to run (repeatable, default: all)
    #[arg(short, long = "workload", value_name = "NAME")]
    pub workloads: Vec<Workload>,

    /// Timed operations per run
    #[arg(short = 'n', long, default_value_t = DEFAULT_ITERATIONS)]
    pub iterations: usize,

    /// Users inserted before read and update workloads
    #[arg(long, default_value_t = DEFAULT_PRELOAD)]
    pub preload: usize,

    /// Users per batch insert
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Ids per multi-id lookup
    #[arg(long, default_value_t = DEFAULT_IDS_BATCH)]
    pub ids_batch: usize,

    /// Page size for list workloads
    #[arg(long, default_value_t = DEFAULT_LIST_LIMIT)]
    pub list_limit: usize,

    /// Storage for provisioned databases (shared-memory or file)
    #[arg(long, default_value = "shared-memory")]
    pub storage_mode: StorageMode,

    /// Output format
    #[arg(long, default_value = "table", value_enum)]
    pub format: OutputFormat,

    /// Print registered backends and workloads and exit
    #[arg(long)]
    pub list: bool,
}

impl Args {
    /// Convert CLI arguments to a harness configuration.
    pub fn into_config(self) -> BenchConfig {
        let mut config = BenchConfig::new()
            .with_iterations(self.iterations)
            .with_preload(self.preload)
            .with_batch_size(self.batch_size)
            .with_ids_batch(self.ids_batch)
            .with_list_limit(self.list_limit)
            .with_storage_mode(self.storage_mode);

        if !self.backends.is_empty() {
            config = config.with_backends(self.backends);
        }
        if !self.workloads.is_empty() {
            config = config.with_workloads(self.workloads);
        }
        config
    }
}

fn main() {
    // Logs go to stderr so JSON output stays parseable
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ormbench=info".parse().unwrap()),
        )
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    if args.list {
        println!("{}", formatter::format_registry());
        return Ok(());
    }

    let format = args.format;
    let config = args.into_config();
    debug!(?config, "resolved configuration");

    let harness = Harness::new(config)?;
    let results = harness.run_all()?;
    println!("{}", formatter::format_results(&results, format));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["ormbench"]);
        let config = args.into_config();
        assert_eq!(config, BenchConfig::default());
    }

    #[test]
    fn test_repeatable_selection() {
        let args = Args::parse_from([
            "ormbench",
            "--backend",
            "direct",
            "--workload",
            "insert-batch",
            "--workload",
            "get-by-ids",
            "-n",
            "50",
            "--storage-mode",
            "file",
            "--format",
            "json",
        ]);
        assert_eq!(args.format, OutputFormat::Json);

        let config = args.into_config();
        assert_eq!(config.backends, vec![BackendKind::Direct]);
        assert_eq!(
            config.workloads,
            vec![Workload::InsertBatch, Workload::GetByIds]
        );
        assert_eq!(config.iterations, 50);
        assert_eq!(config.storage_mode, StorageMode::File);
    }

    #[test]
    fn test_unknown_backend_rejected() {
        assert!(Args::try_parse_from(["ormbench", "--backend", "gorm"]).is_err());
        assert!(Args::try_parse_from(["ormbench", "--workload", "upsert"]).is_err());
    }

    #[test]
    fn test_invalid_sizes_fail_run() {
        let args = Args::parse_from(["ormbench", "--iterations", "0"]);
        assert!(run(args).is_err());
    }

    #[test]
    fn test_oversized_batch_fails_before_running() {
        let args = Args::parse_from(["ormbench", "--batch-size", "11000"]);
        let err = run(args).unwrap_err();
        assert!(err.to_string().len() < 200);
    }
}
