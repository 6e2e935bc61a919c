// crates/feed-archiver-cli/src/main.rs
// ============================================================================
// Module: Feed Archiver CLI Entry Point
// Description: Configuration surface and wiring for the archival pipeline.
// Purpose: Select a backend, connect the stores, and run the dispatcher.
// Dependencies: clap, feed-archiver-core, feed-archiver-metrics,
//               feed-archiver-queue, feed-archiver-search, feed-archiver-sql,
//               sqlx, thiserror, tokio, tracing, tracing-subscriber
// ============================================================================

//! ## Overview
//! The feed archiver binary drains per-topic message-bus queues into either
//! a relational store or a search store. Every flag carries an `FA_`
//! environment fallback so deployments can configure the process without a
//! command line. Startup validates configuration, connects the selected
//! stores, optionally spawns the metrics writer, and hands control to the
//! dispatcher, which runs until the process is stopped.
//!
//! Security posture: credentials arrive via flags or environment and are
//! never logged; queue payloads are untrusted throughout.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use clap::ValueEnum;
use sqlx::postgres::PgConnectOptions;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;
use tracing::error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use feed_archiver_core::ArchiveBackend;
use feed_archiver_core::ArchiveConsumer;
use feed_archiver_core::Consumer;
use feed_archiver_core::Dispatcher;
use feed_archiver_core::DispatcherConfig;
use feed_archiver_core::DispatcherConfigError;
use feed_archiver_core::MetricsSink;
use feed_archiver_core::NoopMetricsSink;
use feed_archiver_core::QueueError;
use feed_archiver_core::QueueSource;
use feed_archiver_core::WriteFailurePolicy;
use feed_archiver_metrics::InfluxConfig;
use feed_archiver_metrics::InfluxConfigError;
use feed_archiver_metrics::spawn_writer;
use feed_archiver_queue::RedisQueueConfig;
use feed_archiver_queue::RedisQueueSource;
use feed_archiver_search::SearchArchiver;
use feed_archiver_search::SearchConfig;
use feed_archiver_search::SearchConfigError;
use feed_archiver_sql::SqlArchiver;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Archive backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum BackendKind {
    /// Relational store: one table per topic, one row per record.
    Sql,
    /// Search store: one index per feed, one document per record.
    Search,
}

/// Command-line and environment configuration.
#[derive(Debug, Parser)]
#[command(name = "feed-archiver", version, about = "Archive per-topic queue records into a relational or search store")]
struct FeedArchiverArgs {
    /// Database server host.
    #[arg(long, env = "FA_DB_HOST", default_value = "127.0.0.1")]
    db_host: String,
    /// Database server port.
    #[arg(long, env = "FA_DB_PORT", default_value_t = 5432)]
    db_port: u16,
    /// Database user.
    #[arg(long, env = "FA_DB_USER", default_value = "archiver")]
    db_user: String,
    /// Database password.
    #[arg(long, env = "FA_DB_PASSWORD", default_value = "")]
    db_password: String,
    /// Database name.
    #[arg(long, env = "FA_DB_NAME", default_value = "archive")]
    db_name: String,
    /// Message-bus connection URL; may embed a credential as
    /// `redis://:password@host:port`.
    #[arg(long, env = "FA_REDIS_ADDR", default_value = "redis://127.0.0.1:6379")]
    redis_addr: String,
    /// Message-bus password; overrides any credential in the URL.
    #[arg(long, env = "FA_REDIS_PASSWORD")]
    redis_password: Option<String>,
    /// Pattern matched against queue key names.
    #[arg(long, env = "FA_PATTERN", default_value = "*")]
    pattern: String,
    /// Number of dispatcher workers; also sizes the database pool.
    #[arg(long, env = "FA_THREADS", default_value_t = 5)]
    threads: usize,
    /// Metrics store endpoint; metrics are disabled when absent.
    #[arg(long, env = "FA_INFLUXDB")]
    influxdb: Option<String>,
    /// Metrics database name.
    #[arg(long, env = "FA_INFLUXDB_DATABASE", default_value = "feed_archiver")]
    influxdb_database: String,
    /// Metric points per flushed batch.
    #[arg(long, env = "FA_INFLUXDB_BUFFER", default_value_t = 500)]
    influxdb_buffer: usize,
    /// Archive backend to write records into.
    #[arg(long, env = "FA_BACKEND", value_enum, default_value_t = BackendKind::Sql)]
    backend: BackendKind,
    /// Search store endpoint, used by the search backend.
    #[arg(long, env = "FA_SEARCH_ADDR", default_value = "http://127.0.0.1:9200")]
    search_addr: String,
}

// ============================================================================
// SECTION: Startup Errors
// ============================================================================

/// Errors that abort startup before the dispatcher runs.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
enum StartupError {
    /// Metrics writer configuration was invalid.
    #[error("metrics configuration: {0}")]
    Metrics(#[from] InfluxConfigError),
    /// Search backend configuration was invalid.
    #[error("search configuration: {0}")]
    Search(#[from] SearchConfigError),
    /// Database pool could not be established.
    #[error("database connection: {0}")]
    Database(#[from] sqlx::Error),
    /// Queue source could not be established.
    #[error("queue connection: {0}")]
    Queue(#[from] QueueError),
    /// Dispatcher configuration was invalid.
    #[error("dispatcher configuration: {0}")]
    Dispatcher(#[from] DispatcherConfigError),
}

// ============================================================================
// SECTION: Wiring
// ============================================================================

/// Builds the database connection options from the parsed arguments.
fn connect_options(args: &FeedArchiverArgs) -> PgConnectOptions {
    PgConnectOptions::new()
        .host(&args.db_host)
        .port(args.db_port)
        .username(&args.db_user)
        .password(&args.db_password)
        .database(&args.db_name)
}

/// Clamps the worker count into the pool-size range.
fn pool_size(threads: usize) -> u32 {
    u32::try_from(threads).unwrap_or(u32::MAX)
}

/// Builds the log filter: the standard env directive when set, `info`
/// otherwise.
fn log_filter(directives: Option<String>) -> EnvFilter {
    directives.map_or_else(|| EnvFilter::new("info"), EnvFilter::new)
}

/// Builds the metrics sink, spawning the writer when an endpoint is set.
fn build_metrics(args: &FeedArchiverArgs) -> Result<Arc<dyn MetricsSink>, StartupError> {
    match &args.influxdb {
        Some(endpoint) => {
            let config =
                InfluxConfig::new(endpoint, &args.influxdb_database, args.influxdb_buffer);
            // The writer handle is intentionally detached: the process runs
            // until stopped and the sink is best-effort.
            let (sink, _writer) = spawn_writer(&config)?;
            info!(endpoint = %endpoint, "metrics writer started");
            Ok(Arc::new(sink) as Arc<dyn MetricsSink>)
        }
        None => Ok(Arc::new(NoopMetricsSink) as Arc<dyn MetricsSink>),
    }
}

/// Builds the selected archive backend.
async fn build_backend(
    args: &FeedArchiverArgs,
    metrics: Arc<dyn MetricsSink>,
) -> Result<Arc<dyn ArchiveBackend>, StartupError> {
    match args.backend {
        BackendKind::Sql => {
            let pool = PgPoolOptions::new()
                .max_connections(pool_size(args.threads))
                .connect_with(connect_options(args))
                .await?;
            info!(host = %args.db_host, database = %args.db_name, "connected relational store");
            Ok(Arc::new(SqlArchiver::new(pool, metrics, WriteFailurePolicy::Drop)))
        }
        BackendKind::Search => {
            let archiver = SearchArchiver::new(
                &SearchConfig::new(&args.search_addr),
                metrics,
                WriteFailurePolicy::Drop,
            )?;
            info!(endpoint = %args.search_addr, "using search store");
            Ok(Arc::new(archiver))
        }
    }
}

/// Connects everything and runs the dispatcher until the process stops.
async fn run(args: FeedArchiverArgs) -> Result<(), StartupError> {
    // Fail closed on a degenerate worker count before any store connection.
    let dispatcher_config = DispatcherConfig {
        workers: args.threads,
        ..DispatcherConfig::default()
    };
    dispatcher_config.validate()?;
    let metrics = build_metrics(&args)?;
    let backend = build_backend(&args, metrics).await?;
    let mut queue_config = RedisQueueConfig::new(&args.redis_addr, &args.pattern);
    queue_config.password = args.redis_password.clone();
    let source = RedisQueueSource::connect(queue_config).await?;
    let consumer = Arc::new(ArchiveConsumer::new(backend)) as Arc<dyn Consumer>;
    let dispatcher = Dispatcher::new(
        dispatcher_config,
        Arc::new(source) as Arc<dyn QueueSource>,
        consumer,
    )?;
    dispatcher.run().await;
    Ok(())
}

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// Process entry point.
#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var("RUST_LOG").ok()))
        .init();
    let args = FeedArchiverArgs::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "startup failed");
            ExitCode::FAILURE
        }
    }
}
