// crates/feed-archiver-sql/src/archiver.rs
// ============================================================================
// Module: SQL Archiver
// Description: Row inserts with lazy table provisioning and conflict metering.
// Purpose: Archive records into per-topic Postgres tables.
// Dependencies: async-trait, feed-archiver-core, sqlx, tracing
// ============================================================================

//! ## Overview
//! [`SqlArchiver`] derives a table name from each record's routing key,
//! ensures the table exists through a [`DestinationRegistry`] backed by
//! [`SqlProvisioner`], and inserts the record as one `(id, data)` row. A
//! unique-key conflict is the expected outcome for re-delivered records and
//! is metered separately from successful inserts; any other write failure is
//! handled per the configured [`WriteFailurePolicy`].
//! Invariants:
//! - The insert binds the identifier and payload as parameters.
//! - A table is provisioned with a key column matching the first identifier
//!   kind seen for its topic.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;
use tracing::error;
use tracing::warn;

use feed_archiver_core::ArchiveBackend;
use feed_archiver_core::DestinationProvisioner;
use feed_archiver_core::DestinationRegistry;
use feed_archiver_core::IdentifierKind;
use feed_archiver_core::IdentifierValue;
use feed_archiver_core::MetricPoint;
use feed_archiver_core::MetricsSink;
use feed_archiver_core::ProvisionError;
use feed_archiver_core::Record;
use feed_archiver_core::WriteFailurePolicy;
use feed_archiver_core::table_destination;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Postgres error code for a unique-constraint violation.
const UNIQUE_VIOLATION_CODE: &str = "23505";

// ============================================================================
// SECTION: Statement Builders
// ============================================================================

/// Returns the key column type for an identifier kind.
const fn key_column_type(kind: IdentifierKind) -> &'static str {
    match kind {
        IdentifierKind::Integer => "bigint",
        IdentifierKind::Bytes => "bytea",
    }
}

/// Builds the idempotent table-creation statement for a destination.
fn create_table_sql(table: &str, kind: IdentifierKind) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS \"{table}\" (\
         id {key} PRIMARY KEY, \
         archived_on timestamp DEFAULT now() NOT NULL, \
         data jsonb NOT NULL)",
        key = key_column_type(kind),
    )
}

/// Builds the parameterized row-insert statement for a destination.
fn insert_sql(table: &str) -> String {
    format!("INSERT INTO \"{table}\" (id, data) VALUES ($1, $2::jsonb)")
}

/// Returns true when the error is a unique-constraint violation.
fn is_unique_violation(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(db) => db.code().as_deref() == Some(UNIQUE_VIOLATION_CODE),
        _ => false,
    }
}

// ============================================================================
// SECTION: Provisioner
// ============================================================================

/// Idempotent table creation against the shared pool.
pub struct SqlProvisioner {
    /// Connection pool shared with the archiver.
    pool: PgPool,
}

impl SqlProvisioner {
    /// Creates a provisioner over the given pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DestinationProvisioner for SqlProvisioner {
    async fn provision(&self, name: &str, kind: IdentifierKind) -> Result<(), ProvisionError> {
        let ddl = create_table_sql(name, kind);
        sqlx::query(&ddl)
            .execute(&self.pool)
            .await
            .map_err(|err| ProvisionError::Store {
                name: name.to_string(),
                message: err.to_string(),
            })?;
        debug!(table = name, "ensured archive table");
        Ok(())
    }
}

// ============================================================================
// SECTION: Archiver
// ============================================================================

/// Relational archive backend writing one row per record.
pub struct SqlArchiver {
    /// Connection pool for row inserts.
    pool: PgPool,
    /// Lazily provisioned table registry.
    registry: DestinationRegistry,
    /// Sink for insert and conflict metrics.
    metrics: Arc<dyn MetricsSink>,
    /// Policy applied to non-conflict write failures.
    policy: WriteFailurePolicy,
}

impl SqlArchiver {
    /// Creates an archiver over the given pool and metrics sink.
    #[must_use]
    pub fn new(pool: PgPool, metrics: Arc<dyn MetricsSink>, policy: WriteFailurePolicy) -> Self {
        let provisioner = Arc::new(SqlProvisioner::new(pool.clone()));
        Self {
            pool,
            registry: DestinationRegistry::new(provisioner as Arc<dyn DestinationProvisioner>),
            metrics,
            policy,
        }
    }

    /// Inserts one row and meters the classified outcome.
    async fn insert_row(&self, table: &str, record: &Record, serialized: &str) {
        let statement = insert_sql(table);
        let query = sqlx::query(&statement);
        let query = match &record.identifier {
            IdentifierValue::Integer(value) => query.bind(*value),
            IdentifierValue::Bytes(bytes) => query.bind(bytes.as_slice()),
        };
        let outcome = query.bind(serialized).execute(&self.pool).await.map(|_| ());
        self.meter_insert(table, serialized.len(), outcome);
    }

    /// Meters one insert outcome.
    ///
    /// Success and duplicate-identifier conflicts each emit their point; any
    /// other failure follows the write-failure policy and emits nothing.
    fn meter_insert(&self, table: &str, size: usize, outcome: Result<(), sqlx::Error>) {
        match outcome {
            Ok(()) => {
                self.metrics.record(MetricPoint::insert_row(table, size));
            }
            Err(err) if is_unique_violation(&err) => {
                self.metrics.record(MetricPoint::unique_violation(table, size));
            }
            Err(err) => match self.policy {
                WriteFailurePolicy::Drop => {
                    error!(table, error = %err, "dropping record after failed insert");
                }
            },
        }
    }
}

#[async_trait]
impl ArchiveBackend for SqlArchiver {
    async fn archive(&self, record: &Record) {
        let table = match table_destination(&record.routing_key) {
            Ok(table) => table,
            Err(err) => {
                warn!(key = %record.routing_key, error = %err, "dropping record with underivable table");
                return;
            }
        };
        if let Err(err) = self.registry.ensure(&table, record.identifier.kind()).await {
            error!(table, error = %err, "dropping record after failed table provisioning");
            return;
        }
        let serialized = record.payload.to_string();
        self.insert_row(&table, record, &serialized).await;
    }
}
