use std::io::{self, Write};
use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tokio::runtime::Handle;
use tracing::info;

use rowforge_exec::{ExecutionError, StatementSink};

use crate::CliError;

/// Executes each statement batch on a Postgres pool.
///
/// Engine workers are plain threads, so every batch is driven to completion
/// on the captured runtime handle. Must not be called from inside an async
/// task.
pub struct PgSink {
    pool: PgPool,
    runtime: Handle,
}

impl PgSink {
    pub async fn connect(conn: &str, max_connections: u32) -> Result<Self, CliError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .connect(conn)
            .await?;
        info!(event = "database_connected", max_connections);

        Ok(Self {
            pool,
            runtime: Handle::current(),
        })
    }
}

impl StatementSink for PgSink {
    fn apply(&self, n: u64, sql: &str) -> Result<u64, ExecutionError> {
        let done = self
            .runtime
            .block_on(sqlx::raw_sql(sql).execute(&self.pool))
            .map_err(|err| ExecutionError::Statement(format!("batch {n}: {err}")))?;
        Ok(done.rows_affected())
    }
}

/// Prints each statement batch to stdout behind a `-- batch <n>` header.
#[derive(Debug, Default)]
pub struct StdoutSink;

impl StatementSink for StdoutSink {
    fn apply(&self, n: u64, sql: &str) -> Result<u64, ExecutionError> {
        let mut out = io::stdout().lock();
        writeln!(out, "-- batch {n}")?;
        writeln!(out, "{sql}")?;
        Ok(0)
    }
}
