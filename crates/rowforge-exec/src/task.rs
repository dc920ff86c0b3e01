use std::cell::Cell;
use std::fs::{self, create_dir_all};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use rowforge_core::{Table, order_tables};
use rowforge_generate::{QueryMaterializer, Row, RowProducer, SequenceSupplier};

use crate::engine::IterationContext;
use crate::errors::ExecutionError;
use crate::options::{OutputMode, SequenceMode};

/// Destination for materialized statement text.
pub trait StatementSink: Send + Sync {
    /// Apply the statement for sequence number `n` and return how many rows
    /// the data store reports as inserted.
    fn apply(&self, n: u64, sql: &str) -> Result<u64, ExecutionError>;
}

/// Writes each statement to `<folder>/GeneratedScript_<n>.sql`.
///
/// Nothing reaches a data store, so the reported insert count is zero.
#[derive(Debug, Clone)]
pub struct FileSink {
    folder: PathBuf,
}

impl FileSink {
    /// Create the sink, creating `folder` if it does not exist.
    pub fn new(folder: impl Into<PathBuf>) -> Result<Self, ExecutionError> {
        let folder = folder.into();
        create_dir_all(&folder)?;
        Ok(Self { folder })
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    pub fn script_path(&self, n: u64) -> PathBuf {
        self.folder.join(format!("GeneratedScript_{n}.sql"))
    }
}

impl StatementSink for FileSink {
    fn apply(&self, n: u64, sql: &str) -> Result<u64, ExecutionError> {
        create_dir_all(&self.folder)?;
        fs::write(self.script_path(n), sql)?;
        Ok(0)
    }
}

/// Pick the sink for `output`.
///
/// File output builds a [`FileSink`]; execute output needs the caller's
/// `executor`. Missing pieces are configuration errors.
pub fn sink_for_output(
    output: &OutputMode,
    executor: Option<Arc<dyn StatementSink>>,
) -> Result<Arc<dyn StatementSink>, ExecutionError> {
    match output {
        OutputMode::WriteToFile {
            folder: Some(folder),
        } => Ok(Arc::new(FileSink::new(folder)?)),
        OutputMode::WriteToFile { folder: None } => Err(ExecutionError::Config(
            "output folder is required when writing to files".to_string(),
        )),
        OutputMode::Execute => executor.ok_or_else(|| {
            ExecutionError::Config("no statement executor configured".to_string())
        }),
    }
}

/// The standard task: produce rows, materialize the query, hand it to a sink.
pub struct StatementTask {
    producer: Arc<RowProducer>,
    tables: Vec<Table>,
    base_query: String,
    materializer: Arc<dyn QueryMaterializer>,
    sink: Arc<dyn StatementSink>,
    sequence: Arc<SequenceSupplier>,
    mode: SequenceMode,
}

impl StatementTask {
    /// Build a task over `tables`, reordered so copy and foreign key sources
    /// are produced first.
    pub fn new(
        producer: Arc<RowProducer>,
        tables: &[Table],
        materializer: Arc<dyn QueryMaterializer>,
        sink: Arc<dyn StatementSink>,
        sequence: Arc<SequenceSupplier>,
    ) -> Result<Self, ExecutionError> {
        if tables.is_empty() {
            return Err(ExecutionError::Config(
                "at least one table is required".to_string(),
            ));
        }

        Ok(Self {
            producer,
            tables: order_tables(tables)?,
            base_query: String::new(),
            materializer,
            sink,
            sequence,
            mode: SequenceMode::NewPerExecution,
        })
    }

    pub fn with_base_query(mut self, base_query: impl Into<String>) -> Self {
        self.base_query = base_query.into();
        self
    }

    pub fn with_sequence_mode(mut self, mode: SequenceMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    /// Materialize one statement without applying it.
    ///
    /// Returns the task's sequence number and the query text.
    pub fn render(&self) -> Result<(u64, String), ExecutionError> {
        let n = self.task_number();
        let rows = self.produce(n)?;
        let sequence = || self.sequence.next();
        let sql = self
            .materializer
            .materialize(&self.base_query, &rows, n, &sequence);
        self.producer.store().release(&rows);
        Ok((n, sql?))
    }

    /// One engine iteration: render, apply, and count the inserts.
    pub fn run_once(&self, ctx: &IterationContext<'_>) -> Result<(), ExecutionError> {
        let (n, sql) = self.render()?;
        let inserted = self.sink.apply(n, &sql)?;
        ctx.record_inserts(inserted);
        debug!(worker = ctx.worker(), n, inserted, "statement applied");
        Ok(())
    }

    fn task_number(&self) -> u64 {
        match self.mode {
            SequenceMode::NewPerExecution | SequenceMode::NewPerRow => self.sequence.next(),
            SequenceMode::Constant(n) => n,
        }
    }

    fn produce(&self, n: u64) -> Result<Vec<Row>, ExecutionError> {
        let first = Cell::new(Some(n));
        let supplier = || match self.mode {
            SequenceMode::NewPerRow => first.take().unwrap_or_else(|| self.sequence.next()),
            SequenceMode::NewPerExecution | SequenceMode::Constant(_) => n,
        };

        let mut rows = Vec::with_capacity(self.tables.len());
        for row in self.producer.produce_rows(&self.tables, supplier)? {
            match row {
                Ok(row) => rows.push(row),
                Err(err) => {
                    self.producer.store().release(&rows);
                    return Err(err.into());
                }
            }
        }
        Ok(rows)
    }
}
