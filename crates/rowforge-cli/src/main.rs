mod config;
mod logging;
mod redaction;
mod sinks;
mod summary;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use rowforge_core::{DatabaseSchema, Error as CoreError, SCHEMA_VERSION, Table, validate_schema};
use rowforge_exec::{
    ExecutionEngine, ExecutionError, ExecutionOptions, OutputMode, Progress, StatementSink,
    StatementTask, StopPolicy, sink_for_output,
};
use rowforge_generate::{InsertMaterializer, RowProducer, SequenceSupplier, ValueStore};
use thiserror::Error;
use tokio::signal;
use tracing::{info, warn};
use uuid::Uuid;

use config::{OutputKind, RunConfig, SequenceKind, StopKind};
use redaction::redact_connection_string;
use sinks::{PgSink, StdoutSink};
use summary::{RunSummary, write_summary};

const PROGRESS_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum CliError {
    #[error("core error: {0}")]
    Core(#[from] CoreError),
    #[error("execution error: {0}")]
    Execution(#[from] ExecutionError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("config parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("logging error: {0}")]
    Logging(String),
    #[error("worker pool failed: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

#[derive(Parser, Debug)]
#[command(
    name = "rowforge",
    version,
    about = "Synthesize test rows and run them under a count or time budget"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate statements and execute or write them until the budget is spent.
    Run(RunArgs),
    /// Print materialized batches to stdout without touching a database.
    Preview(PreviewArgs),
    /// Print the JSON Schema of the schema document.
    Schema(SchemaArgs),
}

#[derive(Args, Debug)]
struct SourceArgs {
    /// Schema document (JSON).
    #[arg(long, value_name = "PATH")]
    schema: PathBuf,
    /// Table to include, as `schema.table` or `table`. Repeatable; defaults to all.
    #[arg(long = "table", value_name = "TABLE")]
    tables: Vec<String>,
    /// Run configuration (TOML). Flags override its values.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Query template; `{{rows}}` receives the generated statements.
    #[arg(long)]
    base_query: Option<String>,
    /// Sequence numbering mode.
    #[arg(long, value_enum)]
    sequence: Option<SequenceKind>,
    /// Number used by the constant sequence mode.
    #[arg(long)]
    constant_sequence: Option<u64>,
    /// Seed for the random generators.
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Args, Debug)]
struct RunArgs {
    #[command(flatten)]
    source: SourceArgs,
    /// Stop after this many task executions.
    #[arg(long, conflicts_with = "duration")]
    count: Option<u64>,
    /// Stop after this many seconds.
    #[arg(long, value_name = "SECONDS")]
    duration: Option<u64>,
    /// Worker threads.
    #[arg(long)]
    threads: Option<usize>,
    /// Execute against the database or write script files.
    #[arg(long, value_enum)]
    output: Option<OutputKind>,
    /// Folder for script files.
    #[arg(long)]
    folder: Option<PathBuf>,
    /// Database connection string.
    #[arg(long, value_name = "CONNECTION_STRING")]
    conn: Option<String>,
    /// Directory for logs and the run summary.
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct PreviewArgs {
    #[command(flatten)]
    source: SourceArgs,
    /// Number of batches to print.
    #[arg(long, default_value_t = 1)]
    batches: u64,
}

#[derive(Args, Debug)]
struct SchemaArgs {
    /// Write to this path instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();

    match cli.command {
        Command::Run(args) => run(args).await,
        Command::Preview(args) => preview(args),
        Command::Schema(args) => print_schema(args),
    }
}

async fn run(args: RunArgs) -> Result<(), CliError> {
    let RunArgs {
        source,
        count,
        duration,
        threads,
        output,
        folder,
        conn,
        log_dir,
    } = args;

    let mut config = RunConfig::load(source.config.as_deref())?;
    apply_source_overrides(&mut config, &source);
    if let Some(target) = count {
        config.stop = StopKind::Count;
        config.target = target;
    }
    if let Some(seconds) = duration {
        config.stop = StopKind::Duration;
        config.duration_secs = seconds;
    }
    if let Some(threads) = threads {
        config.max_threads = threads;
    }
    if let Some(output) = output {
        config.output = output;
    }
    if folder.is_some() {
        config.folder = folder;
    }
    if conn.is_some() {
        config.connection = conn;
    }
    if let Some(log_dir) = log_dir {
        config.log_dir = log_dir;
    }

    let log_path = logging::init_logging(Some(&config.log_dir))?;
    let run_id = Uuid::new_v4().to_string();
    let started_at = Utc::now();
    let connection = config.connection.as_deref().map(redact_connection_string);
    info!(
        event = "run_started",
        run_id = %run_id,
        connection = ?connection,
        logs = ?log_path,
    );

    let options = config.to_options();
    options.validate()?;

    let schema = load_schema(&source.schema)?;
    let tables = select_tables(&schema, &source.tables)?;
    info!(event = "schema_loaded", tables = tables.len());

    let executor = match config.output {
        OutputKind::Execute => {
            let conn = config.connection.as_deref().ok_or_else(|| {
                CliError::InvalidConfig(
                    "a connection string is required to execute statements".to_string(),
                )
            })?;
            let max_connections = u32::try_from(config.max_threads).unwrap_or(u32::MAX);
            let sink: Arc<dyn StatementSink> =
                Arc::new(PgSink::connect(conn, max_connections).await?);
            Some(sink)
        }
        OutputKind::File => None,
    };
    let sink = sink_for_output(&options.output, executor)?;
    let task = build_task(&config, &tables, sink)?;

    let engine = Arc::new(ExecutionEngine::new(options)?);
    let stopper = Arc::clone(&engine);
    let interrupt = tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            warn!(event = "interrupt_received");
            stopper.request_stop();
        }
    });
    let reporter = tokio::spawn(report_progress(Arc::clone(&engine), PROGRESS_INTERVAL));

    let timer = Instant::now();
    let worker_engine = Arc::clone(&engine);
    let result =
        tokio::task::spawn_blocking(move || worker_engine.run(|ctx| task.run_once(ctx))).await??;
    interrupt.abort();
    reporter.abort();
    info!(event = "progress", percent = engine.progress().percent());

    let summary = RunSummary {
        run_id,
        started_at,
        finished_at: Utc::now(),
        cancelled: engine.is_stop_requested(),
        connection,
        result,
    };
    let summary_path = write_summary(&config.log_dir, &summary)?;

    let status = if summary.result.is_success() {
        "success"
    } else {
        "partial"
    };
    info!(
        event = "run_finished",
        status,
        executed = summary.result.executed_item_count,
        inserts = summary.result.insert_count,
        errors = summary.result.errors.len(),
        duration_ms = timer.elapsed().as_millis() as u64,
        summary = %summary_path.display(),
        error_log = ?engine.error_log_path(),
    );
    println!("{}", serde_json::to_string_pretty(&summary.result)?);

    Ok(())
}

fn preview(args: PreviewArgs) -> Result<(), CliError> {
    let PreviewArgs { source, batches } = args;
    logging::init_logging(None)?;

    let mut config = RunConfig::load(source.config.as_deref())?;
    apply_source_overrides(&mut config, &source);

    let schema = load_schema(&source.schema)?;
    let tables = select_tables(&schema, &source.tables)?;
    let task = build_task(&config, &tables, Arc::new(StdoutSink))?;

    let engine = ExecutionEngine::new(ExecutionOptions {
        stop: StopPolicy::Count { target: batches },
        max_threads: 1,
        output: OutputMode::Execute,
        sequence: config.sequence_mode(),
        log_dir: None,
    })?;
    let result = engine.run(|ctx| task.run_once(ctx))?;
    for error in &result.errors {
        warn!(event = "preview_failed", error = %error);
    }

    Ok(())
}

fn print_schema(args: SchemaArgs) -> Result<(), CliError> {
    let schema = schemars::schema_for!(DatabaseSchema);
    let encoded = serde_json::to_string_pretty(&schema)?;
    match args.out {
        Some(path) => std::fs::write(path, encoded)?,
        None => println!("{encoded}"),
    }
    Ok(())
}

fn apply_source_overrides(config: &mut RunConfig, source: &SourceArgs) {
    if let Some(base_query) = &source.base_query {
        config.base_query = base_query.clone();
    }
    if let Some(sequence) = source.sequence {
        config.sequence = sequence;
    }
    if let Some(constant) = source.constant_sequence {
        config.constant_sequence = constant;
    }
    if let Some(seed) = source.seed {
        config.seed = seed;
    }
}

fn load_schema(path: &Path) -> Result<DatabaseSchema, CliError> {
    let content = std::fs::read_to_string(path)?;
    let schema: DatabaseSchema = serde_json::from_str(&content)?;
    if schema.schema_version != SCHEMA_VERSION {
        warn!(
            event = "schema_version_mismatch",
            found = %schema.schema_version,
            expected = SCHEMA_VERSION,
        );
    }
    validate_schema(&schema)?;
    Ok(schema)
}

/// Resolve `filters` against the schema, keeping their order. No filters
/// selects every table.
fn select_tables(schema: &DatabaseSchema, filters: &[String]) -> Result<Vec<Table>, CliError> {
    if filters.is_empty() {
        return Ok(schema.tables.clone());
    }

    filters
        .iter()
        .map(|filter| {
            let found = match filter.split_once('.') {
                Some((schema_name, name)) => schema.table(schema_name, name),
                None => schema.tables.iter().find(|table| table.name == *filter),
            };
            found
                .cloned()
                .ok_or_else(|| CliError::InvalidConfig(format!("unknown table: {filter}")))
        })
        .collect()
}

fn build_task(
    config: &RunConfig,
    tables: &[Table],
    sink: Arc<dyn StatementSink>,
) -> Result<StatementTask, CliError> {
    let store = Arc::new(ValueStore::new());
    let producer = Arc::new(RowProducer::new(Arc::clone(&store), config.seed));
    let task = StatementTask::new(
        producer,
        tables,
        Arc::new(InsertMaterializer::new(store)),
        sink,
        Arc::new(SequenceSupplier::new()),
    )?
    .with_base_query(config.base_query.clone())
    .with_sequence_mode(config.sequence_mode());
    Ok(task)
}

async fn report_progress(engine: Arc<ExecutionEngine>, every: Duration) {
    let progress: Arc<Progress> = engine.progress();
    let mut ticks = tokio::time::interval(every);
    ticks.tick().await;
    loop {
        ticks.tick().await;
        info!(
            event = "progress",
            percent = progress.percent(),
            rows = engine.rows_produced(),
            inserts = engine.inserts(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowforge_core::{Column, ColumnType};

    fn table(schema: &str, name: &str) -> Table {
        Table {
            schema: schema.to_string(),
            name: name.to_string(),
            comment: None,
            columns: vec![Column {
                ordinal_position: 1,
                name: "id".to_string(),
                column_type: ColumnType::new("integer"),
                is_nullable: false,
                is_primary_key: true,
                identity: None,
                foreign_key: None,
                generator: None,
                comment: None,
            }],
        }
    }

    fn schema() -> DatabaseSchema {
        DatabaseSchema {
            schema_version: SCHEMA_VERSION.to_string(),
            database: None,
            tables: vec![
                table("sales", "customer"),
                table("sales", "order"),
                table("audit", "order"),
            ],
        }
    }

    #[test]
    fn selects_all_tables_without_filters() {
        let tables = select_tables(&schema(), &[]).expect("select");
        assert_eq!(tables.len(), 3);
    }

    #[test]
    fn selects_qualified_and_bare_names_in_order() {
        let filters = vec!["audit.order".to_string(), "customer".to_string()];
        let tables = select_tables(&schema(), &filters).expect("select");
        let keys: Vec<String> = tables.iter().map(Table::key).collect();
        assert_eq!(keys, ["audit.order", "sales.customer"]);
    }

    #[test]
    fn unknown_table_is_config_error() {
        let filters = vec!["sales.invoice".to_string()];
        assert!(matches!(
            select_tables(&schema(), &filters),
            Err(CliError::InvalidConfig(_))
        ));
    }

    #[test]
    fn source_flags_override_config() {
        let mut config = RunConfig::default();
        let source = SourceArgs {
            schema: PathBuf::from("schema.json"),
            tables: Vec::new(),
            config: None,
            base_query: Some("BEGIN;\n{{rows}}\nCOMMIT;".to_string()),
            sequence: Some(SequenceKind::Constant),
            constant_sequence: Some(9),
            seed: Some(77),
        };

        apply_source_overrides(&mut config, &source);

        assert_eq!(config.base_query, "BEGIN;\n{{rows}}\nCOMMIT;");
        assert_eq!(config.seed, 77);
        assert_eq!(
            config.sequence_mode(),
            rowforge_exec::SequenceMode::Constant(9)
        );
    }

    #[test]
    fn demo_files_are_valid() {
        let schema: DatabaseSchema =
            serde_json::from_str(include_str!("../../../demos/shop/schema.json")).expect("schema");
        validate_schema(&schema).expect("demo schema validates");
        let config =
            RunConfig::from_toml(include_str!("../../../demos/shop/rowforge.toml")).expect("config");
        config.to_options().validate().expect("demo options validate");

        let tables = select_tables(&schema, &[]).expect("select");
        let sink: Arc<dyn StatementSink> = Arc::new(StdoutSink);
        let task = build_task(&config, &tables, sink).expect("task");
        let (n, sql) = task.render().expect("render");
        assert_eq!(n, 1);
        assert!(sql.starts_with("BEGIN;\n-- batch 1\nINSERT INTO \"sales\".\"Customer\""));
        assert!(sql.contains("INSERT INTO \"sales\".\"Order\" (\"CustomerId\", \"PlacedAt\""));
        assert!(sql.contains("VALUES (1000, '2024-01-01 09:00:00'"));
    }

    #[test]
    fn cli_parses_run_flags() {
        let cli = Cli::try_parse_from([
            "rowforge",
            "run",
            "--schema",
            "schema.json",
            "--table",
            "sales.customer",
            "--duration",
            "30",
            "--threads",
            "4",
            "--output",
            "execute",
        ])
        .expect("parse");

        let Command::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert_eq!(args.duration, Some(30));
        assert_eq!(args.threads, Some(4));
        assert_eq!(args.output, Some(OutputKind::Execute));
        assert_eq!(args.source.tables, ["sales.customer"]);
    }

    #[test]
    fn cli_rejects_count_with_duration() {
        let parsed = Cli::try_parse_from([
            "rowforge",
            "run",
            "--schema",
            "schema.json",
            "--count",
            "10",
            "--duration",
            "30",
        ]);
        assert!(parsed.is_err());
    }
}
