//! A complete load run.

use std::path::{Path, PathBuf};

use tracing::info;

use sf_writer_bulk::BulkOperation;

use crate::batch::chunks;
use crate::config::WriterConfig;
use crate::datadir::DataDir;
use crate::error::Result;
use crate::reconcile::{reconcile, RunSummary};
use crate::report::report;
use crate::runner::JobRunner;
use crate::session::{authenticate_with_retry, SalesforceSessionFactory, SessionFactory};
use crate::settings::RunSettings;
use crate::source::{InputRow, RowSource};

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub summary: RunSummary,
    /// Table of rejected rows, written when rows failed and the run does not
    /// fail on errors.
    pub unsuccessful_table: Option<PathBuf>,
}

/// Resolve the configuration and input table of `data_dir` and load the table
/// into Salesforce.
pub async fn run_data_dir(data_dir: &DataDir, settings: &RunSettings) -> Result<RunReport> {
    let config = WriterConfig::resolve(&data_dir.load_parameters()?)?;
    let table = data_dir.input_table()?;
    let source = RowSource::open(&table, config.replace_string.as_deref())?;
    let factory = SalesforceSessionFactory::new(settings.poll_interval, settings.max_wait);

    run(
        &config,
        &source,
        &factory,
        settings,
        &data_dir.output_tables_dir(),
    )
    .await
}

/// Validate the source, log in, write every chunk and report failed rows.
pub async fn run<F: SessionFactory>(
    config: &WriterConfig,
    source: &RowSource,
    factory: &F,
    settings: &RunSettings,
    out_dir: &Path,
) -> Result<RunReport> {
    info!(
        "Running {} operation with input table to the {} Salesforce object",
        config.operation, config.sf_object
    );

    source.validate(config.operation, config.upsert_field_name.as_deref())?;
    let spec = config.job_spec();

    let session = authenticate_with_retry(factory, &config.credentials, &settings.auth_retry).await?;
    let runner = JobRunner::new(&session, spec, source.headers(), settings);

    let mut results = Vec::new();
    for (index, chunk) in chunks(source.rows()?, config.batch_size)?.enumerate() {
        let chunk = chunk.into_iter().collect::<Result<Vec<InputRow>>>()?;
        info!(chunk = index + 1, rows = chunk.len(), "Writing chunk");
        results.extend(runner.run_chunk(&chunk).await?);
    }

    let (parsed, summary) = reconcile(results);
    info!(
        "All data written to salesforce, {} {} records, {} errors occurred",
        past_tense(config.operation),
        summary.success_count,
        summary.error_count
    );

    let unsuccessful_table = report(
        source,
        &parsed,
        summary,
        config.fail_on_error,
        out_dir,
        &config.unsuccessful_table_name(),
    )?;

    Ok(RunReport {
        summary,
        unsuccessful_table,
    })
}

fn past_tense(operation: BulkOperation) -> &'static str {
    match operation {
        BulkOperation::Insert => "inserted",
        BulkOperation::Update => "updated",
        BulkOperation::Upsert => "upserted",
        BulkOperation::Delete => "deleted",
    }
}
