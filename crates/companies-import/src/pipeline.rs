//! One import run, end to end
//!
//! download -> open archive -> read header -> connect -> swap table ->
//! load rows -> record run. Each stage finishes before the next starts,
//! except loading, which pulls rows from the decoder one at a time.

use std::path::Path;

use reqwest::StatusCode;
use tracing::{info, warn};

use crate::archive::CompanyArchive;
use crate::config::ImportConfig;
use crate::decode::{CompanyRecord, RecordDecoder};
use crate::error::Result;
use crate::fetch::{fetch_archive, FetchOutcome};
use crate::load::{load_records, record_run, LoadStats};
use crate::store::{CompanyStore, MySqlStore, TableNames};
use crate::swap::{create_destination, ensure_audit_table, swap_tables};

/// How a run ended when it did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Table replaced and run recorded
    Imported(LoadStats),
    /// Archive not published (non-200); nothing was touched
    Unavailable(StatusCode),
}

/// Options for the database half of a run
#[derive(Debug, Clone, Copy)]
pub struct LoadOptions {
    pub progress_every: u64,
    pub create_table: bool,
}

impl From<&ImportConfig> for LoadOptions {
    fn from(config: &ImportConfig) -> Self {
        Self {
            progress_every: config.progress_every,
            create_table: config.create_table,
        }
    }
}

/// Replace the destination table with `records` and record the run
pub async fn import_records<S, I>(store: &mut S, records: I, options: LoadOptions) -> Result<LoadStats>
where
    S: CompanyStore + ?Sized,
    I: IntoIterator<Item = Result<CompanyRecord>>,
{
    if options.create_table {
        create_destination(store).await?;
    }

    swap_tables(store).await?;
    ensure_audit_table(store).await?;

    let stats = load_records(store, records, options.progress_every).await?;
    record_run(store, &stats).await?;

    Ok(stats)
}

/// Run a full import with `config`
pub async fn run_import(config: &ImportConfig) -> Result<RunOutcome> {
    config.validate()?;

    let client = reqwest::Client::new();
    let result = match fetch_archive(&client, &config.url, &config.archive_path).await {
        Ok(FetchOutcome::Unavailable(status)) => {
            warn!(status = status.as_u16(), url = %config.url, "Archive not available");
            return Ok(RunOutcome::Unavailable(status));
        },
        Ok(FetchOutcome::Saved { path, bytes }) => {
            info!(path = %path.display(), bytes, "Archive downloaded");
            import_archive(config).await
        },
        // A download that failed part way may have left a partial archive
        Err(e) => Err(e),
    };

    if !config.keep_archive {
        remove_archive(&config.archive_path);
    }

    result.map(RunOutcome::Imported)
}

async fn import_archive(config: &ImportConfig) -> Result<LoadStats> {
    let connect_options = config.database.connect_options()?;

    info!(path = %config.archive_path.display(), "Unzipping archive");
    let mut archive = CompanyArchive::open(&config.archive_path)?;
    let entry = archive.first_entry()?;

    info!("Reading records");
    let decoder = RecordDecoder::new(entry)?;

    let tables = TableNames::new(&config.table, &config.audit_table);
    let mut store = MySqlStore::connect(&connect_options, tables).await?;

    let stats = import_records(&mut store, decoder, LoadOptions::from(config)).await?;

    if let Err(e) = store.close().await {
        warn!(error = %e, "Failed to close database connection cleanly");
    }

    Ok(stats)
}

fn remove_archive(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => info!(path = %path.display(), "Removed temp archive"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {},
        Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove temp archive"),
    }
}
