//! Row loading and run accounting

use tracing::{error, info};

use crate::decode::CompanyRecord;
use crate::error::{ImportError, Result};
use crate::store::CompanyStore;

/// Counters for one load
///
/// `rows_read` counts every record taken from the decoder, `rows_inserted`
/// only those the store accepted. They differ only when a load aborts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub rows_read: u64,
    pub rows_inserted: u64,
}

fn progress_due(rows_read: u64, progress_every: u64) -> bool {
    progress_every > 0 && rows_read % progress_every == 0
}

/// Insert every record into the destination table, one at a time
///
/// Records are pulled from `records` one by one and never buffered. The
/// first decode or insert failure aborts the load; rows inserted before it
/// stay in the table.
pub async fn load_records<S, I>(store: &mut S, records: I, progress_every: u64) -> Result<LoadStats>
where
    S: CompanyStore + ?Sized,
    I: IntoIterator<Item = Result<CompanyRecord>>,
{
    let mut stats = LoadStats::default();

    for record in records {
        let record = record?;
        stats.rows_read += 1;

        if progress_due(stats.rows_read, progress_every) {
            info!(rows_read = stats.rows_read, "Progress: {}", stats.rows_read);
        }

        if let Err(source) = store.insert_company(&record).await {
            error!(
                line = record.line,
                company_number = record.company_number().unwrap_or_default(),
                rows_inserted = stats.rows_inserted,
                error = %source,
                "Insert failed, aborting load"
            );
            return Err(ImportError::Insert {
                line: record.line,
                source,
            });
        }
        stats.rows_inserted += 1;
    }

    info!(
        rows_read = stats.rows_read,
        rows_inserted = stats.rows_inserted,
        "Load complete"
    );

    Ok(stats)
}

/// Append the audit row for a finished load
pub async fn record_run<S>(store: &mut S, stats: &LoadStats) -> Result<()>
where
    S: CompanyStore + ?Sized,
{
    store
        .insert_audit(stats.rows_read)
        .await
        .map_err(ImportError::Audit)?;

    info!(records = stats.rows_read, "Recorded import run");
    Ok(())
}
