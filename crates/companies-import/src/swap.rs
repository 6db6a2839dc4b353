//! Destination table rotation
//!
//! Replaces the destination table with an empty clone of itself before any
//! row is written:
//!
//! 1. `CREATE TABLE new_companies LIKE companies`
//! 2. `RENAME TABLE companies TO old_companies, new_companies TO companies`
//! 3. `DROP TABLE old_companies`
//!
//! Step 2 moves both names in one statement, so `companies` exists at every
//! point. A failed step is not compensated; the tables stay as the last
//! successful step left them.

use std::future::Future;

use tracing::info;

use crate::error::{ImportError, Result, SwapStep};
use crate::store::CompanyStore;

async fn run_step<F>(step: SwapStep, statement: F) -> Result<()>
where
    F: Future<Output = std::result::Result<(), sqlx::Error>>,
{
    statement
        .await
        .map_err(|source| ImportError::Swap { step, source })?;
    info!(step = %step, "Table step complete");
    Ok(())
}

/// Create the destination table if it does not exist yet
pub async fn create_destination<S>(store: &mut S) -> Result<()>
where
    S: CompanyStore + ?Sized,
{
    run_step(SwapStep::CreateDestination, store.create_destination_if_missing()).await
}

/// Rotate in an empty destination table
pub async fn swap_tables<S>(store: &mut S) -> Result<()>
where
    S: CompanyStore + ?Sized,
{
    run_step(SwapStep::CreateStaging, store.create_staging_table()).await?;
    run_step(SwapStep::Rename, store.rename_tables()).await?;
    run_step(SwapStep::DropRetired, store.drop_retired_table()).await
}

/// Create the audit table if it does not exist yet
pub async fn ensure_audit_table<S>(store: &mut S) -> Result<()>
where
    S: CompanyStore + ?Sized,
{
    run_step(SwapStep::EnsureAuditTable, store.ensure_audit_table()).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::decode::{CoercedField, CompanyRecord};
    use crate::store::memory::MemoryStore;

    fn old_row() -> CompanyRecord {
        CompanyRecord {
            line: 2,
            fields: vec![CoercedField::Text("OLD LTD".to_string())],
        }
    }

    #[tokio::test]
    async fn test_swap_leaves_empty_table_with_same_columns() {
        let mut store = MemoryStore::with_existing(vec![old_row(), old_row()]);
        let columns_before = store.current().unwrap().columns.clone();

        swap_tables(&mut store).await.unwrap();

        let current = store.current().unwrap();
        assert!(current.rows.is_empty());
        assert_eq!(current.columns, columns_before);
        assert_eq!(store.tables.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_create_keeps_old_data() {
        let mut store = MemoryStore::with_existing(vec![old_row()]);
        store.fail_step = Some(SwapStep::CreateStaging);

        let err = swap_tables(&mut store).await.unwrap_err();

        assert!(matches!(
            err,
            ImportError::Swap {
                step: SwapStep::CreateStaging,
                ..
            }
        ));
        assert_eq!(store.current().unwrap().rows.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_rename_is_not_compensated() {
        let mut store = MemoryStore::with_existing(vec![old_row()]);
        store.fail_step = Some(SwapStep::Rename);

        let err = swap_tables(&mut store).await.unwrap_err();

        assert!(matches!(
            err,
            ImportError::Swap {
                step: SwapStep::Rename,
                ..
            }
        ));
        assert_eq!(store.current().unwrap().rows.len(), 1);
        assert!(store.tables.contains_key("new_companies"));
    }

    #[tokio::test]
    async fn test_failed_drop_leaves_swapped_table() {
        let mut store = MemoryStore::with_existing(vec![old_row()]);
        store.fail_step = Some(SwapStep::DropRetired);

        assert!(swap_tables(&mut store).await.is_err());
        assert!(store.current().unwrap().rows.is_empty());
        assert_eq!(store.tables["old_companies"].rows.len(), 1);
    }

    #[tokio::test]
    async fn test_swap_without_destination_fails() {
        let mut store = MemoryStore::default();
        let err = swap_tables(&mut store).await.unwrap_err();
        assert!(matches!(
            err,
            ImportError::Swap {
                step: SwapStep::CreateStaging,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_create_destination_bootstraps_empty_database() {
        let mut store = MemoryStore::default();
        create_destination(&mut store).await.unwrap();
        swap_tables(&mut store).await.unwrap();
        assert_eq!(store.current().unwrap().columns.len(), 55);
    }

    #[tokio::test]
    async fn test_ensure_audit_table_is_idempotent() {
        let mut store = MemoryStore::default();
        ensure_audit_table(&mut store).await.unwrap();
        store.audit_rows.as_mut().unwrap().push(3);
        ensure_audit_table(&mut store).await.unwrap();
        assert_eq!(store.audit_rows, Some(vec![3]));
    }
}
