//! Destination store
//!
//! [`CompanyStore`] exposes one method per database statement the import
//! issues. The pipeline decides the order and maps failures to error kinds;
//! implementations only execute.

pub mod mysql;

#[cfg(test)]
pub(crate) mod memory;

use async_trait::async_trait;

use crate::decode::CompanyRecord;
use crate::schema::{COMPANIES_TABLE, DATA_IMPORT_TABLE};

pub use mysql::MySqlStore;

/// Names of the tables touched by one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableNames {
    /// Canonical destination table
    pub current: String,
    /// Empty clone created before the rename
    pub staging: String,
    /// Holding name for the previous table until it is dropped
    pub retired: String,
    /// Audit table
    pub audit: String,
}

impl TableNames {
    pub fn new(table: &str, audit: &str) -> Self {
        Self {
            current: table.to_string(),
            staging: format!("new_{table}"),
            retired: format!("old_{table}"),
            audit: audit.to_string(),
        }
    }
}

impl Default for TableNames {
    fn default() -> Self {
        Self::new(COMPANIES_TABLE, DATA_IMPORT_TABLE)
    }
}

/// Statements the import runs against the destination database
#[async_trait]
pub trait CompanyStore: Send {
    /// Create the destination table from the column layout if it is missing
    async fn create_destination_if_missing(&mut self) -> Result<(), sqlx::Error>;

    /// Create the staging table as an empty clone of the destination
    async fn create_staging_table(&mut self) -> Result<(), sqlx::Error>;

    /// Move destination to the retired name and staging to the destination
    /// name in one statement
    async fn rename_tables(&mut self) -> Result<(), sqlx::Error>;

    /// Drop the retired table
    async fn drop_retired_table(&mut self) -> Result<(), sqlx::Error>;

    /// Create the audit table if it is missing
    async fn ensure_audit_table(&mut self) -> Result<(), sqlx::Error>;

    /// Insert one company row into the destination table
    async fn insert_company(&mut self, record: &CompanyRecord) -> Result<(), sqlx::Error>;

    /// Append one audit row stamped with the current time
    async fn insert_audit(&mut self, records: u64) -> Result<(), sqlx::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_names() {
        let names = TableNames::default();
        assert_eq!(names.current, "companies");
        assert_eq!(names.staging, "new_companies");
        assert_eq!(names.retired, "old_companies");
        assert_eq!(names.audit, "data_import");
    }
}
