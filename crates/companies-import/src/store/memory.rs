//! In-memory [`CompanyStore`] for pipeline tests

use std::collections::BTreeMap;

use async_trait::async_trait;

use super::{CompanyStore, TableNames};
use crate::decode::CompanyRecord;
use crate::error::SwapStep;
use crate::schema::COMPANY_COLUMNS;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct MemoryTable {
    pub columns: Vec<&'static str>,
    pub rows: Vec<CompanyRecord>,
}

/// Tables keyed by name, with failure injection per statement
#[derive(Debug, Default)]
pub(crate) struct MemoryStore {
    pub names: TableNames,
    pub tables: BTreeMap<String, MemoryTable>,
    pub audit_rows: Option<Vec<u64>>,
    /// Fail the n-th company insert (1-based)
    pub fail_insert_at: Option<u64>,
    pub fail_step: Option<SwapStep>,
    pub fail_audit: bool,
    inserts: u64,
}

fn failure(what: &str) -> sqlx::Error {
    sqlx::Error::Protocol(format!("injected failure: {what}"))
}

impl MemoryStore {
    /// Store whose destination table already holds `rows`
    pub fn with_existing(rows: Vec<CompanyRecord>) -> Self {
        let mut store = Self::default();
        let table = MemoryTable {
            columns: COMPANY_COLUMNS.iter().map(|c| c.name).collect(),
            rows,
        };
        store.tables.insert(store.names.current.clone(), table);
        store
    }

    pub fn current(&self) -> Option<&MemoryTable> {
        self.tables.get(&self.names.current)
    }

    fn check(&self, step: SwapStep) -> Result<(), sqlx::Error> {
        if self.fail_step == Some(step) {
            return Err(failure(step.as_str()));
        }
        Ok(())
    }
}

#[async_trait]
impl CompanyStore for MemoryStore {
    async fn create_destination_if_missing(&mut self) -> Result<(), sqlx::Error> {
        self.check(SwapStep::CreateDestination)?;
        self.tables
            .entry(self.names.current.clone())
            .or_insert_with(|| MemoryTable {
                columns: COMPANY_COLUMNS.iter().map(|c| c.name).collect(),
                rows: Vec::new(),
            });
        Ok(())
    }

    async fn create_staging_table(&mut self) -> Result<(), sqlx::Error> {
        self.check(SwapStep::CreateStaging)?;
        if self.tables.contains_key(&self.names.staging) {
            return Err(failure("staging table already exists"));
        }
        let source = self
            .current()
            .ok_or_else(|| failure("destination table does not exist"))?;
        let staging = MemoryTable {
            columns: source.columns.clone(),
            rows: Vec::new(),
        };
        self.tables.insert(self.names.staging.clone(), staging);
        Ok(())
    }

    async fn rename_tables(&mut self) -> Result<(), sqlx::Error> {
        self.check(SwapStep::Rename)?;
        let current = self
            .tables
            .remove(&self.names.current)
            .ok_or_else(|| failure("destination table does not exist"))?;
        let Some(staging) = self.tables.remove(&self.names.staging) else {
            self.tables.insert(self.names.current.clone(), current);
            return Err(failure("staging table does not exist"));
        };
        self.tables.insert(self.names.retired.clone(), current);
        self.tables.insert(self.names.current.clone(), staging);
        Ok(())
    }

    async fn drop_retired_table(&mut self) -> Result<(), sqlx::Error> {
        self.check(SwapStep::DropRetired)?;
        self.tables
            .remove(&self.names.retired)
            .map(|_| ())
            .ok_or_else(|| failure("retired table does not exist"))
    }

    async fn ensure_audit_table(&mut self) -> Result<(), sqlx::Error> {
        self.check(SwapStep::EnsureAuditTable)?;
        self.audit_rows.get_or_insert_with(Vec::new);
        Ok(())
    }

    async fn insert_company(&mut self, record: &CompanyRecord) -> Result<(), sqlx::Error> {
        self.inserts += 1;
        if self.fail_insert_at == Some(self.inserts) {
            return Err(failure("duplicate key"));
        }
        let table = self
            .tables
            .get_mut(&self.names.current)
            .ok_or_else(|| failure("destination table does not exist"))?;
        table.rows.push(record.clone());
        Ok(())
    }

    async fn insert_audit(&mut self, records: u64) -> Result<(), sqlx::Error> {
        if self.fail_audit {
            return Err(failure("audit insert"));
        }
        self.audit_rows
            .as_mut()
            .ok_or_else(|| failure("audit table does not exist"))?
            .push(records);
        Ok(())
    }
}
