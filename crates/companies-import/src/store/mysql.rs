//! MySQL implementation of [`CompanyStore`]

use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::{Connection, Executor};
use tracing::{debug, info};

use super::{CompanyStore, TableNames};
use crate::decode::{CoercedField, CompanyRecord};
use crate::error::{ImportError, Result};
use crate::schema::{create_companies_sql, create_data_import_sql, insert_company_sql};

/// Store backed by a single, exclusively owned MySQL connection
///
/// No statement is wrapped in a transaction; each insert is visible to
/// other readers as soon as it returns.
pub struct MySqlStore {
    conn: MySqlConnection,
    tables: TableNames,
    insert_sql: String,
}

impl MySqlStore {
    /// Open the connection
    pub async fn connect(options: &MySqlConnectOptions, tables: TableNames) -> Result<Self> {
        let conn = MySqlConnection::connect_with(options)
            .await
            .map_err(ImportError::Connect)?;

        info!(table = %tables.current, "Connected to database");

        Ok(Self::from_connection(conn, tables))
    }

    /// Wrap an already open connection
    pub fn from_connection(conn: MySqlConnection, tables: TableNames) -> Self {
        let insert_sql = insert_company_sql(&tables.current);
        Self {
            conn,
            tables,
            insert_sql,
        }
    }

    pub fn tables(&self) -> &TableNames {
        &self.tables
    }

    /// Close the connection cleanly
    pub async fn close(self) -> std::result::Result<(), sqlx::Error> {
        self.conn.close().await
    }

    async fn execute_ddl(&mut self, sql: &str) -> std::result::Result<(), sqlx::Error> {
        debug!(sql, "Executing statement");
        self.conn.execute(sql).await?;
        Ok(())
    }
}

#[async_trait]
impl CompanyStore for MySqlStore {
    async fn create_destination_if_missing(&mut self) -> std::result::Result<(), sqlx::Error> {
        let sql = create_companies_sql(&self.tables.current);
        self.execute_ddl(&sql).await
    }

    async fn create_staging_table(&mut self) -> std::result::Result<(), sqlx::Error> {
        let sql = format!(
            "CREATE TABLE {} LIKE {}",
            self.tables.staging, self.tables.current
        );
        self.execute_ddl(&sql).await
    }

    async fn rename_tables(&mut self) -> std::result::Result<(), sqlx::Error> {
        let sql = format!(
            "RENAME TABLE {current} TO {retired}, {staging} TO {current}",
            current = self.tables.current,
            retired = self.tables.retired,
            staging = self.tables.staging,
        );
        self.execute_ddl(&sql).await
    }

    async fn drop_retired_table(&mut self) -> std::result::Result<(), sqlx::Error> {
        let sql = format!("DROP TABLE {}", self.tables.retired);
        self.execute_ddl(&sql).await
    }

    async fn ensure_audit_table(&mut self) -> std::result::Result<(), sqlx::Error> {
        let sql = create_data_import_sql(&self.tables.audit);
        self.execute_ddl(&sql).await
    }

    async fn insert_company(
        &mut self,
        record: &CompanyRecord,
    ) -> std::result::Result<(), sqlx::Error> {
        let mut query = sqlx::query(&self.insert_sql);

        for field in &record.fields {
            query = match field {
                CoercedField::Text(value) => query.bind(value.as_str()),
                CoercedField::Date(value) => query.bind(*value),
                CoercedField::Integer(value) => query.bind(*value),
            };
        }

        query.execute(&mut self.conn).await?;
        Ok(())
    }

    async fn insert_audit(&mut self, records: u64) -> std::result::Result<(), sqlx::Error> {
        let sql = format!(
            "INSERT INTO {} (created, records) VALUES (NOW(), ?)",
            self.tables.audit
        );

        sqlx::query(&sql)
            .bind(records)
            .execute(&mut self.conn)
            .await?;

        Ok(())
    }
}
