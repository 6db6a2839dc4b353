//! Import configuration

use std::path::PathBuf;

use chrono::{Days, NaiveDate};
use sqlx::mysql::MySqlConnectOptions;

use crate::error::{ImportError, Result};
use crate::schema::{COMPANIES_TABLE, DATA_IMPORT_TABLE};

// ============================================================================
// Defaults
// ============================================================================

/// Host serving the daily company data archives.
pub const DEFAULT_ARCHIVE_HOST: &str = "download.companieshouse.gov.uk";

/// File name of the temp archive, placed in the system temp dir.
pub const DEFAULT_ARCHIVE_FILE_NAME: &str = "company_data.zip";

/// Rows between two progress notices.
pub const DEFAULT_PROGRESS_EVERY: u64 = 1000;

/// Default MySQL port, used when `host` carries none.
pub const DEFAULT_MYSQL_PORT: u16 = 3306;

/// URL of the archive published for `date`
pub fn archive_url_for(date: NaiveDate) -> String {
    format!(
        "http://{}/BasicCompanyDataAsOneFile-{}.zip",
        DEFAULT_ARCHIVE_HOST,
        date.format("%Y-%m-%d")
    )
}

/// URL of the archive published the day before `today` (UTC)
pub fn default_archive_url(today: NaiveDate) -> String {
    let yesterday = today.checked_sub_days(Days::new(1)).unwrap_or(today);
    archive_url_for(yesterday)
}

/// Default temp archive location
pub fn default_archive_path() -> PathBuf {
    std::env::temp_dir().join(DEFAULT_ARCHIVE_FILE_NAME)
}

/// Where the database lives
#[derive(Debug, Clone, Default)]
pub struct DatabaseConfig {
    pub user: String,
    pub password: String,
    /// `host` or `host:port`
    pub host: String,
    pub name: String,
    /// Full `mysql://` URL; takes precedence over the discrete fields
    pub url: Option<String>,
}

impl DatabaseConfig {
    /// Build sqlx connection options from the configured fields
    pub fn connect_options(&self) -> Result<MySqlConnectOptions> {
        if let Some(url) = &self.url {
            return url
                .parse::<MySqlConnectOptions>()
                .map_err(|e| ImportError::config(format!("invalid database URL: {e}")));
        }

        let (host, port) = split_host_port(&self.host)?;

        let mut options = MySqlConnectOptions::new()
            .host(host)
            .port(port)
            .username(&self.user);

        if !self.password.is_empty() {
            options = options.password(&self.password);
        }
        if !self.name.is_empty() {
            options = options.database(&self.name);
        }

        Ok(options)
    }

    fn is_configured(&self) -> bool {
        self.url.is_some() || !self.host.is_empty() || !self.name.is_empty()
    }
}

fn split_host_port(host: &str) -> Result<(&str, u16)> {
    let host = if host.is_empty() { "localhost" } else { host };

    match host.rsplit_once(':') {
        Some((name, port)) => {
            let port = port
                .parse()
                .map_err(|_| ImportError::config(format!("invalid port in host '{host}'")))?;
            Ok((name, port))
        },
        None => Ok((host, DEFAULT_MYSQL_PORT)),
    }
}

/// Settings for one import run
#[derive(Debug, Clone)]
pub struct ImportConfig {
    /// Archive to download
    pub url: String,
    /// Temp file the archive is written to, overwritten each run
    pub archive_path: PathBuf,
    pub database: DatabaseConfig,
    /// Destination table, replaced wholesale
    pub table: String,
    /// Audit table, one row appended per run
    pub audit_table: String,
    pub progress_every: u64,
    /// Create the destination table from the column layout if missing
    pub create_table: bool,
    /// Leave the temp archive on disk after the run
    pub keep_archive: bool,
}

impl ImportConfig {
    /// Config with defaults for everything but the database
    pub fn new(database: DatabaseConfig, today: NaiveDate) -> Self {
        Self {
            url: default_archive_url(today),
            archive_path: default_archive_path(),
            database,
            table: COMPANIES_TABLE.to_string(),
            audit_table: DATA_IMPORT_TABLE.to_string(),
            progress_every: DEFAULT_PROGRESS_EVERY,
            create_table: false,
            keep_archive: false,
        }
    }

    /// Override the archive URL
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Override the temp archive path
    pub fn with_archive_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.archive_path = path.into();
        self
    }

    /// Set the progress interval
    pub fn with_progress_every(mut self, rows: u64) -> Self {
        self.progress_every = rows;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        reqwest::Url::parse(&self.url)
            .map_err(|e| ImportError::config(format!("invalid archive URL '{}': {e}", self.url)))?;

        if self.progress_every == 0 {
            return Err(ImportError::config("progress interval must be greater than 0"));
        }

        if self.table.is_empty() || self.audit_table.is_empty() {
            return Err(ImportError::config("table names cannot be empty"));
        }

        if !self.database.is_configured() {
            tracing::warn!("No database host, name or URL configured; using localhost defaults");
        }

        Ok(())
    }
}
