//! companies-import - replace the companies table with the latest daily data

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::{NaiveDate, Utc};
use clap::Parser;
use companies_common::logging::{init_logging, LogConfig, LogLevel};
use companies_import::config::{DatabaseConfig, ImportConfig, DEFAULT_PROGRESS_EVERY};
use companies_import::pipeline::{run_import, RunOutcome};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "companies-import")]
#[command(author, version, about = "Import the daily basic company data into MySQL")]
struct Cli {
    /// Database user
    #[arg(long, env = "COMPANIES_DB_USER", default_value = "")]
    user: String,

    /// Database password
    #[arg(long, env = "COMPANIES_DB_PASSWORD", default_value = "", hide_env_values = true)]
    password: String,

    /// Database name
    #[arg(long, env = "COMPANIES_DB_NAME", default_value = "")]
    db: String,

    /// Database host, optionally with `:port`
    #[arg(long, env = "COMPANIES_DB_HOST", default_value = "")]
    host: String,

    /// Full mysql:// URL, used instead of user/password/host/db
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: Option<String>,

    /// Download specific data instead of yesterday's archive
    #[arg(long)]
    url: Option<String>,

    /// Where the archive is written during the run
    #[arg(long, env = "COMPANIES_ARCHIVE_PATH")]
    archive_path: Option<PathBuf>,

    /// Log a progress line every N rows
    #[arg(long, default_value_t = DEFAULT_PROGRESS_EVERY)]
    progress_every: u64,

    /// Create the companies table if it does not exist
    #[arg(long)]
    create_table: bool,

    /// Keep the downloaded archive after the run
    #[arg(long)]
    keep_archive: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn into_config(self, today: NaiveDate) -> ImportConfig {
        let database = DatabaseConfig {
            user: self.user,
            password: self.password,
            host: self.host,
            name: self.db,
            url: self.database_url,
        };

        let mut config = ImportConfig::new(database, today).with_progress_every(self.progress_every);

        if let Some(url) = self.url.filter(|u| !u.is_empty()) {
            config = config.with_url(url);
        }
        if let Some(path) = self.archive_path {
            config = config.with_archive_path(path);
        }
        config.create_table = self.create_table;
        config.keep_archive = self.keep_archive;

        config
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    let log_config = LogConfig::new("companies-import").with_level(log_level);

    // Environment variables take precedence
    let log_config = match log_config.merge_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid logging settings: {e}");
            return ExitCode::from(2);
        },
    };

    let _log_guard = match init_logging(&log_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            return ExitCode::from(2);
        },
    };

    let config = cli.into_config(Utc::now().date_naive());
    info!(url = %config.url, "Starting company data import");

    match run_import(&config).await {
        Ok(RunOutcome::Imported(stats)) => {
            info!(
                rows_read = stats.rows_read,
                rows_inserted = stats.rows_inserted,
                "Import complete"
            );
            ExitCode::SUCCESS
        },
        Ok(RunOutcome::Unavailable(status)) => {
            info!(status = status.as_u16(), "Archive not published, nothing imported");
            ExitCode::SUCCESS
        },
        Err(e) => {
            error!(
                error = %e,
                exit_code = e.exit_code(),
                table_touched = e.table_touched(),
                "Import failed"
            );
            ExitCode::from(e.exit_code())
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap_or_default()
    }

    #[test]
    fn test_cli_defaults_to_yesterdays_archive() {
        let cli = Cli::try_parse_from(["companies-import", "--user", "u", "--db", "d"]);
        let config = cli.map(|c| c.into_config(today()));

        assert!(matches!(
            config,
            Ok(ref c) if c.url.ends_with("BasicCompanyDataAsOneFile-2024-03-14.zip")
        ));
    }

    #[test]
    fn test_cli_url_override() {
        let cli = Cli::try_parse_from([
            "companies-import",
            "--url",
            "http://example.com/custom.zip",
            "--progress-every",
            "50",
        ]);
        let config = cli.map(|c| c.into_config(today()));

        assert!(matches!(
            config,
            Ok(ref c) if c.url == "http://example.com/custom.zip" && c.progress_every == 50
        ));
    }

    #[test]
    fn test_empty_url_falls_back_to_default() {
        let cli = Cli::try_parse_from(["companies-import", "--url", ""]);
        let config = cli.map(|c| c.into_config(today()));

        assert!(matches!(config, Ok(ref c) if c.url.contains("2024-03-14")));
    }
}
