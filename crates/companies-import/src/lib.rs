//! Company Data Importer
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Downloads the daily basic company data archive and replaces the
//! `companies` table with its contents.
//!
//! # Pipeline
//!
//! - **fetch**: download the archive to a temp file
//! - **archive**: stream the first entry of the zip
//! - **decode**: parse the CSV into typed [`decode::CompanyRecord`]s
//! - **swap**: rotate in an empty clone of the destination table
//! - **load**: insert every record, then append a `data_import` row
//!
//! # Example
//!
//! ```no_run
//! use chrono::Utc;
//! use companies_import::config::{DatabaseConfig, ImportConfig};
//! use companies_import::pipeline::{run_import, RunOutcome};
//!
//! #[tokio::main]
//! async fn main() -> companies_import::Result<()> {
//!     let database = DatabaseConfig {
//!         user: "importer".to_string(),
//!         host: "localhost:3306".to_string(),
//!         name: "companies_house".to_string(),
//!         ..Default::default()
//!     };
//!     let config = ImportConfig::new(database, Utc::now().date_naive());
//!
//!     if let RunOutcome::Imported(stats) = run_import(&config).await? {
//!         println!("imported {} rows", stats.rows_inserted);
//!     }
//!     Ok(())
//! }
//! ```

pub mod archive;
pub mod config;
pub mod decode;
pub mod error;
pub mod fetch;
pub mod load;
pub mod pipeline;
pub mod schema;
pub mod store;
pub mod swap;

pub use error::{ImportError, Result};
