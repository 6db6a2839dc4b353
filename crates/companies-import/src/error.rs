//! Error types for the company data importer
//!
//! Every fatal condition of a run maps to exactly one variant. The binary
//! turns each variant into a diagnostic and a distinct process exit code.

use thiserror::Error;

/// Result type alias for import operations
pub type Result<T> = std::result::Result<T, ImportError>;

/// Step of the destination table rotation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapStep {
    /// `CREATE TABLE new LIKE current`
    CreateStaging,
    /// `RENAME TABLE current TO old, new TO current`
    Rename,
    /// `DROP TABLE old`
    DropRetired,
    /// `CREATE TABLE IF NOT EXISTS` for the audit table
    EnsureAuditTable,
    /// Bootstrap of a missing destination table
    CreateDestination,
}

impl SwapStep {
    pub fn as_str(self) -> &'static str {
        match self {
            SwapStep::CreateStaging => "create staging table",
            SwapStep::Rename => "rename tables",
            SwapStep::DropRetired => "drop retired table",
            SwapStep::EnsureAuditTable => "ensure audit table",
            SwapStep::CreateDestination => "create destination table",
        }
    }
}

impl std::fmt::Display for SwapStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fatal import failures
#[derive(Error, Debug)]
pub enum ImportError {
    /// Settings are missing or malformed
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP request for the archive failed in transport
    #[error("Failed to download archive: {0}. Check the URL and network connectivity.")]
    Transport(#[from] reqwest::Error),

    /// The downloaded body could not be written to the temp file
    #[error("Failed to write archive to '{path}': {source}. Check disk space and permissions.")]
    ArchiveWrite {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The archive could not be opened or its entry could not be read
    #[error("Failed to open archive: {0}. The download may be corrupt or not a zip file.")]
    Archive(#[from] zip::result::ZipError),

    /// The archive holds no entries at all
    #[error("Archive '{0}' contains no entries")]
    EmptyArchive(String),

    /// The header row does not have one field per declared column
    #[error("Header row has {found} fields, expected {expected}. The upstream file layout has changed.")]
    HeaderMismatch { expected: usize, found: usize },

    /// Reading a data row failed for a reason other than end of data
    #[error("Failed to read data row: {0}")]
    Decode(#[from] csv::Error),

    /// Could not connect to the database
    #[error("Failed to connect to database: {0}. Check the user, password, host and db settings.")]
    Connect(#[source] sqlx::Error),

    /// One of the table rotation statements failed
    #[error("Table swap failed at step '{step}': {source}")]
    Swap {
        step: SwapStep,
        #[source]
        source: sqlx::Error,
    },

    /// Inserting a company row failed
    #[error("Failed to insert row at line {line}: {source}")]
    Insert {
        line: u64,
        #[source]
        source: sqlx::Error,
    },

    /// Inserting the audit row failed
    #[error("Failed to record import run: {0}")]
    Audit(#[source] sqlx::Error),
}

impl ImportError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Process exit code for this failure kind
    pub fn exit_code(&self) -> u8 {
        match self {
            ImportError::Config(_) => 2,
            ImportError::Transport(_) => 3,
            ImportError::ArchiveWrite { .. } => 4,
            ImportError::Archive(_) | ImportError::EmptyArchive(_) => 5,
            ImportError::HeaderMismatch { .. } | ImportError::Decode(_) => 6,
            ImportError::Connect(_) => 7,
            ImportError::Swap { .. } => 8,
            ImportError::Insert { .. } => 9,
            ImportError::Audit(_) => 10,
        }
    }

    /// Whether the destination table may already have been changed when
    /// this error was raised
    pub fn table_touched(&self) -> bool {
        matches!(
            self,
            ImportError::Swap { .. }
                | ImportError::Insert { .. }
                | ImportError::Audit(_)
                | ImportError::Decode(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_distinct_per_kind() {
        let errors = [
            ImportError::config("x"),
            ImportError::ArchiveWrite {
                path: "/tmp/a.zip".to_string(),
                source: std::io::Error::other("disk full"),
            },
            ImportError::EmptyArchive("/tmp/a.zip".to_string()),
            ImportError::HeaderMismatch {
                expected: 55,
                found: 3,
            },
            ImportError::Connect(sqlx::Error::PoolClosed),
            ImportError::Swap {
                step: SwapStep::Rename,
                source: sqlx::Error::PoolClosed,
            },
            ImportError::Insert {
                line: 7,
                source: sqlx::Error::PoolClosed,
            },
            ImportError::Audit(sqlx::Error::PoolClosed),
        ];

        let mut codes: Vec<u8> = errors.iter().map(ImportError::exit_code).collect();
        assert!(codes.iter().all(|c| *c != 0));
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_swap_error_names_step() {
        let err = ImportError::Swap {
            step: SwapStep::DropRetired,
            source: sqlx::Error::PoolClosed,
        };
        assert!(err.to_string().contains("drop retired table"));
        assert!(err.table_touched());
    }

    #[test]
    fn test_pre_mutation_errors_leave_table_untouched() {
        assert!(!ImportError::config("bad").table_touched());
        assert!(!ImportError::EmptyArchive("a.zip".into()).table_touched());
        assert!(!ImportError::HeaderMismatch {
            expected: 55,
            found: 1
        }
        .table_touched());
    }
}
