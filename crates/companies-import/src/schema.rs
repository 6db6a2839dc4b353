//! Column layout of the basic company data file
//!
//! The upstream file carries a fixed, ordered set of columns. Each column is
//! declared once here together with the type its raw text is coerced into,
//! and everything else (the insert statement, the table DDL, the decoder's
//! coercion step) is derived from this table by position.

/// Semantic type of a column in the company data file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Passed through as raw text, empty string included
    Text,
    /// `DD/MM/YYYY` calendar date, null when it does not parse
    Date,
    /// Base-10 signed 32-bit integer, null when it does not parse
    Integer,
}

impl ColumnKind {
    /// MySQL column type used when bootstrapping the destination table
    pub fn sql_type(self) -> &'static str {
        match self {
            ColumnKind::Text => "VARCHAR(255) NOT NULL DEFAULT ''",
            ColumnKind::Date => "DATE NULL",
            ColumnKind::Integer => "INT NULL",
        }
    }
}

/// A named, typed column of the destination table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnKind,
}

const fn text(name: &'static str) -> Column {
    Column {
        name,
        kind: ColumnKind::Text,
    }
}

const fn date(name: &'static str) -> Column {
    Column {
        name,
        kind: ColumnKind::Date,
    }
}

const fn integer(name: &'static str) -> Column {
    Column {
        name,
        kind: ColumnKind::Integer,
    }
}

/// Destination table name
pub const COMPANIES_TABLE: &str = "companies";

/// Audit table name
pub const DATA_IMPORT_TABLE: &str = "data_import";

/// Columns of the company data file, in file order
pub const COMPANY_COLUMNS: &[Column] = &[
    text("CompanyName"),
    text("CompanyNumber"),
    text("RegAddress_CareOf"),
    text("RegAddress_POBox"),
    text("RegAddress_AddressLine1"),
    text("RegAddress_AddressLine2"),
    text("RegAddress_PostTown"),
    text("RegAddress_County"),
    text("RegAddress_Country"),
    text("RegAddress_PostCode"),
    text("CompanyCategory"),
    text("CompanyStatus"),
    text("CountryOfOrigin"),
    date("DissolutionDate"),
    date("IncorporationDate"),
    integer("Accounts_AccountRefDay"),
    integer("Accounts_AccountRefMonth"),
    date("Accounts_NextDueDate"),
    date("Accounts_LastMadeUpDate"),
    text("Accounts_AccountCategory"),
    date("Returns_NextDueDate"),
    date("Returns_LastMadeUpDate"),
    integer("Mortgages_NumMortCharges"),
    integer("Mortgages_NumMortOutstanding"),
    integer("Mortgages_NumMortPartSatisfied"),
    integer("Mortgages_NumMortSatisfied"),
    text("SICCode_SicText_1"),
    text("SICCode_SicText_2"),
    text("SICCode_SicText_3"),
    text("SICCode_SicText_4"),
    integer("LimitedPartnerships_NumGenPartners"),
    integer("LimitedPartnerships_NumLimPartners"),
    text("URI"),
    date("PreviousName_1_CONDATE"),
    text("PreviousName_1_CompanyName"),
    date("PreviousName_2_CONDATE"),
    text("PreviousName_2_CompanyName"),
    date("PreviousName_3_CONDATE"),
    text("PreviousName_3_CompanyName"),
    date("PreviousName_4_CONDATE"),
    text("PreviousName_4_CompanyName"),
    date("PreviousName_5_CONDATE"),
    text("PreviousName_5_CompanyName"),
    date("PreviousName_6_CONDATE"),
    text("PreviousName_6_CompanyName"),
    date("PreviousName_7_CONDATE"),
    text("PreviousName_7_CompanyName"),
    date("PreviousName_8_CONDATE"),
    text("PreviousName_8_CompanyName"),
    date("PreviousName_9_CONDATE"),
    text("PreviousName_9_CompanyName"),
    date("PreviousName_10_CONDATE"),
    text("PreviousName_10_CompanyName"),
    date("ConfStmtNextDueDate"),
    date("ConfStmtLastMadeUpDate"),
];

/// Parameterized insert for one company row, placeholders in column order
pub fn insert_company_sql(table: &str) -> String {
    let names = COMPANY_COLUMNS
        .iter()
        .map(|c| c.name)
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = vec!["?"; COMPANY_COLUMNS.len()].join(", ");

    format!("INSERT INTO {table} ({names}) VALUES ({placeholders})")
}

/// DDL creating the destination table when it does not exist yet
pub fn create_companies_sql(table: &str) -> String {
    let columns = COMPANY_COLUMNS
        .iter()
        .map(|c| format!("  {} {}", c.name, c.kind.sql_type()))
        .collect::<Vec<_>>()
        .join(",\n");

    format!(
        "CREATE TABLE IF NOT EXISTS {table} (\n{columns}\n) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4"
    )
}

/// DDL for the audit table
pub fn create_data_import_sql(table: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {table} (
            created datetime NOT NULL DEFAULT CURRENT_TIMESTAMP,
            records int(10) NOT NULL
        ) ENGINE=InnoDB DEFAULT CHARSET=utf8"
    )
}
