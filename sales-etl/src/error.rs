//! Error types for the load
//!
//! Setup, schema, load and constraint failures each get their own variant so
//! the orchestrator can decide which ones abort the run.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::schema::ColumnType;

/// Kind of integrity constraint rejected by SQLite
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    ForeignKey,
    Unique,
    NotNull,
    Check,
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstraintKind::ForeignKey => write!(f, "foreign key"),
            ConstraintKind::Unique => write!(f, "unique"),
            ConstraintKind::NotNull => write!(f, "not null"),
            ConstraintKind::Check => write!(f, "check"),
        }
    }
}

#[derive(Debug, Error)]
pub enum EtlError {
    #[error("Failed to remove database file {}: {source}", .path.display())]
    Reset {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to open database {}: {source}", .path.display())]
    Connect {
        path: PathBuf,
        #[source]
        source: sqlx::Error,
    },

    #[error("Failed to create table '{table}': {source}")]
    Schema {
        table: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Workbook not found: {}", .path.display())]
    WorkbookNotFound { path: PathBuf },

    #[error("Failed to read workbook {}: {message}", .path.display())]
    WorkbookParse { path: PathBuf, message: String },

    #[error("Workbook has no sheets: {}", .path.display())]
    EmptyWorkbook { path: PathBuf },

    #[error("{table}.{column}, sheet row {row}: cannot store {found} as {expected}")]
    CellType {
        table: String,
        column: String,
        row: usize,
        expected: ColumnType,
        found: String,
    },

    #[error("{kind} constraint failed on '{table}': {message}")]
    Constraint {
        table: String,
        kind: ConstraintKind,
        message: String,
    },

    #[error("Database error while {context}: {source}")]
    Database {
        context: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Failed to create view '{view}': {source}")]
    View {
        view: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Invalid configuration file {}: {message}", .path.display())]
    Config { path: PathBuf, message: String },
}

impl EtlError {
    /// True for a reset that failed only because there was nothing to delete
    pub fn is_missing_file(&self) -> bool {
        matches!(
            self,
            EtlError::Reset { source, .. } if source.kind() == std::io::ErrorKind::NotFound
        )
    }

    pub fn database(context: impl Into<String>, source: sqlx::Error) -> Self {
        EtlError::Database {
            context: context.into(),
            source,
        }
    }

    /// Classify a failed insert: integrity violations become `Constraint`,
    /// anything else stays a plain database error
    pub fn from_insert(table: &str, source: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &source {
            let kind = match db.kind() {
                sqlx::error::ErrorKind::ForeignKeyViolation => Some(ConstraintKind::ForeignKey),
                sqlx::error::ErrorKind::UniqueViolation => Some(ConstraintKind::Unique),
                sqlx::error::ErrorKind::NotNullViolation => Some(ConstraintKind::NotNull),
                sqlx::error::ErrorKind::CheckViolation => Some(ConstraintKind::Check),
                _ => None,
            };
            if let Some(kind) = kind {
                return EtlError::Constraint {
                    table: table.to_string(),
                    kind,
                    message: db.message().to_string(),
                };
            }
        }
        EtlError::database(format!("inserting into '{}'", table), source)
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
