//! Core error types for dayplan-core.
//!
//! This module defines the error hierarchy using thiserror. Planning runs
//! surface a single [`PlanError`]; storage and configuration have their own
//! leaf types that the CLI reports directly.

use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Stored row could not be decoded
    #[error("Corrupt row in '{table}': {message}")]
    CorruptRow { table: &'static str, message: String },

    /// Database is locked
    #[error("Database is locked")]
    Locked,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    /// Data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(#[from] std::io::Error),
}

/// Validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Invalid time range
    #[error("Invalid time range: end_time ({end}) must be greater than start_time ({start})")]
    InvalidTimeRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    /// Block shorter than the minimum block length
    #[error("Block '{title}' lasts {minutes} minutes, minimum is {min}")]
    BlockTooShort { title: String, minutes: i64, min: i64 },

    /// Two blocks of the same date overlap
    #[error("Blocks '{first}' and '{second}' overlap")]
    Overlap { first: String, second: String },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Failure of the delete-then-insert replace of one day.
#[derive(Error, Debug)]
pub enum ReplaceError {
    /// The transaction was rolled back; the previous schedule is intact.
    #[error("{0}")]
    RolledBack(#[from] DatabaseError),

    /// The transaction failed and the rollback failed too.
    #[error("replace failed ({cause}) and rollback failed ({rollback})")]
    Partial { cause: String, rollback: String },
}

/// Error surfaced by a planning run.
#[derive(Error, Debug)]
pub enum PlanError {
    /// Malformed request, rejected before any placement work.
    #[error("invalid planning request: {0}")]
    Input(#[from] ValidationError),

    /// Reading backlog, events or history failed.
    #[error("failed to read {what}: {source}")]
    Read {
        what: &'static str,
        #[source]
        source: DatabaseError,
    },

    /// Replacing the day's blocks failed; nothing was changed.
    #[error("failed to replace schedule for {date}: {source}")]
    Write {
        date: NaiveDate,
        #[source]
        source: DatabaseError,
    },

    /// Replacing the day's blocks failed midway and may have left the day empty.
    #[error("replace partially failed for {date}: {message}")]
    ReplacePartial { date: NaiveDate, message: String },
}

impl PlanError {
    pub(crate) fn from_replace(date: NaiveDate, err: ReplaceError) -> Self {
        match err {
            ReplaceError::RolledBack(source) => PlanError::Write { date, source },
            partial @ ReplaceError::Partial { .. } => PlanError::ReplacePartial {
                date,
                message: partial.to_string(),
            },
        }
    }
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(code, _msg) => {
                if code.code == rusqlite::ErrorCode::DatabaseLocked
                    || code.code == rusqlite::ErrorCode::DatabaseBusy
                {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_replace_maps_to_distinct_plan_error() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 3).unwrap();
        let err = PlanError::from_replace(
            date,
            ReplaceError::Partial {
                cause: "disk full".into(),
                rollback: "io".into(),
            },
        );
        assert!(matches!(err, PlanError::ReplacePartial { .. }));
        assert!(err.to_string().contains("disk full"));
    }

    #[test]
    fn rolled_back_replace_maps_to_write_error() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 3).unwrap();
        let err = PlanError::from_replace(date, ReplaceError::RolledBack(DatabaseError::Locked));
        assert!(matches!(err, PlanError::Write { .. }));
        assert_eq!(
            err.to_string(),
            "failed to replace schedule for 2026-03-03: Database is locked"
        );
    }
}
