mod config;
pub mod migrations;
pub mod schedule_db;

pub use config::{ChainStep, Config, DayConfig, FixedEntry, FixedEntryTable, OverlayConfig, RotationConfig, Window};
pub use schedule_db::ScheduleDb;

use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};

use crate::error::{DatabaseError, ReplaceError};
use crate::schedule::{Block, FixedEvent, HistoryEntry, WorkItem};

/// Returns the dayplan data directory, creating it if needed.
///
/// `DAYPLAN_DATA_DIR` overrides the location outright. Otherwise this is
/// `~/.config/dayplan[-dev]/`, with `DAYPLAN_ENV=dev` selecting the
/// development directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> std::io::Result<PathBuf> {
    let dir = match std::env::var_os("DAYPLAN_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("DAYPLAN_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("dayplan-dev")
            } else {
                base_dir.join("dayplan")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Persistence collaborator of a planning run.
///
/// Reads are snapshots; the engine never mutates what it reads.
pub trait PlanStore {
    /// Work items whose status is open.
    fn open_work_items(&self) -> Result<Vec<WorkItem>, DatabaseError>;

    /// Calendar events starting in `[start, end)`.
    fn fixed_events_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<FixedEvent>, DatabaseError>;

    /// History for the `days` dates before `date`, newest first.
    fn history_before(&self, date: NaiveDate, days: u32) -> Result<Vec<HistoryEntry>, DatabaseError>;

    /// Deletes blocks starting in `[start, end)` and inserts `blocks`, atomically.
    ///
    /// Returns the number of inserted blocks.
    fn replace_blocks(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        blocks: &[Block],
    ) -> Result<usize, ReplaceError>;
}
