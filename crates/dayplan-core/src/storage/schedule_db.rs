//! SQLite-based storage for the backlog, calendar, history, and planned blocks.

use std::path::Path;

use chrono::{DateTime, Duration, NaiveDate, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::migrations;
use super::{data_dir, PlanStore};
use crate::error::{DatabaseError, ReplaceError};
use crate::schedule::{
    Block, BlockDetail, BlockStatus, BlockType, FixedEvent, HistoryEntry, WorkCategory, WorkItem,
    WorkStatus,
};

// === Helper Functions ===

/// Timestamps are stored as fixed-width UTC strings so they order lexically.
fn format_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn parse_ts(table: &'static str, raw: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DatabaseError::CorruptRow {
            table,
            message: format!("bad timestamp '{raw}': {e}"),
        })
}

fn parse_date(table: &'static str, raw: &str) -> Result<NaiveDate, DatabaseError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| DatabaseError::CorruptRow {
        table,
        message: format!("bad date '{raw}': {e}"),
    })
}

fn format_work_status(status: WorkStatus) -> &'static str {
    match status {
        WorkStatus::Open => "open",
        WorkStatus::Done => "done",
    }
}

fn parse_work_status(raw: &str) -> WorkStatus {
    match raw {
        "done" => WorkStatus::Done,
        _ => WorkStatus::Open,
    }
}

struct WorkItemRow {
    id: String,
    title: String,
    description: Option<String>,
    estimated_minutes: Option<i64>,
    min_block_minutes: Option<i64>,
    category: String,
    priority: i32,
    status: String,
    created_at: String,
}

impl WorkItemRow {
    fn from_row(row: &rusqlite::Row) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            estimated_minutes: row.get(3)?,
            min_block_minutes: row.get(4)?,
            category: row.get(5)?,
            priority: row.get(6)?,
            status: row.get(7)?,
            created_at: row.get(8)?,
        })
    }

    fn into_item(self) -> Result<WorkItem, DatabaseError> {
        let category = WorkCategory::parse(&self.category).ok_or_else(|| DatabaseError::CorruptRow {
            table: "work_items",
            message: format!("unknown category '{}'", self.category),
        })?;
        Ok(WorkItem {
            id: self.id,
            title: self.title,
            description: self.description,
            estimated_minutes: self.estimated_minutes,
            min_block_minutes: self.min_block_minutes,
            category,
            priority: self.priority,
            status: parse_work_status(&self.status),
            created_at: parse_ts("work_items", &self.created_at)?,
        })
    }
}

struct BlockRow {
    id: String,
    plan_date: String,
    title: String,
    block_type: String,
    start_time: String,
    end_time: String,
    status: String,
    work_item_id: Option<String>,
    detail: Option<String>,
}

impl BlockRow {
    fn from_row(row: &rusqlite::Row) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get(0)?,
            plan_date: row.get(1)?,
            title: row.get(2)?,
            block_type: row.get(3)?,
            start_time: row.get(4)?,
            end_time: row.get(5)?,
            status: row.get(6)?,
            work_item_id: row.get(7)?,
            detail: row.get(8)?,
        })
    }

    fn into_block(self) -> Result<Block, DatabaseError> {
        let corrupt = |message: String| DatabaseError::CorruptRow {
            table: "blocks",
            message,
        };
        let block_type = BlockType::parse(&self.block_type)
            .ok_or_else(|| corrupt(format!("unknown block type '{}'", self.block_type)))?;
        let status = BlockStatus::parse(&self.status)
            .ok_or_else(|| corrupt(format!("unknown status '{}'", self.status)))?;
        let detail = match self.detail {
            Some(raw) => Some(
                serde_json::from_str::<BlockDetail>(&raw)
                    .map_err(|e| corrupt(format!("bad detail: {e}")))?,
            ),
            None => None,
        };
        Ok(Block {
            id: self.id,
            plan_date: parse_date("blocks", &self.plan_date)?,
            title: self.title,
            block_type,
            start_time: parse_ts("blocks", &self.start_time)?,
            end_time: parse_ts("blocks", &self.end_time)?,
            status,
            work_item_id: self.work_item_id,
            detail,
        })
    }
}

/// SQLite database for schedule storage.
///
/// Stores work items, calendar events, day history, and planned blocks.
pub struct ScheduleDb {
    conn: Connection,
}

impl ScheduleDb {
    /// Open the database at `<data_dir>/dayplan.db`.
    ///
    /// Creates tables if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, DatabaseError> {
        let dir = data_dir().map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
        Self::open_at(&dir.join("dayplan.db"))
    }

    /// Open (or create) a database file at `path`.
    pub fn open_at(path: &Path) -> Result<Self, DatabaseError> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), DatabaseError> {
        migrations::migrate(&self.conn).map_err(|e| DatabaseError::MigrationFailed(e.to_string()))
    }

    // === WorkItem CRUD ===

    pub fn create_work_item(&self, item: &WorkItem) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO work_items (id, title, description, estimated_minutes, min_block_minutes,
                                     category, priority, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                item.id,
                item.title,
                item.description,
                item.estimated_minutes,
                item.min_block_minutes,
                item.category.as_str(),
                item.priority,
                format_work_status(item.status),
                format_ts(&item.created_at),
            ],
        )?;
        Ok(())
    }

    pub fn get_work_item(&self, id: &str) -> Result<Option<WorkItem>, DatabaseError> {
        let row = self
            .conn
            .query_row(
                "SELECT id, title, description, estimated_minutes, min_block_minutes,
                        category, priority, status, created_at
                 FROM work_items WHERE id = ?1",
                params![id],
                WorkItemRow::from_row,
            )
            .optional()?;
        row.map(WorkItemRow::into_item).transpose()
    }

    /// All work items, optionally restricted to one status.
    pub fn list_work_items(&self, status: Option<WorkStatus>) -> Result<Vec<WorkItem>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, description, estimated_minutes, min_block_minutes,
                    category, priority, status, created_at
             FROM work_items
             WHERE ?1 IS NULL OR status = ?1
             ORDER BY priority DESC, id",
        )?;
        let rows = stmt
            .query_map(params![status.map(format_work_status)], WorkItemRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(WorkItemRow::into_item).collect()
    }

    /// Set an item's status. Returns false if no item has that id.
    pub fn set_work_item_status(&self, id: &str, status: WorkStatus) -> Result<bool, DatabaseError> {
        let changed = self.conn.execute(
            "UPDATE work_items SET status = ?1 WHERE id = ?2",
            params![format_work_status(status), id],
        )?;
        Ok(changed > 0)
    }

    // === Calendar events ===

    pub fn create_fixed_event(&self, event: &FixedEvent) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO calendar_events (id, title, start_time, end_time) VALUES (?1, ?2, ?3, ?4)",
            params![
                event.id,
                event.title,
                format_ts(&event.start_time),
                format_ts(&event.end_time),
            ],
        )?;
        Ok(())
    }

    pub fn delete_fixed_event(&self, id: &str) -> Result<bool, DatabaseError> {
        let changed = self
            .conn
            .execute("DELETE FROM calendar_events WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    // === History ===

    /// Insert or replace the history entry for its date.
    pub fn record_history(&self, entry: &HistoryEntry) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO history (date, workout, completed, lunch, dinner)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                entry.date.format("%Y-%m-%d").to_string(),
                entry.workout,
                entry.completed,
                entry.lunch,
                entry.dinner,
            ],
        )?;
        Ok(())
    }

    // === Blocks ===

    /// Blocks starting in `[start, end)`, ordered by start.
    pub fn list_blocks(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Block>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, plan_date, title, block_type, start_time, end_time, status, work_item_id, detail
             FROM blocks
             WHERE start_time >= ?1 AND start_time < ?2
             ORDER BY start_time",
        )?;
        let rows = stmt
            .query_map(params![format_ts(&start), format_ts(&end)], BlockRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(BlockRow::into_block).collect()
    }

    fn insert_block(&self, block: &Block) -> Result<(), DatabaseError> {
        let detail = block
            .detail
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
        self.conn.execute(
            "INSERT INTO blocks (id, plan_date, title, block_type, start_time, end_time,
                                 status, work_item_id, detail)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                block.id,
                block.plan_date.format("%Y-%m-%d").to_string(),
                block.title,
                block.block_type.as_str(),
                format_ts(&block.start_time),
                format_ts(&block.end_time),
                block.status.as_str(),
                block.work_item_id,
                detail,
            ],
        )?;
        Ok(())
    }
}

impl PlanStore for ScheduleDb {
    fn open_work_items(&self) -> Result<Vec<WorkItem>, DatabaseError> {
        self.list_work_items(Some(WorkStatus::Open))
    }

    fn fixed_events_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<FixedEvent>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, start_time, end_time FROM calendar_events
             WHERE start_time >= ?1 AND start_time < ?2
             ORDER BY start_time, id",
        )?;
        let rows = stmt
            .query_map(params![format_ts(&start), format_ts(&end)], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter()
            .map(|(id, title, start_time, end_time)| {
                Ok(FixedEvent {
                    id,
                    title,
                    start_time: parse_ts("calendar_events", &start_time)?,
                    end_time: parse_ts("calendar_events", &end_time)?,
                })
            })
            .collect()
    }

    fn history_before(&self, date: NaiveDate, days: u32) -> Result<Vec<HistoryEntry>, DatabaseError> {
        let earliest = date - Duration::days(i64::from(days));
        let mut stmt = self.conn.prepare(
            "SELECT date, workout, completed, lunch, dinner FROM history
             WHERE date >= ?1 AND date < ?2
             ORDER BY date DESC",
        )?;
        let rows = stmt
            .query_map(
                params![
                    earliest.format("%Y-%m-%d").to_string(),
                    date.format("%Y-%m-%d").to_string()
                ],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, Option<String>>(1)?,
                        row.get::<_, bool>(2)?,
                        row.get::<_, Option<String>>(3)?,
                        row.get::<_, Option<String>>(4)?,
                    ))
                },
            )?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter()
            .map(|(date, workout, completed, lunch, dinner)| {
                Ok(HistoryEntry {
                    date: parse_date("history", &date)?,
                    workout,
                    completed,
                    lunch,
                    dinner,
                })
            })
            .collect()
    }

    fn replace_blocks(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        blocks: &[Block],
    ) -> Result<usize, ReplaceError> {
        self.conn
            .execute_batch("BEGIN IMMEDIATE TRANSACTION;")
            .map_err(DatabaseError::from)?;
        let result: Result<usize, DatabaseError> = (|| {
            let deleted = self.conn.execute(
                "DELETE FROM blocks WHERE start_time >= ?1 AND start_time < ?2",
                params![format_ts(&start), format_ts(&end)],
            )?;
            tracing::debug!(deleted, "cleared previous blocks");
            for block in blocks {
                self.insert_block(block)?;
            }
            self.conn.execute_batch("COMMIT;")?;
            Ok(blocks.len())
        })();
        match result {
            Ok(inserted) => Ok(inserted),
            Err(err) => match self.conn.execute_batch("ROLLBACK;") {
                Ok(()) => Err(ReplaceError::RolledBack(err)),
                Err(rollback) => Err(ReplaceError::Partial {
                    cause: err.to_string(),
                    rollback: rollback.to_string(),
                }),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, 7, h, m, 0).unwrap()
    }

    fn block(id: &str, start: DateTime<Utc>, minutes: i64) -> Block {
        Block {
            id: id.to_string(),
            plan_date: start.date_naive(),
            title: id.to_string(),
            block_type: BlockType::Task,
            start_time: start,
            end_time: start + Duration::minutes(minutes),
            status: BlockStatus::Planned,
            work_item_id: None,
            detail: Some(BlockDetail::Meal {
                label: "Soup".into(),
            }),
        }
    }

    #[test]
    fn work_item_round_trip() {
        let db = ScheduleDb::open_in_memory().unwrap();
        let mut item = WorkItem::new("Quarterly report", WorkCategory::Business);
        item.estimated_minutes = Some(90);
        item.priority = 3;
        db.create_work_item(&item).unwrap();

        let loaded = db.get_work_item(&item.id).unwrap().unwrap();
        assert_eq!(loaded.title, "Quarterly report");
        assert_eq!(loaded.estimated_minutes, Some(90));
        assert_eq!(loaded.category, WorkCategory::Business);
    }

    #[test]
    fn open_work_items_excludes_done() {
        let db = ScheduleDb::open_in_memory().unwrap();
        let open = WorkItem::new("Open", WorkCategory::Personal);
        let done = WorkItem::new("Done", WorkCategory::Personal);
        db.create_work_item(&open).unwrap();
        db.create_work_item(&done).unwrap();
        assert!(db.set_work_item_status(&done.id, WorkStatus::Done).unwrap());
        assert!(!db.set_work_item_status("missing", WorkStatus::Done).unwrap());

        let items = db.open_work_items().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, open.id);
        assert_eq!(db.list_work_items(None).unwrap().len(), 2);
    }

    #[test]
    fn fixed_events_are_filtered_by_start() {
        let db = ScheduleDb::open_in_memory().unwrap();
        db.create_fixed_event(&FixedEvent::new("Before", ts(6, 0), ts(7, 0))).unwrap();
        db.create_fixed_event(&FixedEvent::new("Inside", ts(9, 0), ts(10, 0))).unwrap();
        db.create_fixed_event(&FixedEvent::new("At end", ts(12, 0), ts(13, 0))).unwrap();

        let events = db.fixed_events_between(ts(8, 0), ts(12, 0)).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].title, "Inside");
        assert_eq!(events[0].start_time, ts(9, 0));
    }

    #[test]
    fn history_is_newest_first_and_bounded() {
        let db = ScheduleDb::open_in_memory().unwrap();
        let d = |day| NaiveDate::from_ymd_opt(2026, 4, day).unwrap();
        for (day, workout) in [(1, "Push"), (5, "Pull"), (6, "Legs"), (7, "Cardio")] {
            db.record_history(&HistoryEntry {
                date: d(day),
                workout: Some(workout.into()),
                completed: true,
                lunch: None,
                dinner: None,
            })
            .unwrap();
        }

        let history = db.history_before(d(7), 3).unwrap();
        let workouts: Vec<_> = history.iter().filter_map(|h| h.workout.as_deref()).collect();
        assert_eq!(workouts, vec!["Legs", "Pull"]);
    }

    #[test]
    fn replace_blocks_swaps_only_the_target_range() {
        let db = ScheduleDb::open_in_memory().unwrap();
        db.replace_blocks(ts(0, 0), ts(12, 0), &[block("old-a", ts(8, 0), 30), block("old-b", ts(9, 0), 30)])
            .unwrap();
        db.replace_blocks(ts(12, 0), ts(23, 0), &[block("other-day", ts(13, 0), 30)])
            .unwrap();

        let inserted = db
            .replace_blocks(ts(0, 0), ts(12, 0), &[block("new", ts(10, 0), 45)])
            .unwrap();
        assert_eq!(inserted, 1);

        let morning = db.list_blocks(ts(0, 0), ts(12, 0)).unwrap();
        assert_eq!(morning.len(), 1);
        assert_eq!(morning[0].id, "new");
        assert_eq!(morning[0].detail, Some(BlockDetail::Meal { label: "Soup".into() }));
        assert_eq!(db.list_blocks(ts(12, 0), ts(23, 0)).unwrap().len(), 1);
    }

    #[test]
    fn failed_replace_rolls_back() {
        let db = ScheduleDb::open_in_memory().unwrap();
        db.replace_blocks(ts(0, 0), ts(12, 0), &[block("keep", ts(8, 0), 30)])
            .unwrap();

        // Duplicate primary keys make the second insert fail.
        let dup = block("dup", ts(9, 0), 30);
        let err = db
            .replace_blocks(ts(0, 0), ts(12, 0), &[dup.clone(), dup])
            .unwrap_err();
        assert!(matches!(err, ReplaceError::RolledBack(_)));

        let blocks = db.list_blocks(ts(0, 0), ts(12, 0)).unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].id, "keep");
    }

    #[test]
    fn open_at_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.db");
        {
            let db = ScheduleDb::open_at(&path).unwrap();
            db.create_work_item(&WorkItem::new("Persisted", WorkCategory::Business))
                .unwrap();
        }
        let db = ScheduleDb::open_at(&path).unwrap();
        assert_eq!(db.list_work_items(None).unwrap().len(), 1);
    }
}
