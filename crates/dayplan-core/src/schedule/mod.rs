//! Schedule types: work items, calendar events, history, and placed blocks.

use chrono::{DateTime, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

mod request;

pub use request::{Override, PlanningRequest};

/// Shortest block the engine will emit, in minutes.
pub const MIN_BLOCK_MINUTES: i64 = 5;

/// Duration used for work items that carry no estimate.
pub const DEFAULT_ITEM_MINUTES: i64 = 30;

/// Which part of life a work item belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum WorkCategory {
    Business,
    Personal,
}

impl WorkCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkCategory::Business => "business",
            WorkCategory::Personal => "personal",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "business" => Some(WorkCategory::Business),
            "personal" => Some(WorkCategory::Personal),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WorkStatus {
    Open,
    Done,
}

/// An unscheduled unit of work from the backlog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkItem {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub estimated_minutes: Option<i64>,
    pub min_block_minutes: Option<i64>,
    pub category: WorkCategory,
    /// Higher is scheduled first.
    pub priority: i32,
    pub status: WorkStatus,
    pub created_at: DateTime<Utc>,
}

impl WorkItem {
    pub fn new(title: impl Into<String>, category: WorkCategory) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.into(),
            description: None,
            estimated_minutes: None,
            min_block_minutes: None,
            category,
            priority: 0,
            status: WorkStatus::Open,
            created_at: Utc::now(),
        }
    }

    /// Minutes to reserve: estimate, else minimum block, else the default.
    pub fn planned_minutes(&self) -> i64 {
        self.estimated_minutes
            .or(self.min_block_minutes)
            .unwrap_or(DEFAULT_ITEM_MINUTES)
            .max(MIN_BLOCK_MINUTES)
    }
}

/// An externally sourced, hard-fixed calendar entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FixedEvent {
    pub id: String,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl FixedEvent {
    pub fn new(title: impl Into<String>, start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.into(),
            start_time,
            end_time,
        }
    }
}

/// A recurring ritual supplied by configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RitualRule {
    pub name: String,
    pub duration_minutes: i64,
    #[serde(with = "crate::clock::hhmm")]
    pub window_start: i64,
    #[serde(with = "crate::clock::hhmm")]
    pub window_end: i64,
    /// Fixed rituals sit at `window_start` or not at all.
    #[serde(default)]
    pub fixed: bool,
    /// Empty means every day.
    #[serde(default)]
    pub weekdays: Vec<Weekday>,
}

impl RitualRule {
    pub fn applies_on(&self, weekday: Weekday) -> bool {
        self.weekdays.is_empty() || self.weekdays.contains(&weekday)
    }
}

/// One past day's outcome.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryEntry {
    pub date: NaiveDate,
    pub workout: Option<String>,
    pub completed: bool,
    pub lunch: Option<String>,
    pub dinner: Option<String>,
}

/// Type of schedule block.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BlockType {
    Task,
    Ritual,
    Event,
    Meal,
    Sleep,
    Buffer,
    Commute,
}

impl BlockType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockType::Task => "task",
            BlockType::Ritual => "ritual",
            BlockType::Event => "event",
            BlockType::Meal => "meal",
            BlockType::Sleep => "sleep",
            BlockType::Buffer => "buffer",
            BlockType::Commute => "commute",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Some(match raw {
            "task" => BlockType::Task,
            "ritual" => BlockType::Ritual,
            "event" => BlockType::Event,
            "meal" => BlockType::Meal,
            "sleep" => BlockType::Sleep,
            "buffer" => BlockType::Buffer,
            "commute" => BlockType::Commute,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BlockStatus {
    Planned,
    Done,
    Skipped,
}

impl BlockStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockStatus::Planned => "planned",
            BlockStatus::Done => "done",
            BlockStatus::Skipped => "skipped",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "planned" => Some(BlockStatus::Planned),
            "done" => Some(BlockStatus::Done),
            "skipped" => Some(BlockStatus::Skipped),
            _ => None,
        }
    }
}

/// A short step inside a ritual block.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RitualStep {
    pub title: String,
    /// Offset from the block start.
    pub offset_minutes: i64,
    pub minutes: i64,
}

/// Structured payload attached to a block.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BlockDetail {
    Meal { label: String },
    Workout { label: String },
    Steps { steps: Vec<RitualStep> },
}

/// A placed interval of the day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Block {
    pub id: String,
    pub plan_date: NaiveDate,
    pub title: String,
    pub block_type: BlockType,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: BlockStatus,
    pub work_item_id: Option<String>,
    pub detail: Option<BlockDetail>,
}

impl Block {
    pub fn duration_minutes(&self) -> i64 {
        (self.end_time - self.start_time).num_minutes()
    }

    pub fn overlaps(&self, other: &Block) -> bool {
        self.start_time < other.end_time && self.end_time > other.start_time
    }

    /// Checks the range and minimum length of a single block.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.end_time <= self.start_time {
            return Err(ValidationError::InvalidTimeRange {
                start: self.start_time,
                end: self.end_time,
            });
        }
        let minutes = self.duration_minutes();
        if minutes < MIN_BLOCK_MINUTES {
            return Err(ValidationError::BlockTooShort {
                title: self.title.clone(),
                minutes,
                min: MIN_BLOCK_MINUTES,
            });
        }
        Ok(())
    }
}

/// Validates every block and pairwise non-overlap of a start-sorted day.
pub fn validate_day(blocks: &[Block]) -> Result<(), ValidationError> {
    for block in blocks {
        block.validate()?;
    }
    for pair in blocks.windows(2) {
        if pair[0].overlaps(&pair[1]) {
            return Err(ValidationError::Overlap {
                first: pair[0].title.clone(),
                second: pair[1].title.clone(),
            });
        }
    }
    Ok(())
}
