//! Rule-based day planner.
//!
//! A planning run threads one [`ScheduleBuilder`] through each stage:
//! - Skeleton: sleep, calendar events, the fixed daily spine
//! - Rituals: optional rules from configuration
//! - Overlay: open work items in the remaining work windows
//!
//! Every stage appends through the builder, which rejects overlapping
//! placements, so the accumulated list never contains a conflict. The
//! assembler then turns the minute spans into timestamped [`Block`]s and
//! replaces the stored day.
//!
//! [`Block`]: crate::schedule::Block

pub mod assembler;
pub mod conflict;
pub mod overlay;
pub mod rotation;
pub mod skeleton;
pub mod slot;

use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};
use serde::Serialize;

use crate::schedule::{BlockDetail, BlockType};

pub use assembler::{ComposedDay, DayPlanner, PlanInputs, PlanSummary};
pub use conflict::{conflicts, Occupies, Span};
pub use overlay::WorkOverlay;
pub use rotation::{next_workout, resolve_meal_label, resolve_workout, rotate_meal, WorkoutChoice};
pub use skeleton::SkeletonBuilder;
pub use slot::{find_slot, DEFAULT_STEP_MINUTES};

/// A block placed during a run, still in day-local minutes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedBlock {
    pub span: Span,
    pub title: String,
    pub block_type: BlockType,
    pub work_item_id: Option<String>,
    pub detail: Option<BlockDetail>,
    /// Verbatim timestamps for hard-fixed calendar events.
    pub exact: Option<(DateTime<Utc>, DateTime<Utc>)>,
}

impl PlannedBlock {
    pub fn new(title: impl Into<String>, block_type: BlockType, span: Span) -> Self {
        Self {
            span,
            title: title.into(),
            block_type,
            work_item_id: None,
            detail: None,
            exact: None,
        }
    }

    pub fn with_detail(mut self, detail: BlockDetail) -> Self {
        self.detail = Some(detail);
        self
    }

    pub fn for_work_item(mut self, id: impl Into<String>) -> Self {
        self.work_item_id = Some(id.into());
        self
    }
}

impl Occupies for PlannedBlock {
    fn span(&self) -> Span {
        self.span
    }
}

/// The accumulating block list of one planning run.
#[derive(Debug, Clone)]
pub struct ScheduleBuilder {
    date: NaiveDate,
    placed: Vec<PlannedBlock>,
}

impl ScheduleBuilder {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            placed: Vec::new(),
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn weekday(&self) -> Weekday {
        self.date.weekday()
    }

    pub fn placed(&self) -> &[PlannedBlock] {
        &self.placed
    }

    pub fn len(&self) -> usize {
        self.placed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placed.is_empty()
    }

    pub fn conflicts(&self, span: Span) -> bool {
        conflicts(&self.placed, span)
    }

    pub fn find_slot(&self, duration: i64, window_start: i64, window_end: i64, step: i64) -> Option<Span> {
        find_slot(&self.placed, duration, window_start, window_end, step)
    }

    /// Appends `block` unless it overlaps something already placed.
    ///
    /// On conflict the block is handed back untouched.
    pub fn place(&mut self, block: PlannedBlock) -> Result<(), PlannedBlock> {
        if self.conflicts(block.span) {
            return Err(block);
        }
        tracing::debug!(
            title = %block.title,
            start = block.span.start,
            end = block.span.end,
            "placed block"
        );
        self.placed.push(block);
        Ok(())
    }

    pub fn into_blocks(self) -> Vec<PlannedBlock> {
        self.placed
    }
}
