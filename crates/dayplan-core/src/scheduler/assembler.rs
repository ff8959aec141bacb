//! Composes a full day and commits it.
//!
//! [`DayPlanner::compose`] is pure: given the same inputs it returns the same
//! blocks, ids included. [`DayPlanner::plan`] wraps it with the store reads
//! and the transactional replace.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::overlay::WorkOverlay;
use super::rotation::{resolve_meal_label, resolve_workout, rotate_meal, WorkoutChoice};
use super::skeleton::{SkeletonBuilder, SpineLabels};
use super::{PlannedBlock, ScheduleBuilder};
use crate::clock::Clock;
use crate::error::{PlanError, ValidationError};
use crate::schedule::{
    validate_day, Block, BlockStatus, FixedEvent, HistoryEntry, Override, PlanningRequest, WorkItem,
};
use crate::storage::{Config, PlanStore};

/// Snapshot of everything a run reads from the store.
#[derive(Debug, Clone, Default)]
pub struct PlanInputs {
    pub work_items: Vec<WorkItem>,
    pub fixed_events: Vec<FixedEvent>,
    /// Newest first.
    pub history: Vec<HistoryEntry>,
}

/// Result of composing one day, before it is stored.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedDay {
    pub date: NaiveDate,
    /// Sorted by start time.
    pub blocks: Vec<Block>,
    pub workout: WorkoutChoice,
    pub lunch_label: String,
    pub dinner_label: String,
    /// Ids of work items that found no slot.
    pub skipped_items: Vec<String>,
    /// Titles of calendar events that could not be reserved.
    pub dropped_events: Vec<String>,
    /// Spine steps and rituals that found no slot.
    pub dropped_steps: Vec<String>,
}

/// Response of a planning run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanSummary {
    pub success: bool,
    pub date: NaiveDate,
    pub blocks_created: usize,
    /// Resolved workout label, or `skip`.
    pub workout: String,
    /// The lunch override as given, or `auto`.
    pub lunch: String,
    /// The dinner override as given, or `auto`.
    pub dinner: String,
    /// Title of the lunch block after rotation.
    pub lunch_label: String,
    /// Title of the dinner block after rotation.
    pub dinner_label: String,
    pub skipped_items: Vec<String>,
    pub dropped_events: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dropped_steps: Vec<String>,
}

/// Rule-based planner for a single date.
#[derive(Debug, Clone)]
pub struct DayPlanner {
    config: Config,
    clock: Clock,
}

impl DayPlanner {
    /// Planner using the clock policy from `config`.
    pub fn new(config: Config) -> Self {
        let clock = Clock::new(config.clock);
        Self { config, clock }
    }

    /// Replaces the clock, for alternate offset policies.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    /// The request's date, or tomorrow in local time at `now`.
    pub fn resolve_date(&self, request: &PlanningRequest, now: DateTime<Utc>) -> NaiveDate {
        request
            .date
            .unwrap_or_else(|| self.clock.local_date(now) + Duration::days(1))
    }

    /// Builds the day's blocks without touching storage.
    ///
    /// # Errors
    /// Returns a [`ValidationError`] for a malformed request, or if the
    /// composed day breaks a block invariant.
    pub fn compose(
        &self,
        date: NaiveDate,
        inputs: &PlanInputs,
        request: &PlanningRequest,
    ) -> Result<ComposedDay, ValidationError> {
        request.validate()?;
        let rotation = &self.config.rotation;

        let workout = resolve_workout(&request.workout, &inputs.history, &rotation.workout_cycle);
        let lunch_label = self.meal_label(
            &request.lunch,
            &rotation.generic_lunch,
            &rotation.lunch_menu,
            inputs.history.iter().filter_map(|h| h.lunch.as_deref()),
        );
        let dinner_label = self.meal_label(
            &request.dinner,
            &rotation.generic_dinner,
            &rotation.dinner_menu,
            inputs.history.iter().filter_map(|h| h.dinner.as_deref()),
        );
        let labels = SpineLabels {
            workout: workout.clone(),
            lunch: lunch_label.clone(),
            dinner: dinner_label.clone(),
        };

        let skeleton = SkeletonBuilder::new(
            &self.config.day,
            &self.config.meetings,
            &self.clock,
            self.config.overlay.step_minutes,
        );
        let (builder, report) = skeleton.build(ScheduleBuilder::new(date), &inputs.fixed_events, &labels);
        let (builder, dropped_rituals) = skeleton.place_rituals(builder, &self.config.rituals);
        let (builder, skipped_items) =
            WorkOverlay::new(&self.config.overlay, &self.config.day).apply(builder, &inputs.work_items);

        let blocks = self.to_blocks(date, builder.into_blocks());
        validate_day(&blocks)?;

        let mut dropped_steps = report.dropped_steps;
        dropped_steps.extend(dropped_rituals);

        Ok(ComposedDay {
            date,
            blocks,
            workout,
            lunch_label,
            dinner_label,
            skipped_items,
            dropped_events: report.dropped_events,
            dropped_steps,
        })
    }

    /// Plans the request's date and replaces whatever was stored for it.
    ///
    /// `now` only feeds the default date; the placement itself never reads
    /// the clock.
    ///
    /// # Errors
    /// - [`PlanError::Input`] for a malformed request, before any read
    /// - [`PlanError::Read`] if loading backlog, events or history fails
    /// - [`PlanError::Write`] if the replace failed and was rolled back
    /// - [`PlanError::ReplacePartial`] if the rollback failed as well
    pub fn plan<S: PlanStore>(
        &self,
        store: &S,
        request: &PlanningRequest,
        now: DateTime<Utc>,
    ) -> Result<PlanSummary, PlanError> {
        request.validate()?;
        let date = self.resolve_date(request, now);
        let (day_start, day_end) = self.clock.day_bounds(date);

        let inputs = PlanInputs {
            work_items: store
                .open_work_items()
                .map_err(|source| PlanError::Read { what: "work items", source })?,
            fixed_events: store
                .fixed_events_between(day_start, day_end)
                .map_err(|source| PlanError::Read { what: "calendar events", source })?,
            history: store
                .history_before(date, self.config.rotation.history_days)
                .map_err(|source| PlanError::Read { what: "history", source })?,
        };

        let day = self.compose(date, &inputs, request)?;
        let blocks_created = store
            .replace_blocks(day_start, day_end, &day.blocks)
            .map_err(|err| PlanError::from_replace(date, err))?;

        tracing::info!(
            %date,
            blocks = blocks_created,
            workout = %day.workout,
            lunch = %day.lunch_label,
            dinner = %day.dinner_label,
            skipped = day.skipped_items.len(),
            "planned day"
        );

        Ok(PlanSummary {
            success: true,
            date,
            blocks_created,
            workout: day.workout.to_string(),
            lunch: request.lunch.to_string(),
            dinner: request.dinner.to_string(),
            lunch_label: day.lunch_label,
            dinner_label: day.dinner_label,
            skipped_items: day.skipped_items,
            dropped_events: day.dropped_events,
            dropped_steps: day.dropped_steps,
        })
    }

    fn meal_label<'h>(
        &self,
        choice: &Override,
        generic: &str,
        menu: &[String],
        recent: impl IntoIterator<Item = &'h str>,
    ) -> String {
        if *choice == Override::Auto && !menu.is_empty() {
            if let Some(label) = rotate_meal(menu, recent, self.config.rotation.avoid_repeat_days) {
                return label;
            }
        }
        resolve_meal_label(choice, generic)
    }

    /// Timestamps, sorts and ids the placed blocks.
    fn to_blocks(&self, date: NaiveDate, placed: Vec<PlannedBlock>) -> Vec<Block> {
        let mut timed: Vec<(DateTime<Utc>, DateTime<Utc>, PlannedBlock)> = placed
            .into_iter()
            .map(|block| {
                let (start, end) = block.exact.unwrap_or_else(|| {
                    (
                        self.clock.to_absolute(date, block.span.start),
                        self.clock.to_absolute(date, block.span.end),
                    )
                });
                (start, end, block)
            })
            .collect();
        timed.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.2.title.cmp(&b.2.title)));

        timed
            .into_iter()
            .enumerate()
            .map(|(index, (start_time, end_time, planned))| Block {
                id: block_id(date, index, &planned.title),
                plan_date: date,
                title: planned.title,
                block_type: planned.block_type,
                start_time,
                end_time,
                status: BlockStatus::Planned,
                work_item_id: planned.work_item_id,
                detail: planned.detail,
            })
            .collect()
    }
}

/// Stable id for the `index`-th block of `date`.
fn block_id(date: NaiveDate, index: usize, title: &str) -> String {
    let name = format!("dayplan/{date}/{index}/{title}");
    Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()).to_string()
}
