//! The fixed daily spine and configured rituals.

use chrono::Duration;

use super::conflict::Span;
use super::rotation::WorkoutChoice;
use super::{PlannedBlock, ScheduleBuilder};
use crate::clock::{Clock, MINUTES_PER_DAY};
use crate::schedule::{
    BlockDetail, BlockType, FixedEvent, RitualRule, RitualStep, MIN_BLOCK_MINUTES,
};
use crate::storage::{DayConfig, FixedEntryTable, Window};

/// Labels resolved before the spine is laid down.
#[derive(Debug, Clone)]
pub struct SpineLabels {
    pub workout: WorkoutChoice,
    pub lunch: String,
    pub dinner: String,
}

/// What the skeleton could not place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkeletonReport {
    /// Calendar events that were invalid or collided with sleep or an earlier event.
    pub dropped_events: Vec<String>,
    /// Spine steps and rituals with no free slot.
    pub dropped_steps: Vec<String>,
}

/// Lays down sleep, hard-fixed events, and the daily spine.
pub struct SkeletonBuilder<'a> {
    day: &'a DayConfig,
    meetings: &'a FixedEntryTable,
    clock: &'a Clock,
    step: i64,
}

impl<'a> SkeletonBuilder<'a> {
    pub fn new(day: &'a DayConfig, meetings: &'a FixedEntryTable, clock: &'a Clock, step: i64) -> Self {
        Self {
            day,
            meetings,
            clock,
            step,
        }
    }

    /// Places the spine into `builder`.
    ///
    /// Sleep goes first and is always emitted. Calendar events are reserved
    /// next so every later step avoids them. Spine steps then follow in
    /// wake-to-bed order; a step whose anchor is taken moves within its flex
    /// window if it has one, or is dropped.
    pub fn build(
        &self,
        mut builder: ScheduleBuilder,
        events: &[FixedEvent],
        labels: &SpineLabels,
    ) -> (ScheduleBuilder, SkeletonReport) {
        let mut report = SkeletonReport::default();
        let day = self.day;
        let rest_day = day.is_rest_day(builder.weekday());

        let sleep = PlannedBlock::new(
            "Sleep",
            BlockType::Sleep,
            Span::new(day.bedtime, MINUTES_PER_DAY + day.wake),
        );
        if let Err(sleep) = builder.place(sleep) {
            // Only reachable if a caller pre-filled the builder.
            report.dropped_steps.push(sleep.title);
        }

        self.reserve_events(&mut builder, &mut report, events);

        if let Some(rituals) = self.micro_rituals() {
            self.place_anchored(&mut builder, &mut report, rituals, None);
        }

        let deep_work = PlannedBlock::new(
            day.deep_work_title.clone(),
            BlockType::Task,
            Span::starting_at(day.deep_work_start, day.deep_work_minutes),
        );
        self.place_anchored(
            &mut builder,
            &mut report,
            deep_work,
            Some(Window::new(day.wake, day.deep_work_latest_end)),
        );

        let workout_start = if rest_day {
            day.workout_start_rest_day
        } else {
            day.workout_start_workday
        };
        let shower_start = match labels.workout.label() {
            Some(label) => {
                let workout = PlannedBlock::new(
                    label,
                    BlockType::Ritual,
                    Span::starting_at(workout_start, day.workout_minutes),
                )
                .with_detail(BlockDetail::Workout {
                    label: label.to_string(),
                });
                self.place_anchored(&mut builder, &mut report, workout, None);
                workout_start + day.workout_minutes
            }
            None => workout_start,
        };
        let shower = PlannedBlock::new(
            "Shower",
            BlockType::Ritual,
            Span::starting_at(shower_start, day.shower_minutes),
        );
        self.place_anchored(&mut builder, &mut report, shower, None);

        if !rest_day {
            let commute = PlannedBlock::new(
                "Commute",
                BlockType::Commute,
                Span::starting_at(day.commute_out, day.commute_minutes),
            );
            self.place_anchored(&mut builder, &mut report, commute, None);
        }

        for entry in self.meetings.for_weekday(builder.weekday()) {
            let meeting = PlannedBlock::new(
                entry.title.clone(),
                entry.block_type,
                Span::starting_at(entry.start, entry.minutes),
            );
            self.place_anchored(&mut builder, &mut report, meeting, None);
        }

        let lunch = PlannedBlock::new(
            labels.lunch.clone(),
            BlockType::Meal,
            Span::starting_at(day.lunch_start, day.lunch_minutes),
        )
        .with_detail(BlockDetail::Meal {
            label: labels.lunch.clone(),
        });
        self.place_anchored(&mut builder, &mut report, lunch, Some(day.lunch_window));

        if !rest_day {
            let commute_home = PlannedBlock::new(
                "Commute home",
                BlockType::Commute,
                Span::starting_at(day.commute_home, day.commute_minutes),
            );
            self.place_anchored(&mut builder, &mut report, commute_home, None);
        }

        let dinner = PlannedBlock::new(
            labels.dinner.clone(),
            BlockType::Meal,
            Span::new(day.dinner_end - day.dinner_minutes, day.dinner_end),
        )
        .with_detail(BlockDetail::Meal {
            label: labels.dinner.clone(),
        });
        self.place_anchored(&mut builder, &mut report, dinner, None);

        for step in &day.evening_chain {
            let block = PlannedBlock::new(
                step.title.clone(),
                step.block_type,
                Span::starting_at(day.dinner_end + step.offset_minutes, step.minutes),
            );
            self.place_anchored(&mut builder, &mut report, block, None);
        }

        (builder, report)
    }

    /// Places user rituals that apply on the builder's weekday.
    ///
    /// Fixed rituals sit at their window start; flexible ones take the first
    /// free slot in their window. Returns the names that did not fit.
    pub fn place_rituals(
        &self,
        mut builder: ScheduleBuilder,
        rules: &[RitualRule],
    ) -> (ScheduleBuilder, Vec<String>) {
        let mut dropped = Vec::new();
        let weekday = builder.weekday();
        for rule in rules.iter().filter(|r| r.applies_on(weekday)) {
            let minutes = rule.duration_minutes.max(MIN_BLOCK_MINUTES);
            let span = if rule.fixed {
                let span = Span::starting_at(rule.window_start, minutes);
                (span.end <= rule.window_end && !builder.conflicts(span)).then_some(span)
            } else {
                builder.find_slot(minutes, rule.window_start, rule.window_end, self.step)
            };
            match span {
                Some(span) => {
                    let block = PlannedBlock::new(rule.name.clone(), BlockType::Ritual, span);
                    if let Err(block) = builder.place(block) {
                        dropped.push(block.title);
                    }
                }
                None => {
                    tracing::warn!(ritual = %rule.name, "no free slot for ritual");
                    dropped.push(rule.name.clone());
                }
            }
        }
        (builder, dropped)
    }

    /// One ritual block holding the wake-up micro-steps back to back.
    fn micro_rituals(&self) -> Option<PlannedBlock> {
        let day = self.day;
        if day.micro_rituals.is_empty() {
            return None;
        }
        let steps: Vec<RitualStep> = day
            .micro_rituals
            .iter()
            .enumerate()
            .map(|(i, title)| RitualStep {
                title: title.clone(),
                offset_minutes: i as i64 * day.micro_ritual_minutes,
                minutes: day.micro_ritual_minutes,
            })
            .collect();
        let total = (steps.len() as i64 * day.micro_ritual_minutes).max(MIN_BLOCK_MINUTES);
        Some(
            PlannedBlock::new(
                "Morning micro-rituals",
                BlockType::Ritual,
                Span::starting_at(day.wake, total),
            )
            .with_detail(BlockDetail::Steps { steps }),
        )
    }

    fn reserve_events(
        &self,
        builder: &mut ScheduleBuilder,
        report: &mut SkeletonReport,
        events: &[FixedEvent],
    ) {
        let date = builder.date();
        let mut ordered: Vec<&FixedEvent> = events.iter().collect();
        ordered.sort_by(|a, b| a.start_time.cmp(&b.start_time).then_with(|| a.id.cmp(&b.id)));

        for event in ordered {
            if event.end_time - event.start_time < Duration::minutes(MIN_BLOCK_MINUTES) {
                tracing::warn!(event = %event.title, "dropping calendar event shorter than minimum block");
                report.dropped_events.push(event.title.clone());
                continue;
            }
            let span = Span::new(
                self.clock.local_minute(date, event.start_time),
                self.clock.local_minute_ceil(date, event.end_time),
            );
            let mut block = PlannedBlock::new(event.title.clone(), BlockType::Event, span);
            block.exact = Some((event.start_time, event.end_time));
            if let Err(block) = builder.place(block) {
                tracing::warn!(event = %block.title, "calendar event collides with sleep or another event");
                report.dropped_events.push(block.title);
            }
        }
    }

    fn place_anchored(
        &self,
        builder: &mut ScheduleBuilder,
        report: &mut SkeletonReport,
        block: PlannedBlock,
        flex: Option<Window>,
    ) {
        let Err(mut block) = builder.place(block) else {
            return;
        };
        let relocated =
            flex.and_then(|w| builder.find_slot(block.span.minutes(), w.start, w.end, self.step));
        match relocated {
            Some(span) => {
                tracing::debug!(step = %block.title, from = block.span.start, to = span.start, "moved spine step");
                block.span = span;
                if let Err(block) = builder.place(block) {
                    report.dropped_steps.push(block.title);
                }
            }
            None => {
                tracing::warn!(step = %block.title, "spine step collides and has no free slot");
                report.dropped_steps.push(block.title);
            }
        }
    }
}
