//! Fills open work windows with backlog items.

use std::collections::HashSet;

use super::{PlannedBlock, ScheduleBuilder};
use crate::schedule::{BlockType, WorkCategory, WorkItem};
use crate::storage::{DayConfig, OverlayConfig, Window};

/// Places work items into the day's work windows.
pub struct WorkOverlay<'a> {
    config: &'a OverlayConfig,
    day: &'a DayConfig,
}

impl<'a> WorkOverlay<'a> {
    pub fn new(config: &'a OverlayConfig, day: &'a DayConfig) -> Self {
        Self { config, day }
    }

    /// Work windows and the category allowed in them for the builder's date.
    fn windows_for(&self, builder: &ScheduleBuilder) -> (&'a [Window], WorkCategory) {
        if self.day.is_rest_day(builder.weekday()) {
            (self.config.rest_day_windows.as_slice(), WorkCategory::Personal)
        } else {
            (self.config.workday_windows.as_slice(), WorkCategory::Business)
        }
    }

    /// Sorted candidates: matching category, highest priority first, ties by id.
    fn candidates<'i>(items: &'i [WorkItem], category: WorkCategory) -> Vec<&'i WorkItem> {
        let mut candidates: Vec<&WorkItem> =
            items.iter().filter(|item| item.category == category).collect();
        candidates.sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| a.id.cmp(&b.id)));
        candidates
    }

    /// Places items window by window.
    ///
    /// Within a window a cursor starts at the window start; each item is
    /// tried first-fit from the cursor, and a placed item moves the cursor to
    /// its end plus the configured gap. Items that do not fit are left for
    /// the next window's pass and are reported if no window took them.
    pub fn apply(&self, mut builder: ScheduleBuilder, items: &[WorkItem]) -> (ScheduleBuilder, Vec<String>) {
        let (windows, category) = self.windows_for(&builder);
        let candidates = Self::candidates(items, category);
        let mut placed_ids: HashSet<&str> = HashSet::new();

        for window in windows {
            let mut cursor = window.start;
            for item in &candidates {
                if placed_ids.contains(item.id.as_str()) || cursor >= window.end {
                    continue;
                }
                let minutes = item.planned_minutes();
                let Some(span) =
                    builder.find_slot(minutes, cursor, window.end, self.config.step_minutes)
                else {
                    tracing::debug!(item = %item.title, minutes, window_start = window.start, "item does not fit window");
                    continue;
                };
                let block = PlannedBlock::new(item.title.clone(), BlockType::Task, span)
                    .for_work_item(item.id.clone());
                if builder.place(block).is_ok() {
                    placed_ids.insert(item.id.as_str());
                    cursor = span.end + self.config.gap_minutes;
                }
            }
        }

        let skipped: Vec<String> = candidates
            .iter()
            .filter(|item| !placed_ids.contains(item.id.as_str()))
            .map(|item| item.id.clone())
            .collect();
        if !skipped.is_empty() {
            tracing::info!(count = skipped.len(), "work items left unscheduled");
        }
        (builder, skipped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::Span;
    use crate::storage::Config;
    use chrono::NaiveDate;

    fn item(id: &str, category: WorkCategory, priority: i32, minutes: Option<i64>) -> WorkItem {
        let mut item = WorkItem::new(format!("Item {id}"), category);
        item.id = id.to_string();
        item.priority = priority;
        item.estimated_minutes = minutes;
        item
    }

    fn task_spans(builder: &ScheduleBuilder) -> Vec<(String, Span)> {
        let mut out: Vec<_> = builder
            .placed()
            .iter()
            .filter_map(|b| b.work_item_id.clone().map(|id| (id, b.span)))
            .collect();
        out.sort_by_key(|(_, span)| span.start);
        out
    }

    #[test]
    fn workday_places_business_items_by_priority() {
        let cfg = Config::default();
        let overlay = WorkOverlay::new(&cfg.overlay, &cfg.day);
        let date = NaiveDate::from_ymd_opt(2026, 6, 3).unwrap(); // Wednesday
        let items = vec![
            item("low", WorkCategory::Business, 1, Some(30)),
            item("high", WorkCategory::Business, 9, Some(60)),
            item("home", WorkCategory::Personal, 10, Some(30)),
        ];
        let (builder, skipped) = overlay.apply(ScheduleBuilder::new(date), &items);

        assert_eq!(
            task_spans(&builder),
            vec![
                ("high".to_string(), Span::new(570, 630)),
                ("low".to_string(), Span::new(640, 670)),
            ]
        );
        assert_eq!(skipped, Vec::<String>::new());
    }

    #[test]
    fn rest_day_uses_personal_items() {
        let cfg = Config::default();
        let overlay = WorkOverlay::new(&cfg.overlay, &cfg.day);
        let date = NaiveDate::from_ymd_opt(2026, 6, 7).unwrap(); // Sunday
        let items = vec![
            item("office", WorkCategory::Business, 10, Some(30)),
            item("garden", WorkCategory::Personal, 1, Some(45)),
        ];
        let (builder, _) = overlay.apply(ScheduleBuilder::new(date), &items);
        assert_eq!(task_spans(&builder), vec![("garden".to_string(), Span::new(600, 645))]);
    }

    #[test]
    fn oversized_item_is_skipped_but_smaller_ones_still_fit() {
        let cfg = Config::default();
        let overlay = WorkOverlay::new(&cfg.overlay, &cfg.day);
        let date = NaiveDate::from_ymd_opt(2026, 6, 3).unwrap();
        let items = vec![
            item("huge", WorkCategory::Business, 9, Some(600)),
            item("small", WorkCategory::Business, 1, Some(20)),
        ];
        let (builder, skipped) = overlay.apply(ScheduleBuilder::new(date), &items);
        assert_eq!(skipped, vec!["huge".to_string()]);
        assert_eq!(task_spans(&builder), vec![("small".to_string(), Span::new(570, 590))]);
    }

    #[test]
    fn item_too_big_for_morning_lands_in_afternoon() {
        let cfg = Config::default();
        let overlay = WorkOverlay::new(&cfg.overlay, &cfg.day);
        let date = NaiveDate::from_ymd_opt(2026, 6, 3).unwrap();
        let items = vec![item("long", WorkCategory::Business, 5, Some(200))];
        let (builder, skipped) = overlay.apply(ScheduleBuilder::new(date), &items);
        assert!(skipped.is_empty());
        assert_eq!(task_spans(&builder), vec![("long".to_string(), Span::new(800, 1000))]);
    }

    #[test]
    fn items_avoid_already_placed_blocks() {
        let cfg = Config::default();
        let overlay = WorkOverlay::new(&cfg.overlay, &cfg.day);
        let date = NaiveDate::from_ymd_opt(2026, 6, 3).unwrap();
        let mut builder = ScheduleBuilder::new(date);
        builder
            .place(PlannedBlock::new("Meeting", BlockType::Event, Span::new(580, 640)))
            .unwrap();
        let items = vec![item("a", WorkCategory::Business, 1, Some(30))];
        let (builder, _) = overlay.apply(builder, &items);
        assert_eq!(task_spans(&builder), vec![("a".to_string(), Span::new(640, 670))]);
    }
}
