//! Property tests for composed days.

use chrono::{Duration, NaiveDate};
use dayplan_core::schedule::MIN_BLOCK_MINUTES;
use dayplan_core::{
    BlockType, Config, DayPlanner, FixedEvent, HistoryEntry, Override, PlanInputs, PlanningRequest,
    WorkCategory, WorkItem,
};
use proptest::prelude::*;

fn item_strategy() -> impl Strategy<Value = WorkItem> {
    (any::<bool>(), -5i32..10, proptest::option::of(1i64..400), "[a-z]{4}").prop_map(
        |(business, priority, minutes, id)| {
            let category = if business {
                WorkCategory::Business
            } else {
                WorkCategory::Personal
            };
            let mut item = WorkItem::new(format!("Task {id}"), category);
            item.id = id;
            item.priority = priority;
            item.estimated_minutes = minutes;
            item
        },
    )
}

fn workout_strategy() -> impl Strategy<Value = Override> {
    prop_oneof![
        Just(Override::Auto),
        Just(Override::Skip),
        "[A-Z][a-z]{2,8}".prop_map(Override::Explicit),
    ]
}

fn meal_strategy() -> impl Strategy<Value = Override> {
    prop_oneof![Just(Override::Auto), "[A-Z][a-z]{2,8}".prop_map(Override::Explicit)]
}

proptest! {
    #[test]
    fn prop_days_are_valid(
        day_offset in 0i64..366,
        items in proptest::collection::vec(item_strategy(), 0..8),
        events in proptest::collection::vec((0i64..1440, 1i64..180), 0..5),
        last_workout in proptest::option::of("(Push|Pull|Legs|Cardio|Swim)"),
        workout in workout_strategy(),
        lunch in meal_strategy(),
        dinner in meal_strategy(),
    ) {
        let date = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap() + Duration::days(day_offset);
        let planner = DayPlanner::new(Config::default());
        let clock = planner.clock().clone();
        let fixed_events = events
            .iter()
            .enumerate()
            .map(|(i, (start, minutes))| {
                let mut event = FixedEvent::new(
                    format!("Event {i}"),
                    clock.to_absolute(date, *start),
                    clock.to_absolute(date, start + minutes),
                );
                event.id = format!("event-{i}");
                event
            })
            .collect();
        let history = last_workout
            .map(|label| HistoryEntry {
                date: date - Duration::days(1),
                workout: Some(label),
                completed: true,
                lunch: None,
                dinner: None,
            })
            .into_iter()
            .collect();
        let inputs = PlanInputs { work_items: items, fixed_events, history };
        let request = PlanningRequest {
            date: Some(date),
            notes: None,
            lunch,
            dinner,
            workout,
        };

        let day = planner.compose(date, &inputs, &request).unwrap();

        for block in &day.blocks {
            prop_assert!(block.end_time > block.start_time);
            prop_assert!(block.duration_minutes() >= MIN_BLOCK_MINUTES, "{} too short", block.title);
        }
        for (i, a) in day.blocks.iter().enumerate() {
            for b in &day.blocks[i + 1..] {
                prop_assert!(
                    !(a.start_time < b.end_time && a.end_time > b.start_time),
                    "{} overlaps {}", a.title, b.title
                );
            }
        }

        let sleeps: Vec<_> = day.blocks.iter().filter(|b| b.block_type == BlockType::Sleep).collect();
        prop_assert_eq!(sleeps.len(), 1);
        prop_assert_eq!(sleeps[0].start_time, clock.to_absolute(date, 21 * 60 + 30));
        prop_assert_eq!(sleeps[0].end_time, clock.to_absolute(date + Duration::days(1), 6 * 60));

        let again = planner.compose(date, &inputs, &request).unwrap();
        prop_assert_eq!(day, again);
    }
}
