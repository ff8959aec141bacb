//! Calendar event commands for CLI.

use clap::Subcommand;
use dayplan_core::clock::{format_minute, parse_minute};
use dayplan_core::{FixedEvent, PlanStore, ScheduleDb, ValidationError};

use super::{configured_clock, date_or_today};

#[derive(Subcommand)]
pub enum EventAction {
    /// Add a hard-fixed calendar event
    Add {
        /// Event title
        title: String,
        /// Local date (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Local start time (HH:MM)
        #[arg(long)]
        start: String,
        /// Local end time (HH:MM)
        #[arg(long)]
        end: String,
    },
    /// List events starting on a day
    List {
        /// Local date (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete an event
    Delete {
        /// Event ID
        id: String,
    },
}

fn minute_arg(field: &str, raw: &str) -> Result<i64, ValidationError> {
    parse_minute(raw).ok_or_else(|| ValidationError::InvalidValue {
        field: field.into(),
        message: format!("'{raw}' is not HH:MM"),
    })
}

pub fn run(action: EventAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = ScheduleDb::open()?;
    let clock = configured_clock();

    match action {
        EventAction::Add {
            title,
            date,
            start,
            end,
        } => {
            let date = date_or_today(date.as_deref(), &clock)?;
            let start = minute_arg("start", &start)?;
            let end = minute_arg("end", &end)?;
            let start_time = clock.to_absolute(date, start);
            let end_time = clock.to_absolute(date, end);
            if end_time <= start_time {
                return Err(ValidationError::InvalidTimeRange {
                    start: start_time,
                    end: end_time,
                }
                .into());
            }
            let event = FixedEvent::new(title, start_time, end_time);
            db.create_fixed_event(&event)?;
            println!("Event created: {}", event.id);
        }
        EventAction::List { date, json } => {
            let date = date_or_today(date.as_deref(), &clock)?;
            let (start, end) = clock.day_bounds(date);
            let events = db.fixed_events_between(start, end)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&events)?);
            } else if events.is_empty() {
                println!("No events on {date}");
            } else {
                for event in &events {
                    println!(
                        "{}  {}-{}  {}",
                        event.id,
                        format_minute(clock.local_minute(date, event.start_time)),
                        format_minute(clock.local_minute(date, event.end_time)),
                        event.title
                    );
                }
            }
        }
        EventAction::Delete { id } => {
            if db.delete_fixed_event(&id)? {
                println!("Event deleted: {id}");
            } else {
                return Err(format!("event not found: {id}").into());
            }
        }
    }
    Ok(())
}
