//! History commands for CLI.

use chrono::Duration;
use clap::{ArgAction, Subcommand};
use dayplan_core::{HistoryEntry, PlanStore, ScheduleDb};

use super::{configured_clock, date_or_today};

#[derive(Subcommand)]
pub enum HistoryAction {
    /// Record how a day went
    Record {
        /// Date (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Workout done that day
        #[arg(long)]
        workout: Option<String>,
        /// Whether the workout was completed
        #[arg(long, default_value_t = true, action = ArgAction::Set)]
        completed: bool,
        /// Lunch eaten
        #[arg(long)]
        lunch: Option<String>,
        /// Dinner eaten
        #[arg(long)]
        dinner: Option<String>,
    },
    /// List recent history, newest first
    List {
        /// Number of days to show, ending today
        #[arg(long, default_value_t = 7)]
        days: u32,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(action: HistoryAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = ScheduleDb::open()?;
    let clock = configured_clock();

    match action {
        HistoryAction::Record {
            date,
            workout,
            completed,
            lunch,
            dinner,
        } => {
            let entry = HistoryEntry {
                date: date_or_today(date.as_deref(), &clock)?,
                workout,
                completed,
                lunch,
                dinner,
            };
            db.record_history(&entry)?;
            println!("History recorded for {}", entry.date);
        }
        HistoryAction::List { days, json } => {
            let today = date_or_today(None, &clock)?;
            let entries = db.history_before(today + Duration::days(1), days)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else if entries.is_empty() {
                println!("No history");
            } else {
                for entry in &entries {
                    println!(
                        "{}  workout: {}{}  lunch: {}  dinner: {}",
                        entry.date,
                        entry.workout.as_deref().unwrap_or("-"),
                        if entry.completed { "" } else { " (not completed)" },
                        entry.lunch.as_deref().unwrap_or("-"),
                        entry.dinner.as_deref().unwrap_or("-"),
                    );
                }
            }
        }
    }
    Ok(())
}
