use chrono::Utc;
use clap::Args;
use dayplan_core::{Config, DayPlanner, PlanningRequest, ScheduleDb};

#[derive(Args)]
pub struct PlanArgs {
    /// Date to plan (YYYY-MM-DD, default: tomorrow)
    #[arg(long)]
    date: Option<String>,
    /// Lunch label, or "auto"
    #[arg(long)]
    lunch: Option<String>,
    /// Dinner label, or "auto"
    #[arg(long)]
    dinner: Option<String>,
    /// Workout label, "auto", or "skip"
    #[arg(long)]
    workout: Option<String>,
    /// Free-form notes kept with the request
    #[arg(long)]
    notes: Option<String>,
    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(args: PlanArgs) -> Result<(), Box<dyn std::error::Error>> {
    let request = PlanningRequest::from_raw(
        args.date.as_deref(),
        args.lunch.as_deref(),
        args.dinner.as_deref(),
        args.workout.as_deref(),
        args.notes.as_deref(),
    )?;
    let planner = DayPlanner::new(Config::load()?);
    let db = ScheduleDb::open()?;
    let summary = planner.plan(&db, &request, Utc::now())?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("Planned {}: {} blocks", summary.date, summary.blocks_created);
    println!("  workout: {}", summary.workout);
    println!("  lunch:   {} ({})", summary.lunch_label, summary.lunch);
    println!("  dinner:  {} ({})", summary.dinner_label, summary.dinner);
    if !summary.skipped_items.is_empty() {
        println!("  unscheduled items: {}", summary.skipped_items.join(", "));
    }
    if !summary.dropped_events.is_empty() {
        println!("  dropped events: {}", summary.dropped_events.join(", "));
    }
    if !summary.dropped_steps.is_empty() {
        println!("  dropped steps: {}", summary.dropped_steps.join(", "));
    }
    Ok(())
}
