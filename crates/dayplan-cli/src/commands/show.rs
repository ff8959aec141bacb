use clap::Args;
use dayplan_core::clock::format_minute;
use dayplan_core::ScheduleDb;

use super::{configured_clock, date_or_today};

#[derive(Args)]
pub struct ShowArgs {
    /// Date to show (YYYY-MM-DD, default: today)
    #[arg(long)]
    date: Option<String>,
    /// Print blocks as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(args: ShowArgs) -> Result<(), Box<dyn std::error::Error>> {
    let clock = configured_clock();
    let date = date_or_today(args.date.as_deref(), &clock)?;
    let (start, end) = clock.day_bounds(date);
    let blocks = ScheduleDb::open()?.list_blocks(start, end)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&blocks)?);
        return Ok(());
    }
    if blocks.is_empty() {
        println!("No schedule for {date}");
        return Ok(());
    }

    println!("Schedule for {date}");
    for block in &blocks {
        println!(
            "  {}-{}  {:<8} {}",
            format_minute(clock.local_minute(date, block.start_time)),
            format_minute(clock.local_minute(date, block.end_time)),
            block.block_type.as_str(),
            block.title
        );
    }
    Ok(())
}
