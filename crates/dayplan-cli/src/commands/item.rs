//! Work item backlog commands for CLI.

use clap::Subcommand;
use dayplan_core::{ScheduleDb, ValidationError, WorkCategory, WorkItem, WorkStatus};

#[derive(Subcommand)]
pub enum ItemAction {
    /// Add a work item
    Add {
        /// Item title
        title: String,
        /// Item description
        #[arg(long)]
        description: Option<String>,
        /// Estimated minutes (default: 30)
        #[arg(long)]
        minutes: Option<i64>,
        /// Minimum block length in minutes, used when no estimate is given
        #[arg(long)]
        min_block: Option<i64>,
        /// Category: business or personal (default: business)
        #[arg(long, default_value = "business")]
        category: String,
        /// Priority, higher first (default: 0)
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        priority: i32,
    },
    /// List work items
    List {
        /// Include done items
        #[arg(long)]
        all: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Mark a work item done
    Done {
        /// Item ID
        id: String,
    },
}

pub fn run(action: ItemAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = ScheduleDb::open()?;

    match action {
        ItemAction::Add {
            title,
            description,
            minutes,
            min_block,
            category,
            priority,
        } => {
            let category = WorkCategory::parse(&category).ok_or_else(|| ValidationError::InvalidValue {
                field: "category".into(),
                message: format!("'{category}' is not business or personal"),
            })?;
            for (field, value) in [("minutes", minutes), ("min_block", min_block)] {
                if value.is_some_and(|m| m <= 0) {
                    return Err(ValidationError::InvalidValue {
                        field: field.into(),
                        message: "must be positive".into(),
                    }
                    .into());
                }
            }
            let mut item = WorkItem::new(title, category);
            item.description = description;
            item.estimated_minutes = minutes;
            item.min_block_minutes = min_block;
            item.priority = priority;
            db.create_work_item(&item)?;
            println!("Item created: {}", item.id);
        }
        ItemAction::List { all, json } => {
            let status = if all { None } else { Some(WorkStatus::Open) };
            let items = db.list_work_items(status)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&items)?);
            } else if items.is_empty() {
                println!("No work items");
            } else {
                for item in &items {
                    println!(
                        "{}  [{}] p{} {}m  {}",
                        item.id,
                        item.category.as_str(),
                        item.priority,
                        item.planned_minutes(),
                        item.title
                    );
                }
            }
        }
        ItemAction::Done { id } => {
            if db.set_work_item_status(&id, WorkStatus::Done)? {
                println!("Item done: {id}");
            } else {
                return Err(format!("work item not found: {id}").into());
            }
        }
    }
    Ok(())
}
