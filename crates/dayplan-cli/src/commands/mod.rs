pub mod config;
pub mod event;
pub mod history;
pub mod item;
pub mod plan;
pub mod show;

use chrono::{NaiveDate, Utc};
use dayplan_core::{Clock, Config, ValidationError};

/// Parses a `YYYY-MM-DD` argument, defaulting to today's local date.
pub fn date_or_today(raw: Option<&str>, clock: &Clock) -> Result<NaiveDate, ValidationError> {
    match raw {
        Some(raw) => parse_date(raw),
        None => Ok(clock.local_date(Utc::now())),
    }
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|e| ValidationError::InvalidValue {
        field: "date".into(),
        message: format!("'{raw}' is not a YYYY-MM-DD date: {e}"),
    })
}

/// Clock built from the stored configuration.
pub fn configured_clock() -> Clock {
    Clock::new(Config::load_or_default().clock)
}
