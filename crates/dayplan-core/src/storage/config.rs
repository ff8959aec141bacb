//! TOML-based planner configuration.
//!
//! Holds every policy constant the engine uses:
//! - Clock season rule
//! - The daily spine (wake, deep work, workout, meals, evening chain, bedtime)
//! - The weekday-keyed fixed meeting table
//! - Work windows and overlay spacing
//! - Workout cycle and meal labels
//! - Optional user rituals
//!
//! Configuration is stored at `~/.config/dayplan/config.toml`.

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::clock::{hhmm, SeasonalOffset, MINUTES_PER_DAY};
use crate::error::ConfigError;
use crate::schedule::{BlockType, RitualRule, MIN_BLOCK_MINUTES};

/// One step of the evening chain, placed relative to dinner end.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChainStep {
    pub title: String,
    pub block_type: BlockType,
    pub offset_minutes: i64,
    pub minutes: i64,
}

impl ChainStep {
    fn new(title: &str, block_type: BlockType, offset_minutes: i64, minutes: i64) -> Self {
        Self {
            title: title.to_string(),
            block_type,
            offset_minutes,
            minutes,
        }
    }
}

/// A fixed entry in the weekday meeting table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FixedEntry {
    pub title: String,
    #[serde(with = "hhmm")]
    pub start: i64,
    pub minutes: i64,
    #[serde(default = "default_entry_type")]
    pub block_type: BlockType,
}

fn default_entry_type() -> BlockType {
    BlockType::Event
}

/// Weekday → ordered fixed entries.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct FixedEntryTable(pub HashMap<Weekday, Vec<FixedEntry>>);

impl FixedEntryTable {
    pub fn for_weekday(&self, weekday: Weekday) -> &[FixedEntry] {
        self.0.get(&weekday).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn insert(&mut self, weekday: Weekday, entry: FixedEntry) {
        self.0.entry(weekday).or_default().push(entry);
    }
}

/// A `[start, end)` window of the day.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Window {
    #[serde(with = "hhmm")]
    pub start: i64,
    #[serde(with = "hhmm")]
    pub end: i64,
}

impl Window {
    pub const fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }
}

/// The daily spine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DayConfig {
    #[serde(with = "hhmm", default = "default_wake")]
    pub wake: i64,
    #[serde(with = "hhmm", default = "default_bedtime")]
    pub bedtime: i64,
    #[serde(default = "default_micro_rituals")]
    pub micro_rituals: Vec<String>,
    #[serde(default = "default_micro_ritual_minutes")]
    pub micro_ritual_minutes: i64,
    #[serde(default = "default_deep_work_title")]
    pub deep_work_title: String,
    #[serde(with = "hhmm", default = "default_deep_work_start")]
    pub deep_work_start: i64,
    #[serde(default = "default_deep_work_minutes")]
    pub deep_work_minutes: i64,
    #[serde(with = "hhmm", default = "default_deep_work_latest_end")]
    pub deep_work_latest_end: i64,
    #[serde(with = "hhmm", default = "default_workout_start_workday")]
    pub workout_start_workday: i64,
    #[serde(with = "hhmm", default = "default_workout_start_rest_day")]
    pub workout_start_rest_day: i64,
    #[serde(default = "default_workout_minutes")]
    pub workout_minutes: i64,
    #[serde(default = "default_shower_minutes")]
    pub shower_minutes: i64,
    #[serde(with = "hhmm", default = "default_commute_out")]
    pub commute_out: i64,
    #[serde(with = "hhmm", default = "default_commute_home")]
    pub commute_home: i64,
    #[serde(default = "default_commute_minutes")]
    pub commute_minutes: i64,
    #[serde(with = "hhmm", default = "default_lunch_start")]
    pub lunch_start: i64,
    #[serde(default = "default_lunch_minutes")]
    pub lunch_minutes: i64,
    #[serde(default = "default_lunch_window")]
    pub lunch_window: Window,
    #[serde(with = "hhmm", default = "default_dinner_end")]
    pub dinner_end: i64,
    #[serde(default = "default_dinner_minutes")]
    pub dinner_minutes: i64,
    #[serde(default = "default_evening_chain")]
    pub evening_chain: Vec<ChainStep>,
    #[serde(default = "default_rest_days")]
    pub rest_days: Vec<Weekday>,
}

/// Work windows and overlay spacing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OverlayConfig {
    #[serde(default = "default_workday_windows")]
    pub workday_windows: Vec<Window>,
    #[serde(default = "default_rest_day_windows")]
    pub rest_day_windows: Vec<Window>,
    /// Gap left after each placed work item.
    #[serde(default = "default_gap_minutes")]
    pub gap_minutes: i64,
    /// Scan granularity of the slot finder.
    #[serde(default = "default_step_minutes")]
    pub step_minutes: i64,
}

/// Workout cycle, meal labels, and history depth.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RotationConfig {
    #[serde(default = "default_workout_cycle")]
    pub workout_cycle: Vec<String>,
    #[serde(default = "default_generic_lunch")]
    pub generic_lunch: String,
    #[serde(default = "default_generic_dinner")]
    pub generic_dinner: String,
    /// When non-empty, `auto` lunches rotate through this menu.
    #[serde(default)]
    pub lunch_menu: Vec<String>,
    #[serde(default)]
    pub dinner_menu: Vec<String>,
    #[serde(default = "default_avoid_repeat_days")]
    pub avoid_repeat_days: usize,
    /// How many days of history a planning run reads.
    #[serde(default = "default_history_days")]
    pub history_days: u32,
}

/// Planner configuration.
///
/// Serialized to/from TOML at `~/.config/dayplan/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub clock: SeasonalOffset,
    #[serde(default)]
    pub day: DayConfig,
    #[serde(default = "default_meetings")]
    pub meetings: FixedEntryTable,
    #[serde(default)]
    pub overlay: OverlayConfig,
    #[serde(default)]
    pub rotation: RotationConfig,
    #[serde(default)]
    pub rituals: Vec<RitualRule>,
}

// Default functions
fn default_wake() -> i64 {
    6 * 60
}
fn default_bedtime() -> i64 {
    21 * 60 + 30
}
fn default_micro_rituals() -> Vec<String> {
    vec!["Push-ups".into(), "Hygiene".into(), "Weigh-in".into()]
}
fn default_micro_ritual_minutes() -> i64 {
    2
}
fn default_deep_work_title() -> String {
    "Deep work".into()
}
fn default_deep_work_start() -> i64 {
    6 * 60 + 10
}
fn default_deep_work_minutes() -> i64 {
    120
}
fn default_deep_work_latest_end() -> i64 {
    12 * 60
}
fn default_workout_start_workday() -> i64 {
    8 * 60 + 15
}
fn default_workout_start_rest_day() -> i64 {
    9 * 60
}
fn default_workout_minutes() -> i64 {
    30
}
fn default_shower_minutes() -> i64 {
    10
}
fn default_commute_out() -> i64 {
    9 * 60
}
fn default_commute_home() -> i64 {
    17 * 60 + 30
}
fn default_commute_minutes() -> i64 {
    30
}
fn default_lunch_start() -> i64 {
    12 * 60 + 30
}
fn default_lunch_minutes() -> i64 {
    45
}
fn default_lunch_window() -> Window {
    Window::new(11 * 60 + 30, 14 * 60 + 30)
}
fn default_dinner_end() -> i64 {
    19 * 60 + 30
}
fn default_dinner_minutes() -> i64 {
    45
}
fn default_evening_chain() -> Vec<ChainStep> {
    vec![
        ChainStep::new("Evening walk", BlockType::Ritual, 0, 20),
        ChainStep::new("Reading", BlockType::Buffer, 20, 40),
        ChainStep::new("Mobility / yoga / meditation", BlockType::Ritual, 60, 20),
        ChainStep::new("Evening hygiene", BlockType::Ritual, 80, 10),
        ChainStep::new("Wind-down", BlockType::Buffer, 90, 30),
    ]
}
fn default_rest_days() -> Vec<Weekday> {
    vec![Weekday::Sat, Weekday::Sun]
}
fn default_meetings() -> FixedEntryTable {
    let mut table = FixedEntryTable::default();
    table.insert(
        Weekday::Mon,
        FixedEntry {
            title: "Team sync".into(),
            start: 10 * 60,
            minutes: 30,
            block_type: BlockType::Event,
        },
    );
    table.insert(
        Weekday::Tue,
        FixedEntry {
            title: "Mentoring 1:1".into(),
            start: 14 * 60,
            minutes: 30,
            block_type: BlockType::Event,
        },
    );
    table.insert(
        Weekday::Fri,
        FixedEntry {
            title: "Weekly review".into(),
            start: 16 * 60,
            minutes: 45,
            block_type: BlockType::Event,
        },
    );
    table
}
fn default_workday_windows() -> Vec<Window> {
    vec![
        Window::new(9 * 60 + 30, 12 * 60 + 30),
        Window::new(13 * 60 + 20, 17 * 60 + 30),
    ]
}
fn default_rest_day_windows() -> Vec<Window> {
    vec![Window::new(10 * 60, 18 * 60)]
}
fn default_gap_minutes() -> i64 {
    10
}
fn default_step_minutes() -> i64 {
    5
}
fn default_workout_cycle() -> Vec<String> {
    vec!["Push".into(), "Pull".into(), "Legs".into(), "Cardio".into()]
}
fn default_generic_lunch() -> String {
    "Lunch".into()
}
fn default_generic_dinner() -> String {
    "Dinner".into()
}
fn default_avoid_repeat_days() -> usize {
    3
}
fn default_history_days() -> u32 {
    7
}

impl Default for DayConfig {
    fn default() -> Self {
        Self {
            wake: default_wake(),
            bedtime: default_bedtime(),
            micro_rituals: default_micro_rituals(),
            micro_ritual_minutes: default_micro_ritual_minutes(),
            deep_work_title: default_deep_work_title(),
            deep_work_start: default_deep_work_start(),
            deep_work_minutes: default_deep_work_minutes(),
            deep_work_latest_end: default_deep_work_latest_end(),
            workout_start_workday: default_workout_start_workday(),
            workout_start_rest_day: default_workout_start_rest_day(),
            workout_minutes: default_workout_minutes(),
            shower_minutes: default_shower_minutes(),
            commute_out: default_commute_out(),
            commute_home: default_commute_home(),
            commute_minutes: default_commute_minutes(),
            lunch_start: default_lunch_start(),
            lunch_minutes: default_lunch_minutes(),
            lunch_window: default_lunch_window(),
            dinner_end: default_dinner_end(),
            dinner_minutes: default_dinner_minutes(),
            evening_chain: default_evening_chain(),
            rest_days: default_rest_days(),
        }
    }
}

impl DayConfig {
    pub fn is_rest_day(&self, weekday: Weekday) -> bool {
        self.rest_days.contains(&weekday)
    }
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            workday_windows: default_workday_windows(),
            rest_day_windows: default_rest_day_windows(),
            gap_minutes: default_gap_minutes(),
            step_minutes: default_step_minutes(),
        }
    }
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            workout_cycle: default_workout_cycle(),
            generic_lunch: default_generic_lunch(),
            generic_dinner: default_generic_dinner(),
            lunch_menu: Vec::new(),
            dinner_menu: Vec::new(),
            avoid_repeat_days: default_avoid_repeat_days(),
            history_days: default_history_days(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            clock: SeasonalOffset::default(),
            day: DayConfig::default(),
            meetings: default_meetings(),
            overlay: OverlayConfig::default(),
            rotation: RotationConfig::default(),
            rituals: Vec::new(),
        }
    }
}

fn invalid(key: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.into(),
    }
}

fn too_short(key: &str, minutes: i64) -> ConfigError {
    invalid(key, format!("{minutes} minutes is below the {MIN_BLOCK_MINUTES}-minute minimum block"))
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || invalid(key, "unknown config key");
        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() || key.is_empty() {
            return Err(invalid(key, "config key is empty"));
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_some() {
                current = current.get_mut(part).ok_or_else(unknown)?;
                continue;
            }

            let obj = current.as_object_mut().ok_or_else(unknown)?;
            let existing = obj.get(part).ok_or_else(unknown)?;
            let new_value = match existing {
                serde_json::Value::Bool(_) => serde_json::Value::Bool(
                    value
                        .parse::<bool>()
                        .map_err(|e| invalid(key, e.to_string()))?,
                ),
                serde_json::Value::Number(_) => {
                    let n = value
                        .parse::<i64>()
                        .map_err(|_| invalid(key, format!("cannot parse '{value}' as integer")))?;
                    serde_json::Value::Number(n.into())
                }
                serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                    serde_json::from_str(value).map_err(|e| invalid(key, e.to_string()))?
                }
                _ => serde_json::Value::String(value.into()),
            };
            obj.insert(part.to_string(), new_value);
            return Ok(());
        }

        Err(unknown())
    }

    /// Path of the config file inside the data directory.
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk, writing and returning the default if no file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed or is
    /// invalid, or if the default config cannot be written.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.clone(),
                    message: e.to_string(),
                })?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path,
                message: e.to_string(),
            }),
        }
    }

    /// Persist to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path()?;
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&path, content).map_err(|e| ConfigError::SaveFailed {
            path,
            message: e.to_string(),
        })
    }

    /// Load from disk, returning default on error.
    pub fn load_or_default() -> Self {
        match Self::load() {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!(error = %e, "falling back to default config");
                Self::default()
            }
        }
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a value by dot-separated key and validate the result.
    ///
    /// Does not save; call [`Config::save`] afterwards.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config =
            serde_json::from_value(json).map_err(|e| invalid(key, e.to_string()))?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Rejects configurations the engine cannot plan with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let day = &self.day;
        if !(0..MINUTES_PER_DAY).contains(&day.wake) || day.bedtime <= day.wake {
            return Err(invalid("day.bedtime", "bedtime must fall after wake on the same day"));
        }
        if self.rotation.workout_cycle.is_empty() {
            return Err(invalid("rotation.workout_cycle", "cycle needs at least one phase"));
        }
        if self.overlay.step_minutes <= 0 {
            return Err(invalid("overlay.step_minutes", "must be positive"));
        }
        if self.overlay.gap_minutes < 0 {
            return Err(invalid("overlay.gap_minutes", "must not be negative"));
        }
        for (key, windows) in [
            ("overlay.workday_windows", &self.overlay.workday_windows),
            ("overlay.rest_day_windows", &self.overlay.rest_day_windows),
        ] {
            if windows.iter().any(|w| w.end <= w.start) {
                return Err(invalid(key, "window end must be after start"));
            }
        }
        for (key, minutes) in [
            ("day.deep_work_minutes", day.deep_work_minutes),
            ("day.workout_minutes", day.workout_minutes),
            ("day.shower_minutes", day.shower_minutes),
            ("day.commute_minutes", day.commute_minutes),
            ("day.lunch_minutes", day.lunch_minutes),
            ("day.dinner_minutes", day.dinner_minutes),
        ] {
            if minutes < MIN_BLOCK_MINUTES {
                return Err(too_short(key, minutes));
            }
        }
        if day.micro_ritual_minutes <= 0 {
            return Err(invalid("day.micro_ritual_minutes", "must be positive"));
        }
        for step in &day.evening_chain {
            if step.minutes < MIN_BLOCK_MINUTES {
                return Err(too_short("day.evening_chain", step.minutes));
            }
            if step.offset_minutes < 0 {
                return Err(invalid(
                    "day.evening_chain",
                    format!("step '{}' starts before dinner ends", step.title),
                ));
            }
        }
        for (weekday, entries) in &self.meetings.0 {
            if let Some(entry) = entries.iter().find(|e| e.minutes < MIN_BLOCK_MINUTES) {
                return Err(invalid(
                    "meetings",
                    format!(
                        "'{}' on {weekday} lasts {} minutes, minimum is {MIN_BLOCK_MINUTES}",
                        entry.title, entry.minutes
                    ),
                ));
            }
        }
        for rule in &self.rituals {
            if rule.window_end <= rule.window_start || rule.duration_minutes <= 0 {
                return Err(invalid("rituals", format!("ritual '{}' has an empty window", rule.name)));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn times_are_written_as_hhmm() {
        let toml_str = toml::to_string_pretty(&Config::default()).unwrap();
        assert!(toml_str.contains("wake = \"06:00\""));
        assert!(toml_str.contains("bedtime = \"21:30\""));
    }

    #[test]
    fn partial_file_fills_defaults() {
        let cfg: Config = toml::from_str(
            r#"
            [day]
            wake = "05:30"

            [meetings]
            Wed = [{ title = "Standup", start = "09:45", minutes = 15 }]
            "#,
        )
        .unwrap();
        assert_eq!(cfg.day.wake, 330);
        assert_eq!(cfg.day.bedtime, default_bedtime());
        assert_eq!(cfg.meetings.for_weekday(Weekday::Wed)[0].start, 585);
        assert!(cfg.meetings.for_weekday(Weekday::Mon).is_empty());
        assert_eq!(cfg.rotation.workout_cycle.len(), 4);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("day.wake").as_deref(), Some("06:00"));
        assert_eq!(cfg.get("overlay.gap_minutes").as_deref(), Some("10"));
        assert!(cfg.get("day.missing_key").is_none());
    }

    #[test]
    fn set_updates_nested_values() {
        let mut cfg = Config::default();
        cfg.set("overlay.gap_minutes", "15").unwrap();
        cfg.set("day.bedtime", "22:15").unwrap();
        cfg.set("rotation.generic_lunch", "Midday meal").unwrap();
        assert_eq!(cfg.overlay.gap_minutes, 15);
        assert_eq!(cfg.day.bedtime, 22 * 60 + 15);
        assert_eq!(cfg.rotation.generic_lunch, "Midday meal");
    }

    #[test]
    fn set_accepts_json_for_lists() {
        let mut cfg = Config::default();
        cfg.set("rotation.workout_cycle", r#"["A","B"]"#).unwrap();
        assert_eq!(cfg.rotation.workout_cycle, vec!["A", "B"]);
    }

    #[test]
    fn set_rejects_unknown_key() {
        let mut cfg = Config::default();
        assert!(cfg.set("day.nonexistent", "1").is_err());
    }

    #[test]
    fn set_rejects_malformed_time() {
        let mut cfg = Config::default();
        assert!(cfg.set("day.wake", "quarter past six").is_err());
        assert_eq!(cfg.day.wake, default_wake());
    }

    #[test]
    fn set_rejects_values_that_fail_validation() {
        let mut cfg = Config::default();
        assert!(cfg.set("rotation.workout_cycle", "[]").is_err());
        assert!(cfg.set("overlay.step_minutes", "0").is_err());
    }

    #[test]
    fn set_rejects_spine_durations_below_minimum_block() {
        let mut cfg = Config::default();
        assert!(cfg.set("day.shower_minutes", "0").is_err());
        assert!(cfg.set("day.lunch_minutes", "4").is_err());
        assert!(cfg.set("day.micro_ritual_minutes", "0").is_err());
        assert_eq!(cfg.day.shower_minutes, default_shower_minutes());
        assert!(cfg.set("day.lunch_minutes", "5").is_ok());
    }

    #[test]
    fn validate_rejects_short_meetings_and_bad_chain_steps() {
        let cfg: Config = toml::from_str(
            r#"
            [meetings]
            Mon = [{ title = "Standup", start = "10:00", minutes = 3 }]
            "#,
        )
        .unwrap();
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("Standup"));

        let mut cfg = Config::default();
        cfg.day.evening_chain[0].minutes = 2;
        assert!(cfg.validate().is_err());

        let mut cfg = Config::default();
        cfg.day.evening_chain[1].offset_minutes = -10;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }
}
