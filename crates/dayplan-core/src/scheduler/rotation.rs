//! Label selection from history: workout cycle and meals.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::schedule::{HistoryEntry, Override};

/// Outcome of workout resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkoutChoice {
    Planned(String),
    Skipped,
}

impl WorkoutChoice {
    pub fn label(&self) -> Option<&str> {
        match self {
            WorkoutChoice::Planned(label) => Some(label),
            WorkoutChoice::Skipped => None,
        }
    }
}

impl fmt::Display for WorkoutChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label().unwrap_or("skip"))
    }
}

impl Serialize for WorkoutChoice {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Index of the cycle phase `label` belongs to.
///
/// A label belongs to the phase whose name is its longest case-insensitive
/// prefix, so "Legs (heavy)" maps to "Legs".
fn base_phase(label: &str, cycle: &[String]) -> Option<usize> {
    let label = label.trim().to_lowercase();
    cycle
        .iter()
        .enumerate()
        .filter(|(_, phase)| !phase.is_empty() && label.starts_with(&phase.to_lowercase()))
        .max_by_key(|(_, phase)| phase.len())
        .map(|(idx, _)| idx)
}

/// The phase after the most recent completed workout in `history`.
///
/// `history` is newest first. Without a completed, recognisable workout the
/// first phase is returned.
///
/// # Panics
/// Panics if `cycle` is empty; configuration validation rejects that.
pub fn next_workout(history: &[HistoryEntry], cycle: &[String]) -> String {
    let last = history
        .iter()
        .filter(|entry| entry.completed)
        .find_map(|entry| entry.workout.as_deref().filter(|w| !w.trim().is_empty()));

    let next_idx = match last.and_then(|label| base_phase(label, cycle)) {
        Some(idx) => (idx + 1) % cycle.len(),
        None => 0,
    };
    cycle[next_idx].clone()
}

/// Applies the request override on top of [`next_workout`].
pub fn resolve_workout(choice: &Override, history: &[HistoryEntry], cycle: &[String]) -> WorkoutChoice {
    match choice {
        Override::Explicit(label) => WorkoutChoice::Planned(label.clone()),
        Override::Skip => WorkoutChoice::Skipped,
        Override::Auto => WorkoutChoice::Planned(next_workout(history, cycle)),
    }
}

/// Explicit override verbatim, otherwise the generic label.
pub fn resolve_meal_label(choice: &Override, generic: &str) -> String {
    match choice.explicit() {
        Some(label) => label.to_string(),
        None => generic.to_string(),
    }
}

/// First menu entry not eaten in the last `avoid_days` history entries.
///
/// Falls back to the first entry when every option was eaten recently.
/// Returns `None` for an empty menu.
pub fn rotate_meal<'a>(
    menu: &[String],
    recent: impl IntoIterator<Item = &'a str>,
    avoid_days: usize,
) -> Option<String> {
    let recent: Vec<String> = recent
        .into_iter()
        .take(avoid_days)
        .map(|meal| meal.trim().to_lowercase())
        .collect();
    menu.iter()
        .find(|option| !recent.contains(&option.trim().to_lowercase()))
        .or_else(|| menu.first())
        .cloned()
}
