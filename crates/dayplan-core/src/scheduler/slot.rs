//! First-fit slot search.

use super::conflict::{conflicts, Occupies, Span};

/// Default scan granularity in minutes.
pub const DEFAULT_STEP_MINUTES: i64 = 5;

/// Finds the earliest `duration`-minute span inside `[window_start, window_end)`
/// that overlaps nothing in `placed`.
///
/// Candidate starts are `window_start, window_start + step, ...` up to
/// `window_end - duration`. Earlier always wins; there is no best-fit pass.
pub fn find_slot<T: Occupies>(
    placed: &[T],
    duration: i64,
    window_start: i64,
    window_end: i64,
    step: i64,
) -> Option<Span> {
    if duration <= 0 || step <= 0 {
        return None;
    }
    let mut start = window_start;
    while start + duration <= window_end {
        let candidate = Span::starting_at(start, duration);
        if !conflicts(placed, candidate) {
            return Some(candidate);
        }
        start += step;
    }
    None
}
