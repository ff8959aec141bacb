//! Half-open interval overlap checks over day-local minutes.

use serde::{Deserialize, Serialize};

/// A `[start, end)` interval in minutes since local midnight of the plan date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: i64,
    pub end: i64,
}

impl Span {
    pub const fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    pub const fn starting_at(start: i64, minutes: i64) -> Self {
        Self {
            start,
            end: start + minutes,
        }
    }

    pub const fn minutes(&self) -> i64 {
        self.end - self.start
    }

    pub const fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && self.end > other.start
    }
}

/// Anything that occupies a span of the day.
pub trait Occupies {
    fn span(&self) -> Span;
}

impl Occupies for Span {
    fn span(&self) -> Span {
        *self
    }
}

/// True if `candidate` overlaps any placed interval. Linear scan.
pub fn conflicts<T: Occupies>(placed: &[T], candidate: Span) -> bool {
    placed.iter().any(|p| p.span().overlaps(&candidate))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touching_intervals_do_not_conflict() {
        let placed = [Span::new(60, 120)];
        assert!(!conflicts(&placed, Span::new(120, 180)));
        assert!(!conflicts(&placed, Span::new(0, 60)));
    }

    #[test]
    fn partial_and_containing_overlaps_conflict() {
        let placed = [Span::new(60, 120)];
        assert!(conflicts(&placed, Span::new(119, 130)));
        assert!(conflicts(&placed, Span::new(50, 61)));
        assert!(conflicts(&placed, Span::new(0, 300)));
        assert!(conflicts(&placed, Span::new(70, 80)));
    }

    #[test]
    fn empty_list_never_conflicts() {
        let placed: [Span; 0] = [];
        assert!(!conflicts(&placed, Span::new(0, 1440)));
    }
}
