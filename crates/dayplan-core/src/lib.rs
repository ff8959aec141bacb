//! # Dayplan Core Library
//!
//! This library provides the deterministic day planner behind the `dayplan`
//! CLI. Given a date, a backlog of work items, calendar events and recent
//! history, it lays out a non-overlapping day of blocks and stores it as the
//! schedule for that date, replacing any earlier plan.
//!
//! ## Architecture
//!
//! - **Clock**: day-local minutes ⇄ UTC timestamps under a pluggable offset policy
//! - **Scheduler**: skeleton, rituals and work overlay threaded through one
//!   [`ScheduleBuilder`](scheduler::ScheduleBuilder)
//! - **Storage**: SQLite-backed [`PlanStore`] and TOML-based configuration
//!
//! ## Key Components
//!
//! - [`DayPlanner`]: composes and commits a day
//! - [`ScheduleDb`]: work items, calendar events, history and blocks
//! - [`Config`]: planner configuration management

pub mod clock;
pub mod error;
pub mod schedule;
pub mod scheduler;
pub mod storage;

pub use clock::{Clock, FixedOffset, OffsetPolicy, SeasonalOffset};
pub use error::{ConfigError, DatabaseError, PlanError, ReplaceError, ValidationError};
pub use schedule::{
    Block, BlockDetail, BlockStatus, BlockType, FixedEvent, HistoryEntry, Override, PlanningRequest,
    RitualRule, WorkCategory, WorkItem, WorkStatus,
};
pub use scheduler::{ComposedDay, DayPlanner, PlanInputs, PlanSummary, WorkoutChoice};
pub use storage::{Config, PlanStore, ScheduleDb};
