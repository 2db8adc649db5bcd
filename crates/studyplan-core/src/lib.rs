//! # Studyplan Core Library
//!
//! Core scheduling engine for a personal academic planner. It turns a
//! snapshot of courses, tasks, and calendar events into a conflict-free set
//! of study blocks placed inside the user's daily study window. All
//! operations are available through a standalone CLI binary built on top of
//! this library.
//!
//! ## Architecture
//!
//! - **Estimator**: derives required effort hours and a scheduling window
//!   (bounded by a buffered soft deadline) for each task
//! - **Prioritizer**: orders pending tasks so urgent work claims calendar
//!   time first
//! - **Availability**: merges course sessions, events, and placed blocks
//!   into free gaps per day
//! - **Allocator**: greedily fills those gaps with bounded work sessions
//! - **Scheduler**: orchestrates a full run over every pending task
//! - **Storage**: SQLite persistence and TOML preferences
//!
//! ## Key Components
//!
//! - [`Scheduler`]: one scheduling run over a data snapshot
//! - [`PlannerDb`]: course, task, event, and block persistence
//! - [`Preferences`]: user scheduling preferences

pub mod allocator;
pub mod availability;
pub mod error;
pub mod estimate;
pub mod interval;
pub mod model;
pub mod prefs;
pub mod priority;
pub mod scheduler;
pub mod storage;

pub use allocator::{Allocator, BusySet};
pub use availability::Availability;
pub use error::{ConfigError, CoreError, DatabaseError, Result, ValidationError};
pub use estimate::{estimate, EffortEstimate};
pub use interval::{merge_intervals, subtract_busy, Interval};
pub use model::{
    BlockKind, Course, CourseSession, Event, EventKind, SessionKind, Task, TaskKind, TaskStatus,
    TimeBlock,
};
pub use prefs::Preferences;
pub use priority::prioritize;
pub use scheduler::{ScheduleOutcome, Scheduler, TaskSchedule, TaskScheduleSummary};
pub use storage::PlannerDb;
