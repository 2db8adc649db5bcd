//! Planner data model: courses, tasks, calendar events, and time blocks.
//!
//! Tasks and courses/events are owned by the caller (forms, importers); the
//! scheduling engine reads them and produces [`TimeBlock`]s. Date fields
//! deserialize defensively: an unparsable due date falls back to two weeks
//! out instead of failing the whole document.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Kind of academic work. Drives default effort hours, buffer days, and
/// preferred time-of-day periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    Assignment,
    Exam,
    Project,
    Reading,
    Lab,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Assignment => "assignment",
            Self::Exam => "exam",
            Self::Project => "project",
            Self::Reading => "reading",
            Self::Lab => "lab",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "exam" => Self::Exam,
            "project" => Self::Project,
            "reading" => Self::Reading,
            "lab" => Self::Lab,
            _ => Self::Assignment,
        }
    }

    /// Exams and projects benefit most from high-energy days; the
    /// orchestrator warns when they land on a low-energy one.
    pub fn is_high_energy(&self) -> bool {
        matches!(self, Self::Exam | Self::Project)
    }
}

/// Completion status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    NotStarted,
    InProgress,
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "not-started",
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "in-progress" => Self::InProgress,
            "completed" => Self::Completed,
            _ => Self::NotStarted,
        }
    }
}

/// A unit of academic work with a hard deadline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub kind: TaskKind,
    pub course_id: String,
    /// Hard deadline. Assumed stable within a scheduling run.
    #[serde(deserialize_with = "deserialize_due_date")]
    pub due_date: DateTime<Utc>,
    /// Ordinal 1..=5, applied as a multiplier over base effort hours.
    pub difficulty: u8,
    /// Explicit effort override; 0 means "derive from kind and difficulty".
    #[serde(default)]
    pub estimated_hours: f64,
    #[serde(default)]
    pub is_hard_deadline: bool,
    /// Days before the due date the work should be finished. Falls back to
    /// the per-kind preference default when absent.
    #[serde(default)]
    pub buffer_days: Option<i64>,
    pub status: TaskStatus,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Task {
    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }

    /// Difficulty clamped to the valid 1..=5 range.
    pub fn difficulty_clamped(&self) -> u8 {
        self.difficulty.clamp(1, 5)
    }
}

/// Kind tag for a placed work session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Study,
    Review,
    Work,
}

impl BlockKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Study => "study",
            Self::Review => "review",
            Self::Work => "work",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "review" => Self::Review,
            "work" => Self::Work,
            _ => Self::Study,
        }
    }
}

/// A placed work session on the calendar.
///
/// Blocks with `is_manual = true` were placed by the user and are never
/// cleared or moved by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeBlock {
    pub id: String,
    pub task_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub completed: bool,
    pub kind: BlockKind,
    #[serde(default)]
    pub is_manual: bool,
}

impl TimeBlock {
    /// Create an engine-generated block. Callers guarantee `end > start`;
    /// the allocator never materializes a block below the minimum session
    /// length, so a violation here is an allocator bug.
    pub fn generated(
        task_id: &str,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        kind: BlockKind,
    ) -> Self {
        debug_assert!(end_time > start_time, "generated block with end <= start");
        Self {
            id: Uuid::new_v4().to_string(),
            task_id: task_id.to_string(),
            start_time,
            end_time,
            completed: false,
            kind,
            is_manual: false,
        }
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end_time - self.start_time).num_minutes()
    }
}

/// Kind of recurring course session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionKind {
    Lecture,
    Lab,
    Tutorial,
    OfficeHours,
}

/// A weekly recurring slot owned by a course (e.g. "lecture, Tue
/// 14:30-15:45"). Always a busy interval on matching days.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseSession {
    /// 0 = Sunday .. 6 = Saturday
    pub day_of_week: u8,
    /// HH:mm
    pub start_time: String,
    /// HH:mm
    pub end_time: String,
    pub kind: SessionKind,
    #[serde(default)]
    pub room: Option<String>,
}

/// A course with its recurring weekly schedule. Read-only input to the
/// engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub id: String,
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub credits: u32,
    #[serde(default)]
    pub sessions: Vec<CourseSession>,
}

/// Kind of one-off calendar item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Lecture,
    Clinical,
    Lab,
    Exam,
    Simulation,
    Review,
    Deadline,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lecture => "lecture",
            Self::Clinical => "clinical",
            Self::Lab => "lab",
            Self::Exam => "exam",
            Self::Simulation => "simulation",
            Self::Review => "review",
            Self::Deadline => "deadline",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "clinical" => Self::Clinical,
            "lab" => Self::Lab,
            "exam" => Self::Exam,
            "simulation" => Self::Simulation,
            "review" => Self::Review,
            "deadline" => Self::Deadline,
            _ => Self::Lecture,
        }
    }
}

/// A one-off calendar item. Read-only input to the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub title: String,
    pub kind: EventKind,
    #[serde(default)]
    pub course_id: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub location: Option<String>,
    /// Set on deadline markers created for a task.
    #[serde(default)]
    pub task_id: Option<String>,
}

impl Event {
    /// Deadline events are visual markers at the due date, never busy time.
    pub fn blocks_time(&self) -> bool {
        self.kind != EventKind::Deadline
    }

    /// Clinical days are immovable full-day commitments: the whole date is
    /// treated as busy rather than computing partial gaps around them.
    pub fn occupies_full_day(&self) -> bool {
        self.kind == EventKind::Clinical
    }
}

/// Parse a datetime from RFC3339, or a bare `YYYY-MM-DD` date (midnight).
pub fn parse_datetime_flexible(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|ndt| DateTime::from_naive_utc_and_offset(ndt, Utc))
}

/// Parse a datetime from an RFC3339 string with fallback to current time.
pub fn parse_datetime_fallback(s: &str) -> DateTime<Utc> {
    parse_datetime_flexible(s).unwrap_or_else(Utc::now)
}

// Due dates arrive from external collaborators as either timestamps or
// ISO-8601 strings. A single malformed task must not abort loading the
// whole snapshot: fall back to "due in two weeks" and warn.
fn deserialize_due_date<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Parsed(DateTime<Utc>),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Parsed(dt) => Ok(dt),
        Raw::Text(s) => Ok(parse_datetime_flexible(&s).unwrap_or_else(|| {
            tracing::warn!(value = %s, "unparsable due date, defaulting to two weeks out");
            Utc::now() + Duration::days(14)
        })),
    }
}
