//! Effort estimation: turns a task into required hours and a scheduling
//! window bounded by an internal soft deadline.
//!
//! Buffer policy is day-based: the per-kind buffer-day default (or the
//! task's explicit override) is subtracted from the due date to obtain the
//! soft deadline. Percentage buffers are intentionally not supported.

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::error::ValidationError;
use crate::model::Task;
use crate::prefs::Preferences;

/// The computed effort and scheduling window for one task.
#[derive(Debug, Clone)]
pub struct EffortEstimate {
    /// Total required effort, rounded to the nearest half hour.
    pub total_hours: f64,
    pub buffer_days: i64,
    /// Target completion time, `due_date - buffer_days`.
    pub soft_deadline: DateTime<Utc>,
    /// First date the allocator may place blocks on.
    pub window_start: NaiveDate,
    /// Last date the allocator may place blocks on (inclusive).
    pub window_end: NaiveDate,
}

impl EffortEstimate {
    pub fn total_minutes(&self) -> i64 {
        (self.total_hours * 60.0).round() as i64
    }
}

/// Estimate a task's required effort and scheduling window.
///
/// Returns `Ok(None)` when the due date has already passed: stale tasks are
/// a normal terminal state, not an error. A negative explicit estimate is a
/// malformed input and is rejected.
pub fn estimate(
    task: &Task,
    prefs: &Preferences,
    now: DateTime<Utc>,
) -> Result<Option<EffortEstimate>, ValidationError> {
    if task.estimated_hours < 0.0 {
        return Err(ValidationError::InvalidValue {
            field: "estimated_hours".to_string(),
            message: format!("negative effort ({}) for task {}", task.estimated_hours, task.id),
        });
    }

    if task.due_date <= now {
        return Ok(None);
    }

    let base_hours = if task.estimated_hours > 0.0 {
        task.estimated_hours
    } else {
        prefs.default_hours.for_kind(task.kind)
    };
    let raw = base_hours * prefs.difficulty_multiplier(task.difficulty_clamped());
    let total_hours = (raw * 2.0).round() / 2.0;

    let buffer_days = effective_buffer_days(task, prefs);
    let soft_deadline = task.due_date - Duration::days(buffer_days);

    let today = now.date_naive();
    let soft_date = soft_deadline.date_naive();

    // A soft deadline already behind us does not make the task hopeless:
    // collapse the window to [today, due date] instead.
    let window_end = if soft_date < today {
        task.due_date.date_naive()
    } else {
        soft_date
    };

    let days_needed = (total_hours / prefs.daily_max_hours).ceil().max(1.0) as i64;
    let ideal_start = window_end - Duration::days(days_needed);
    let window_start = ideal_start.max(today);

    Ok(Some(EffortEstimate {
        total_hours,
        buffer_days,
        soft_deadline,
        window_start,
        window_end,
    }))
}

/// Explicit task override wins; otherwise the per-kind default, halved
/// (minimum one day) for immovable deadlines where a large cushion would
/// waste the little room there is.
fn effective_buffer_days(task: &Task, prefs: &Preferences) -> i64 {
    if let Some(days) = task.buffer_days {
        return days.max(0);
    }
    let default = prefs.buffer_days.for_kind(task.kind);
    if task.is_hard_deadline {
        (default / 2).max(1)
    } else {
        default
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{TaskKind, TaskStatus};
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap()
    }

    fn make_task(kind: TaskKind, due_in_days: i64, difficulty: u8) -> Task {
        Task {
            id: "t1".to_string(),
            title: "Test".to_string(),
            kind,
            course_id: "c1".to_string(),
            due_date: fixed_now() + Duration::days(due_in_days),
            difficulty,
            estimated_hours: 0.0,
            is_hard_deadline: false,
            buffer_days: None,
            status: TaskStatus::NotStarted,
            description: None,
            created_at: fixed_now(),
        }
    }

    #[test]
    fn derives_hours_from_kind_and_difficulty() {
        let prefs = Preferences::default();
        let task = make_task(TaskKind::Exam, 10, 5);
        let est = estimate(&task, &prefs, fixed_now()).unwrap().unwrap();
        // base 10h for an exam, difficulty 5 doubles it
        assert_eq!(est.total_hours, 20.0);
    }

    #[test]
    fn explicit_estimate_overrides_kind_default() {
        let prefs = Preferences::default();
        let mut task = make_task(TaskKind::Reading, 5, 3);
        task.estimated_hours = 6.0;
        let est = estimate(&task, &prefs, fixed_now()).unwrap().unwrap();
        assert_eq!(est.total_hours, 6.0);
    }

    #[test]
    fn rounds_to_nearest_half_hour() {
        let prefs = Preferences::default();
        let mut task = make_task(TaskKind::Assignment, 5, 2);
        task.estimated_hours = 3.0; // 3.0 * 0.75 = 2.25 -> 2.5
        let est = estimate(&task, &prefs, fixed_now()).unwrap().unwrap();
        assert_eq!(est.total_hours, 2.5);
    }

    #[test]
    fn soft_deadline_uses_kind_buffer() {
        let prefs = Preferences::default();
        let task = make_task(TaskKind::Exam, 10, 3);
        let est = estimate(&task, &prefs, fixed_now()).unwrap().unwrap();
        assert_eq!(est.buffer_days, 7);
        assert_eq!(est.soft_deadline, task.due_date - Duration::days(7));
        assert_eq!(est.window_end, (fixed_now() + Duration::days(3)).date_naive());
    }

    #[test]
    fn hard_deadline_shrinks_default_buffer() {
        let prefs = Preferences::default();
        let mut task = make_task(TaskKind::Exam, 10, 3);
        task.is_hard_deadline = true;
        let est = estimate(&task, &prefs, fixed_now()).unwrap().unwrap();
        assert_eq!(est.buffer_days, 3);
    }

    #[test]
    fn explicit_buffer_wins_over_defaults() {
        let prefs = Preferences::default();
        let mut task = make_task(TaskKind::Exam, 10, 3);
        task.buffer_days = Some(1);
        task.is_hard_deadline = true;
        let est = estimate(&task, &prefs, fixed_now()).unwrap().unwrap();
        assert_eq!(est.buffer_days, 1);
    }

    #[test]
    fn past_soft_deadline_collapses_window_to_due_date() {
        let prefs = Preferences::default();
        // Due tomorrow, default assignment buffer of 3 days puts the soft
        // deadline in the past.
        let task = make_task(TaskKind::Assignment, 1, 3);
        let est = estimate(&task, &prefs, fixed_now()).unwrap().unwrap();
        assert!(est.soft_deadline < fixed_now());
        assert_eq!(est.window_start, fixed_now().date_naive());
        assert_eq!(est.window_end, task.due_date.date_naive());
    }

    #[test]
    fn overdue_task_is_not_schedulable() {
        let prefs = Preferences::default();
        let task = make_task(TaskKind::Assignment, -1, 3);
        assert!(estimate(&task, &prefs, fixed_now()).unwrap().is_none());
    }

    #[test]
    fn negative_effort_is_rejected() {
        let prefs = Preferences::default();
        let mut task = make_task(TaskKind::Assignment, 5, 3);
        task.estimated_hours = -2.0;
        assert!(estimate(&task, &prefs, fixed_now()).is_err());
    }

    #[test]
    fn window_start_never_precedes_today() {
        let prefs = Preferences::default();
        let mut task = make_task(TaskKind::Reading, 3, 1);
        task.estimated_hours = 1.0;
        let est = estimate(&task, &prefs, fixed_now()).unwrap().unwrap();
        assert!(est.window_start >= fixed_now().date_naive());
        assert!(est.window_start <= est.window_end);
    }
}
