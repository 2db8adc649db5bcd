//! Task priority ordering.
//!
//! Tasks claim calendar time in priority order, so the ordering decides who
//! wins contested gaps. Urgency (days until due) is the primary key: a task
//! due strictly sooner is always scheduled before one due strictly later.
//! Ties are broken by an importance score combining exponential urgency
//! decay and difficulty, with exams weighted double.

use chrono::{DateTime, Utc};

use crate::model::{Task, TaskKind};

/// Exponential urgency decay: 1.0 when due now, ~0.37 a week out.
pub fn urgency(days_until_due: i64) -> f64 {
    (-(days_until_due.max(0) as f64) / 7.0).exp()
}

/// Importance from difficulty, doubled for exams.
pub fn importance(task: &Task) -> f64 {
    let base = task.difficulty_clamped() as f64 / 5.0;
    if task.kind == TaskKind::Exam {
        base * 2.0
    } else {
        base
    }
}

/// Composite score used only to break ties between equally-urgent tasks.
pub fn priority_score(task: &Task, now: DateTime<Utc>) -> f64 {
    let days = (task.due_date - now).num_days();
    urgency(days) * 0.7 + importance(task) * 0.3
}

/// Order non-completed tasks for scheduling: ascending days-until-due,
/// then descending score, then id for a deterministic total order.
pub fn prioritize<'a>(tasks: &'a [Task], now: DateTime<Utc>) -> Vec<&'a Task> {
    let mut pending: Vec<&Task> = tasks.iter().filter(|t| !t.is_completed()).collect();
    pending.sort_by(|a, b| {
        let days_a = (a.due_date - now).num_days();
        let days_b = (b.due_date - now).num_days();
        days_a
            .cmp(&days_b)
            .then_with(|| {
                priority_score(b, now)
                    .partial_cmp(&priority_score(a, now))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .then_with(|| a.id.cmp(&b.id))
    });
    pending
}
