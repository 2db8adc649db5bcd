//! Scheduling orchestrator: wires the estimator, prioritizer, availability
//! calculator and allocator into per-task and whole-plan runs.
//!
//! A `Scheduler` owns the busy accumulator for one run. Tasks scheduled
//! through the same instance see each other's placements, which is what
//! makes a full `reschedule_all` conflict-free. Persistence stays with the
//! caller: the scheduler consumes a snapshot and returns blocks.

use chrono::{DateTime, Duration, Utc};

use crate::allocator::{Allocator, BusySet};
use crate::availability::Availability;
use crate::error::Result;
use crate::estimate::{estimate, EffortEstimate};
use crate::interval::Interval;
use crate::model::{BlockKind, Course, Event, Task, TaskKind, TimeBlock};
use crate::prefs::Preferences;
use crate::priority::prioritize;

/// Per-task result of a run, for reporting shortfalls to the user.
#[derive(Debug, Clone)]
pub struct TaskScheduleSummary {
    pub task_id: String,
    pub title: String,
    /// Required effort from the estimate, hours.
    pub required_hours: f64,
    /// Study hours actually placed (review sessions not included).
    pub scheduled_hours: f64,
    pub block_count: usize,
}

impl TaskScheduleSummary {
    /// Hours the window could not hold. Zero means fully scheduled.
    pub fn shortfall_hours(&self) -> f64 {
        (self.required_hours - self.scheduled_hours).max(0.0)
    }
}

/// Blocks placed for one task, with the summary when the task was
/// schedulable at all.
#[derive(Debug, Clone)]
pub struct TaskSchedule {
    pub blocks: Vec<TimeBlock>,
    pub summary: Option<TaskScheduleSummary>,
}

impl TaskSchedule {
    fn skipped() -> Self {
        Self { blocks: Vec::new(), summary: None }
    }
}

/// Result of a whole-plan run.
#[derive(Debug, Clone, Default)]
pub struct ScheduleOutcome {
    pub blocks: Vec<TimeBlock>,
    pub summaries: Vec<TaskScheduleSummary>,
    /// Task ids whose scheduling failed validation. Their old blocks should
    /// be left untouched by the caller.
    pub failed_task_ids: Vec<String>,
}

impl ScheduleOutcome {
    pub fn total_scheduled_hours(&self) -> f64 {
        self.blocks
            .iter()
            .map(|b| b.duration_minutes() as f64 / 60.0)
            .sum()
    }
}

/// One scheduling run over a snapshot of courses and events.
pub struct Scheduler<'a> {
    prefs: &'a Preferences,
    availability: Availability<'a>,
    allocator: Allocator<'a>,
    busy: BusySet,
    now: DateTime<Utc>,
}

impl<'a> Scheduler<'a> {
    /// Build a scheduler for a snapshot, validating preferences up front so
    /// a malformed study window fails the run before any task is touched.
    pub fn new(
        courses: &'a [Course],
        events: &'a [Event],
        prefs: &'a Preferences,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let availability = Availability::new(courses, events, prefs);
        availability.validate()?;
        Ok(Self {
            prefs,
            availability,
            allocator: Allocator::new(prefs),
            busy: BusySet::new(),
            now,
        })
    }

    /// Seed the run with blocks that must be scheduled around but were not
    /// produced by it, e.g. the user's manual blocks.
    pub fn reserve(&mut self, blocks: &[TimeBlock]) {
        for block in blocks {
            if let Some(iv) = Interval::new(block.start_time, block.end_time) {
                self.busy.add_existing(iv);
            }
        }
    }

    /// Schedule a single task into the run.
    ///
    /// Completed and overdue tasks are quietly skipped. Exams additionally
    /// get short review sessions on the days leading up to the exam.
    pub fn schedule_task(&mut self, task: &Task) -> Result<TaskSchedule> {
        if task.is_completed() {
            tracing::debug!(task = %task.title, "skipping completed task");
            return Ok(TaskSchedule::skipped());
        }

        let est = match estimate(task, self.prefs, self.now)? {
            Some(est) => est,
            None => {
                tracing::debug!(task = %task.title, due = %task.due_date, "skipping overdue task");
                return Ok(TaskSchedule::skipped());
            }
        };
        if est.total_minutes() < self.prefs.min_session_minutes as i64 {
            tracing::debug!(task = %task.title, "estimate below the minimum session, nothing to place");
            return Ok(TaskSchedule::skipped());
        }

        let mut blocks =
            self.allocator
                .allocate(task, &est, &self.availability, &mut self.busy, self.now);

        let scheduled_minutes: i64 = blocks.iter().map(|b| b.duration_minutes()).sum();
        if scheduled_minutes < est.total_minutes() {
            tracing::warn!(
                task = %task.title,
                required_hours = est.total_hours,
                scheduled_hours = scheduled_minutes as f64 / 60.0,
                "window too tight, task is under-scheduled"
            );
        }

        if task.kind == TaskKind::Exam {
            blocks.extend(self.place_review_sessions(task, &est));
        }

        let summary = TaskScheduleSummary {
            task_id: task.id.clone(),
            title: task.title.clone(),
            required_hours: est.total_hours,
            scheduled_hours: scheduled_minutes as f64 / 60.0,
            block_count: blocks.len(),
        };
        Ok(TaskSchedule { blocks, summary: Some(summary) })
    }

    /// Schedule every pending task in priority order.
    ///
    /// A task that fails validation is logged and skipped so one bad record
    /// never takes down the whole plan.
    pub fn reschedule_all(&mut self, tasks: &[Task]) -> ScheduleOutcome {
        let mut outcome = ScheduleOutcome::default();
        for task in prioritize(tasks, self.now) {
            match self.schedule_task(task) {
                Ok(schedule) => {
                    outcome.blocks.extend(schedule.blocks);
                    if let Some(summary) = schedule.summary {
                        outcome.summaries.push(summary);
                    }
                }
                Err(e) => {
                    tracing::warn!(task = %task.title, error = %e, "skipping unschedulable task");
                    outcome.failed_task_ids.push(task.id.clone());
                }
            }
        }
        tracing::info!(
            tasks = outcome.summaries.len(),
            blocks = outcome.blocks.len(),
            hours = outcome.total_scheduled_hours(),
            "scheduling run finished"
        );
        outcome
    }

    /// Short refresh sessions on the `review_days` days before an exam,
    /// placed on top of the regular study plan and exempt from the daily
    /// effort cap.
    fn place_review_sessions(&mut self, task: &Task, est: &EffortEstimate) -> Vec<TimeBlock> {
        let review_minutes = (self.prefs.review_hours * 60.0).round() as i64;
        if review_minutes < self.prefs.min_session_minutes as i64 {
            return Vec::new();
        }

        let today = self.now.date_naive();
        let due_date = task.due_date.date_naive();
        let order = self.allocator.review_period_order();
        let mut blocks = Vec::new();

        for offset in 1..=self.prefs.review_days {
            let date = due_date - Duration::days(offset);
            if date < today || date < est.window_start {
                continue;
            }
            let placed = self.allocator.place_block(
                &task.id,
                date,
                review_minutes,
                &order,
                BlockKind::Review,
                &self.availability,
                &mut self.busy,
                self.now,
                task.due_date,
            );
            match placed {
                Some(block) => blocks.push(block),
                None => tracing::debug!(task = %task.title, date = %date, "no room for a review session"),
            }
        }

        blocks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TaskStatus;
    use chrono::TimeZone;

    // 2026-03-02 is a Monday.
    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap()
    }

    fn make_task(id: &str, kind: TaskKind, due_in_days: i64, hours: f64) -> Task {
        Task {
            id: id.to_string(),
            title: format!("Task {id}"),
            kind,
            course_id: "c1".to_string(),
            due_date: fixed_now() + Duration::days(due_in_days),
            difficulty: 3,
            estimated_hours: hours,
            is_hard_deadline: false,
            buffer_days: Some(1),
            status: TaskStatus::NotStarted,
            description: None,
            created_at: fixed_now(),
        }
    }

    fn overlapping(a: &TimeBlock, b: &TimeBlock) -> bool {
        a.start_time < b.end_time && b.start_time < a.end_time
    }

    #[test]
    fn completed_task_produces_no_blocks() {
        let prefs = Preferences::default();
        let mut scheduler = Scheduler::new(&[], &[], &prefs, fixed_now()).unwrap();
        let mut task = make_task("t1", TaskKind::Assignment, 5, 3.0);
        task.status = TaskStatus::Completed;
        let schedule = scheduler.schedule_task(&task).unwrap();
        assert!(schedule.blocks.is_empty());
        assert!(schedule.summary.is_none());
    }

    #[test]
    fn exam_gets_review_sessions_before_the_due_date() {
        let prefs = Preferences::default();
        let mut scheduler = Scheduler::new(&[], &[], &prefs, fixed_now()).unwrap();
        let task = make_task("exam", TaskKind::Exam, 8, 4.0);
        let schedule = scheduler.schedule_task(&task).unwrap();

        let reviews: Vec<_> = schedule
            .blocks
            .iter()
            .filter(|b| b.kind == BlockKind::Review)
            .collect();
        assert_eq!(reviews.len(), prefs.review_days as usize);
        for review in &reviews {
            assert!(review.end_time <= task.due_date);
            assert!(review.start_time.date_naive() >= task.due_date.date_naive() - Duration::days(prefs.review_days));
        }
    }

    #[test]
    fn blocks_from_different_tasks_never_overlap() {
        let prefs = Preferences::default();
        let mut scheduler = Scheduler::new(&[], &[], &prefs, fixed_now()).unwrap();
        let tasks = vec![
            make_task("a", TaskKind::Exam, 6, 8.0),
            make_task("b", TaskKind::Assignment, 6, 6.0),
            make_task("c", TaskKind::Reading, 6, 4.0),
        ];
        let outcome = scheduler.reschedule_all(&tasks);

        assert!(!outcome.blocks.is_empty());
        for (i, a) in outcome.blocks.iter().enumerate() {
            for b in &outcome.blocks[i + 1..] {
                assert!(!overlapping(a, b), "{:?} overlaps {:?}", a, b);
            }
        }
    }

    #[test]
    fn one_invalid_task_does_not_abort_the_run() {
        let prefs = Preferences::default();
        let mut scheduler = Scheduler::new(&[], &[], &prefs, fixed_now()).unwrap();
        let mut bad = make_task("bad", TaskKind::Assignment, 5, 3.0);
        bad.estimated_hours = -1.0;
        let good = make_task("good", TaskKind::Reading, 5, 2.0);
        let outcome = scheduler.reschedule_all(&[bad, good]);

        assert_eq!(outcome.failed_task_ids, vec!["bad".to_string()]);
        assert_eq!(outcome.summaries.len(), 1);
        assert_eq!(outcome.summaries[0].task_id, "good");
        assert!(outcome.blocks.iter().all(|b| b.task_id == "good"));
    }

    #[test]
    fn manual_blocks_are_scheduled_around() {
        let prefs = Preferences::default();
        let mut scheduler = Scheduler::new(&[], &[], &prefs, fixed_now()).unwrap();

        let mut manual = TimeBlock::generated(
            "other",
            fixed_now() + Duration::hours(2),
            fixed_now() + Duration::hours(8),
            BlockKind::Study,
        );
        manual.is_manual = true;
        scheduler.reserve(std::slice::from_ref(&manual));

        let task = make_task("t1", TaskKind::Assignment, 2, 4.0);
        let schedule = scheduler.schedule_task(&task).unwrap();
        for block in &schedule.blocks {
            assert!(!overlapping(block, &manual));
        }
    }

    #[test]
    fn runs_are_deterministic_for_a_fixed_clock() {
        let prefs = Preferences::default();
        let tasks = vec![
            make_task("a", TaskKind::Exam, 7, 6.0),
            make_task("b", TaskKind::Project, 10, 8.0),
        ];

        let shape = |outcome: &ScheduleOutcome| -> Vec<(String, DateTime<Utc>, DateTime<Utc>)> {
            outcome
                .blocks
                .iter()
                .map(|b| (b.task_id.clone(), b.start_time, b.end_time))
                .collect()
        };

        let mut first = Scheduler::new(&[], &[], &prefs, fixed_now()).unwrap();
        let mut second = Scheduler::new(&[], &[], &prefs, fixed_now()).unwrap();
        assert_eq!(
            shape(&first.reschedule_all(&tasks)),
            shape(&second.reschedule_all(&tasks))
        );
    }

    #[test]
    fn summary_reports_shortfall_for_tight_windows() {
        let mut prefs = Preferences::default();
        prefs.daily_max_hours = 2.0;
        let mut scheduler = Scheduler::new(&[], &[], &prefs, fixed_now()).unwrap();
        // Ten hours due in two days cannot fit under a two-hour cap.
        let task = make_task("t1", TaskKind::Assignment, 2, 10.0);
        let schedule = scheduler.schedule_task(&task).unwrap();
        let summary = schedule.summary.unwrap();
        assert!(summary.shortfall_hours() > 0.0);
        assert!(summary.scheduled_hours > 0.0);
    }

    #[test]
    fn invalid_study_window_fails_construction() {
        let mut prefs = Preferences::default();
        prefs.study_window.start = "22:00".to_string();
        prefs.study_window.end = "09:00".to_string();
        assert!(Scheduler::new(&[], &[], &prefs, fixed_now()).is_err());
    }
}
