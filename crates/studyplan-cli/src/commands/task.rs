//! Task management commands for CLI.

use chrono::{DateTime, NaiveDate, Utc};
use clap::Subcommand;
use studyplan_core::{
    model::parse_datetime_flexible, Event, EventKind, PlannerDb, Preferences, Scheduler, Task,
    TaskKind, TaskStatus, TimeBlock,
};
use uuid::Uuid;

#[derive(Subcommand)]
pub enum TaskAction {
    /// Create a new task and schedule study blocks for it
    Add {
        /// Task title
        title: String,
        /// Course ID the task belongs to
        #[arg(long)]
        course: String,
        /// Task kind: assignment, exam, project, reading, or lab
        #[arg(long, default_value = "assignment")]
        kind: String,
        /// Due date, "YYYY-MM-DD" (end of day) or RFC3339
        #[arg(long)]
        due: String,
        /// Difficulty rating 1..=5
        #[arg(long, default_value = "3")]
        difficulty: u8,
        /// Estimated effort hours (defaults per kind when omitted)
        #[arg(long)]
        hours: Option<f64>,
        /// Immovable deadline (shrinks the completion buffer)
        #[arg(long)]
        hard: bool,
        /// Override the buffer days before the due date
        #[arg(long)]
        buffer_days: Option<i64>,
        /// Task description
        #[arg(long)]
        description: Option<String>,
    },
    /// List tasks
    List {
        /// Filter by course ID
        #[arg(long)]
        course: Option<String>,
        /// Filter by status (not-started, in-progress, completed)
        #[arg(long)]
        status: Option<String>,
    },
    /// Get task details
    Get {
        /// Task ID
        id: String,
    },
    /// Mark a task completed
    Complete {
        /// Task ID
        id: String,
    },
    /// Delete a task, its blocks, and its deadline marker
    Delete {
        /// Task ID
        id: String,
    },
}

/// Parse a due date: RFC3339 as-is, a bare date as end of that day.
fn parse_due(s: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        let eod = date.and_hms_opt(23, 59, 0).expect("valid clock time");
        return Ok(DateTime::from_naive_utc_and_offset(eod, Utc));
    }
    parse_datetime_flexible(s).ok_or_else(|| format!("invalid due date: {s:?}"))
}

/// Marker event pinned at the due date so the deadline shows on the
/// calendar without blocking study time.
fn deadline_event(task: &Task) -> Event {
    Event {
        id: Uuid::new_v4().to_string(),
        title: format!("DUE: {}", task.title),
        kind: EventKind::Deadline,
        course_id: Some(task.course_id.clone()),
        start_time: task.due_date,
        end_time: task.due_date,
        location: None,
        task_id: Some(task.id.clone()),
    }
}

/// Schedule blocks for one task against the stored snapshot and persist
/// them, leaving every other task's blocks alone.
fn schedule_one(db: &mut PlannerDb, task: &Task) -> Result<Vec<TimeBlock>, Box<dyn std::error::Error>> {
    let prefs = Preferences::load()?;
    let courses = db.list_courses()?;
    let events = db.list_events()?;
    let existing: Vec<TimeBlock> = db
        .list_blocks()?
        .into_iter()
        .filter(|b| b.task_id != task.id || b.is_manual)
        .collect();

    let mut scheduler = Scheduler::new(&courses, &events, &prefs, Utc::now())?;
    scheduler.reserve(&existing);
    let schedule = scheduler.schedule_task(task)?;
    db.replace_task_blocks(&task.id, &schedule.blocks)?;

    if let Some(summary) = &schedule.summary {
        if summary.shortfall_hours() > 0.0 {
            eprintln!(
                "warning: only {:.1}h of {:.1}h fit before the deadline",
                summary.scheduled_hours, summary.required_hours
            );
        }
    }
    Ok(schedule.blocks)
}

pub fn run(action: TaskAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        TaskAction::Add {
            title,
            course,
            kind,
            due,
            difficulty,
            hours,
            hard,
            buffer_days,
            description,
        } => {
            let mut db = PlannerDb::open()?;
            if db.get_course(&course)?.is_none() {
                eprintln!("course not found: {course}");
                std::process::exit(1);
            }
            let task = Task {
                id: Uuid::new_v4().to_string(),
                title,
                kind: TaskKind::parse(&kind),
                course_id: course,
                due_date: parse_due(&due)?,
                difficulty,
                estimated_hours: hours.unwrap_or(0.0),
                is_hard_deadline: hard,
                buffer_days,
                status: TaskStatus::NotStarted,
                description,
                created_at: Utc::now(),
            };
            db.upsert_task(&task)?;
            db.upsert_event(&deadline_event(&task))?;

            let blocks = schedule_one(&mut db, &task)?;
            println!("Task created: {}", task.id);
            println!("Scheduled {} study block(s)", blocks.len());
            println!("{}", serde_json::to_string_pretty(&task)?);
        }
        TaskAction::List { course, status } => {
            let db = PlannerDb::open()?;
            let filtered: Vec<Task> = db
                .list_tasks()?
                .into_iter()
                .filter(|task| {
                    if let Some(ref c) = course {
                        if &task.course_id != c {
                            return false;
                        }
                    }
                    if let Some(ref s) = status {
                        if task.status != TaskStatus::parse(s) {
                            return false;
                        }
                    }
                    true
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&filtered)?);
        }
        TaskAction::Get { id } => {
            let db = PlannerDb::open()?;
            match db.get_task(&id)? {
                Some(task) => println!("{}", serde_json::to_string_pretty(&task)?),
                None => {
                    eprintln!("task not found: {id}");
                    std::process::exit(1);
                }
            }
        }
        TaskAction::Complete { id } => {
            let mut db = PlannerDb::open()?;
            if !db.set_task_status(&id, TaskStatus::Completed)? {
                eprintln!("task not found: {id}");
                std::process::exit(1);
            }
            // Completed work frees its remaining generated blocks.
            db.replace_task_blocks(&id, &[])?;
            println!("Task completed: {id}");
        }
        TaskAction::Delete { id } => {
            let mut db = PlannerDb::open()?;
            if !db.delete_task(&id)? {
                eprintln!("task not found: {id}");
                std::process::exit(1);
            }
            println!("Task deleted: {id}");
        }
    }
    Ok(())
}
