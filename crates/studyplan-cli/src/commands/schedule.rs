//! Schedule generation and inspection commands for CLI.

use chrono::{Duration, Utc};
use clap::Subcommand;
use std::collections::HashMap;
use studyplan_core::{PlannerDb, Preferences, Scheduler, TimeBlock};

#[derive(Subcommand)]
pub enum ScheduleAction {
    /// Regenerate study blocks for every pending task
    Run,
    /// Show upcoming study blocks
    Show {
        /// Days ahead to include
        #[arg(long, default_value = "7")]
        days: i64,
    },
    /// Scheduling statistics for the upcoming days
    Stats {
        /// Days ahead to include
        #[arg(long, default_value = "7")]
        days: i64,
    },
}

pub fn run(action: ScheduleAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ScheduleAction::Run => {
            let mut db = PlannerDb::open()?;
            let prefs = Preferences::load()?;
            let courses = db.list_courses()?;
            let events = db.list_events()?;
            let tasks = db.list_tasks()?;
            let manual: Vec<TimeBlock> = db
                .list_blocks()?
                .into_iter()
                .filter(|b| b.is_manual)
                .collect();

            let mut scheduler = Scheduler::new(&courses, &events, &prefs, Utc::now())?;
            scheduler.reserve(&manual);
            let outcome = scheduler.reschedule_all(&tasks);
            db.replace_generated_blocks(&outcome.blocks, &outcome.failed_task_ids)?;

            println!(
                "Scheduled {} block(s) across {} task(s), {:.1}h total",
                outcome.blocks.len(),
                outcome.summaries.len(),
                outcome.total_scheduled_hours()
            );
            for summary in &outcome.summaries {
                if summary.shortfall_hours() > 0.0 {
                    println!(
                        "  ! {}: {:.1}h of {:.1}h fit before the deadline",
                        summary.title, summary.scheduled_hours, summary.required_hours
                    );
                }
            }
            for task_id in &outcome.failed_task_ids {
                println!("  ! skipped unschedulable task {task_id}");
            }
        }
        ScheduleAction::Show { days } => {
            let db = PlannerDb::open()?;
            let now = Utc::now();
            let blocks = db.list_blocks_between(now, now + Duration::days(days))?;
            let titles: HashMap<String, String> = db
                .list_tasks()?
                .into_iter()
                .map(|t| (t.id, t.title))
                .collect();

            for block in &blocks {
                let title = titles
                    .get(&block.task_id)
                    .map(String::as_str)
                    .unwrap_or("(unknown task)");
                println!(
                    "{}  {} - {}  [{}{}] {}",
                    block.start_time.format("%a %Y-%m-%d"),
                    block.start_time.format("%H:%M"),
                    block.end_time.format("%H:%M"),
                    block.kind.as_str(),
                    if block.is_manual { ", manual" } else { "" },
                    title,
                );
            }
            if blocks.is_empty() {
                println!("No blocks in the next {days} day(s)");
            }
        }
        ScheduleAction::Stats { days } => {
            let db = PlannerDb::open()?;
            let now = Utc::now();
            let blocks = db.list_blocks_between(now, now + Duration::days(days))?;
            let tasks = db.list_tasks()?;
            let course_of: HashMap<&str, &str> = tasks
                .iter()
                .map(|t| (t.id.as_str(), t.course_id.as_str()))
                .collect();

            let mut by_course: HashMap<&str, i64> = HashMap::new();
            let mut by_kind: HashMap<&str, i64> = HashMap::new();
            let mut total = 0i64;
            for block in &blocks {
                let minutes = block.duration_minutes();
                total += minutes;
                let course = course_of
                    .get(block.task_id.as_str())
                    .copied()
                    .unwrap_or("(none)");
                *by_course.entry(course).or_insert(0) += minutes;
                *by_kind.entry(block.kind.as_str()).or_insert(0) += minutes;
            }

            println!("Next {days} day(s): {} block(s), {:.1}h", blocks.len(), total as f64 / 60.0);
            println!("By kind:");
            let mut rows: Vec<_> = by_kind.into_iter().collect();
            rows.sort_by(|a, b| b.1.cmp(&a.1));
            for (kind, minutes) in rows {
                println!("  {kind}: {:.1}h", minutes as f64 / 60.0);
            }
            println!("By course:");
            let mut rows: Vec<_> = by_course.into_iter().collect();
            rows.sort_by(|a, b| b.1.cmp(&a.1));
            for (course, minutes) in rows {
                println!("  {course}: {:.1}h", minutes as f64 / 60.0);
            }
        }
    }
    Ok(())
}
