//! Calendar event commands for CLI.

use chrono::Utc;
use clap::Subcommand;
use studyplan_core::{model::parse_datetime_flexible, Event, EventKind, PlannerDb};
use uuid::Uuid;

#[derive(Subcommand)]
pub enum EventAction {
    /// Add a one-off calendar event
    Add {
        /// Event title
        title: String,
        /// Event kind: lecture, clinical, lab, exam, simulation, or review
        #[arg(long, default_value = "lecture")]
        kind: String,
        /// Start, RFC3339 or "YYYY-MM-DD"
        #[arg(long)]
        start: String,
        /// End, RFC3339 or "YYYY-MM-DD"
        #[arg(long)]
        end: String,
        /// Course ID the event belongs to
        #[arg(long)]
        course: Option<String>,
        /// Location
        #[arg(long)]
        location: Option<String>,
    },
    /// List events
    List {
        /// Only events that have not ended yet
        #[arg(long)]
        upcoming: bool,
    },
    /// Delete an event
    Delete {
        /// Event ID
        id: String,
    },
}

pub fn run(action: EventAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = PlannerDb::open()?;

    match action {
        EventAction::Add { title, kind, start, end, course, location } => {
            let start_time =
                parse_datetime_flexible(&start).ok_or_else(|| format!("invalid start: {start:?}"))?;
            let end_time =
                parse_datetime_flexible(&end).ok_or_else(|| format!("invalid end: {end:?}"))?;
            if end_time <= start_time {
                return Err("event end must be after start".into());
            }

            let event = Event {
                id: Uuid::new_v4().to_string(),
                title,
                kind: EventKind::parse(&kind),
                course_id: course,
                start_time,
                end_time,
                location,
                task_id: None,
            };
            db.upsert_event(&event)?;
            println!("Event created: {}", event.id);
            println!("{}", serde_json::to_string_pretty(&event)?);
        }
        EventAction::List { upcoming } => {
            let now = Utc::now();
            let events: Vec<Event> = db
                .list_events()?
                .into_iter()
                .filter(|e| !upcoming || e.end_time >= now)
                .collect();
            println!("{}", serde_json::to_string_pretty(&events)?);
        }
        EventAction::Delete { id } => {
            if !db.delete_event(&id)? {
                eprintln!("event not found: {id}");
                std::process::exit(1);
            }
            println!("Event deleted: {id}");
        }
    }
    Ok(())
}
