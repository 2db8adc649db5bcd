//! Course management commands for CLI.

use clap::Subcommand;
use studyplan_core::{Course, CourseSession, PlannerDb, SessionKind};
use uuid::Uuid;

#[derive(Subcommand)]
pub enum CourseAction {
    /// Add a new course
    Add {
        /// Course name
        name: String,
        /// Course code (e.g. "NUR301")
        #[arg(long)]
        code: String,
        /// Credit hours
        #[arg(long, default_value = "3")]
        credits: u32,
        /// Display color (hex)
        #[arg(long)]
        color: Option<String>,
        /// Recurring session, "DAY@HH:MM-HH:MM[/KIND]" with DAY 0=Sunday..6=Saturday
        /// (e.g. "1@10:00-11:30/lecture"). May be repeated.
        #[arg(long = "session")]
        sessions: Vec<String>,
    },
    /// List courses
    List,
    /// Get course details
    Get {
        /// Course ID
        id: String,
    },
    /// Delete a course and everything attached to it
    Delete {
        /// Course ID
        id: String,
    },
}

/// Parse a "DAY@HH:MM-HH:MM[/KIND]" session spec.
fn parse_session(spec: &str) -> Result<CourseSession, String> {
    let bad = || format!("invalid session spec: {spec:?} (expected DAY@HH:MM-HH:MM[/KIND])");
    let (day, rest) = spec.split_once('@').ok_or_else(bad)?;
    let day_of_week: u8 = day.parse().map_err(|_| bad())?;
    if day_of_week > 6 {
        return Err(bad());
    }

    let (times, kind) = match rest.split_once('/') {
        Some((times, kind)) => (times, kind),
        None => (rest, "lecture"),
    };
    let (start, end) = times.split_once('-').ok_or_else(bad)?;

    let kind = match kind {
        "lecture" => SessionKind::Lecture,
        "lab" => SessionKind::Lab,
        "tutorial" => SessionKind::Tutorial,
        "office-hours" => SessionKind::OfficeHours,
        other => return Err(format!("unknown session kind: {other:?}")),
    };

    Ok(CourseSession {
        day_of_week,
        start_time: start.to_string(),
        end_time: end.to_string(),
        kind,
        room: None,
    })
}

pub fn run(action: CourseAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        CourseAction::Add { name, code, credits, color, sessions } => {
            let sessions = sessions
                .iter()
                .map(|s| parse_session(s))
                .collect::<Result<Vec<_>, _>>()?;
            let course = Course {
                id: Uuid::new_v4().to_string(),
                name,
                code,
                color,
                credits,
                sessions,
            };
            let db = PlannerDb::open()?;
            db.upsert_course(&course)?;
            println!("Course created: {}", course.id);
            println!("{}", serde_json::to_string_pretty(&course)?);
        }
        CourseAction::List => {
            let db = PlannerDb::open()?;
            println!("{}", serde_json::to_string_pretty(&db.list_courses()?)?);
        }
        CourseAction::Get { id } => {
            let db = PlannerDb::open()?;
            match db.get_course(&id)? {
                Some(course) => println!("{}", serde_json::to_string_pretty(&course)?),
                None => {
                    eprintln!("course not found: {id}");
                    std::process::exit(1);
                }
            }
        }
        CourseAction::Delete { id } => {
            let mut db = PlannerDb::open()?;
            db.delete_course(&id)?;
            println!("Course deleted: {id}");
        }
    }
    Ok(())
}
