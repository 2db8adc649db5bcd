//! Per-day availability: merges recurring course sessions, one-off events,
//! and already-placed blocks into the free gaps of a day's active window.

use chrono::{DateTime, Datelike, NaiveDate, Utc};

use crate::error::ConfigError;
use crate::interval::{merge_intervals, subtract_busy, Interval};
use crate::model::{Course, Event};
use crate::prefs::Preferences;

/// Parse an `HH:mm` clock string.
pub fn parse_hhmm(s: &str) -> Option<(u32, u32)> {
    let (h, m) = s.split_once(':')?;
    let hour: u32 = h.parse().ok()?;
    let minute: u32 = m.parse().ok()?;
    if hour > 23 || minute > 59 {
        return None;
    }
    Some((hour, minute))
}

/// Build a UTC timestamp for a clock time on a date.
pub fn at_time(date: NaiveDate, hour: u32, minute: u32) -> DateTime<Utc> {
    DateTime::from_naive_utc_and_offset(
        date.and_hms_opt(hour, minute, 0).expect("valid clock time"),
        Utc,
    )
}

/// Computes free gaps for a calendar day from the read-only snapshot of
/// courses and events. Blocks placed earlier in the same run are passed in
/// by the caller, which owns that accumulator.
pub struct Availability<'a> {
    courses: &'a [Course],
    events: &'a [Event],
    prefs: &'a Preferences,
}

impl<'a> Availability<'a> {
    pub fn new(courses: &'a [Course], events: &'a [Event], prefs: &'a Preferences) -> Self {
        Self { courses, events, prefs }
    }

    /// Reject malformed study-window preferences before any run starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let start = parse_hhmm(&self.prefs.study_window.start).ok_or_else(|| {
            ConfigError::InvalidValue {
                key: "study_window.start".to_string(),
                message: format!("not an HH:mm time: {:?}", self.prefs.study_window.start),
            }
        })?;
        let end = parse_hhmm(&self.prefs.study_window.end).ok_or_else(|| {
            ConfigError::InvalidValue {
                key: "study_window.end".to_string(),
                message: format!("not an HH:mm time: {:?}", self.prefs.study_window.end),
            }
        })?;
        if end <= start {
            return Err(ConfigError::InvalidValue {
                key: "study_window".to_string(),
                message: "window end must be after start".to_string(),
            });
        }
        Ok(())
    }

    /// The day's active window from preferences.
    pub fn day_window(&self, date: NaiveDate) -> Interval {
        let (sh, sm) = parse_hhmm(&self.prefs.study_window.start).unwrap_or((9, 0));
        let (eh, em) = parse_hhmm(&self.prefs.study_window.end).unwrap_or((22, 0));
        Interval::new(at_time(date, sh, sm), at_time(date, eh, em))
            .expect("validated study window")
    }

    /// A date holding an immovable full-day commitment (e.g. a clinical) is
    /// skipped entirely rather than scheduled around.
    pub fn is_fully_booked(&self, date: NaiveDate) -> bool {
        self.events.iter().any(|e| {
            e.occupies_full_day()
                && e.start_time.date_naive() <= date
                && date <= e.end_time.date_naive()
        })
    }

    /// Busy intervals from fixed commitments on a date: recurring course
    /// sessions whose weekday matches, plus blocking (non-deadline) events.
    pub fn fixed_commitments(&self, date: NaiveDate) -> Vec<Interval> {
        let weekday = date.weekday().num_days_from_sunday() as u8;
        let mut busy = Vec::new();

        for course in self.courses {
            for session in course.sessions.iter().filter(|s| s.day_of_week == weekday) {
                let parsed = parse_hhmm(&session.start_time)
                    .zip(parse_hhmm(&session.end_time))
                    .and_then(|((sh, sm), (eh, em))| {
                        Interval::new(at_time(date, sh, sm), at_time(date, eh, em))
                    });
                match parsed {
                    Some(iv) => busy.push(iv),
                    None => tracing::debug!(
                        course = %course.code,
                        start = %session.start_time,
                        end = %session.end_time,
                        "skipping course session with malformed times"
                    ),
                }
            }
        }

        let window = self.day_window(date);
        for event in self.events.iter().filter(|e| e.blocks_time()) {
            if let Some(iv) = Interval::new(event.start_time, event.end_time) {
                if iv.overlaps(&window) {
                    busy.push(iv);
                }
            }
        }

        busy
    }

    /// Free gaps for a date, given blocks already placed (by the user, by
    /// other tasks, or earlier in this run). `clip_start`/`clip_end` bound
    /// the window further, e.g. "not before now" and "not past the due
    /// time".
    pub fn free_gaps(
        &self,
        date: NaiveDate,
        placed: &[Interval],
        clip_start: Option<DateTime<Utc>>,
        clip_end: Option<DateTime<Utc>>,
    ) -> Vec<Interval> {
        if self.is_fully_booked(date) {
            return Vec::new();
        }

        let window = self.day_window(date);
        let start = clip_start.map_or(window.start, |c| window.start.max(c));
        let end = clip_end.map_or(window.end, |c| window.end.min(c));
        let window = match Interval::new(start, end) {
            Some(w) => w,
            None => return Vec::new(),
        };

        let mut busy = self.fixed_commitments(date);
        busy.extend(placed.iter().copied());
        let merged = merge_intervals(busy);

        subtract_busy(window, &merged, self.prefs.min_session_minutes as i64)
    }
}
