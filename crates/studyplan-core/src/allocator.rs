//! Greedy block allocation: walks a task's scheduling window day by day,
//! consuming free gaps to place bounded work sessions until the required
//! effort is met or the window runs out.
//!
//! Under-scheduling is a normal outcome: when the window cannot hold the
//! full effort the allocator places what fits and stops, it never raises.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Timelike, Utc, Weekday};
use std::collections::HashMap;

use crate::availability::{at_time, Availability};
use crate::estimate::EffortEstimate;
use crate::interval::Interval;
use crate::model::{BlockKind, Task, TaskKind, TimeBlock};
use crate::prefs::{Period, Preferences};

/// Candidate placements advance on half-hour marks, like a paper planner.
const SCAN_STEP_MINUTES: i64 = 30;

/// The shared busy accumulator for one scheduling run.
///
/// Holds every occupied interval the allocator must avoid (pre-existing
/// blocks plus everything placed so far this run) and the per-day minutes
/// this run has already scheduled, which count against the daily effort
/// cap. Threading this through the per-task calls is what lets task N see
/// task N-1's placements.
#[derive(Debug, Default)]
pub struct BusySet {
    intervals: Vec<Interval>,
    scheduled_minutes: HashMap<NaiveDate, i64>,
}

impl BusySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pre-existing occupied interval (manual blocks, blocks
    /// kept from other sources). Does not count against daily caps.
    pub fn add_existing(&mut self, interval: Interval) {
        self.intervals.push(interval);
    }

    /// Register a block placed by this run, padding its occupancy with the
    /// inter-session break so the next placement cannot start back-to-back.
    pub fn add_block(&mut self, block: &TimeBlock, break_minutes: u32) {
        let padded_end = block.end_time + Duration::minutes(break_minutes as i64);
        if let Some(iv) = Interval::new(block.start_time, padded_end) {
            self.intervals.push(iv);
        }
        *self
            .scheduled_minutes
            .entry(block.start_time.date_naive())
            .or_insert(0) += block.duration_minutes();
    }

    /// Minutes this run has scheduled on a date.
    pub fn minutes_on(&self, date: NaiveDate) -> i64 {
        self.scheduled_minutes.get(&date).copied().unwrap_or(0)
    }

    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }
}

/// Places work sessions for a single task into the shared busy set.
pub struct Allocator<'a> {
    prefs: &'a Preferences,
}

impl<'a> Allocator<'a> {
    pub fn new(prefs: &'a Preferences) -> Self {
        Self { prefs }
    }

    /// Allocate study blocks for `task` across its estimated window.
    ///
    /// Placed blocks are pushed into `busy` immediately so later days of
    /// this loop, and later tasks in the run, see them as occupied.
    pub fn allocate(
        &self,
        task: &Task,
        est: &EffortEstimate,
        availability: &Availability<'_>,
        busy: &mut BusySet,
        now: DateTime<Utc>,
    ) -> Vec<TimeBlock> {
        let min_session = self.prefs.min_session_minutes as i64;
        let mut remaining = est.total_minutes();
        let mut blocks = Vec::new();
        let mut date = est.window_start;

        while remaining >= min_session && date <= est.window_end {
            if availability.is_fully_booked(date) {
                date += Duration::days(1);
                continue;
            }

            let energy = self.prefs.energy.for_weekday(date.weekday());
            let mut day_budget = self.day_cap_minutes(date) - busy.minutes_on(date);

            while remaining >= min_session && day_budget >= min_session {
                let target = (self.prefs.session_minutes as i64)
                    .min(remaining)
                    .min(day_budget);

                let placed = self.place_block(
                    &task.id,
                    date,
                    target,
                    &self.period_order(task.kind),
                    BlockKind::Study,
                    availability,
                    busy,
                    now,
                    task.due_date,
                );

                match placed {
                    Some(block) => {
                        if task.kind.is_high_energy() && energy < 0.8 {
                            tracing::warn!(
                                task = %task.title,
                                date = %date,
                                energy,
                                "high-energy task scheduled on a low-energy day"
                            );
                        }
                        remaining -= block.duration_minutes();
                        day_budget -= block.duration_minutes();
                        blocks.push(block);
                    }
                    None => break,
                }
            }

            date += Duration::days(1);
        }

        blocks
    }

    /// Place a single session of up to `target_minutes` on `date`, trying
    /// periods in the given preference order. Returns `None` when nothing
    /// of at least the minimum session length fits.
    #[allow(clippy::too_many_arguments)]
    pub fn place_block(
        &self,
        task_id: &str,
        date: NaiveDate,
        target_minutes: i64,
        period_order: &[Period],
        kind: BlockKind,
        availability: &Availability<'_>,
        busy: &mut BusySet,
        now: DateTime<Utc>,
        due: DateTime<Utc>,
    ) -> Option<TimeBlock> {
        let min_session = self.prefs.min_session_minutes as i64;
        let clip_start = (date == now.date_naive()).then_some(now);
        let gaps = availability.free_gaps(date, busy.intervals(), clip_start, Some(due));
        if gaps.is_empty() {
            return None;
        }

        for period in period_order {
            // Period hours come from user config; clamp instead of trusting.
            let window = match Interval::new(
                at_time(date, period.start_hour.min(23), 0),
                at_time(date, period.end_hour.min(23), 0),
            ) {
                Some(w) => w,
                None => continue,
            };

            for gap in &gaps {
                let usable = match Interval::new(gap.start.max(window.start), gap.end.min(window.end)) {
                    Some(u) => u,
                    None => continue,
                };
                let start = round_up_to_step(usable.start);
                let duration = target_minutes.min((usable.end - start).num_minutes());
                if duration < min_session {
                    continue;
                }

                let block = TimeBlock::generated(
                    task_id,
                    start,
                    start + Duration::minutes(duration),
                    kind,
                );
                busy.add_block(&block, self.prefs.break_minutes);
                return Some(block);
            }
        }

        None
    }

    /// Preferred time-of-day periods for a task kind. A period with weight
    /// zero (or less) is disabled outright.
    pub fn period_order(&self, kind: TaskKind) -> Vec<Period> {
        let p = &self.prefs.periods;
        let ranked = match kind {
            TaskKind::Exam | TaskKind::Lab => [p.morning, p.afternoon, p.evening],
            TaskKind::Reading => [p.evening, p.afternoon, p.morning],
            TaskKind::Project => [p.afternoon, p.morning, p.evening],
            TaskKind::Assignment => [p.afternoon, p.evening, p.morning],
        };
        ranked.into_iter().filter(|p| p.weight > 0.0).collect()
    }

    /// Review sessions favor the morning, like exam study.
    pub fn review_period_order(&self) -> Vec<Period> {
        let p = &self.prefs.periods;
        [p.morning, p.afternoon, p.evening]
            .into_iter()
            .filter(|p| p.weight > 0.0)
            .collect()
    }

    /// The date's effort cap in minutes: weekday or weekend base, scaled by
    /// the day's energy level.
    fn day_cap_minutes(&self, date: NaiveDate) -> i64 {
        let weekend = matches!(date.weekday(), Weekday::Sat | Weekday::Sun);
        let base = if weekend {
            self.prefs.weekend_max_hours
        } else {
            self.prefs.daily_max_hours
        };
        let energy = self.prefs.energy.for_weekday(date.weekday()).clamp(0.0, 1.0);
        (base * energy * 60.0).round() as i64
    }
}

/// Round a timestamp up to the next half-hour mark.
fn round_up_to_step(dt: DateTime<Utc>) -> DateTime<Utc> {
    let minute = dt.minute() as i64;
    let second = dt.second() as i64;
    let past_step = minute % SCAN_STEP_MINUTES;
    if past_step == 0 && second == 0 {
        return dt;
    }
    dt + Duration::minutes(SCAN_STEP_MINUTES - past_step) - Duration::seconds(second)
}
