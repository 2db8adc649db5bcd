//! User scheduling preferences.
//!
//! Serialized to/from TOML at `~/.config/studyplan/config.toml`. Every field
//! carries a serde default so partial files load cleanly. Preferences are
//! process-wide but passed explicitly into the engine, so a run can override
//! them without touching disk.

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::ConfigError;
use crate::model::TaskKind;
use crate::storage::data_dir;

/// Daily active window bounds, as HH:mm strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudyWindow {
    #[serde(default = "default_day_start")]
    pub start: String,
    #[serde(default = "default_day_end")]
    pub end: String,
}

/// A time-of-day period candidates are drawn from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Period {
    pub start_hour: u32,
    pub end_hour: u32,
    #[serde(default = "default_weight")]
    pub weight: f64,
}

/// Morning/afternoon/evening period table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Periods {
    #[serde(default = "default_morning")]
    pub morning: Period,
    #[serde(default = "default_afternoon")]
    pub afternoon: Period,
    #[serde(default = "default_evening")]
    pub evening: Period,
}

/// Per-weekday energy multiplier (0..=1) scaling the daily effort cap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnergyLevels {
    #[serde(default = "default_energy_mon")]
    pub monday: f64,
    #[serde(default = "default_energy_tue")]
    pub tuesday: f64,
    #[serde(default = "default_energy_wed")]
    pub wednesday: f64,
    #[serde(default = "default_energy_thu")]
    pub thursday: f64,
    #[serde(default = "default_energy_fri")]
    pub friday: f64,
    #[serde(default = "default_energy_sat")]
    pub saturday: f64,
    #[serde(default = "default_energy_sun")]
    pub sunday: f64,
}

impl EnergyLevels {
    pub fn for_weekday(&self, weekday: Weekday) -> f64 {
        match weekday {
            Weekday::Mon => self.monday,
            Weekday::Tue => self.tuesday,
            Weekday::Wed => self.wednesday,
            Weekday::Thu => self.thursday,
            Weekday::Fri => self.friday,
            Weekday::Sat => self.saturday,
            Weekday::Sun => self.sunday,
        }
    }
}

/// Buffer-day defaults per task kind: how many days before the due date the
/// work should be finished.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BufferDays {
    #[serde(default = "default_buffer_exam")]
    pub exam: i64,
    #[serde(default = "default_buffer_assignment")]
    pub assignment: i64,
    #[serde(default = "default_buffer_project")]
    pub project: i64,
    #[serde(default = "default_buffer_reading")]
    pub reading: i64,
    #[serde(default = "default_buffer_lab")]
    pub lab: i64,
}

impl BufferDays {
    pub fn for_kind(&self, kind: TaskKind) -> i64 {
        match kind {
            TaskKind::Exam => self.exam,
            TaskKind::Assignment => self.assignment,
            TaskKind::Project => self.project,
            TaskKind::Reading => self.reading,
            TaskKind::Lab => self.lab,
        }
    }
}

/// Base effort hours per task kind, used when a task has no explicit
/// estimate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultHours {
    #[serde(default = "default_hours_assignment")]
    pub assignment: f64,
    #[serde(default = "default_hours_exam")]
    pub exam: f64,
    #[serde(default = "default_hours_project")]
    pub project: f64,
    #[serde(default = "default_hours_reading")]
    pub reading: f64,
    #[serde(default = "default_hours_lab")]
    pub lab: f64,
}

impl DefaultHours {
    pub fn for_kind(&self, kind: TaskKind) -> f64 {
        match kind {
            TaskKind::Assignment => self.assignment,
            TaskKind::Exam => self.exam,
            TaskKind::Project => self.project,
            TaskKind::Reading => self.reading,
            TaskKind::Lab => self.lab,
        }
    }
}

/// User scheduling preferences.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preferences {
    /// Target work session length, minutes.
    #[serde(default = "default_session_minutes")]
    pub session_minutes: u32,
    /// Break between consecutive sessions, minutes.
    #[serde(default = "default_break_minutes")]
    pub break_minutes: u32,
    /// Sessions shorter than this are never created, minutes.
    #[serde(default = "default_min_session_minutes")]
    pub min_session_minutes: u32,
    /// Weekday effort cap, hours.
    #[serde(default = "default_daily_max_hours")]
    pub daily_max_hours: f64,
    /// Weekend effort cap, hours.
    #[serde(default = "default_weekend_max_hours")]
    pub weekend_max_hours: f64,
    #[serde(default)]
    pub study_window: StudyWindow,
    #[serde(default)]
    pub periods: Periods,
    #[serde(default)]
    pub energy: EnergyLevels,
    #[serde(default)]
    pub buffer_days: BufferDays,
    #[serde(default)]
    pub default_hours: DefaultHours,
    /// Multipliers indexed by difficulty 1..=5.
    #[serde(default = "default_difficulty_multipliers")]
    pub difficulty_multipliers: [f64; 5],
    /// Review sessions placed on the days before each exam.
    #[serde(default = "default_review_days")]
    pub review_days: i64,
    #[serde(default = "default_review_hours")]
    pub review_hours: f64,
}

// Default functions
fn default_day_start() -> String {
    "09:00".into()
}
fn default_day_end() -> String {
    "22:00".into()
}
fn default_weight() -> f64 {
    1.0
}
fn default_morning() -> Period {
    Period { start_hour: 8, end_hour: 12, weight: 1.0 }
}
fn default_afternoon() -> Period {
    Period { start_hour: 13, end_hour: 17, weight: 1.0 }
}
fn default_evening() -> Period {
    Period { start_hour: 18, end_hour: 22, weight: 1.0 }
}
fn default_energy_mon() -> f64 {
    0.9
}
fn default_energy_tue() -> f64 {
    1.0
}
fn default_energy_wed() -> f64 {
    0.95
}
fn default_energy_thu() -> f64 {
    0.85
}
fn default_energy_fri() -> f64 {
    0.7
}
fn default_energy_sat() -> f64 {
    0.8
}
fn default_energy_sun() -> f64 {
    0.9
}
fn default_buffer_exam() -> i64 {
    7
}
fn default_buffer_assignment() -> i64 {
    3
}
fn default_buffer_project() -> i64 {
    10
}
fn default_buffer_reading() -> i64 {
    2
}
fn default_buffer_lab() -> i64 {
    2
}
fn default_hours_assignment() -> f64 {
    3.0
}
fn default_hours_exam() -> f64 {
    10.0
}
fn default_hours_project() -> f64 {
    15.0
}
fn default_hours_reading() -> f64 {
    2.0
}
fn default_hours_lab() -> f64 {
    4.0
}
fn default_session_minutes() -> u32 {
    120
}
fn default_break_minutes() -> u32 {
    15
}
fn default_min_session_minutes() -> u32 {
    30
}
fn default_daily_max_hours() -> f64 {
    6.0
}
fn default_weekend_max_hours() -> f64 {
    4.0
}
fn default_difficulty_multipliers() -> [f64; 5] {
    [0.5, 0.75, 1.0, 1.5, 2.0]
}
fn default_review_days() -> i64 {
    2
}
fn default_review_hours() -> f64 {
    2.0
}

impl Default for StudyWindow {
    fn default() -> Self {
        Self { start: default_day_start(), end: default_day_end() }
    }
}

impl Default for Periods {
    fn default() -> Self {
        Self {
            morning: default_morning(),
            afternoon: default_afternoon(),
            evening: default_evening(),
        }
    }
}

impl Default for EnergyLevels {
    fn default() -> Self {
        Self {
            monday: default_energy_mon(),
            tuesday: default_energy_tue(),
            wednesday: default_energy_wed(),
            thursday: default_energy_thu(),
            friday: default_energy_fri(),
            saturday: default_energy_sat(),
            sunday: default_energy_sun(),
        }
    }
}

impl Default for BufferDays {
    fn default() -> Self {
        Self {
            exam: default_buffer_exam(),
            assignment: default_buffer_assignment(),
            project: default_buffer_project(),
            reading: default_buffer_reading(),
            lab: default_buffer_lab(),
        }
    }
}

impl Default for DefaultHours {
    fn default() -> Self {
        Self {
            assignment: default_hours_assignment(),
            exam: default_hours_exam(),
            project: default_hours_project(),
            reading: default_hours_reading(),
            lab: default_hours_lab(),
        }
    }
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            session_minutes: default_session_minutes(),
            break_minutes: default_break_minutes(),
            min_session_minutes: default_min_session_minutes(),
            daily_max_hours: default_daily_max_hours(),
            weekend_max_hours: default_weekend_max_hours(),
            study_window: StudyWindow::default(),
            periods: Periods::default(),
            energy: EnergyLevels::default(),
            buffer_days: BufferDays::default(),
            default_hours: DefaultHours::default(),
            difficulty_multipliers: default_difficulty_multipliers(),
            review_days: default_review_days(),
            review_hours: default_review_hours(),
        }
    }
}

impl Preferences {
    /// Multiplier for a difficulty rating, clamped to the 1..=5 range.
    pub fn difficulty_multiplier(&self, difficulty: u8) -> f64 {
        let idx = difficulty.clamp(1, 5) as usize - 1;
        self.difficulty_multipliers[idx]
    }

    pub fn min_session_hours(&self) -> f64 {
        self.min_session_minutes as f64 / 60.0
    }

    /// Path to the preferences file.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("~/.config/studyplan"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load preferences from disk, falling back to defaults when the file
    /// does not exist yet.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(&path).map_err(|e| ConfigError::LoadFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        toml::from_str(&contents).map_err(|e| ConfigError::ParseFailed(e.to_string()))
    }

    /// Save preferences to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::config_path()?;
        let contents = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&path, contents).map_err(|e| ConfigError::SaveFailed {
            path,
            message: e.to_string(),
        })
    }
}
