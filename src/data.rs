use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::{ClockTimeError, LoadError};
use crate::timetable::Timetable;

// Type aliases for clarity
pub type DayName = String;
pub type RoomId = String;
pub type TeacherId = String;
pub type SubjectId = String;
pub type ClassId = String;

/// A wall-clock time of day, stored as minutes since midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime(u32);

/// Accepted layouts, tried in order.
const CLOCK_FORMATS: [&str; 3] = ["%H:%M", "%I:%M %p", "%I:%M%p"];
/// Hour-only layouts; chrono needs a minute field, so `00` is appended before parsing.
const HOUR_FORMATS: [&str; 2] = ["%I %p %M", "%I%p %M"];

impl ClockTime {
    pub fn minutes(self) -> u32 {
        self.0
    }

    pub fn plus_minutes(self, minutes: u32) -> Self {
        ClockTime(self.0 + minutes)
    }
}

impl From<NaiveTime> for ClockTime {
    fn from(time: NaiveTime) -> Self {
        ClockTime(time.hour() * 60 + time.minute())
    }
}

impl FromStr for ClockTime {
    type Err = ClockTimeError;

    /// Accepts `13:05`, `1:05 pm`, `1pm`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let padded = format!("{} 00", trimmed);
        CLOCK_FORMATS
            .iter()
            .find_map(|format| NaiveTime::parse_from_str(trimmed, format).ok())
            .or_else(|| {
                HOUR_FORMATS
                    .iter()
                    .find_map(|format| NaiveTime::parse_from_str(&padded, format).ok())
            })
            .map(ClockTime::from)
            .ok_or_else(|| ClockTimeError(s.to_string()))
    }
}

impl TryFrom<String> for ClockTime {
    type Error = ClockTimeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ClockTime> for String {
    fn from(time: ClockTime) -> Self {
        time.to_string()
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

/// Represents a physical room. Capacity plays no part here; `kind` is matched against
/// a subject's `room_kind` as a soft preference.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Room {
    pub id: RoomId,
    #[serde(default)]
    pub kind: Option<String>,
}

/// Slots on a given day that a teacher cannot take. An empty `slots` list blocks the whole day.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Unavailability {
    pub day: DayName,
    #[serde(default)]
    pub slots: Vec<usize>,
}

/// Represents a teacher with their qualifications and scheduling constraints.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    pub id: TeacherId,
    /// Subjects this teacher may take. Empty means unrestricted.
    #[serde(default)]
    pub subjects: Vec<SubjectId>,
    #[serde(default)]
    pub unavailable: Vec<Unavailability>,
}

impl Teacher {
    pub fn may_teach(&self, subject: &str) -> bool {
        self.subjects.is_empty() || self.subjects.iter().any(|s| s == subject)
    }
}

/// A subject taught to one class, with its weekly load.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: SubjectId,
    #[serde(default)]
    pub name: Option<String>,
    pub class: ClassId,
    pub sessions_per_week: u32,
    #[serde(default)]
    pub duration_slots: Option<u32>,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub preferred_room: Option<RoomId>,
    #[serde(default)]
    pub room_kind: Option<String>,
    #[serde(default)]
    pub teacher: Option<TeacherId>,
}

impl Subject {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }

    /// Session length in grid slots. Minutes are rounded down to whole slots, never below one.
    pub fn duration_in_slots(&self, slot_length_minutes: u32) -> usize {
        match (self.duration_slots, self.duration_minutes) {
            (Some(slots), _) => slots as usize,
            (None, Some(minutes)) if slot_length_minutes > 0 => {
                (minutes / slot_length_minutes).max(1) as usize
            }
            _ => 1,
        }
    }
}

/// A blocked time window. Without a `day` it applies to every working day.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RecessWindow {
    #[serde(default)]
    pub day: Option<DayName>,
    pub start: ClockTime,
    pub end: ClockTime,
}

/// Tuning knobs for the assignment engine and batch controller.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SolverSettings {
    /// Backjumps one engine run may perform in total.
    pub max_backtracks: usize,
    /// Backjumps a single dead end may take before its request is set aside.
    pub backtrack_depth: usize,
    pub spread_weight: i64,
    pub room_preference_weight: i64,
    /// Engine runs per timetable, including the first. Later runs use derived seeds and
    /// only happen while no run has placed everything.
    pub restarts_per_timetable: usize,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            max_backtracks: 2000,
            backtrack_depth: 8,
            spread_weight: 10,
            room_preference_weight: 3,
            restarts_per_timetable: 10,
        }
    }
}

/// The complete input for the timetabling problem.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimetableConfig {
    pub working_days: Vec<DayName>,
    pub day_start: ClockTime,
    pub day_end: ClockTime,
    pub slot_length_minutes: u32,
    #[serde(default)]
    pub recesses: Vec<RecessWindow>,
    /// Flag the slot nearest mid-day as recess when the day spans at least four hours.
    #[serde(default)]
    pub auto_recess: bool,
    #[serde(default)]
    pub rooms: Vec<Room>,
    #[serde(default)]
    pub teachers: Vec<Teacher>,
    /// Optional class roster. When empty, classes are taken from the subjects.
    #[serde(default)]
    pub classes: Vec<ClassId>,
    #[serde(default)]
    pub subjects: Vec<Subject>,
    #[serde(default)]
    pub timetable_names: Vec<String>,
    #[serde(default)]
    pub solver: SolverSettings,
}

impl TimetableConfig {
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(Self::from_json_str(&contents)?)
    }

    /// Name of the `index`-th generated timetable, falling back to `TT_<n>`.
    pub fn timetable_name(&self, index: usize) -> String {
        self.timetable_names
            .get(index)
            .filter(|name| !name.trim().is_empty())
            .cloned()
            .unwrap_or_else(|| format!("TT_{}", index + 1))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Status {
    Complete,
    Partial,
}

/// Why a session request could not be placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum UnplacedReason {
    NoAvailableSlot,
    TeacherConflict,
    RoomConflict,
    DurationExceedsDay,
    /// The run was cancelled before this request was reached.
    Cancelled,
}

impl fmt::Display for UnplacedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            UnplacedReason::NoAvailableSlot => "no available slot",
            UnplacedReason::TeacherConflict => "teacher conflict",
            UnplacedReason::RoomConflict => "room conflict",
            UnplacedReason::DurationExceedsDay => "duration exceeds day",
            UnplacedReason::Cancelled => "cancelled",
        };
        f.write_str(text)
    }
}

/// A session request the engine could not place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnplacedRequest {
    pub request: usize,
    pub subject: SubjectId,
    pub class: ClassId,
    pub teacher: TeacherId,
    pub duration: usize,
    pub occurrence: u32,
    pub reason: UnplacedReason,
}

impl fmt::Display for UnplacedRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} #{} for class {} with {} ({} slot(s))",
            self.reason, self.subject, self.occurrence, self.class, self.teacher, self.duration
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchStats {
    pub steps: u64,
    pub backtracks: u64,
    pub restarts: usize,
    pub elapsed_ms: u64,
}

/// The outcome of one generation attempt.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub name: String,
    pub seed: u64,
    pub status: Status,
    pub timetable: Timetable,
    pub unplaced: Vec<UnplacedRequest>,
    pub stats: SearchStats,
}

impl GenerationResult {
    pub fn is_complete(&self) -> bool {
        self.status == Status::Complete
    }
}
