use thiserror::Error;

/// Malformed or inconsistent input. Generation never starts while any of these is present.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("no working days configured")]
    NoWorkingDays,

    #[error("working day '{0}' is listed more than once")]
    DuplicateDay(String),

    #[error("day end {end} must be after day start {start}")]
    InvalidTimeRange { start: String, end: String },

    #[error("slot length must be positive")]
    ZeroSlotLength,

    #[error("slot length of {slot_minutes} min does not fit in a {window_minutes} min working day")]
    SlotLengthExceedsDay {
        slot_minutes: u32,
        window_minutes: u32,
    },

    #[error("recess window {start}-{end} is empty or inverted")]
    InvalidRecess { start: String, end: String },

    #[error("{context} references unknown day '{day}'")]
    UnknownDay { context: String, day: String },

    #[error("no rooms configured")]
    NoRooms,

    #[error("no subjects configured")]
    NoSubjects,

    #[error("duplicate {kind} id '{id}'")]
    DuplicateId { kind: &'static str, id: String },

    #[error("subject '{subject}' must require at least one session per week")]
    NonPositiveSessions { subject: String },

    #[error("subject '{subject}' has a zero-length session")]
    ZeroDuration { subject: String },

    #[error("subject '{subject}' needs {duration} consecutive slots but a day only has {slots_per_day}")]
    DurationExceedsDay {
        subject: String,
        duration: usize,
        slots_per_day: usize,
    },

    #[error("subject '{subject}' references unknown teacher '{teacher}'")]
    UnknownTeacher { subject: String, teacher: String },

    #[error("teacher '{teacher}' is not qualified to teach subject '{subject}'")]
    TeacherNotQualified { subject: String, teacher: String },

    #[error("no teacher is qualified to teach subject '{subject}'")]
    NoEligibleTeacher { subject: String },

    #[error("subject '{subject}' references unknown room '{room}'")]
    UnknownRoom { subject: String, room: String },

    #[error("subject '{subject}' references undeclared class '{class}'")]
    UnknownClass { subject: String, class: String },

    #[error("teacher '{teacher}' marks slot {slot} unavailable but a day only has {slots_per_day} slots")]
    SlotOutOfRange {
        teacher: String,
        slot: usize,
        slots_per_day: usize,
    },

    #[error("at least one timetable must be requested")]
    ZeroAttempts,
}

/// An assignment that disagrees with the problem it was built for. Always an engine bug.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantError {
    #[error("placement of request {request} uses slot {slot} on day {day} outside the grid")]
    SlotOutsideGrid {
        request: usize,
        day: usize,
        slot: usize,
    },

    #[error("placement of request {request} uses a recess slot (day {day}, slot {slot})")]
    RecessPlacement {
        request: usize,
        day: usize,
        slot: usize,
    },

    #[error("placement references unknown {kind} index {index}")]
    UnknownIndex { kind: &'static str, index: usize },

    #[error("{owner} '{id}' is double-booked on day {day}, slot {slot}")]
    DoubleBooked {
        owner: &'static str,
        id: String,
        day: usize,
        slot: usize,
    },
}

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("invalid configuration: {}", join_errors(.0))]
    Config(Vec<ConfigError>),

    #[error("internal invariant violated: {0}")]
    Invariant(#[from] InvariantError),
}

impl From<ConfigError> for GenerateError {
    fn from(err: ConfigError) -> Self {
        GenerateError::Config(vec![err])
    }
}

fn join_errors(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid clock time '{0}', expected HH:MM or H:MM am/pm")]
pub struct ClockTimeError(pub String);

/// Failure to read a configuration document from disk.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}
