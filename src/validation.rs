//! Static pre-check of a timetable configuration.
//!
//! Collects every problem instead of stopping at the first, so a caller can show the whole
//! list at once. Covers grid parameters, duplicate ids, dangling teacher/room/class references,
//! non-positive counts and teacher unavailability that points outside the grid.

use std::collections::HashSet;

use crate::data::TimetableConfig;
use crate::error::ConfigError;
use crate::expander::{self, Catalog};
use crate::grid::{self, Grid};

pub fn validate(config: &TimetableConfig) -> Vec<ConfigError> {
    let mut errors = grid::check_config(config);
    // slot counts are only meaningful once the grid itself is sound
    let slots_per_day = errors
        .is_empty()
        .then(|| Grid::build(config).ok())
        .flatten()
        .map(|g| g.slots_per_day());

    if config.rooms.is_empty() {
        errors.push(ConfigError::NoRooms);
    }
    if config.subjects.is_empty() {
        errors.push(ConfigError::NoSubjects);
    }

    check_unique("room", config.rooms.iter().map(|r| r.id.clone()), &mut errors);
    check_unique("teacher", config.teachers.iter().map(|t| t.id.clone()), &mut errors);
    check_unique("class", config.classes.iter().cloned(), &mut errors);
    check_unique(
        "subject",
        config
            .subjects
            .iter()
            .map(|s| format!("{}@{}", s.id, s.class)),
        &mut errors,
    );

    for teacher in &config.teachers {
        for block in &teacher.unavailable {
            if !config.working_days.contains(&block.day) {
                errors.push(ConfigError::UnknownDay {
                    context: format!("teacher '{}'", teacher.id),
                    day: block.day.clone(),
                });
            }
            if let Some(limit) = slots_per_day {
                for &slot in block.slots.iter().filter(|&&s| s >= limit) {
                    errors.push(ConfigError::SlotOutOfRange {
                        teacher: teacher.id.clone(),
                        slot,
                        slots_per_day: limit,
                    });
                }
            }
        }
    }

    let classes = roster(config);
    let catalog = Catalog::new(&config.teachers, &config.rooms, &classes);
    for subject in &config.subjects {
        errors.extend(expander::check_subject(
            subject,
            slots_per_day,
            config.slot_length_minutes,
            &catalog,
        ));
    }

    errors
}

/// The declared class roster, or the classes named by subjects in first-seen order.
pub fn roster(config: &TimetableConfig) -> Vec<String> {
    if !config.classes.is_empty() {
        return config.classes.clone();
    }
    let mut seen = HashSet::new();
    config
        .subjects
        .iter()
        .filter(|s| seen.insert(s.class.as_str()))
        .map(|s| s.class.clone())
        .collect()
}

fn check_unique(
    kind: &'static str,
    ids: impl Iterator<Item = String>,
    errors: &mut Vec<ConfigError>,
) {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id.clone()) {
            errors.push(ConfigError::DuplicateId { kind, id });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn base() -> serde_json::Value {
        json!({
            "workingDays": ["Mon", "Tue"],
            "dayStart": "08:00",
            "dayEnd": "12:00",
            "slotLengthMinutes": 60,
            "rooms": [{"id": "R1"}],
            "teachers": [{"id": "T1", "unavailable": [{"day": "Mon", "slots": [0]}]}],
            "subjects": [{"id": "math", "class": "A", "sessionsPerWeek": 2, "teacher": "T1"}]
        })
    }

    fn check(value: serde_json::Value) -> Vec<ConfigError> {
        validate(&serde_json::from_value(value).unwrap())
    }

    #[test]
    fn valid_config_has_no_errors() {
        assert!(check(base()).is_empty());
    }

    #[test]
    fn reports_every_problem_at_once() {
        let mut value = base();
        value["rooms"] = json!([{"id": "R1"}, {"id": "R1"}]);
        value["teachers"][0]["unavailable"] = json!([{"day": "Sun"}, {"day": "Mon", "slots": [9]}]);
        value["subjects"] = json!([
            {"id": "math", "class": "A", "sessionsPerWeek": 0, "teacher": "T9"},
            {"id": "math", "class": "A", "sessionsPerWeek": 1, "teacher": "T1", "durationSlots": 5}
        ]);
        let errors = check(value);
        assert!(errors.contains(&ConfigError::DuplicateId {
            kind: "room",
            id: "R1".into()
        }));
        assert!(errors.contains(&ConfigError::DuplicateId {
            kind: "subject",
            id: "math@A".into()
        }));
        assert!(errors.iter().any(|e| matches!(e, ConfigError::UnknownDay { .. })));
        assert!(errors.contains(&ConfigError::SlotOutOfRange {
            teacher: "T1".into(),
            slot: 9,
            slots_per_day: 4
        }));
        assert!(errors.iter().any(|e| matches!(e, ConfigError::NonPositiveSessions { .. })));
        assert!(errors.iter().any(|e| matches!(e, ConfigError::UnknownTeacher { .. })));
        assert!(errors.iter().any(|e| matches!(e, ConfigError::DurationExceedsDay { .. })));
    }

    #[test]
    fn empty_catalogs_are_rejected() {
        let mut value = base();
        value["rooms"] = json!([]);
        value["subjects"] = json!([]);
        let errors = check(value);
        assert_eq!(errors, vec![ConfigError::NoRooms, ConfigError::NoSubjects]);
    }

    #[test]
    fn declared_roster_must_cover_subjects() {
        let mut value = base();
        value["classes"] = json!(["B"]);
        let errors = check(value);
        assert!(matches!(errors.as_slice(), [ConfigError::UnknownClass { .. }]));
    }

    #[test]
    fn derived_roster_keeps_first_seen_order() {
        let mut value = base();
        value["subjects"] = json!([
            {"id": "a", "class": "Y", "sessionsPerWeek": 1, "teacher": "T1"},
            {"id": "b", "class": "X", "sessionsPerWeek": 1, "teacher": "T1"},
            {"id": "c", "class": "Y", "sessionsPerWeek": 1, "teacher": "T1"}
        ]);
        let config: TimetableConfig = serde_json::from_value(value).unwrap();
        assert_eq!(roster(&config), vec!["Y".to_string(), "X".to_string()]);
    }
}
