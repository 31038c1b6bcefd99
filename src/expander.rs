//! Expansion of the subject catalog into atomic session requests.

use log::debug;
use std::collections::HashMap;

use crate::data::{ClassId, Room, Subject, Teacher};
use crate::error::ConfigError;

/// One required occurrence of a subject. Indices point into the owning `Problem`'s tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRequest {
    /// Position in declaration order; also the request's key in an `Assignment`.
    pub id: usize,
    pub subject: usize,
    pub class: usize,
    pub teacher: usize,
    /// Consecutive slots needed.
    pub duration: usize,
    /// 1-based occurrence number within the subject's weekly sessions.
    pub occurrence: u32,
    pub preferred_room: Option<usize>,
}

/// Name-to-index lookups over the declared teachers, rooms and classes.
pub struct Catalog<'a> {
    teachers: &'a [Teacher],
    teacher_index: HashMap<&'a str, usize>,
    room_index: HashMap<&'a str, usize>,
    class_index: HashMap<&'a str, usize>,
}

impl<'a> Catalog<'a> {
    pub fn new(teachers: &'a [Teacher], rooms: &'a [Room], classes: &'a [ClassId]) -> Self {
        // first declaration wins on duplicates; validation reports those separately
        let mut teacher_index = HashMap::new();
        for (i, t) in teachers.iter().enumerate() {
            teacher_index.entry(t.id.as_str()).or_insert(i);
        }
        let mut room_index = HashMap::new();
        for (i, r) in rooms.iter().enumerate() {
            room_index.entry(r.id.as_str()).or_insert(i);
        }
        let mut class_index = HashMap::new();
        for (i, c) in classes.iter().enumerate() {
            class_index.entry(c.as_str()).or_insert(i);
        }
        Self {
            teachers,
            teacher_index,
            room_index,
            class_index,
        }
    }

    pub fn teacher(&self, id: &str) -> Option<usize> {
        self.teacher_index.get(id).copied()
    }

    pub fn room(&self, id: &str) -> Option<usize> {
        self.room_index.get(id).copied()
    }

    pub fn class(&self, id: &str) -> Option<usize> {
        self.class_index.get(id).copied()
    }

    fn eligible_teachers<'s>(&'s self, subject: &'s str) -> impl Iterator<Item = usize> + 's {
        self.teachers
            .iter()
            .enumerate()
            .filter(move |(_, t)| t.subjects.iter().any(|s| s == subject))
            .map(|(i, _)| i)
    }
}

/// Every problem with a single subject definition.
pub fn check_subject(
    subject: &Subject,
    slots_per_day: Option<usize>,
    slot_length_minutes: u32,
    catalog: &Catalog<'_>,
) -> Vec<ConfigError> {
    let mut errors = Vec::new();

    if subject.sessions_per_week == 0 {
        errors.push(ConfigError::NonPositiveSessions {
            subject: subject.id.clone(),
        });
    }

    let duration = subject.duration_in_slots(slot_length_minutes);
    if duration == 0 {
        errors.push(ConfigError::ZeroDuration {
            subject: subject.id.clone(),
        });
    } else if let Some(slots_per_day) = slots_per_day.filter(|&n| duration > n) {
        errors.push(ConfigError::DurationExceedsDay {
            subject: subject.id.clone(),
            duration,
            slots_per_day,
        });
    }

    match &subject.teacher {
        Some(teacher) => match catalog.teacher(teacher) {
            None => errors.push(ConfigError::UnknownTeacher {
                subject: subject.id.clone(),
                teacher: teacher.clone(),
            }),
            Some(i) if !catalog.teachers[i].may_teach(&subject.id) => {
                errors.push(ConfigError::TeacherNotQualified {
                    subject: subject.id.clone(),
                    teacher: teacher.clone(),
                })
            }
            Some(_) => {}
        },
        None => {
            if catalog.eligible_teachers(&subject.id).next().is_none() {
                errors.push(ConfigError::NoEligibleTeacher {
                    subject: subject.id.clone(),
                });
            }
        }
    }

    if let Some(room) = &subject.preferred_room {
        if catalog.room(room).is_none() {
            errors.push(ConfigError::UnknownRoom {
                subject: subject.id.clone(),
                room: room.clone(),
            });
        }
    }

    if catalog.class(&subject.class).is_none() {
        errors.push(ConfigError::UnknownClass {
            subject: subject.id.clone(),
            class: subject.class.clone(),
        });
    }

    errors
}

/// Expands each subject into `sessions_per_week` requests, in declaration order.
///
/// Subjects without an explicit teacher go to the least-loaded qualified teacher (load counted
/// in slot units, ties to the earlier declaration), so the assignment is stable for a given
/// catalog.
pub fn expand(
    subjects: &[Subject],
    slots_per_day: usize,
    slot_length_minutes: u32,
    catalog: &Catalog<'_>,
) -> Result<Vec<SessionRequest>, ConfigError> {
    let mut requests = Vec::new();
    let mut load = vec![0usize; catalog.teachers.len()];

    for (subject_idx, subject) in subjects.iter().enumerate() {
        if let Some(err) = check_subject(subject, Some(slots_per_day), slot_length_minutes, catalog)
            .into_iter()
            .next()
        {
            return Err(err);
        }

        let duration = subject.duration_in_slots(slot_length_minutes);
        let teacher = match &subject.teacher {
            Some(id) => catalog.teacher(id),
            None => catalog
                .eligible_teachers(&subject.id)
                .min_by_key(|&t| (load[t], t)),
        }
        .ok_or_else(|| ConfigError::NoEligibleTeacher {
            subject: subject.id.clone(),
        })?;
        let class = catalog
            .class(&subject.class)
            .ok_or_else(|| ConfigError::UnknownClass {
                subject: subject.id.clone(),
                class: subject.class.clone(),
            })?;
        let preferred_room = subject.preferred_room.as_deref().and_then(|r| catalog.room(r));

        load[teacher] += duration * subject.sessions_per_week as usize;
        for occurrence in 1..=subject.sessions_per_week {
            requests.push(SessionRequest {
                id: requests.len(),
                subject: subject_idx,
                class,
                teacher,
                duration,
                occurrence,
                preferred_room,
            });
        }
    }

    debug!(
        "Expanded {} subject(s) into {} session request(s).",
        subjects.len(),
        requests.len()
    );
    Ok(requests)
}
