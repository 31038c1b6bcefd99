//! The validated, index-interned form of a configuration.
//!
//! Built once per generation call and shared read-only by every attempt.

use log::info;
use std::collections::HashSet;

use crate::data::{ClassId, Room, Subject, TeacherId, TimetableConfig};
use crate::error::{ConfigError, GenerateError};
use crate::expander::{self, Catalog, SessionRequest};
use crate::grid::{Grid, SlotRange};
use crate::validation;

#[derive(Debug, Clone)]
pub struct TeacherInfo {
    pub id: TeacherId,
    blocked: HashSet<(usize, usize)>,
}

impl TeacherInfo {
    pub fn is_available(&self, day: usize, slot: usize) -> bool {
        !self.blocked.contains(&(day, slot))
    }

    pub fn is_available_for(&self, range: SlotRange) -> bool {
        range.indices().all(|slot| self.is_available(range.day, slot))
    }
}

#[derive(Debug, Clone)]
pub struct Problem {
    pub grid: Grid,
    pub rooms: Vec<Room>,
    pub teachers: Vec<TeacherInfo>,
    pub classes: Vec<ClassId>,
    pub subjects: Vec<Subject>,
    pub requests: Vec<SessionRequest>,
}

impl Problem {
    /// Validates `config` and derives the slot grid and request list from it.
    pub fn prepare(config: &TimetableConfig) -> Result<Problem, GenerateError> {
        let errors = validation::validate(config);
        if !errors.is_empty() {
            return Err(GenerateError::Config(errors));
        }

        let grid = Grid::build(config)?;
        let classes = validation::roster(config);
        let catalog = Catalog::new(&config.teachers, &config.rooms, &classes);
        let requests = expander::expand(
            &config.subjects,
            grid.slots_per_day(),
            config.slot_length_minutes,
            &catalog,
        )?;

        let mut teachers = Vec::with_capacity(config.teachers.len());
        for teacher in &config.teachers {
            let mut blocked = HashSet::new();
            for block in &teacher.unavailable {
                let day = grid.day_index(&block.day).ok_or_else(|| ConfigError::UnknownDay {
                    context: format!("teacher '{}'", teacher.id),
                    day: block.day.clone(),
                })?;
                if block.slots.is_empty() {
                    blocked.extend((0..grid.slots_per_day()).map(|slot| (day, slot)));
                } else {
                    blocked.extend(block.slots.iter().map(|&slot| (day, slot)));
                }
            }
            teachers.push(TeacherInfo {
                id: teacher.id.clone(),
                blocked,
            });
        }

        info!(
            "Prepared problem: {} request(s), {} room(s), {} teacher(s), {} class(es), {} bookable slot(s).",
            requests.len(),
            config.rooms.len(),
            teachers.len(),
            classes.len(),
            grid.bookable_count()
        );

        Ok(Problem {
            grid,
            rooms: config.rooms.clone(),
            teachers,
            classes,
            subjects: config.subjects.clone(),
            requests,
        })
    }

    pub fn request(&self, id: usize) -> Option<&SessionRequest> {
        self.requests.get(id)
    }

    /// Total slot units a teacher is asked to cover.
    pub fn teacher_demand(&self, teacher: usize) -> usize {
        self.requests
            .iter()
            .filter(|r| r.teacher == teacher)
            .map(|r| r.duration)
            .sum()
    }
}
