//! Read-only projections of an assignment: per-class and per-teacher week grids, a flat
//! session list, and row-oriented output for tabular export.

use itertools::Itertools;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

use crate::checker::Assignment;
use crate::data::{ClassId, ClockTime, DayName, RoomId, SubjectId, TeacherId};
use crate::error::InvariantError;
use crate::grid::{RangeError, Slot};
use crate::problem::Problem;

/// What occupies one slot of a grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cell {
    pub subject: SubjectId,
    pub subject_name: String,
    pub class: ClassId,
    pub teacher: TeacherId,
    pub room: RoomId,
}

/// A day x slot matrix of cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekGrid {
    pub days: Vec<Vec<Option<Cell>>>,
}

impl WeekGrid {
    fn empty(days: usize, slots: usize) -> Self {
        Self {
            days: vec![vec![None; slots]; days],
        }
    }

    pub fn get(&self, day: usize, slot: usize) -> Option<&Cell> {
        self.days.get(day)?.get(slot)?.as_ref()
    }

    pub fn occupied(&self) -> usize {
        self.days.iter().flatten().flatten().count()
    }
}

/// One placed session, in request order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledSession {
    pub request: usize,
    pub day: DayName,
    pub start: ClockTime,
    pub end: ClockTime,
    pub slots: Vec<usize>,
    pub subject: SubjectId,
    pub class: ClassId,
    pub teacher: TeacherId,
    pub room: RoomId,
}

/// One occupied slot, flattened for CSV-like output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimetableRow {
    pub day: DayName,
    pub start: ClockTime,
    pub end: ClockTime,
    pub class: ClassId,
    pub teacher: TeacherId,
    pub subject: SubjectId,
    pub subject_name: String,
    pub room: RoomId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Timetable {
    pub days: Vec<DayName>,
    pub slots: Vec<Slot>,
    pub sessions: Vec<ScheduledSession>,
    pub classes: BTreeMap<ClassId, WeekGrid>,
    pub teachers: BTreeMap<TeacherId, WeekGrid>,
}

impl Timetable {
    /// Projects `assignment` onto `problem`'s grid.
    ///
    /// Any placement outside the grid, on a recess, referencing an unknown entity, or
    /// colliding with another placement is reported as an `InvariantError`.
    pub fn materialize(problem: &Problem, assignment: &Assignment) -> Result<Timetable, InvariantError> {
        let grid = &problem.grid;
        let (day_count, slot_count) = (grid.day_count(), grid.slots_per_day());
        let mut class_grids = vec![WeekGrid::empty(day_count, slot_count); problem.classes.len()];
        let mut teacher_grids =
            vec![WeekGrid::empty(day_count, slot_count); problem.teachers.len()];
        let mut rooms_taken = HashSet::new();
        let mut sessions = Vec::with_capacity(assignment.len());

        for placement in assignment.placements() {
            let request = problem
                .request(placement.request)
                .ok_or(InvariantError::UnknownIndex {
                    kind: "request",
                    index: placement.request,
                })?;
            let range = placement.range;
            match grid.check_range(range) {
                Ok(()) => {}
                Err(RangeError::OutOfBounds) => {
                    return Err(InvariantError::SlotOutsideGrid {
                        request: request.id,
                        day: range.day,
                        slot: range.end().saturating_sub(1),
                    });
                }
                Err(RangeError::Recess) => {
                    let slot = range
                        .indices()
                        .find(|&s| grid.slot(range.day, s).is_some_and(|s| s.is_recess))
                        .unwrap_or(range.start);
                    return Err(InvariantError::RecessPlacement {
                        request: request.id,
                        day: range.day,
                        slot,
                    });
                }
            }

            let subject = lookup(&problem.subjects, request.subject, "subject")?;
            let room = lookup(&problem.rooms, placement.room, "room")?;
            let teacher = lookup(&problem.teachers, request.teacher, "teacher")?;
            let class = lookup(&problem.classes, request.class, "class")?;
            let cell = Cell {
                subject: subject.id.clone(),
                subject_name: subject.display_name().to_string(),
                class: class.clone(),
                teacher: teacher.id.clone(),
                room: room.id.clone(),
            };

            for slot in range.indices() {
                if !rooms_taken.insert((range.day, slot, placement.room)) {
                    return Err(double_booked("room", &room.id, range.day, slot));
                }
                if !fill(&mut class_grids[request.class], range.day, slot, &cell) {
                    return Err(double_booked("class", class, range.day, slot));
                }
                if !fill(&mut teacher_grids[request.teacher], range.day, slot, &cell) {
                    return Err(double_booked("teacher", &teacher.id, range.day, slot));
                }
            }

            let first = grid.slot(range.day, range.start);
            let last = grid.slot(range.day, range.end() - 1);
            let (Some(first), Some(last)) = (first, last) else {
                return Err(InvariantError::SlotOutsideGrid {
                    request: request.id,
                    day: range.day,
                    slot: range.start,
                });
            };
            sessions.push(ScheduledSession {
                request: request.id,
                day: grid.days()[range.day].clone(),
                start: first.start,
                end: last.end,
                slots: range.indices().collect(),
                subject: cell.subject,
                class: cell.class,
                teacher: cell.teacher,
                room: cell.room,
            });
        }

        Ok(Timetable {
            days: grid.days().to_vec(),
            slots: grid.slots().to_vec(),
            sessions,
            classes: problem.classes.iter().cloned().zip(class_grids).collect(),
            teachers: problem
                .teachers
                .iter()
                .map(|t| t.id.clone())
                .zip(teacher_grids)
                .collect(),
        })
    }

    pub fn class_grid(&self, class: &str) -> Option<&WeekGrid> {
        self.classes.get(class)
    }

    pub fn teacher_grid(&self, teacher: &str) -> Option<&WeekGrid> {
        self.teachers.get(teacher)
    }

    /// One row per occupied class slot, ordered by day, slot, then class.
    pub fn rows(&self) -> Vec<TimetableRow> {
        let slots_per_day = self.slots.len().checked_div(self.days.len()).unwrap_or(0);
        self.classes
            .values()
            .flat_map(|grid| {
                grid.days.iter().enumerate().flat_map(move |(day, cells)| {
                    cells
                        .iter()
                        .enumerate()
                        .filter_map(move |(slot, cell)| cell.as_ref().map(|c| (day, slot, c)))
                })
            })
            .sorted_by_key(|(day, slot, cell)| (*day, *slot, cell.class.clone()))
            .filter_map(|(day, slot, cell)| {
                let header = self.slots.get(day * slots_per_day + slot)?;
                Some(TimetableRow {
                    day: self.days.get(day)?.clone(),
                    start: header.start,
                    end: header.end,
                    class: cell.class.clone(),
                    teacher: cell.teacher.clone(),
                    subject: cell.subject.clone(),
                    subject_name: cell.subject_name.clone(),
                    room: cell.room.clone(),
                })
            })
            .collect()
    }
}

fn lookup<'a, T>(items: &'a [T], index: usize, kind: &'static str) -> Result<&'a T, InvariantError> {
    items
        .get(index)
        .ok_or(InvariantError::UnknownIndex { kind, index })
}

/// Writes `cell` into an empty grid position. False if the position is taken or missing.
fn fill(grid: &mut WeekGrid, day: usize, slot: usize, cell: &Cell) -> bool {
    match grid.days.get_mut(day).and_then(|d| d.get_mut(slot)) {
        Some(target) if target.is_none() => {
            *target = Some(cell.clone());
            true
        }
        _ => false,
    }
}

fn double_booked(owner: &'static str, id: &str, day: usize, slot: usize) -> InvariantError {
    InvariantError::DoubleBooked {
        owner,
        id: id.to_string(),
        day,
        slot,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::TimetableConfig;
    use crate::grid::SlotRange;
    use serde_json::json;

    fn problem() -> Problem {
        let config: TimetableConfig = serde_json::from_value(json!({
            "workingDays": ["Mon", "Tue"],
            "dayStart": "09:00",
            "dayEnd": "13:00",
            "slotLengthMinutes": 60,
            "recesses": [{"day": "Tue", "start": "11:00", "end": "12:00"}],
            "rooms": [{"id": "R1"}, {"id": "R2"}],
            "teachers": [{"id": "T1"}, {"id": "T2"}],
            "subjects": [
                {"id": "math", "name": "Mathematics", "class": "A", "sessionsPerWeek": 1, "teacher": "T1"},
                {"id": "lab", "class": "B", "sessionsPerWeek": 1, "teacher": "T2", "durationSlots": 2}
            ]
        }))
        .unwrap();
        Problem::prepare(&config).unwrap()
    }

    #[test]
    fn projects_class_and_teacher_views() {
        let p = problem();
        let mut a = Assignment::new(p.requests.len());
        a.place(&p.requests[0], SlotRange::new(0, 1, 1), 0).unwrap();
        a.place(&p.requests[1], SlotRange::new(0, 0, 2), 1).unwrap();

        let t = Timetable::materialize(&p, &a).unwrap();
        let class_a = t.class_grid("A").unwrap();
        assert_eq!(class_a.occupied(), 1);
        let cell = class_a.get(0, 1).unwrap();
        assert_eq!(cell.subject_name, "Mathematics");
        assert_eq!(cell.room, "R1");
        assert_eq!(t.teacher_grid("T2").unwrap().occupied(), 2);
        assert_eq!(t.teacher_grid("T1").unwrap().get(1, 1), None);

        assert_eq!(t.sessions.len(), 2);
        assert_eq!(t.sessions[1].start.to_string(), "09:00");
        assert_eq!(t.sessions[1].end.to_string(), "11:00");
        assert_eq!(t.sessions[1].slots, vec![0, 1]);

        let rows = t.rows();
        assert_eq!(rows.len(), 3);
        assert_eq!(
            rows.iter()
                .map(|r| (r.start.to_string(), r.class.as_str()))
                .collect::<Vec<_>>(),
            vec![
                ("09:00".to_string(), "B"),
                ("10:00".to_string(), "A"),
                ("10:00".to_string(), "B")
            ]
        );
        assert!(rows.iter().all(|r| r.day == "Mon"));
    }

    #[test]
    fn empty_assignment_yields_empty_grids_for_every_class_and_teacher() {
        let p = problem();
        let t = Timetable::materialize(&p, &Assignment::new(p.requests.len())).unwrap();
        assert_eq!(t.classes.len(), 2);
        assert_eq!(t.teachers.len(), 2);
        assert!(t.rows().is_empty());
        assert_eq!(t.slots.iter().filter(|s| s.is_recess).count(), 1);
    }

    #[test]
    fn placement_built_for_another_grid_is_an_invariant_error() {
        let p = problem();
        let mut a = Assignment::new(p.requests.len());
        // the assignment store does not know about recesses; the projection must refuse it
        a.place(&p.requests[0], SlotRange::new(1, 2, 1), 0).unwrap();
        assert_eq!(
            Timetable::materialize(&p, &a),
            Err(InvariantError::RecessPlacement {
                request: 0,
                day: 1,
                slot: 2
            })
        );

        let mut a = Assignment::new(p.requests.len());
        a.place(&p.requests[0], SlotRange::new(3, 0, 1), 0).unwrap();
        assert!(matches!(
            Timetable::materialize(&p, &a),
            Err(InvariantError::SlotOutsideGrid { day: 3, .. })
        ));
    }
}
