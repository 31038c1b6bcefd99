//! Hard-constraint checks and the placement store they run against.
//!
//! An `Assignment` indexes its placements by (day, slot, teacher|room|class) so every check is
//! a handful of hash lookups per slot in the candidate range, independent of how many
//! sessions are already placed.

use serde::Serialize;
use std::collections::HashMap;

use crate::expander::SessionRequest;
use crate::grid::{RangeError, SlotRange};
use crate::problem::Problem;

/// A session request pinned to a slot range and a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Placement {
    pub request: usize,
    pub range: SlotRange,
    pub room: usize,
}

/// The first hard constraint a proposed placement breaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Conflict {
    OutOfBounds,
    Recess,
    TeacherUnavailable,
    TeacherBusy,
    ClassBusy,
    RoomBusy,
    UnknownRoom,
    AlreadyPlaced,
}

impl From<RangeError> for Conflict {
    fn from(err: RangeError) -> Self {
        match err {
            RangeError::OutOfBounds => Conflict::OutOfBounds,
            RangeError::Recess => Conflict::Recess,
        }
    }
}

type Cell = (usize, usize, usize);

/// The placements of one generation attempt.
#[derive(Debug, Clone, Default)]
pub struct Assignment {
    placements: Vec<Option<Placement>>,
    placed: usize,
    teacher_busy: HashMap<Cell, usize>,
    room_busy: HashMap<Cell, usize>,
    class_busy: HashMap<Cell, usize>,
    // (class, subject, day) -> sessions
    daily_sessions: HashMap<Cell, usize>,
}

impl Assignment {
    pub fn new(request_count: usize) -> Self {
        Self {
            placements: vec![None; request_count],
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.placed
    }

    pub fn is_empty(&self) -> bool {
        self.placed == 0
    }

    pub fn is_placed(&self, request: usize) -> bool {
        self.placement(request).is_some()
    }

    pub fn placement(&self, request: usize) -> Option<&Placement> {
        self.placements.get(request).and_then(Option::as_ref)
    }

    /// Placements ordered by request id.
    pub fn placements(&self) -> impl Iterator<Item = &Placement> + '_ {
        self.placements.iter().flatten()
    }

    pub fn teacher_at(&self, day: usize, slot: usize, teacher: usize) -> Option<usize> {
        self.teacher_busy.get(&(day, slot, teacher)).copied()
    }

    pub fn room_at(&self, day: usize, slot: usize, room: usize) -> Option<usize> {
        self.room_busy.get(&(day, slot, room)).copied()
    }

    pub fn class_at(&self, day: usize, slot: usize, class: usize) -> Option<usize> {
        self.class_busy.get(&(day, slot, class)).copied()
    }

    /// How many sessions of `subject` the class already has on `day`.
    pub fn sessions_on_day(&self, class: usize, subject: usize, day: usize) -> usize {
        self.daily_sessions
            .get(&(class, subject, day))
            .copied()
            .unwrap_or(0)
    }

    /// Records a placement. Occupancy is re-checked; on conflict nothing is changed.
    pub fn place(
        &mut self,
        request: &SessionRequest,
        range: SlotRange,
        room: usize,
    ) -> Result<(), Conflict> {
        match self.placements.get(request.id) {
            None => return Err(Conflict::OutOfBounds),
            Some(Some(_)) => return Err(Conflict::AlreadyPlaced),
            Some(None) => {}
        }
        check_occupancy(self, request, range)?;
        if !room_free(self, range, room) {
            return Err(Conflict::RoomBusy);
        }

        for slot in range.indices() {
            self.teacher_busy
                .insert((range.day, slot, request.teacher), request.id);
            self.room_busy.insert((range.day, slot, room), request.id);
            self.class_busy
                .insert((range.day, slot, request.class), request.id);
        }
        *self
            .daily_sessions
            .entry((request.class, request.subject, range.day))
            .or_insert(0) += 1;
        self.placements[request.id] = Some(Placement {
            request: request.id,
            range,
            room,
        });
        self.placed += 1;
        Ok(())
    }

    /// Removes the placement of `request`, if any, and returns it.
    pub fn unplace(&mut self, request: &SessionRequest) -> Option<Placement> {
        let placement = self.placements.get_mut(request.id)?.take()?;
        let range = placement.range;
        for slot in range.indices() {
            self.teacher_busy.remove(&(range.day, slot, request.teacher));
            self.room_busy.remove(&(range.day, slot, placement.room));
            self.class_busy.remove(&(range.day, slot, request.class));
        }
        let key = (request.class, request.subject, range.day);
        if let Some(count) = self.daily_sessions.get_mut(&key) {
            *count -= 1;
            if *count == 0 {
                self.daily_sessions.remove(&key);
            }
        }
        self.placed -= 1;
        Some(placement)
    }
}

/// Whether `request` may occupy `range` in `room` given what `assignment` already holds.
pub fn can_place(
    problem: &Problem,
    assignment: &Assignment,
    request: &SessionRequest,
    range: SlotRange,
    room: usize,
) -> bool {
    check(problem, assignment, request, range, room).is_ok()
}

/// Like [`can_place`], but names the first violated constraint.
pub fn check(
    problem: &Problem,
    assignment: &Assignment,
    request: &SessionRequest,
    range: SlotRange,
    room: usize,
) -> Result<(), Conflict> {
    if room >= problem.rooms.len() {
        return Err(Conflict::UnknownRoom);
    }
    check_time(problem, assignment, request, range)?;
    if room_free(assignment, range, room) {
        Ok(())
    } else {
        Err(Conflict::RoomBusy)
    }
}

/// Every room-independent constraint: grid bounds, recess, teacher availability,
/// teacher and class occupancy.
pub fn check_time(
    problem: &Problem,
    assignment: &Assignment,
    request: &SessionRequest,
    range: SlotRange,
) -> Result<(), Conflict> {
    if range.len != request.duration {
        return Err(Conflict::OutOfBounds);
    }
    problem.grid.check_range(range)?;
    let available = problem
        .teachers
        .get(request.teacher)
        .is_some_and(|t| t.is_available_for(range));
    if !available {
        return Err(Conflict::TeacherUnavailable);
    }
    check_occupancy(assignment, request, range)
}

pub fn room_free(assignment: &Assignment, range: SlotRange, room: usize) -> bool {
    range
        .indices()
        .all(|slot| assignment.room_at(range.day, slot, room).is_none())
}

fn check_occupancy(
    assignment: &Assignment,
    request: &SessionRequest,
    range: SlotRange,
) -> Result<(), Conflict> {
    for slot in range.indices() {
        if assignment.teacher_at(range.day, slot, request.teacher).is_some() {
            return Err(Conflict::TeacherBusy);
        }
        if assignment.class_at(range.day, slot, request.class).is_some() {
            return Err(Conflict::ClassBusy);
        }
    }
    Ok(())
}
