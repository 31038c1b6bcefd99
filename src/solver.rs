//! The assignment engine: places every session request or explains why it could not.
//!
//! # Search
//! Requests are visited most-constrained first. Each visit opens a frame holding every
//! feasible (range, room) candidate ranked by the soft-constraint scorer, and places the best.
//! Frames live on an explicit stack. When a request has no candidate, the engine collects the
//! placed requests that block its feasible ranges (same teacher, same class, or every room
//! taken) and jumps back to the most recent of them: frames above it are retracted and the
//! blocker moves to a candidate on a different range. A blocker that has nothing left to try
//! adds its own blockers to the set and the jump continues further down. A single dead end
//! may take at most `backtrack_depth` jumps, and one run at most `max_backtracks`. When
//! neither bound lets the dead end through, that request is set aside and the search carries
//! on without it. Set-aside requests get one more greedy try against the final assignment;
//! whatever still does not fit is reported as unplaced with a diagnosed reason.

use log::{debug, info, trace, warn};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use crate::checker::{self, Assignment};
use crate::data::{SearchStats, SolverSettings, Status, UnplacedReason, UnplacedRequest};
use crate::expander::SessionRequest;
use crate::grid::SlotRange;
use crate::problem::Problem;
use crate::scoring::{PlacementScorer, ScoreContext, WeightedScorer};

/// Cooperative cancellation flag shared between a caller and running attempts.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Lifecycle of one engine run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Pending,
    InProgress,
    Complete,
    Partial,
}

/// What one run produced. `assignment` is always internally consistent, even when cancelled.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub state: RunState,
    pub assignment: Assignment,
    pub unplaced: Vec<UnplacedRequest>,
    pub stats: SearchStats,
}

impl Outcome {
    pub fn status(&self) -> Status {
        match self.state {
            RunState::Complete => Status::Complete,
            _ => Status::Partial,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    range: SlotRange,
    room: usize,
    penalty: i64,
    jitter: u64,
}

#[derive(Debug)]
struct Frame {
    request: usize,
    candidates: Vec<Candidate>,
    next: usize,
    skipped: bool,
}

impl Frame {
    fn open(request: usize, candidates: Vec<Candidate>) -> Self {
        Self {
            request,
            candidates,
            next: 0,
            skipped: false,
        }
    }

    fn skipped(request: usize) -> Self {
        Self {
            request,
            candidates: Vec::new(),
            next: 0,
            skipped: true,
        }
    }

    /// Places the frame's next untried candidate. False once candidates are exhausted.
    fn place_next(&mut self, assignment: &mut Assignment, request: &SessionRequest) -> bool {
        self.place_next_off(assignment, request, None)
    }

    /// Like `place_next`, but skips candidates on `vacated`; another room on the same
    /// range cannot clear a dead end.
    fn place_next_off(
        &mut self,
        assignment: &mut Assignment,
        request: &SessionRequest,
        vacated: Option<SlotRange>,
    ) -> bool {
        while let Some(candidate) = self.candidates.get(self.next).copied() {
            self.next += 1;
            if Some(candidate.range) == vacated {
                continue;
            }
            if assignment
                .place(request, candidate.range, candidate.room)
                .is_ok()
            {
                return true;
            }
        }
        false
    }
}

#[derive(Debug, Clone, Copy)]
struct DeadEnd {
    position: usize,
    request: usize,
    jumps: usize,
}

pub struct Engine<'p> {
    problem: &'p Problem,
    settings: SolverSettings,
    scorer: Box<dyn PlacementScorer>,
    state: RunState,
}

impl<'p> Engine<'p> {
    pub fn new(problem: &'p Problem, settings: &SolverSettings) -> Self {
        Self {
            problem,
            settings: settings.clone(),
            scorer: Box::new(WeightedScorer::from_settings(settings)),
            state: RunState::Pending,
        }
    }

    /// Replaces the soft-constraint scorer.
    pub fn with_scorer(mut self, scorer: impl PlacementScorer + 'static) -> Self {
        self.scorer = Box::new(scorer);
        self
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Runs one attempt. `None` visits ties in declaration order and scans candidates
    /// front to back; a seed shuffles both reproducibly.
    pub fn run(&mut self, seed: Option<u64>, cancel: &CancelToken) -> Outcome {
        let started = Instant::now();
        let problem = self.problem;
        self.state = RunState::InProgress;
        info!(
            "Starting attempt (seed {:?}) over {} request(s)...",
            seed,
            problem.requests.len()
        );

        let mut rng = seed.map(ChaCha8Rng::seed_from_u64);
        let order = self.order(rng.as_mut());
        let mut assignment = Assignment::new(problem.requests.len());
        let mut stack: Vec<Frame> = Vec::with_capacity(order.len());
        let mut set_aside = vec![false; problem.requests.len()];
        let mut dead_end: Option<DeadEnd> = None;
        let mut budget = self.settings.max_backtracks;
        let mut stats = SearchStats::default();
        let mut cancelled = false;

        while stack.len() < order.len() {
            if cancel.is_cancelled() {
                warn!(
                    "Attempt cancelled with {} of {} request(s) placed.",
                    assignment.len(),
                    problem.requests.len()
                );
                cancelled = true;
                break;
            }
            stats.steps += 1;

            let position = stack.len();
            let request = &problem.requests[order[position]];
            if set_aside[request.id] {
                stack.push(Frame::skipped(request.id));
                continue;
            }

            let candidates = self.candidates(request, &assignment, rng.as_mut());
            let mut frame = Frame::open(request.id, candidates);
            if frame.place_next(&mut assignment, request) {
                stack.push(frame);
                if dead_end.is_some_and(|d| stack.len() > d.position) {
                    dead_end = None;
                }
                continue;
            }

            let mut end = dead_end.unwrap_or(DeadEnd {
                position,
                request: request.id,
                jumps: 0,
            });
            trace!(
                "Dead end at position {} (request {}), budget {} left.",
                position, request.id, budget
            );

            let mut conflicts = self.blockers(request, &assignment);
            let mut resumed = false;
            while budget > 0 && end.jumps < self.settings.backtrack_depth {
                let Some(target) = stack
                    .iter()
                    .rposition(|f| !f.skipped && conflicts.contains(&f.request))
                else {
                    break;
                };
                for frame in stack.drain(target + 1..) {
                    if !frame.skipped {
                        assignment.unplace(&problem.requests[frame.request]);
                    }
                }
                let Some(top) = stack.last_mut() else { break };
                let blocker = &problem.requests[top.request];
                let vacated = assignment.unplace(blocker).map(|p| p.range);
                budget -= 1;
                end.jumps += 1;
                stats.backtracks += 1;
                trace!("Jumping back to request {} at position {}.", blocker.id, target);
                if top.place_next_off(&mut assignment, blocker, vacated) {
                    resumed = true;
                    break;
                }
                stack.pop();
                conflicts.remove(&blocker.id);
                conflicts.extend(self.blockers(blocker, &assignment));
            }

            if resumed {
                dead_end = Some(end);
            } else {
                debug!(
                    "Setting aside request {} after {} jump(s) ({} budget left).",
                    end.request, end.jumps, budget
                );
                set_aside[end.request] = true;
                dead_end = None;
            }
        }

        let mut unplaced = Vec::new();
        for &id in &order {
            if assignment.is_placed(id) {
                continue;
            }
            let request = &problem.requests[id];
            let reason = if !set_aside[id] {
                // only reachable after cancellation
                UnplacedReason::Cancelled
            } else if !cancelled && self.place_greedy(request, &mut assignment) {
                continue;
            } else {
                self.diagnose(request, &assignment)
            };
            unplaced.push(describe(problem, request, reason));
        }
        unplaced.sort_by_key(|u| u.request);

        stats.elapsed_ms = started.elapsed().as_millis() as u64;
        self.state = if unplaced.is_empty() {
            RunState::Complete
        } else {
            RunState::Partial
        };
        info!(
            "Attempt finished {:?}: {} placed, {} unplaced, {} backtrack(s) in {} ms.",
            self.state,
            assignment.len(),
            unplaced.len(),
            stats.backtracks,
            stats.elapsed_ms
        );
        for u in &unplaced {
            debug!("Unplaced: {}", u);
        }

        Outcome {
            state: self.state,
            assignment,
            unplaced,
            stats,
        }
    }

    /// Most constrained first: fewest statically feasible starts, then the busiest teacher,
    /// then the longest session, then the tie-break rank.
    fn order(&self, rng: Option<&mut ChaCha8Rng>) -> Vec<usize> {
        let problem = self.problem;
        let mut rank: Vec<usize> = (0..problem.requests.len()).collect();
        if let Some(rng) = rng {
            rank.shuffle(rng);
        }

        let mut demand: HashMap<usize, usize> = HashMap::new();
        let mut domain: HashMap<(usize, usize), usize> = HashMap::new();
        let mut keyed: Vec<_> = problem
            .requests
            .iter()
            .map(|r| {
                let load = *demand
                    .entry(r.teacher)
                    .or_insert_with(|| problem.teacher_demand(r.teacher));
                let starts = *domain.entry((r.teacher, r.duration)).or_insert_with(|| {
                    problem
                        .grid
                        .ranges(r.duration)
                        .filter(|range| {
                            problem
                                .teachers
                                .get(r.teacher)
                                .is_some_and(|t| t.is_available_for(*range))
                        })
                        .count()
                });
                ((starts, Reverse(load), Reverse(r.duration), rank[r.id]), r.id)
            })
            .collect();
        keyed.sort();
        keyed.into_iter().map(|(_, id)| id).collect()
    }

    /// Preferred room, then rooms of the wanted kind, then the rest, each in declaration order.
    fn room_order(&self, request: &SessionRequest) -> Vec<usize> {
        let problem = self.problem;
        let kind = problem
            .subjects
            .get(request.subject)
            .and_then(|s| s.room_kind.as_deref());
        let mut rooms: Vec<usize> = (0..problem.rooms.len()).collect();
        rooms.sort_by_key(|&room| {
            (
                Some(room) != request.preferred_room,
                kind.is_some() && problem.rooms[room].kind.as_deref() != kind,
                room,
            )
        });
        rooms
    }

    fn candidates(
        &self,
        request: &SessionRequest,
        assignment: &Assignment,
        mut rng: Option<&mut ChaCha8Rng>,
    ) -> Vec<Candidate> {
        let problem = self.problem;
        let rooms = self.room_order(request);
        let mut candidates = Vec::new();

        for range in problem.grid.ranges(request.duration) {
            if checker::check_time(problem, assignment, request, range).is_err() {
                continue;
            }
            for &room in &rooms {
                if !checker::room_free(assignment, range, room) {
                    continue;
                }
                let penalty = self.scorer.penalty(&ScoreContext {
                    problem,
                    assignment,
                    request,
                    range,
                    room,
                });
                let jitter = rng.as_deref_mut().map_or(0, |r| r.random::<u64>());
                candidates.push(Candidate {
                    range,
                    room,
                    penalty,
                    jitter,
                });
            }
        }

        // stable: unseeded ties keep the forward scan and room order
        candidates.sort_by_key(|c| (c.penalty, c.jitter));
        candidates
    }

    /// Placed requests standing in the way of `request`: whoever holds its teacher or class
    /// on a range the teacher could take, or every room on a range that is otherwise free.
    fn blockers(&self, request: &SessionRequest, assignment: &Assignment) -> HashSet<usize> {
        let problem = self.problem;
        let teacher = problem.teachers.get(request.teacher);
        let mut blockers = HashSet::new();

        for range in problem.grid.ranges(request.duration) {
            if !teacher.is_some_and(|t| t.is_available_for(range)) {
                continue;
            }
            let mut held = false;
            for slot in range.indices() {
                let occupants = [
                    assignment.teacher_at(range.day, slot, request.teacher),
                    assignment.class_at(range.day, slot, request.class),
                ];
                for occupant in occupants.into_iter().flatten() {
                    blockers.insert(occupant);
                    held = true;
                }
            }
            let room_free =
                (0..problem.rooms.len()).any(|room| checker::room_free(assignment, range, room));
            if !held && !room_free {
                for slot in range.indices() {
                    blockers.extend(
                        (0..problem.rooms.len())
                            .filter_map(|room| assignment.room_at(range.day, slot, room)),
                    );
                }
            }
        }
        blockers
    }

    fn place_greedy(&self, request: &SessionRequest, assignment: &mut Assignment) -> bool {
        let candidates = self.candidates(request, assignment, None);
        let mut frame = Frame::open(request.id, candidates);
        frame.place_next(assignment, request)
    }

    /// Names the dominant obstacle for a request that has no feasible candidate.
    ///
    /// A range blocked only by the teacher counts toward `TeacherConflict`, one blocked only
    /// by rooms toward `RoomConflict`. Anything else, including a saturated class, is
    /// `NoAvailableSlot`.
    fn diagnose(&self, request: &SessionRequest, assignment: &Assignment) -> UnplacedReason {
        let problem = self.problem;
        let mut ranges = problem.grid.ranges(request.duration).peekable();
        if ranges.peek().is_none() {
            return UnplacedReason::DurationExceedsDay;
        }

        let (mut teacher_only, mut room_only) = (0usize, 0usize);
        for range in ranges {
            let teacher_ok = problem
                .teachers
                .get(request.teacher)
                .is_some_and(|t| t.is_available_for(range))
                && range
                    .indices()
                    .all(|s| assignment.teacher_at(range.day, s, request.teacher).is_none());
            let class_ok = range
                .indices()
                .all(|s| assignment.class_at(range.day, s, request.class).is_none());
            let room_ok =
                (0..problem.rooms.len()).any(|room| checker::room_free(assignment, range, room));
            match (teacher_ok, class_ok, room_ok) {
                (false, true, true) => teacher_only += 1,
                (true, true, false) => room_only += 1,
                _ => {}
            }
        }

        if teacher_only > 0 && teacher_only >= room_only {
            UnplacedReason::TeacherConflict
        } else if room_only > 0 {
            UnplacedReason::RoomConflict
        } else {
            UnplacedReason::NoAvailableSlot
        }
    }
}

fn describe(problem: &Problem, request: &SessionRequest, reason: UnplacedReason) -> UnplacedRequest {
    UnplacedRequest {
        request: request.id,
        subject: problem
            .subjects
            .get(request.subject)
            .map(|s| s.id.clone())
            .unwrap_or_default(),
        class: problem.classes.get(request.class).cloned().unwrap_or_default(),
        teacher: problem
            .teachers
            .get(request.teacher)
            .map(|t| t.id.clone())
            .unwrap_or_default(),
        duration: request.duration,
        occurrence: request.occurrence,
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::TimetableConfig;
    use serde_json::json;

    fn problem(value: serde_json::Value) -> Problem {
        let config: TimetableConfig = serde_json::from_value(value).unwrap();
        Problem::prepare(&config).unwrap()
    }

    fn small() -> serde_json::Value {
        json!({
            "workingDays": ["Mon", "Tue", "Wed"],
            "dayStart": "08:00",
            "dayEnd": "12:00",
            "slotLengthMinutes": 60,
            "rooms": [{"id": "R1"}, {"id": "Lab", "kind": "lab"}],
            "teachers": [{"id": "T1"}, {"id": "T2"}],
            "subjects": [
                {"id": "math", "class": "A", "sessionsPerWeek": 3, "teacher": "T1"},
                {"id": "chem", "class": "A", "sessionsPerWeek": 2, "teacher": "T2",
                 "durationSlots": 2, "roomKind": "lab"},
                {"id": "math", "class": "B", "sessionsPerWeek": 3, "teacher": "T1"}
            ]
        })
    }

    fn assert_consistent(p: &Problem, a: &Assignment) {
        let mut seen = std::collections::HashSet::new();
        for placement in a.placements() {
            let r = &p.requests[placement.request];
            assert!(p.grid.check_range(placement.range).is_ok());
            for slot in placement.range.indices() {
                let day = placement.range.day;
                assert!(seen.insert(("teacher", day, slot, r.teacher)));
                assert!(seen.insert(("room", day, slot, placement.room)));
                assert!(seen.insert(("class", day, slot, r.class)));
            }
        }
    }

    #[test]
    fn places_everything_and_spreads_subjects() {
        let p = problem(small());
        let mut engine = Engine::new(&p, &SolverSettings::default());
        assert_eq!(engine.state(), RunState::Pending);
        let outcome = engine.run(None, &CancelToken::new());

        assert_eq!(engine.state(), RunState::Complete);
        assert_eq!(outcome.status(), Status::Complete);
        assert_eq!(outcome.assignment.len(), p.requests.len());
        assert!(outcome.unplaced.is_empty());
        assert_consistent(&p, &outcome.assignment);

        // three math sessions for class A land on three different days
        let mut days: Vec<usize> = p
            .requests
            .iter()
            .filter(|r| r.subject == 0)
            .filter_map(|r| outcome.assignment.placement(r.id))
            .map(|pl| pl.range.day)
            .collect();
        days.sort();
        assert_eq!(days, vec![0, 1, 2]);

        // chem prefers the lab
        for r in p.requests.iter().filter(|r| r.subject == 1) {
            assert_eq!(outcome.assignment.placement(r.id).unwrap().room, 1);
        }
    }

    #[test]
    fn same_seed_same_assignment() {
        let p = problem(small());
        let settings = SolverSettings::default();
        let first = Engine::new(&p, &settings).run(Some(42), &CancelToken::new());
        let second = Engine::new(&p, &settings).run(Some(42), &CancelToken::new());
        let a: Vec<_> = first.assignment.placements().copied().collect();
        let b: Vec<_> = second.assignment.placements().copied().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn backtracking_repairs_greedy_dead_end() {
        // The talk is most constrained and greedily takes slot 2, which splits the day so the
        // three-slot lab no longer fits. Moving the talk to slot 4 frees 0-2.
        let p = problem(json!({
            "workingDays": ["Mon"],
            "dayStart": "08:00",
            "dayEnd": "13:00",
            "slotLengthMinutes": 60,
            "rooms": [{"id": "R1"}],
            "teachers": [
                {"id": "T1", "unavailable": [{"day": "Mon", "slots": [0, 1, 3]}]},
                {"id": "T2"},
                {"id": "T3"}
            ],
            "subjects": [
                {"id": "talk", "class": "A", "sessionsPerWeek": 1, "teacher": "T1"},
                {"id": "lab", "class": "A", "sessionsPerWeek": 1, "teacher": "T2", "durationSlots": 3},
                {"id": "quiz", "class": "A", "sessionsPerWeek": 1, "teacher": "T3"}
            ]
        }));
        let outcome = Engine::new(&p, &SolverSettings::default()).run(None, &CancelToken::new());
        assert_eq!(outcome.state, RunState::Complete);
        assert!(outcome.stats.backtracks >= 1);
        assert_eq!(outcome.assignment.placement(0).unwrap().range, SlotRange::new(0, 4, 1));
        assert_eq!(outcome.assignment.placement(1).unwrap().range, SlotRange::new(0, 0, 3));
        assert_consistent(&p, &outcome.assignment);
    }

    /// Class A: the keynote is pinned to slot 1, chem may take 0 or 2, reading 0 or 1.
    /// `unrelated` single-session classes are ordered between chem and reading.
    fn buried_blocker(unrelated: usize) -> serde_json::Value {
        let mut teachers = vec![
            json!({"id": "TK", "unavailable": [{"day": "Mon", "slots": [0, 2]}]}),
            json!({"id": "T5", "unavailable": [{"day": "Mon", "slots": [1]}]}),
            json!({"id": "T2", "unavailable": [{"day": "Mon", "slots": [2]}]}),
        ];
        let mut subjects = vec![
            json!({"id": "keynote", "class": "A", "sessionsPerWeek": 1, "teacher": "TK"}),
            json!({"id": "chem", "class": "A", "sessionsPerWeek": 1, "teacher": "T5"}),
        ];
        for i in 0..unrelated {
            teachers.push(json!({"id": format!("TU{}", i), "unavailable": [{"day": "Mon", "slots": [1]}]}));
            subjects.push(json!({
                "id": "club", "class": format!("U{}", i), "sessionsPerWeek": 1,
                "teacher": format!("TU{}", i)
            }));
        }
        subjects.push(json!({"id": "reading", "class": "A", "sessionsPerWeek": 1, "teacher": "T2"}));
        let rooms: Vec<_> = (0..unrelated + 2).map(|i| json!({"id": format!("R{}", i)})).collect();
        json!({
            "workingDays": ["Mon"],
            "dayStart": "08:00",
            "dayEnd": "11:00",
            "slotLengthMinutes": 60,
            "rooms": rooms,
            "teachers": teachers,
            "subjects": subjects
        })
    }

    #[test]
    fn jumps_over_unrelated_frames_to_the_blocker() {
        for unrelated in [0, 2, 10] {
            let p = problem(buried_blocker(unrelated));
            let reading = unrelated + 2;
            let outcome = Engine::new(&p, &SolverSettings::default()).run(None, &CancelToken::new());
            assert_eq!(outcome.state, RunState::Complete, "unrelated = {}", unrelated);
            assert_eq!(outcome.stats.backtracks, 1);
            assert_eq!(outcome.assignment.placement(1).unwrap().range, SlotRange::new(0, 2, 1));
            assert_eq!(
                outcome.assignment.placement(reading).unwrap().range,
                SlotRange::new(0, 0, 1)
            );
            assert_consistent(&p, &outcome.assignment);
        }
    }

    #[test]
    fn depth_and_budget_bound_the_repair() {
        let p = problem(buried_blocker(4));
        let shallow = SolverSettings {
            backtrack_depth: 0,
            ..SolverSettings::default()
        };
        let broke = SolverSettings {
            max_backtracks: 0,
            ..SolverSettings::default()
        };
        for settings in [shallow, broke] {
            let outcome = Engine::new(&p, &settings).run(None, &CancelToken::new());
            assert_eq!(outcome.state, RunState::Partial);
            assert_eq!(outcome.stats.backtracks, 0);
            assert_eq!(outcome.unplaced.len(), 1);
            assert_eq!(outcome.unplaced[0].request, 6);
            assert_consistent(&p, &outcome.assignment);
        }
    }

    #[test]
    fn exhausted_budget_still_reports_every_request() {
        let p = problem(json!({
            "workingDays": ["Mon"],
            "dayStart": "08:00",
            "dayEnd": "11:00",
            "slotLengthMinutes": 60,
            "rooms": [{"id": "R1"}],
            "teachers": [{"id": "T1"}],
            "subjects": [{"id": "math", "class": "A", "sessionsPerWeek": 5, "teacher": "T1"}]
        }));
        let settings = SolverSettings {
            max_backtracks: 0,
            ..SolverSettings::default()
        };
        let outcome = Engine::new(&p, &settings).run(None, &CancelToken::new());
        assert_eq!(outcome.state, RunState::Partial);
        assert_eq!(outcome.assignment.len(), 3);
        assert_eq!(outcome.unplaced.len(), 2);
        assert!(outcome
            .unplaced
            .iter()
            .all(|u| u.reason == UnplacedReason::NoAvailableSlot));
    }

    #[test]
    fn reports_teacher_and_room_conflicts() {
        let teacher_bound = problem(json!({
            "workingDays": ["Mon"],
            "dayStart": "08:00",
            "dayEnd": "10:00",
            "slotLengthMinutes": 60,
            "rooms": [{"id": "R1"}, {"id": "R2"}],
            "teachers": [{"id": "T1"}],
            "subjects": [
                {"id": "math", "class": "A", "sessionsPerWeek": 2, "teacher": "T1"},
                {"id": "math", "class": "B", "sessionsPerWeek": 1, "teacher": "T1"}
            ]
        }));
        let outcome =
            Engine::new(&teacher_bound, &SolverSettings::default()).run(None, &CancelToken::new());
        assert_eq!(outcome.unplaced.len(), 1);
        assert_eq!(outcome.unplaced[0].reason, UnplacedReason::TeacherConflict);

        let room_bound = problem(json!({
            "workingDays": ["Mon"],
            "dayStart": "08:00",
            "dayEnd": "09:00",
            "slotLengthMinutes": 60,
            "rooms": [{"id": "R1"}],
            "teachers": [{"id": "T1"}, {"id": "T2"}],
            "subjects": [
                {"id": "math", "class": "A", "sessionsPerWeek": 1, "teacher": "T1"},
                {"id": "art", "class": "B", "sessionsPerWeek": 1, "teacher": "T2"}
            ]
        }));
        let outcome =
            Engine::new(&room_bound, &SolverSettings::default()).run(None, &CancelToken::new());
        assert_eq!(outcome.unplaced.len(), 1);
        assert_eq!(outcome.unplaced[0].reason, UnplacedReason::RoomConflict);
    }

    #[test]
    fn recess_split_day_reports_duration() {
        let p = problem(json!({
            "workingDays": ["Mon"],
            "dayStart": "08:00",
            "dayEnd": "13:00",
            "slotLengthMinutes": 60,
            "recesses": [{"start": "10:00", "end": "11:00"}],
            "rooms": [{"id": "R1"}],
            "teachers": [{"id": "T1"}],
            "subjects": [{"id": "lab", "class": "A", "sessionsPerWeek": 1, "teacher": "T1", "durationSlots": 3}]
        }));
        let outcome = Engine::new(&p, &SolverSettings::default()).run(None, &CancelToken::new());
        assert_eq!(outcome.unplaced.len(), 1);
        assert_eq!(outcome.unplaced[0].reason, UnplacedReason::DurationExceedsDay);
    }

    #[test]
    fn cancelled_run_returns_consistent_partial() {
        let p = problem(small());
        let cancel = CancelToken::new();
        cancel.cancel();
        let mut engine = Engine::new(&p, &SolverSettings::default());
        let outcome = engine.run(None, &cancel);
        assert_eq!(engine.state(), RunState::Partial);
        assert!(outcome.assignment.is_empty());
        assert_eq!(outcome.unplaced.len(), p.requests.len());
        assert!(outcome
            .unplaced
            .iter()
            .all(|u| u.reason == UnplacedReason::Cancelled));
    }
}
