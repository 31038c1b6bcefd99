//! Soft-constraint scoring of candidate placements.
//!
//! Scorers only rank candidates that already passed the hard checks in `checker`; they never
//! decide feasibility. Lower penalties are better.

use crate::checker::Assignment;
use crate::data::SolverSettings;
use crate::expander::SessionRequest;
use crate::grid::SlotRange;
use crate::problem::Problem;

/// A candidate placement under evaluation.
pub struct ScoreContext<'a> {
    pub problem: &'a Problem,
    pub assignment: &'a Assignment,
    pub request: &'a SessionRequest,
    pub range: SlotRange,
    pub room: usize,
}

pub trait PlacementScorer: Send + Sync {
    fn name(&self) -> &'static str;

    fn penalty(&self, ctx: &ScoreContext<'_>) -> i64;
}

/// Penalizes stacking the same subject for the same class on one day.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpreadScorer;

impl PlacementScorer for SpreadScorer {
    fn name(&self) -> &'static str {
        "spread"
    }

    fn penalty(&self, ctx: &ScoreContext<'_>) -> i64 {
        let same_day = ctx.assignment.sessions_on_day(
            ctx.request.class,
            ctx.request.subject,
            ctx.range.day,
        ) as i64;
        // quadratic so a third session on one day hurts more than a second
        same_day * same_day + same_day
    }
}

/// Penalizes rooms other than the subject's preferred room, and rooms of the wrong kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoomPreferenceScorer;

impl PlacementScorer for RoomPreferenceScorer {
    fn name(&self) -> &'static str {
        "room-preference"
    }

    fn penalty(&self, ctx: &ScoreContext<'_>) -> i64 {
        let mut penalty = 0;
        if let Some(preferred) = ctx.request.preferred_room {
            if preferred != ctx.room {
                penalty += 2;
            }
        }
        let wanted = ctx
            .problem
            .subjects
            .get(ctx.request.subject)
            .and_then(|s| s.room_kind.as_deref());
        if let Some(wanted) = wanted {
            let kind = ctx.problem.rooms.get(ctx.room).and_then(|r| r.kind.as_deref());
            if kind != Some(wanted) {
                penalty += 1;
            }
        }
        penalty
    }
}

/// Weighted sum of other scorers.
#[derive(Default)]
pub struct WeightedScorer {
    parts: Vec<(i64, Box<dyn PlacementScorer>)>,
}

impl WeightedScorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, weight: i64, scorer: impl PlacementScorer + 'static) -> Self {
        self.parts.push((weight, Box::new(scorer)));
        self
    }

    /// The default mix: day spread and room preference, weighted per `settings`.
    pub fn from_settings(settings: &SolverSettings) -> Self {
        Self::new()
            .with(settings.spread_weight, SpreadScorer)
            .with(settings.room_preference_weight, RoomPreferenceScorer)
    }
}

impl PlacementScorer for WeightedScorer {
    fn name(&self) -> &'static str {
        "weighted"
    }

    fn penalty(&self, ctx: &ScoreContext<'_>) -> i64 {
        self.parts
            .iter()
            .filter(|(weight, _)| *weight != 0)
            .map(|(weight, scorer)| weight * scorer.penalty(ctx))
            .sum()
    }
}

impl std::fmt::Debug for WeightedScorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.parts.iter().map(|(w, s)| (w, s.name())))
            .finish()
    }
}
