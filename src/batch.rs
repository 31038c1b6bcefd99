//! Generation of several independent timetables in one call.
//!
//! The configuration is validated and prepared once; every attempt then owns a private
//! assignment and shares only the read-only `Problem`, so attempts run in parallel on the
//! rayon pool. Per-attempt seeds are drawn from a ChaCha stream keyed by the base seed,
//! which keeps a batch reproducible on any platform.

use log::{error, info};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use crate::data::{GenerationResult, SolverSettings, TimetableConfig};
use crate::error::{ConfigError, GenerateError};
use crate::problem::Problem;
use crate::solver::{CancelToken, Engine, RunState};
use crate::timetable::Timetable;

#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    pub attempts: usize,
    /// Base seed. Drawn from OS entropy when absent.
    pub seed: Option<u64>,
    pub cancel: CancelToken,
}

impl BatchOptions {
    pub fn new(attempts: usize) -> Self {
        Self {
            attempts,
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// Generates `attempts` timetables. Attempts that cannot place everything come back as
/// `Partial` results; only configuration problems and engine bugs are errors.
pub fn generate(
    config: &TimetableConfig,
    attempts: usize,
    seed: Option<u64>,
) -> Result<Vec<GenerationResult>, GenerateError> {
    let mut options = BatchOptions::new(attempts);
    options.seed = seed;
    generate_with(config, &options)
}

pub fn generate_with(
    config: &TimetableConfig,
    options: &BatchOptions,
) -> Result<Vec<GenerationResult>, GenerateError> {
    if options.attempts == 0 {
        return Err(ConfigError::ZeroAttempts.into());
    }
    let base = options.seed.unwrap_or_else(rand::random);
    let seeds = attempt_seeds(base, options.attempts);
    info!(
        "Generating {} timetable(s) from base seed {}.",
        options.attempts, base
    );
    generate_with_seeds(config, &seeds, &options.cancel)
}

/// Runs one attempt per seed, in order. The same configuration and seed list always
/// produce the same results.
pub fn generate_with_seeds(
    config: &TimetableConfig,
    seeds: &[u64],
    cancel: &CancelToken,
) -> Result<Vec<GenerationResult>, GenerateError> {
    if seeds.is_empty() {
        return Err(ConfigError::ZeroAttempts.into());
    }
    let problem = Problem::prepare(config)?;

    let results: Vec<GenerationResult> = seeds
        .par_iter()
        .enumerate()
        .map(|(i, &seed)| {
            run_attempt(
                &problem,
                &config.solver,
                config.timetable_name(i),
                seed,
                cancel,
            )
        })
        .collect::<Result<_, _>>()?;

    let complete = results.iter().filter(|r| r.is_complete()).count();
    info!(
        "Batch finished: {} of {} timetable(s) complete.",
        complete,
        results.len()
    );
    Ok(results)
}

pub fn attempt_seeds(base: u64, attempts: usize) -> Vec<u64> {
    let mut rng = ChaCha8Rng::seed_from_u64(base);
    (0..attempts).map(|_| rng.random()).collect()
}

/// One timetable: up to `restarts_per_timetable` engine runs, keeping the first complete
/// run or else the one with the fewest unplaced requests. The reported seed is the one
/// whose run was kept, so a single-seed batch with it reproduces the result.
fn run_attempt(
    problem: &Problem,
    settings: &SolverSettings,
    name: String,
    seed: u64,
    cancel: &CancelToken,
) -> Result<GenerationResult, GenerateError> {
    let tries = settings.restarts_per_timetable.max(1);
    let mut restart_seeds = ChaCha8Rng::seed_from_u64(seed);
    let mut kept_seed = seed;
    let mut kept = Engine::new(problem, settings).run(Some(seed), cancel);
    let mut runs = 1;

    while runs < tries && kept.state != RunState::Complete && !cancel.is_cancelled() {
        let run_seed = restart_seeds.random();
        let outcome = Engine::new(problem, settings).run(Some(run_seed), cancel);
        runs += 1;
        if outcome.unplaced.len() < kept.unplaced.len() {
            kept_seed = run_seed;
            kept = outcome;
        }
    }

    let timetable = Timetable::materialize(problem, &kept.assignment).map_err(|e| {
        error!("Timetable '{}' failed to materialize: {}", name, e);
        e
    })?;
    let mut stats = kept.stats.clone();
    stats.restarts = runs - 1;

    Ok(GenerationResult {
        name,
        seed: kept_seed,
        status: kept.status(),
        timetable,
        unplaced: kept.unplaced,
        stats,
    })
}
