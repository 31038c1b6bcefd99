//! Conflict-free school timetable generation.
//!
//! A configuration (working days, time grid, recesses, rooms, teachers, subjects) is checked
//! by [`validate`], expanded into one session request per required occurrence, and placed by a
//! bounded-backtracking engine that never double-books a teacher, room or class and never
//! uses a recess slot. [`generate`] runs several independent, seeded attempts in parallel and
//! returns each as a `Complete` or `Partial` timetable with per-class and per-teacher views.
//!
//! # Modules
//!
//! - **`data`**: configuration input and result DTOs
//! - **`grid`**: slot grid construction
//! - **`expander`**: subject catalog to session requests
//! - **`checker`**: assignment store and hard-constraint checks
//! - **`scoring`**: pluggable soft-constraint scoring
//! - **`solver`**: the assignment engine
//! - **`timetable`**: per-class / per-teacher projections
//! - **`batch`**: multi-attempt generation
//! - **`server`**: HTTP front end

pub mod batch;
pub mod checker;
pub mod data;
pub mod error;
pub mod expander;
pub mod grid;
pub mod problem;
pub mod scoring;
pub mod server;
pub mod solver;
pub mod timetable;
pub mod validation;

pub use batch::{BatchOptions, generate, generate_with, generate_with_seeds};
pub use error::{ConfigError, GenerateError, InvariantError};
pub use validation::validate;
