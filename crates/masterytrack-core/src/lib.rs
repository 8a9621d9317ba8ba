//! masterytrack-core — Curriculum progression and mastery-tracking engine.
//!
//! This crate defines the curriculum structure model, the per-student
//! progress records, and the progression rules that the rest of the
//! masterytrack system builds on: star-based lesson grading, threshold
//! driven module unlocks, and the level-assessment workflow.

pub mod engine;
pub mod error;
pub mod model;
pub mod parser;
pub mod records;
pub mod scoring;
pub mod snapshot;
pub mod summary;
pub mod traits;
