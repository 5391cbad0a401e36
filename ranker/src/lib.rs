//! Primer quality scoring and ranking.
//!
//! Each parsed primer pair gets ten sub-scores in `[0, 100]`, a weighted
//! composite and a letter grade; a batch is ordered best first with ties
//! kept in input order. All thresholds live in [`config::ScoringConfig`].

pub mod config;
pub mod errors;
pub mod helper_functions;
pub mod models;
pub mod primer_table;
pub mod ranking;
pub mod scoring;
pub mod summary;

pub use config::ScoringConfig;
pub use errors::{RankerError, RankerResult};
pub use models::{Dimension, Grade, PrimerPairRecord, ScoredPrimerPair, SubScores};
pub use ranking::{rank, Ranker, Ranking};
pub use scoring::score;
pub use summary::QualitySummary;
