//! ranking.rs - batch scoring and the deterministic ranking order.
//!
//! Scoring is a parallel map over independent records; the order is then
//! fixed by a single sort on (composite desc, input index asc).

use std::collections::HashMap;

use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use tracing::{debug, info, warn};

use crate::config::ScoringConfig;
use crate::errors::RankerResult;
use crate::models::{PrimerPairRecord, ScoredPrimerPair};
use crate::scoring::{malformed_dimensions, score_at};
use crate::summary::QualitySummary;

/// Scored pairs in ranking order. Never truncated.
#[derive(Debug, Clone, Default)]
pub struct Ranking {
    pub pairs: Vec<ScoredPrimerPair>,
}

impl Ranking {
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn top(&self, n: usize) -> &[ScoredPrimerPair] {
        &self.pairs[..n.min(self.pairs.len())]
    }

    /// Original input positions in ranking order.
    pub fn input_order(&self) -> Vec<usize> {
        self.pairs.iter().map(|p| p.input_index).collect()
    }

    pub fn summary(&self) -> QualitySummary {
        QualitySummary::from_pairs(&self.pairs)
    }
}

fn order_and_assign_ranks(pairs: &mut [ScoredPrimerPair]) {
    pairs.sort_by(|a, b| {
        b.composite
            .total_cmp(&a.composite)
            .then(a.input_index.cmp(&b.input_index))
    });

    let mut seen_per_group: HashMap<String, usize> = HashMap::new();
    for (i, pair) in pairs.iter_mut().enumerate() {
        pair.global_rank = i + 1;
        let n = seen_per_group.entry(pair.record.gene_id.clone()).or_insert(0);
        *n += 1;
        pair.rank_in_group = *n;
    }
}

/// Scores every record and orders them by composite score, best first.
/// Ties keep their input order. Runs on the current rayon pool.
pub fn rank(records: &[PrimerPairRecord], config: &ScoringConfig) -> Ranking {
    info!("Scoring {} primer pairs", records.len());

    let mut pairs: Vec<ScoredPrimerPair> = records
        .par_iter()
        .enumerate()
        .map(|(i, rec)| score_at(i, rec, config))
        .collect();

    let mut degraded = 0usize;
    for (i, rec) in records.iter().enumerate() {
        let bad = malformed_dimensions(rec);
        if !bad.is_empty() {
            degraded += 1;
            debug!("Row {} ({}): zero-scored dimensions {:?}", i, rec.pair_id, bad);
        }
    }
    if degraded > 0 {
        warn!("{} of {} primer pairs had malformed fields scored as 0", degraded, records.len());
    }

    order_and_assign_ranks(&mut pairs);

    if let Some(best) = pairs.first() {
        info!("Best pair: {} ({:.2}, {})", best.record.pair_id, best.composite, best.grade);
    }
    Ranking { pairs }
}

/// Validated configuration plus the size of the scoring pool.
#[derive(Debug, Clone)]
pub struct Ranker {
    config: ScoringConfig,
    threads: usize,
}

impl Ranker {
    /// Fails if the configuration is invalid; nothing is scored with a
    /// broken weight table.
    pub fn new(config: ScoringConfig) -> RankerResult<Self> {
        config.validate()?;
        Ok(Self { config, threads: 0 })
    }

    /// `0` uses rayon's global pool.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn rank(&self, records: &[PrimerPairRecord]) -> RankerResult<Ranking> {
        if self.threads == 0 {
            return Ok(rank(records, &self.config));
        }
        debug!("Building scoring pool with {} threads", self.threads);
        let pool = ThreadPoolBuilder::new().num_threads(self.threads).build()?;
        Ok(pool.install(|| rank(records, &self.config)))
    }
}
