use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::RankerResult;
use crate::helper_functions::write_json;
use crate::models::{Grade, ScoredPrimerPair};

const HIGH_QUALITY: f64 = 80.0;
const MEDIUM_QUALITY: f64 = 70.0;
const GOOD_DIMER: f64 = 80.0;

/// Batch statistics. Every figure is 0 for an empty batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualitySummary {
    pub count: usize,
    pub mean_score: f64,
    pub min_score: f64,
    pub max_score: f64,
    /// One entry per grade, best first, including empty grades.
    pub grade_counts: Vec<(Grade, usize)>,
    pub high_quality: usize,
    pub medium_quality: usize,
    pub low_quality: usize,
    pub mean_dimer_score: f64,
    pub good_dimer_count: usize,
    pub mean_forward_tm: f64,
    pub mean_reverse_tm: f64,
    pub mean_forward_gc: f64,
    pub mean_reverse_gc: f64,
    pub mean_product_size: f64,
}

fn mean<I: Iterator<Item = f64>>(values: I) -> f64 {
    let (sum, n) = values
        .filter(|v| v.is_finite())
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 { 0.0 } else { sum / n as f64 }
}

impl QualitySummary {
    pub fn from_pairs(pairs: &[ScoredPrimerPair]) -> Self {
        let mut by_grade: BTreeMap<Grade, usize> = Grade::ALL.iter().map(|&g| (g, 0)).collect();
        for p in pairs {
            *by_grade.entry(p.grade).or_insert(0) += 1;
        }

        let scores = || pairs.iter().map(|p| p.composite);
        let (min_score, max_score) = if pairs.is_empty() {
            (0.0, 0.0)
        } else {
            (
                scores().fold(f64::INFINITY, f64::min),
                scores().fold(f64::NEG_INFINITY, f64::max),
            )
        };

        Self {
            count: pairs.len(),
            mean_score: mean(scores()),
            min_score,
            max_score,
            grade_counts: by_grade.into_iter().collect(),
            high_quality: scores().filter(|&s| s >= HIGH_QUALITY).count(),
            medium_quality: scores()
                .filter(|&s| (MEDIUM_QUALITY..HIGH_QUALITY).contains(&s))
                .count(),
            low_quality: scores().filter(|&s| s < MEDIUM_QUALITY).count(),
            mean_dimer_score: mean(pairs.iter().filter_map(|p| p.dimer_score)),
            good_dimer_count: pairs
                .iter()
                .filter(|p| p.dimer_score.is_some_and(|d| d >= GOOD_DIMER))
                .count(),
            mean_forward_tm: mean(pairs.iter().filter_map(|p| p.record.forward_tm)),
            mean_reverse_tm: mean(pairs.iter().filter_map(|p| p.record.reverse_tm)),
            mean_forward_gc: mean(pairs.iter().filter_map(|p| p.record.forward_gc)),
            mean_reverse_gc: mean(pairs.iter().filter_map(|p| p.record.reverse_gc)),
            mean_product_size: mean(pairs.iter().filter_map(|p| p.record.product_size)),
        }
    }

    pub fn grade_count(&self, grade: Grade) -> usize {
        self.grade_counts
            .iter()
            .find(|(g, _)| *g == grade)
            .map(|(_, n)| *n)
            .unwrap_or(0)
    }

    pub fn log(&self) {
        info!("Primer pairs evaluated: {}", self.count);
        if self.count == 0 {
            return;
        }
        let pct = |n: usize| 100.0 * n as f64 / self.count as f64;
        info!("High quality (>=80): {} ({:.1}%)", self.high_quality, pct(self.high_quality));
        info!("Medium quality (70-79): {} ({:.1}%)", self.medium_quality, pct(self.medium_quality));
        info!("Low quality (<70): {} ({:.1}%)", self.low_quality, pct(self.low_quality));
        info!(
            "Score mean {:.2}, min {:.2}, max {:.2}",
            self.mean_score, self.min_score, self.max_score
        );
        let grades: Vec<String> =
            self.grade_counts.iter().map(|(g, n)| format!("{g}={n}")).collect();
        info!("Grades: {}", grades.join(" "));
        info!(
            "Good dimer performance (>=80): {} ({:.1}%)",
            self.good_dimer_count,
            pct(self.good_dimer_count)
        );
        info!(
            "Mean Tm {:.1}/{:.1} C, mean GC {:.1}/{:.1}%, mean product {:.0} bp",
            self.mean_forward_tm,
            self.mean_reverse_tm,
            self.mean_forward_gc,
            self.mean_reverse_gc,
            self.mean_product_size
        );
    }

    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> RankerResult<()> {
        write_json(self, path)
    }
}
