//! scoring.rs - piecewise-linear sub-scores and the weighted composite.
//!
//! Every rule maps a scalar onto `[0, 100]`. A dimension whose inputs are
//! missing or outside sane bounds has no scalar and scores 0; the pair is
//! still scored on the remaining dimensions.

use crate::config::{CapRule, GradeCutoffs, ScoringConfig, TargetRule, Weights, WindowRule};
use crate::models::{Dimension, Grade, PrimerPairRecord, ScoredPrimerPair, SubScores};

const MAX_SCORE: f64 = 100.0;

/// Dimer load at which the dimer score reaches 0: two self-dimer terms plus
/// twice the pair term, each at the default self-dimer cap of 8.
const DIMER_SCALE: f64 = 24.0;

fn clamp_score(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, MAX_SCORE)
    }
}

impl WindowRule {
    pub fn score(&self, x: f64) -> f64 {
        if !x.is_finite() {
            return 0.0;
        }
        let distance = if x < self.min {
            self.min - x
        } else if x > self.max {
            x - self.max
        } else {
            return MAX_SCORE;
        };
        clamp_score(MAX_SCORE * (1.0 - distance / self.falloff))
    }
}

impl TargetRule {
    pub fn score(&self, x: f64) -> f64 {
        if !x.is_finite() {
            return 0.0;
        }
        clamp_score(MAX_SCORE - self.penalty_rate * (x - self.ideal).abs())
    }
}

impl CapRule {
    pub fn score(&self, x: f64) -> f64 {
        if !x.is_finite() {
            return 0.0;
        }
        clamp_score(MAX_SCORE * (1.0 - x.clamp(0.0, self.cap) / self.cap))
    }
}

impl GradeCutoffs {
    /// Cutoffs are inclusive lower bounds: 90.0 is an A+, 89.999 an A.
    pub fn grade(&self, score: f64) -> Grade {
        if score >= self.a_plus {
            Grade::APlus
        } else if score >= self.a {
            Grade::A
        } else if score >= self.b_plus {
            Grade::BPlus
        } else if score >= self.b {
            Grade::B
        } else if score >= self.c_plus {
            Grade::CPlus
        } else if score >= self.c {
            Grade::C
        } else {
            Grade::D
        }
    }
}

// ─── Input extraction ────────────────────────────────────────────────────────

fn finite(v: Option<f64>) -> Option<f64> {
    v.filter(|x| x.is_finite())
}

fn positive(v: Option<f64>) -> Option<f64> {
    finite(v).filter(|&x| x > 0.0)
}

fn percent(v: Option<f64>) -> Option<f64> {
    finite(v).filter(|x| (0.0..=100.0).contains(x))
}

fn risk(v: Option<f64>) -> Option<f64> {
    finite(v).filter(|&x| x >= 0.0)
}

fn mean_of(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    Some((a? + b?) / 2.0)
}

fn abs_diff(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    Some((a? - b?).abs())
}

/// The scalar each dimension is scored on, or `None` when the record's
/// fields for that dimension are malformed.
fn dimension_input(record: &PrimerPairRecord, dim: Dimension) -> Option<f64> {
    let tm = (finite(record.forward_tm), finite(record.reverse_tm));
    let gc = (percent(record.forward_gc), percent(record.reverse_gc));
    match dim {
        Dimension::ProductSize => positive(record.product_size),
        Dimension::MeltingTemp => mean_of(tm.0, tm.1),
        Dimension::TmDifference => abs_diff(tm.0, tm.1),
        Dimension::GcContent => mean_of(gc.0, gc.1),
        Dimension::GcDifference => abs_diff(gc.0, gc.1),
        Dimension::PrimerLength => {
            mean_of(positive(record.forward_len), positive(record.reverse_len))
        }
        Dimension::SelfDimer => risk(record.self_dimer),
        Dimension::EndDimer => risk(record.end_dimer),
        Dimension::Hairpin => risk(record.hairpin),
        Dimension::Complementarity => risk(record.complementarity),
    }
}

/// Dimensions that fell back to a zero sub-score because of malformed input.
pub fn malformed_dimensions(record: &PrimerPairRecord) -> Vec<Dimension> {
    Dimension::ALL
        .into_iter()
        .filter(|&d| dimension_input(record, d).is_none())
        .collect()
}

fn rule_score(config: &ScoringConfig, dim: Dimension, x: f64) -> f64 {
    match dim {
        Dimension::ProductSize => config.product_size.score(x),
        Dimension::MeltingTemp => config.melting_temp.score(x),
        Dimension::TmDifference => config.tm_difference.score(x),
        Dimension::GcContent => config.gc_content.score(x),
        Dimension::GcDifference => config.gc_difference.score(x),
        Dimension::PrimerLength => config.primer_length.score(x),
        Dimension::SelfDimer => config.self_dimer.score(x),
        Dimension::EndDimer => config.end_dimer.score(x),
        Dimension::Hairpin => config.hairpin.score(x),
        Dimension::Complementarity => config.complementarity.score(x),
    }
}

fn sub_score(record: &PrimerPairRecord, config: &ScoringConfig, dim: Dimension) -> f64 {
    dimension_input(record, dim)
        .map(|x| rule_score(config, dim, x))
        .unwrap_or(0.0)
}

// ─── Scoring ─────────────────────────────────────────────────────────────────

pub fn sub_scores(record: &PrimerPairRecord, config: &ScoringConfig) -> SubScores {
    SubScores {
        product_size: sub_score(record, config, Dimension::ProductSize),
        melting_temp: sub_score(record, config, Dimension::MeltingTemp),
        tm_difference: sub_score(record, config, Dimension::TmDifference),
        gc_content: sub_score(record, config, Dimension::GcContent),
        gc_difference: sub_score(record, config, Dimension::GcDifference),
        primer_length: sub_score(record, config, Dimension::PrimerLength),
        self_dimer: sub_score(record, config, Dimension::SelfDimer),
        end_dimer: sub_score(record, config, Dimension::EndDimer),
        hairpin: sub_score(record, config, Dimension::Hairpin),
        complementarity: sub_score(record, config, Dimension::Complementarity),
    }
}

/// Weighted sum of sub-scores with percentage weights, clamped to `[0, 100]`.
pub fn composite_score(scores: &SubScores, weights: &Weights) -> f64 {
    let weighted: f64 = scores.iter().map(|(d, s)| weights.get(d) * s).sum();
    clamp_score(weighted / 100.0)
}

/// Secondary-structure summary kept alongside the composite; not weighted.
/// Reads the uncapped `dimer_load` when the record has one.
pub fn dimer_score(record: &PrimerPairRecord) -> Option<f64> {
    let load = match record.dimer_load {
        Some(load) => risk(Some(load))?,
        None => 2.0 * (risk(record.self_dimer)? + risk(record.complementarity)?),
    };
    Some(clamp_score(MAX_SCORE * (1.0 - load / DIMER_SCALE)))
}

/// Scores a single record. Pure and infallible; ranks are left at 0.
pub fn score(record: &PrimerPairRecord, config: &ScoringConfig) -> ScoredPrimerPair {
    score_at(0, record, config)
}

pub(crate) fn score_at(
    input_index: usize,
    record: &PrimerPairRecord,
    config: &ScoringConfig,
) -> ScoredPrimerPair {
    let sub_scores = sub_scores(record, config);
    let composite = composite_score(&sub_scores, &config.weights);
    let grade = config.grades.grade(composite);
    ScoredPrimerPair {
        record: record.clone(),
        sub_scores,
        composite,
        grade,
        dimer_score: dimer_score(record),
        input_index,
        global_rank: 0,
        rank_in_group: 0,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Every attribute on target for the default configuration.
    pub(crate) fn ideal_record() -> PrimerPairRecord {
        PrimerPairRecord {
            gene_id: "geneA".into(),
            pair_id: "geneA_pair_0".into(),
            forward_seq: "ACGTACGTACGTACGTACGT".into(),
            reverse_seq: "TGCATGCATGCATGCATGCA".into(),
            forward_tm: Some(60.0),
            reverse_tm: Some(60.0),
            forward_gc: Some(50.0),
            reverse_gc: Some(50.0),
            forward_len: Some(20.0),
            reverse_len: Some(20.0),
            product_size: Some(200.0),
            self_dimer: Some(0.0),
            end_dimer: Some(0.0),
            hairpin: Some(0.0),
            complementarity: Some(0.0),
            dimer_load: Some(0.0),
        }
    }

    pub(crate) fn worst_record() -> PrimerPairRecord {
        PrimerPairRecord {
            gene_id: "geneZ".into(),
            pair_id: "geneZ_pair_9".into(),
            forward_tm: Some(30.0),
            reverse_tm: Some(40.0),
            forward_gc: Some(0.0),
            reverse_gc: Some(15.0),
            forward_len: Some(5.0),
            reverse_len: Some(5.0),
            product_size: Some(5000.0),
            self_dimer: Some(8.0),
            end_dimer: Some(3.0),
            hairpin: Some(40.0),
            complementarity: Some(8.0),
            ..Default::default()
        }
    }

    #[test]
    fn ideal_record_scores_100_and_a_plus() {
        let cfg = ScoringConfig::default();
        let scored = score(&ideal_record(), &cfg);
        for (dim, s) in scored.sub_scores.iter() {
            assert_eq!(s, 100.0, "{dim} should be 100");
        }
        assert_eq!(scored.composite, 100.0);
        assert_eq!(scored.grade, Grade::APlus);
        assert_eq!(scored.dimer_score, Some(100.0));
    }

    #[test]
    fn worst_record_scores_0_and_d() {
        let cfg = ScoringConfig::default();
        let scored = score(&worst_record(), &cfg);
        for (dim, s) in scored.sub_scores.iter() {
            assert_eq!(s, 0.0, "{dim} should be 0");
        }
        assert_eq!(scored.composite, 0.0);
        assert_eq!(scored.grade, Grade::D);
    }

    #[test]
    fn risks_at_or_above_cap_score_zero() {
        let cfg = ScoringConfig::default();
        let mut rec = ideal_record();
        rec.self_dimer = Some(8.0);
        rec.end_dimer = Some(12.5);
        rec.hairpin = Some(40.0);
        rec.complementarity = Some(1e9);
        let s = sub_scores(&rec, &cfg);
        assert_eq!(s.self_dimer, 0.0);
        assert_eq!(s.end_dimer, 0.0);
        assert_eq!(s.hairpin, 0.0);
        assert_eq!(s.complementarity, 0.0);
        assert_eq!(composite_score(&s, &cfg.weights), 65.0);
    }

    #[test]
    fn window_rule_boundaries() {
        let rule = WindowRule {
            min: 40.0,
            max: 60.0,
            falloff: 20.0,
        };
        assert_eq!(rule.score(40.0), 100.0);
        assert_eq!(rule.score(60.0), 100.0);
        assert_eq!(rule.score(70.0), 50.0);
        assert_eq!(rule.score(30.0), 50.0);
        assert_eq!(rule.score(80.0), 0.0);
        assert_eq!(rule.score(-500.0), 0.0);
        assert_eq!(rule.score(f64::NAN), 0.0);
    }

    #[test]
    fn target_rule_decays_linearly() {
        let rule = TargetRule {
            ideal: 60.0,
            penalty_rate: 10.0,
        };
        assert_eq!(rule.score(60.0), 100.0);
        assert_eq!(rule.score(57.5), 75.0);
        assert_eq!(rule.score(62.5), 75.0);
        assert_eq!(rule.score(70.0), 0.0);
        assert_eq!(rule.score(-40.0), 0.0);
    }

    #[test]
    fn cap_rule_decays_to_zero_at_cap() {
        let rule = CapRule { cap: 8.0 };
        assert_eq!(rule.score(0.0), 100.0);
        assert_eq!(rule.score(2.0), 75.0);
        assert_eq!(rule.score(8.0), 0.0);
        assert_eq!(rule.score(100.0), 0.0);
        assert_eq!(rule.score(f64::INFINITY), 0.0);
    }

    #[test]
    fn grade_boundaries_are_inclusive_below() {
        let g = GradeCutoffs::default();
        assert_eq!(g.grade(100.0), Grade::APlus);
        assert_eq!(g.grade(90.0), Grade::APlus);
        assert_eq!(g.grade(89.999), Grade::A);
        assert_eq!(g.grade(85.0), Grade::A);
        assert_eq!(g.grade(84.999), Grade::BPlus);
        assert_eq!(g.grade(80.0), Grade::BPlus);
        assert_eq!(g.grade(75.0), Grade::B);
        assert_eq!(g.grade(70.0), Grade::CPlus);
        assert_eq!(g.grade(65.0), Grade::C);
        assert_eq!(g.grade(64.999), Grade::D);
        assert_eq!(g.grade(0.0), Grade::D);
    }

    #[test]
    fn missing_fields_zero_only_their_dimensions() {
        let cfg = ScoringConfig::default();
        let mut rec = ideal_record();
        rec.forward_tm = None;
        rec.hairpin = None;
        let s = sub_scores(&rec, &cfg);
        assert_eq!(s.melting_temp, 0.0);
        assert_eq!(s.tm_difference, 0.0);
        assert_eq!(s.hairpin, 0.0);
        assert_eq!(s.gc_content, 100.0);
        assert_eq!(s.product_size, 100.0);
        // 100 - 15 (Tm) - 10 (Tm diff) - 5 (hairpin)
        assert_eq!(composite_score(&s, &cfg.weights), 70.0);
        assert_eq!(
            malformed_dimensions(&rec),
            vec![Dimension::MeltingTemp, Dimension::TmDifference, Dimension::Hairpin]
        );
    }

    #[test]
    fn out_of_range_values_are_penalised_not_rejected() {
        let cfg = ScoringConfig::default();
        let rec = PrimerPairRecord {
            forward_tm: Some(-20.0),
            reverse_tm: Some(f64::NAN),
            forward_gc: Some(150.0),
            reverse_gc: Some(-3.0),
            forward_len: Some(0.0),
            reverse_len: Some(-1.0),
            product_size: Some(-100.0),
            self_dimer: Some(-1.0),
            end_dimer: Some(f64::INFINITY),
            hairpin: Some(f64::NEG_INFINITY),
            complementarity: None,
            ..Default::default()
        };
        let scored = score(&rec, &cfg);
        assert_eq!(scored.composite, 0.0);
        assert_eq!(scored.grade, Grade::D);
        assert_eq!(scored.dimer_score, None);
        assert_eq!(malformed_dimensions(&rec).len(), 10);
    }

    #[test]
    fn composite_stays_in_range_for_adversarial_inputs() {
        let cfg = ScoringConfig::default();
        let values = [f64::NAN, f64::INFINITY, -1e300, -1.0, 0.0, 0.5, 50.0, 100.0, 1e300];
        for &a in &values {
            for &b in &values {
                let rec = PrimerPairRecord {
                    forward_tm: Some(a),
                    reverse_tm: Some(b),
                    forward_gc: Some(a),
                    reverse_gc: Some(b),
                    forward_len: Some(a),
                    reverse_len: Some(b),
                    product_size: Some(a),
                    self_dimer: Some(b),
                    end_dimer: Some(a),
                    hairpin: Some(b),
                    complementarity: Some(a),
                    ..Default::default()
                };
                let scored = score(&rec, &cfg);
                assert!(
                    (0.0..=100.0).contains(&scored.composite),
                    "{a} {b} -> {}",
                    scored.composite
                );
                for (_, s) in scored.sub_scores.iter() {
                    assert!((0.0..=100.0).contains(&s));
                }
            }
        }
    }

    #[test]
    fn scoring_is_deterministic() {
        let cfg = ScoringConfig::default();
        let mut rec = ideal_record();
        rec.forward_tm = Some(58.3);
        rec.reverse_gc = Some(63.1);
        rec.end_dimer = Some(1.7);
        let a = score(&rec, &cfg);
        let b = score(&rec, &cfg);
        assert_eq!(a.composite.to_bits(), b.composite.to_bits());
        assert_eq!(a, b);
    }

    #[test]
    fn product_size_outside_window_decays() {
        let cfg = ScoringConfig::default();
        let mut rec = ideal_record();
        rec.product_size = Some(450.0);
        assert_eq!(sub_scores(&rec, &cfg).product_size, 50.0);
        rec.product_size = Some(55.0);
        assert_eq!(sub_scores(&rec, &cfg).product_size, 75.0);
        rec.product_size = Some(500.0);
        assert_eq!(sub_scores(&rec, &cfg).product_size, 0.0);
    }

    #[test]
    fn dimer_score_combines_self_and_pair_terms() {
        let mut rec = ideal_record();
        rec.self_dimer = Some(3.0);
        rec.complementarity = Some(3.0);
        // the recorded load wins over the capped risk fields
        assert_eq!(dimer_score(&rec), Some(100.0));
        rec.dimer_load = None;
        assert_eq!(dimer_score(&rec), Some(50.0));
        rec.complementarity = None;
        assert_eq!(dimer_score(&rec), None);
        rec.dimer_load = Some(6.0);
        assert_eq!(dimer_score(&rec), Some(75.0));
        rec.dimer_load = Some(-1.0);
        assert_eq!(dimer_score(&rec), None);
    }
}
