//! config.rs - every threshold the scorer uses, in one record.
//!
//! Defaults reproduce the toolkit's published scoring table. A JSON file can
//! override any top-level section; rule sections must be given in full,
//! `weights` and `grades` may be partial.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::{RankerError, RankerResult};
use crate::models::Dimension;

/// Full score inside `[min, max]`, decaying linearly to 0 at `falloff`
/// units outside the window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WindowRule {
    pub min: f64,
    pub max: f64,
    pub falloff: f64,
}

/// `max(0, 100 - penalty_rate * |x - ideal|)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetRule {
    pub ideal: f64,
    pub penalty_rate: f64,
}

/// 100 at 0, linearly down to 0 at `cap` and beyond.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CapRule {
    pub cap: f64,
}

/// Dimension weights in percent. Must sum to 100.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Weights {
    pub product_size: f64,
    pub melting_temp: f64,
    pub tm_difference: f64,
    pub gc_content: f64,
    pub gc_difference: f64,
    pub primer_length: f64,
    pub self_dimer: f64,
    pub end_dimer: f64,
    pub hairpin: f64,
    pub complementarity: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            product_size: 10.0,
            melting_temp: 15.0,
            tm_difference: 10.0,
            gc_content: 15.0,
            gc_difference: 5.0,
            primer_length: 10.0,
            self_dimer: 10.0,
            end_dimer: 10.0,
            hairpin: 5.0,
            complementarity: 10.0,
        }
    }
}

impl Weights {
    pub fn get(&self, dim: Dimension) -> f64 {
        match dim {
            Dimension::ProductSize => self.product_size,
            Dimension::MeltingTemp => self.melting_temp,
            Dimension::TmDifference => self.tm_difference,
            Dimension::GcContent => self.gc_content,
            Dimension::GcDifference => self.gc_difference,
            Dimension::PrimerLength => self.primer_length,
            Dimension::SelfDimer => self.self_dimer,
            Dimension::EndDimer => self.end_dimer,
            Dimension::Hairpin => self.hairpin,
            Dimension::Complementarity => self.complementarity,
        }
    }

    pub fn sum(&self) -> f64 {
        Dimension::ALL.iter().map(|&d| self.get(d)).sum()
    }
}

/// Lower bounds (inclusive) of each grade; anything under `c` is a D.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GradeCutoffs {
    pub a_plus: f64,
    pub a: f64,
    pub b_plus: f64,
    pub b: f64,
    pub c_plus: f64,
    pub c: f64,
}

impl Default for GradeCutoffs {
    fn default() -> Self {
        Self {
            a_plus: 90.0,
            a: 85.0,
            b_plus: 80.0,
            b: 75.0,
            c_plus: 70.0,
            c: 65.0,
        }
    }
}

impl GradeCutoffs {
    /// Cutoffs from best to worst grade.
    pub fn as_array(&self) -> [f64; 6] {
        [self.a_plus, self.a, self.b_plus, self.b, self.c_plus, self.c]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScoringConfig {
    pub product_size: WindowRule,
    pub melting_temp: TargetRule,
    pub tm_difference: CapRule,
    pub gc_content: WindowRule,
    pub gc_difference: CapRule,
    pub primer_length: WindowRule,
    pub self_dimer: CapRule,
    pub end_dimer: CapRule,
    pub hairpin: CapRule,
    pub complementarity: CapRule,
    pub weights: Weights,
    pub grades: GradeCutoffs,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            product_size: WindowRule {
                min: 80.0,
                max: 400.0,
                falloff: 100.0,
            },
            melting_temp: TargetRule {
                ideal: 60.0,
                penalty_rate: 10.0,
            },
            tm_difference: CapRule { cap: 5.0 },
            gc_content: WindowRule {
                min: 40.0,
                max: 60.0,
                falloff: 20.0,
            },
            gc_difference: CapRule { cap: 10.0 },
            primer_length: WindowRule {
                min: 18.0,
                max: 25.0,
                falloff: 5.0,
            },
            self_dimer: CapRule { cap: 8.0 },
            end_dimer: CapRule { cap: 3.0 },
            hairpin: CapRule { cap: 40.0 },
            complementarity: CapRule { cap: 8.0 },
            weights: Weights::default(),
            grades: GradeCutoffs::default(),
        }
    }
}

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

fn invalid(msg: String) -> RankerError {
    RankerError::InvalidConfig(msg)
}

fn check_window(name: &str, rule: &WindowRule) -> RankerResult<()> {
    if !(rule.min.is_finite() && rule.max.is_finite() && rule.falloff.is_finite()) {
        return Err(invalid(format!("{name}: window bounds must be finite")));
    }
    if rule.min > rule.max {
        return Err(invalid(format!("{name}: window min {} exceeds max {}", rule.min, rule.max)));
    }
    if rule.falloff <= 0.0 {
        return Err(invalid(format!("{name}: falloff must be positive, got {}", rule.falloff)));
    }
    Ok(())
}

fn check_target(name: &str, rule: &TargetRule) -> RankerResult<()> {
    if !(rule.ideal.is_finite() && rule.penalty_rate.is_finite()) {
        return Err(invalid(format!("{name}: target values must be finite")));
    }
    if rule.penalty_rate < 0.0 {
        return Err(invalid(format!(
            "{name}: penalty rate must not be negative, got {}",
            rule.penalty_rate
        )));
    }
    Ok(())
}

fn check_cap(name: &str, rule: &CapRule) -> RankerResult<()> {
    if !rule.cap.is_finite() || rule.cap <= 0.0 {
        return Err(invalid(format!("{name}: cap must be a positive number, got {}", rule.cap)));
    }
    Ok(())
}

impl ScoringConfig {
    /// Reads a JSON override file and validates the result.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> RankerResult<Self> {
        let path = path.as_ref();
        info!("Loading scoring configuration from {}", path.display());
        let raw = fs::read_to_string(path)?;
        let config: ScoringConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        debug!("Scoring configuration: {:?}", config);
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> RankerResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> RankerResult<()> {
        check_window("product_size", &self.product_size)?;
        check_target("melting_temp", &self.melting_temp)?;
        check_cap("tm_difference", &self.tm_difference)?;
        check_window("gc_content", &self.gc_content)?;
        check_cap("gc_difference", &self.gc_difference)?;
        check_window("primer_length", &self.primer_length)?;
        check_cap("self_dimer", &self.self_dimer)?;
        check_cap("end_dimer", &self.end_dimer)?;
        check_cap("hairpin", &self.hairpin)?;
        check_cap("complementarity", &self.complementarity)?;

        for dim in Dimension::ALL {
            let w = self.weights.get(dim);
            if !w.is_finite() || w < 0.0 {
                return Err(invalid(format!(
                    "weight for {dim} must be a non-negative number, got {w}"
                )));
            }
        }
        let sum = self.weights.sum();
        if (sum - 100.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(invalid(format!("weights must sum to 100%, got {sum}")));
        }

        let cutoffs = self.grades.as_array();
        for &c in &cutoffs {
            if !c.is_finite() || c <= 0.0 || c > 100.0 {
                return Err(invalid(format!("grade cutoff {c} is outside (0, 100]")));
            }
        }
        if cutoffs.windows(2).any(|w| w[0] <= w[1]) {
            return Err(invalid(format!(
                "grade cutoffs must be strictly descending, got {:?}",
                cutoffs
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let cfg = ScoringConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.weights.sum(), 100.0);
    }

    #[test]
    fn weights_not_summing_to_100_are_rejected() {
        let mut cfg = ScoringConfig::default();
        cfg.weights.hairpin = 10.0;
        let err = cfg.validate().unwrap_err();
        assert!(matches!(err, RankerError::InvalidConfig(_)));
        assert!(err.to_string().contains("sum to 100"));
    }

    #[test]
    fn negative_weight_is_rejected() {
        let mut cfg = ScoringConfig::default();
        cfg.weights.hairpin = -5.0;
        cfg.weights.gc_difference = 15.0;
        assert!(matches!(cfg.validate(), Err(RankerError::InvalidConfig(_))));
    }

    #[test]
    fn unordered_grade_cutoffs_are_rejected() {
        let mut cfg = ScoringConfig::default();
        cfg.grades.b = 82.0;
        assert!(matches!(cfg.validate(), Err(RankerError::InvalidConfig(_))));

        let mut cfg = ScoringConfig::default();
        cfg.grades.a = 90.0;
        assert!(matches!(cfg.validate(), Err(RankerError::InvalidConfig(_))));
    }

    #[test]
    fn cutoff_above_100_is_rejected() {
        let mut cfg = ScoringConfig::default();
        cfg.grades.a_plus = 101.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn broken_rules_are_rejected() {
        let mut cfg = ScoringConfig::default();
        cfg.gc_content = WindowRule {
            min: 60.0,
            max: 40.0,
            falloff: 20.0,
        };
        assert!(cfg.validate().is_err());

        let mut cfg = ScoringConfig::default();
        cfg.primer_length.falloff = 0.0;
        assert!(cfg.validate().is_err());

        let mut cfg = ScoringConfig::default();
        cfg.hairpin.cap = 0.0;
        assert!(cfg.validate().is_err());

        let mut cfg = ScoringConfig::default();
        cfg.melting_temp.penalty_rate = -1.0;
        assert!(cfg.validate().is_err());

        let mut cfg = ScoringConfig::default();
        cfg.melting_temp.ideal = f64::NAN;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn partial_json_overrides_keep_defaults() {
        let json = r#"{
            "hairpin": { "cap": 20.0 },
            "weights": { "hairpin": 10.0, "gc_difference": 0.0 },
            "grades": { "a_plus": 95.0 }
        }"#;
        let cfg: ScoringConfig = serde_json::from_str(json).unwrap();
        cfg.validate().unwrap();
        assert_eq!(cfg.hairpin.cap, 20.0);
        assert_eq!(cfg.weights.hairpin, 10.0);
        assert_eq!(cfg.weights.melting_temp, 15.0);
        assert_eq!(cfg.grades.a_plus, 95.0);
        assert_eq!(cfg.grades.a, 85.0);
        assert_eq!(cfg.product_size, ScoringConfig::default().product_size);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let json = r#"{ "weigths": { "hairpin": 5.0 } }"#;
        assert!(serde_json::from_str::<ScoringConfig>(json).is_err());
    }

    #[test]
    fn from_json_file_validates() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "weights": {{ "hairpin": 50.0 }} }}"#).unwrap();
        let err = ScoringConfig::from_json_file(file.path()).unwrap_err();
        assert!(matches!(err, RankerError::InvalidConfig(_)));

        let mut ok = tempfile::NamedTempFile::new().unwrap();
        write!(ok, "{}", ScoringConfig::default().to_json_pretty().unwrap()).unwrap();
        let cfg = ScoringConfig::from_json_file(ok.path()).unwrap();
        assert_eq!(cfg, ScoringConfig::default());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = ScoringConfig::from_json_file("/nonexistent/ranker-config.json").unwrap_err();
        assert!(matches!(err, RankerError::Io(_)));
    }
}
