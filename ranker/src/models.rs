// src/models.rs

use bio_seq::codec::dna::Dna;
use bio_seq::prelude::*;
use serde::{Deserialize, Serialize};

/// One primer pair as handed over by the upstream Primer3 parser.
///
/// Numeric attributes are `None` when the source cell was missing, empty,
/// non-numeric or non-finite. Scoring treats `None` as the worst value for
/// the affected dimension.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PrimerPairRecord {
    pub gene_id: String,
    pub pair_id: String,
    pub forward_seq: String,
    pub reverse_seq: String,
    pub forward_tm: Option<f64>,
    pub reverse_tm: Option<f64>,
    pub forward_gc: Option<f64>,
    pub reverse_gc: Option<f64>,
    pub forward_len: Option<f64>,
    pub reverse_len: Option<f64>,
    pub product_size: Option<f64>,
    pub self_dimer: Option<f64>,
    pub end_dimer: Option<f64>,
    pub hairpin: Option<f64>,
    pub complementarity: Option<f64>,
    /// Uncapped `Left_Self_Any + Right_Self_Any + 2 * Pair_Compl_Any` as
    /// reported by the parser. Without it the dimer score is derived from
    /// `self_dimer` and `complementarity`.
    pub dimer_load: Option<f64>,
}

impl PrimerPairRecord {
    /// Fills primer lengths and GC% that the parser left empty, deriving them
    /// from the primer sequences. A sequence that is not plain DNA only
    /// contributes its length.
    pub fn fill_from_sequences(&mut self) {
        if self.forward_len.is_none() {
            self.forward_len = sequence_length(&self.forward_seq);
        }
        if self.reverse_len.is_none() {
            self.reverse_len = sequence_length(&self.reverse_seq);
        }
        if self.forward_gc.is_none() {
            self.forward_gc = gc_percent(&self.forward_seq);
        }
        if self.reverse_gc.is_none() {
            self.reverse_gc = gc_percent(&self.reverse_seq);
        }
    }
}

fn sequence_length(seq: &str) -> Option<f64> {
    let n = seq.trim().len();
    (n > 0).then_some(n as f64)
}

/// GC content of a primer in percent, `None` unless the sequence is
/// non-empty ACGT.
pub fn gc_percent(seq: &str) -> Option<f64> {
    let upper = seq.trim().to_ascii_uppercase();
    if upper.is_empty() {
        return None;
    }
    let dna = Seq::<Dna>::try_from(upper.as_str()).ok()?;
    let gc = dna.iter().filter(|b| matches!(b, Dna::G | Dna::C)).count();
    Some(100.0 * gc as f64 / dna.len() as f64)
}

/// The ten scoring dimensions, in weight-table order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dimension {
    ProductSize,
    MeltingTemp,
    TmDifference,
    GcContent,
    GcDifference,
    PrimerLength,
    SelfDimer,
    EndDimer,
    Hairpin,
    Complementarity,
}

impl Dimension {
    pub const ALL: [Dimension; 10] = [
        Dimension::ProductSize,
        Dimension::MeltingTemp,
        Dimension::TmDifference,
        Dimension::GcContent,
        Dimension::GcDifference,
        Dimension::PrimerLength,
        Dimension::SelfDimer,
        Dimension::EndDimer,
        Dimension::Hairpin,
        Dimension::Complementarity,
    ];

    /// Output column holding this dimension's sub-score.
    pub fn column_name(self) -> &'static str {
        match self {
            Dimension::ProductSize => "Product_Size_Score",
            Dimension::MeltingTemp => "Tm_Score",
            Dimension::TmDifference => "Tm_Diff_Score",
            Dimension::GcContent => "GC_Score",
            Dimension::GcDifference => "GC_Diff_Score",
            Dimension::PrimerLength => "Length_Score",
            Dimension::SelfDimer => "Self_Dimer_Score",
            Dimension::EndDimer => "End_Dimer_Score",
            Dimension::Hairpin => "Hairpin_Score",
            Dimension::Complementarity => "Pair_Compl_Score",
        }
    }
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Dimension::ProductSize => "product_size",
            Dimension::MeltingTemp => "melting_temp",
            Dimension::TmDifference => "tm_difference",
            Dimension::GcContent => "gc_content",
            Dimension::GcDifference => "gc_difference",
            Dimension::PrimerLength => "primer_length",
            Dimension::SelfDimer => "self_dimer",
            Dimension::EndDimer => "end_dimer",
            Dimension::Hairpin => "hairpin",
            Dimension::Complementarity => "complementarity",
        };
        write!(f, "{s}")
    }
}

/// Per-dimension sub-scores, each in `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SubScores {
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

impl SubScores {
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

    /// `(dimension, sub-score)` pairs in weight-table order.
    pub fn iter(&self) -> impl Iterator<Item = (Dimension, f64)> + '_ {
        Dimension::ALL.into_iter().map(move |d| (d, self.get(d)))
    }
}

/// Letter grade derived from the composite score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Grade {
    #[serde(rename = "A+")]
    APlus,
    #[serde(rename = "A")]
    A,
    #[serde(rename = "B+")]
    BPlus,
    #[serde(rename = "B")]
    B,
    #[serde(rename = "C+")]
    CPlus,
    #[serde(rename = "C")]
    C,
    #[serde(rename = "D")]
    D,
}

impl Grade {
    /// Best to worst.
    pub const ALL: [Grade; 7] = [
        Grade::APlus,
        Grade::A,
        Grade::BPlus,
        Grade::B,
        Grade::CPlus,
        Grade::C,
        Grade::D,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::BPlus => "B+",
            Grade::B => "B",
            Grade::CPlus => "C+",
            Grade::C => "C",
            Grade::D => "D",
        }
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A record after scoring. Ranks are 0 until the pair has gone through
/// [`crate::ranking::rank`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredPrimerPair {
    pub record: PrimerPairRecord,
    pub sub_scores: SubScores,
    pub composite: f64,
    pub grade: Grade,
    pub dimer_score: Option<f64>,
    pub input_index: usize,
    pub global_rank: usize,
    pub rank_in_group: usize,
}
