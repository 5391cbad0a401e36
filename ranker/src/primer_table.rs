// src/primer_table.rs
// -----------------------------------------------------------------------------
// Parsed-primer table <-> records.
// Columns are looked up by name (first alias found wins), never by position.
// Unknown columns are carried through to the ranked table untouched.
// -----------------------------------------------------------------------------

use std::path::Path;

use polars::prelude::*;
use tracing::{info, warn};

use crate::config::ScoringConfig;
use crate::errors::{RankerError, RankerResult};
use crate::helper_functions::read_csv;
use crate::models::{Dimension, PrimerPairRecord};
use crate::ranking::Ranking;

// ─── Input column aliases ────────────────────────────────────────────────────
const GENE_COLS: &[&str] = &["Gene", "ID"];
const PAIR_COLS: &[&str] = &["ID", "Pair_Index", "Primer_Pair_Index"];
const LEFT_SEQ_COLS: &[&str] = &["Left_Primer", "Left_Seq"];
const RIGHT_SEQ_COLS: &[&str] = &["Right_Primer", "Right_Seq"];
const LEFT_TM_COLS: &[&str] = &["Left_Tm"];
const RIGHT_TM_COLS: &[&str] = &["Right_Tm"];
const LEFT_GC_COLS: &[&str] = &["Left_GC%", "Left_GC"];
const RIGHT_GC_COLS: &[&str] = &["Right_GC%", "Right_GC"];
const LEFT_LEN_COLS: &[&str] = &["Left_Length", "Left_Len"];
const RIGHT_LEN_COLS: &[&str] = &["Right_Length", "Right_Len"];
const PRODUCT_SIZE_COLS: &[&str] = &["Product_Size"];

/// Either one pair-level column or a left/right pair. Per-primer values are
/// clamped to the dimension's cap before they are averaged.
struct RiskColumns {
    pair: &'static str,
    left: &'static str,
    right: &'static str,
}

const SELF_DIMER: RiskColumns = RiskColumns {
    pair: "Self_Any",
    left: "Left_Self_Any",
    right: "Right_Self_Any",
};
const END_DIMER: RiskColumns = RiskColumns {
    pair: "Self_End",
    left: "Left_Self_End",
    right: "Right_Self_End",
};
const HAIRPIN: RiskColumns = RiskColumns {
    pair: "Hairpin",
    left: "Left_Hairpin",
    right: "Right_Hairpin",
};

const PAIR_COMPL: &str = "Pair_Compl";
const PAIR_COMPL_ANY: &str = "Pair_Compl_Any";
const PAIR_COMPL_END: &str = "Pair_Compl_End";
/// Any-position and doubled end complementarity are each capped, then
/// weighted 0.4 and 0.6.
const COMPL_ANY_WEIGHT: f64 = 0.4;
const COMPL_END_WEIGHT: f64 = 0.6;
const COMPL_END_FACTOR: f64 = 2.0;

// ─── Output columns ──────────────────────────────────────────────────────────
pub const QUALITY_SCORE_COL: &str = "Quality_Score";
pub const GRADE_COL: &str = "Grade";
pub const GLOBAL_RANK_COL: &str = "Global_Rank";
pub const RANK_IN_GROUP_COL: &str = "Rank_In_Group";
pub const DIMER_SCORE_COL: &str = "Dimer_Score";

const PRIORITY_COLS: &[&str] = &[
    "ID",
    "Gene",
    "Pair_Index",
    "Primer_Pair_Index",
    QUALITY_SCORE_COL,
    GRADE_COL,
    GLOBAL_RANK_COL,
    RANK_IN_GROUP_COL,
    "Product_Size",
    "Left_Primer",
    "Left_Seq",
    "Left_Start",
    "Left_Length",
    "Left_Len",
    "Left_Tm",
    "Left_GC%",
    "Left_GC",
    "Right_Primer",
    "Right_Seq",
    "Right_Start",
    "Right_Length",
    "Right_Len",
    "Right_Tm",
    "Right_GC%",
    "Right_GC",
    "Left_Self_Any",
    "Right_Self_Any",
    "Left_Self_End",
    "Right_Self_End",
    "Left_Hairpin",
    "Right_Hairpin",
    "Pair_Compl_Any",
    "Pair_Compl_End",
    DIMER_SCORE_COL,
];

type Values<T> = Vec<Option<T>>;

fn find_column<'a>(df: &'a DataFrame, aliases: &[&str]) -> Option<&'a Column> {
    aliases.iter().find_map(|name| df.column(name).ok())
}

fn numeric_values(df: &DataFrame, aliases: &[&str]) -> PolarsResult<Option<Values<f64>>> {
    let Some(col) = find_column(df, aliases) else {
        return Ok(None);
    };
    // non-strict cast: unparseable cells become null
    let cast = col.cast(&DataType::Float64)?;
    let values = cast
        .f64()?
        .into_iter()
        .map(|v| v.filter(|x| x.is_finite()))
        .collect();
    Ok(Some(values))
}

fn string_values(df: &DataFrame, aliases: &[&str]) -> PolarsResult<Option<Values<String>>> {
    let Some(col) = find_column(df, aliases) else {
        return Ok(None);
    };
    let cast = col.cast(&DataType::String)?;
    let values = cast
        .str()?
        .into_iter()
        .map(|v| v.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string))
        .collect();
    Ok(Some(values))
}

/// Negative risks stay malformed; anything past the cap counts as the cap.
fn capped(v: Option<f64>, cap: f64) -> Option<f64> {
    v.filter(|&x| x >= 0.0).map(|x| x.min(cap))
}

fn left_right(
    df: &DataFrame,
    cols: &RiskColumns,
) -> PolarsResult<Option<(Values<f64>, Values<f64>)>> {
    match (numeric_values(df, &[cols.left])?, numeric_values(df, &[cols.right])?) {
        (Some(l), Some(r)) => Ok(Some((l, r))),
        _ => Ok(None),
    }
}

fn risk_values(df: &DataFrame, cols: &RiskColumns, cap: f64) -> PolarsResult<Option<Values<f64>>> {
    if let Some(v) = numeric_values(df, &[cols.pair])? {
        return Ok(Some(v));
    }
    Ok(left_right(df, cols)?.map(|(left, right)| {
        left.into_iter()
            .zip(right)
            .map(|(l, r)| Some((capped(l, cap)? + capped(r, cap)?) / 2.0))
            .collect()
    }))
}

fn complementarity_values(df: &DataFrame, cap: f64) -> PolarsResult<Option<Values<f64>>> {
    if let Some(v) = numeric_values(df, &[PAIR_COMPL])? {
        return Ok(Some(v));
    }
    let any = numeric_values(df, &[PAIR_COMPL_ANY])?;
    let end = numeric_values(df, &[PAIR_COMPL_END])?;
    Ok(match (any, end) {
        (Some(any), Some(end)) => Some(
            any.into_iter()
                .zip(end)
                .map(|(a, e)| {
                    let end = capped(e.map(|e| COMPL_END_FACTOR * e), cap)?;
                    Some(COMPL_ANY_WEIGHT * capped(a, cap)? + COMPL_END_WEIGHT * end)
                })
                .collect(),
        ),
        (Some(any), None) => Some(any),
        _ => None,
    })
}

/// Uncapped `left + right + 2 * pair` self-dimer and any-position
/// complementarity load. A pair-level `Self_Any` counts for both primers.
fn dimer_loads(df: &DataFrame) -> PolarsResult<Option<Values<f64>>> {
    let self_any: Option<Values<f64>> = match numeric_values(df, &[SELF_DIMER.pair])? {
        Some(v) => Some(v.into_iter().map(|x| x.map(|x| 2.0 * x)).collect()),
        None => left_right(df, &SELF_DIMER)?.map(|(left, right)| {
            left.into_iter().zip(right).map(|(l, r)| Some(l? + r?)).collect()
        }),
    };
    let pair_any = numeric_values(df, &[PAIR_COMPL_ANY, PAIR_COMPL])?;
    Ok(match (self_any, pair_any) {
        (Some(s), Some(p)) => {
            Some(s.into_iter().zip(p).map(|(s, p)| Some(s? + 2.0 * p?)).collect())
        }
        _ => None,
    })
}

fn at<T: Clone>(values: &Option<Values<T>>, i: usize) -> Option<T> {
    values.as_ref().and_then(|v| v.get(i).cloned().flatten())
}

fn warn_if_missing(present: bool, what: &str, dims: &[Dimension]) {
    if !present {
        let dims: Vec<String> = dims.iter().map(|d| d.to_string()).collect();
        warn!("No {} column found; {} will score 0", what, dims.join(", "));
    }
}

/// Builds one record per row. Never fails on cell content; only a frame
/// that polars itself cannot cast produces an error. The risk caps in
/// `config` bound each per-primer value before left and right are combined.
pub fn records_from_frame(
    df: &DataFrame,
    config: &ScoringConfig,
) -> RankerResult<Vec<PrimerPairRecord>> {
    let gene = string_values(df, GENE_COLS)?;
    let pair = string_values(df, PAIR_COLS)?;
    let left_seq = string_values(df, LEFT_SEQ_COLS)?;
    let right_seq = string_values(df, RIGHT_SEQ_COLS)?;
    let left_tm = numeric_values(df, LEFT_TM_COLS)?;
    let right_tm = numeric_values(df, RIGHT_TM_COLS)?;
    let left_gc = numeric_values(df, LEFT_GC_COLS)?;
    let right_gc = numeric_values(df, RIGHT_GC_COLS)?;
    let left_len = numeric_values(df, LEFT_LEN_COLS)?;
    let right_len = numeric_values(df, RIGHT_LEN_COLS)?;
    let product_size = numeric_values(df, PRODUCT_SIZE_COLS)?;
    let self_dimer = risk_values(df, &SELF_DIMER, config.self_dimer.cap)?;
    let end_dimer = risk_values(df, &END_DIMER, config.end_dimer.cap)?;
    let hairpin = risk_values(df, &HAIRPIN, config.hairpin.cap)?;
    let complementarity = complementarity_values(df, config.complementarity.cap)?;
    let dimer_load = dimer_loads(df)?;

    if df.height() > 0 {
        warn_if_missing(
            left_tm.is_some() && right_tm.is_some(),
            "Left_Tm/Right_Tm",
            &[Dimension::MeltingTemp, Dimension::TmDifference],
        );
        warn_if_missing(product_size.is_some(), "Product_Size", &[Dimension::ProductSize]);
        warn_if_missing(self_dimer.is_some(), "self-dimer", &[Dimension::SelfDimer]);
        warn_if_missing(end_dimer.is_some(), "end-dimer", &[Dimension::EndDimer]);
        warn_if_missing(hairpin.is_some(), "hairpin", &[Dimension::Hairpin]);
        warn_if_missing(
            complementarity.is_some(),
            "pair complementarity",
            &[Dimension::Complementarity],
        );
    }

    let records = (0..df.height())
        .map(|i| {
            let gene_id = at(&gene, i);
            let pair_id = at(&pair, i);
            let mut rec = PrimerPairRecord {
                gene_id: gene_id
                    .clone()
                    .or_else(|| pair_id.clone())
                    .unwrap_or_else(|| i.to_string()),
                pair_id: pair_id.or(gene_id).unwrap_or_else(|| i.to_string()),
                forward_seq: at(&left_seq, i).unwrap_or_default(),
                reverse_seq: at(&right_seq, i).unwrap_or_default(),
                forward_tm: at(&left_tm, i),
                reverse_tm: at(&right_tm, i),
                forward_gc: at(&left_gc, i),
                reverse_gc: at(&right_gc, i),
                forward_len: at(&left_len, i),
                reverse_len: at(&right_len, i),
                product_size: at(&product_size, i),
                self_dimer: at(&self_dimer, i),
                end_dimer: at(&end_dimer, i),
                hairpin: at(&hairpin, i),
                complementarity: at(&complementarity, i),
                dimer_load: at(&dimer_load, i),
            };
            rec.fill_from_sequences();
            rec
        })
        .collect();
    Ok(records)
}

/// Reads a parsed-primer CSV and returns both the raw frame (kept for
/// output) and the records built from it.
pub fn load_primer_table<P: AsRef<Path>>(
    path: P,
    config: &ScoringConfig,
) -> RankerResult<(DataFrame, Vec<PrimerPairRecord>)> {
    let path = path.as_ref();
    info!("Loading primer data from {}", path.display());
    let df = read_csv(path)?;
    info!("Read {} rows, {} columns", df.height(), df.width());
    let records = records_from_frame(&df, config)?;
    Ok((df, records))
}

fn output_column_order(df: &DataFrame) -> Vec<String> {
    let present: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
    let score_cols: Vec<&str> = Dimension::ALL.iter().map(|d| d.column_name()).collect();

    let mut order: Vec<String> = Vec::with_capacity(present.len());
    let groups = [PRIORITY_COLS, score_cols.as_slice()];
    for name in groups.iter().flat_map(|g| g.iter()) {
        if present.iter().any(|p| p == name) && !order.iter().any(|o| o == name) {
            order.push(name.to_string());
        }
    }
    for name in present {
        if !order.contains(&name) {
            order.push(name);
        }
    }
    order
}

/// The input frame in ranking order with score, grade and rank columns
/// added. Score columns already present in the input are replaced.
pub fn ranked_frame(df: &DataFrame, ranking: &Ranking) -> RankerResult<DataFrame> {
    if df.height() != ranking.len() {
        return Err(RankerError::Table(PolarsError::ShapeMismatch(
            format!("table has {} rows but ranking has {}", df.height(), ranking.len()).into(),
        )));
    }

    let order: Vec<IdxSize> = ranking.input_order().into_iter().map(|i| i as IdxSize).collect();
    let idx = IdxCa::from_vec("idx".into(), order);
    let mut out = df.take(&idx)?;

    let pairs = &ranking.pairs;
    for dim in Dimension::ALL {
        let values: Vec<f64> = pairs.iter().map(|p| p.sub_scores.get(dim)).collect();
        out.with_column(Series::new(PlSmallStr::from(dim.column_name()), values))?;
    }
    let scores: Vec<f64> = pairs.iter().map(|p| p.composite).collect();
    let grades: Vec<&str> = pairs.iter().map(|p| p.grade.as_str()).collect();
    let global: Vec<u32> = pairs.iter().map(|p| p.global_rank as u32).collect();
    let in_group: Vec<u32> = pairs.iter().map(|p| p.rank_in_group as u32).collect();
    let dimer: Vec<Option<f64>> = pairs.iter().map(|p| p.dimer_score).collect();

    out.with_column(Series::new(PlSmallStr::from(QUALITY_SCORE_COL), scores))?;
    out.with_column(Series::new(PlSmallStr::from(GRADE_COL), grades))?;
    out.with_column(Series::new(PlSmallStr::from(GLOBAL_RANK_COL), global))?;
    out.with_column(Series::new(PlSmallStr::from(RANK_IN_GROUP_COL), in_group))?;
    out.with_column(Series::new(PlSmallStr::from(DIMER_SCORE_COL), dimer))?;

    Ok(out.select(output_column_order(&out))?)
}
