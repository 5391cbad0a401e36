use std::fs::{self, File};
use std::path::{Path, PathBuf};

use polars::error::PolarsResult;
use polars::frame::DataFrame;
use polars::prelude::{CsvReadOptions, CsvWriter, SerReader, SerWriter};
use serde::Serialize;
use tracing::debug;

use crate::errors::RankerResult;

/// Reads every column as text; callers cast what they need so that one
/// malformed cell cannot fail schema inference for the whole file.
pub fn read_csv<P: AsRef<Path>>(file_path: P) -> PolarsResult<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(PathBuf::from(file_path.as_ref())))?
        .finish()
}

fn ensure_parent_dir(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            debug!("Creating output directory {}", parent.display());
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

pub fn write_csv<P: AsRef<Path>>(df: &mut DataFrame, path: P) -> RankerResult<()> {
    let path = path.as_ref();
    ensure_parent_dir(path)?;
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .with_separator(b',')
        .finish(df)?;
    Ok(())
}

pub fn write_json<T: Serialize, P: AsRef<Path>>(value: &T, path: P) -> RankerResult<()> {
    let path = path.as_ref();
    ensure_parent_dir(path)?;
    fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}
