use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use csv::{ReaderBuilder, StringRecord};
use tracing::{info, instrument};

use crate::columns::REQUIRED;
use crate::error::LoadError;
use crate::records::{Cell, RecordSet};

/// Field values the exports use for "no value".
pub const NA_VALUES: [&str; 19] = [
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

fn to_cell(raw: &str) -> Cell {
    if NA_VALUES.contains(&raw) {
        None
    } else {
        Some(raw.to_string())
    }
}

/// Read every source and stack the rows in order.
///
/// Headers are unioned across sources; rows from a source without some
/// column get nulls there. No deduplication happens.
#[instrument(skip_all, fields(sources = paths.len()))]
pub fn load_sources(paths: &[PathBuf], date_column: &str) -> Result<RecordSet, LoadError> {
    let (first, rest) = paths.split_first().ok_or(LoadError::NoSources)?;

    let mut combined = load_source(first, date_column)?;
    for path in rest {
        let next = load_source(path, date_column)?;
        combined = combined.concat(next);
    }

    info!(
        rows = combined.len(),
        columns = combined.width(),
        "sources combined"
    );
    Ok(combined)
}

/// Parse one CSV export. The date column is kept exactly as exported; the
/// normalizer decides what it means.
pub fn load_source(path: &Path, date_column: &str) -> Result<RecordSet, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let csv_err = |source: csv::Error| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .trim(csv::Trim::None)
        .from_reader(BufReader::with_capacity(1 << 20, file));

    let headers = rdr.headers().map_err(csv_err)?.clone();
    let mut set = RecordSet::new(headers.iter()).map_err(|source| LoadError::Header {
        path: path.to_path_buf(),
        source,
    })?;

    let missing = |column: &str| LoadError::MissingColumn {
        path: path.to_path_buf(),
        column: column.to_string(),
    };
    if !set.has_column(date_column) {
        return Err(missing(date_column));
    }
    if let Some(column) = REQUIRED.iter().find(|c| !set.has_column(c)) {
        return Err(missing(*column));
    }

    let mut rec = StringRecord::new();
    while rdr.read_record(&mut rec).map_err(csv_err)? {
        set.push_row(rec.iter().map(to_cell).collect::<Vec<Cell>>());
    }

    info!(path = %path.display(), rows = set.len(), "source loaded");
    Ok(set)
}
