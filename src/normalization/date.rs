use chrono::NaiveDateTime;
use tracing::{debug, instrument};

use super::patterns::{is_dmy_dash_stamp, is_dmy_slash_stamp, is_ydm_dash_stamp};
use crate::columns::DATE;
use crate::error::SchemaError;
use crate::records::RecordSet;

/// Output layout for every recognised date.
pub const CANONICAL_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Layouts seen in the exports, tried in order. The canonical layout is not
/// one of them, so running already-normalized text back through yields `""`.
pub const INPUT_FORMATS: [&str; 3] = ["%d-%m-%Y %H:%M:%S", "%d/%m/%Y %H:%M", "%Y-%d-%m %H:%M:%S"];

// chrono's `%Y` takes any digit count and a sign, so each layout is gated on
// its exact year width first.
const LAYOUTS: [(&str, fn(&str) -> bool); 3] = [
    (INPUT_FORMATS[0], is_dmy_dash_stamp),
    (INPUT_FORMATS[1], is_dmy_slash_stamp),
    (INPUT_FORMATS[2], is_ydm_dash_stamp),
];

/// Re-emit `raw` in [`CANONICAL_FORMAT`].
///
/// Null passes through untouched. Text matching none of [`INPUT_FORMATS`]
/// becomes `Some("")`, which marks "unparseable" as opposed to "absent".
pub fn normalize_date(raw: Option<&str>) -> Option<String> {
    let raw = raw?;
    let parsed = LAYOUTS
        .iter()
        .filter(|(_, shaped)| shaped(raw))
        .find_map(|(fmt, _)| NaiveDateTime::parse_from_str(raw, fmt).ok());
    Some(
        parsed
            .map(|dt| dt.format(CANONICAL_FORMAT).to_string())
            .unwrap_or_default(),
    )
}

/// Parse a canonical string produced by [`normalize_date`]; `""` yields `None`.
pub fn parse_canonical(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, CANONICAL_FORMAT).ok()
}

#[instrument(skip_all, fields(rows = set.len()))]
pub fn normalize_dates(mut set: RecordSet) -> Result<RecordSet, SchemaError> {
    let date = set.column(DATE)?;
    let mut unparseable = 0usize;
    for row in set.rows_mut() {
        let normalized = normalize_date(row.get(date));
        if normalized.as_deref() == Some("") {
            unparseable += 1;
        }
        row.set(date, normalized);
    }
    debug!(unparseable, "dates normalized");
    Ok(set)
}
