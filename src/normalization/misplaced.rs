use tracing::{debug, instrument};

use super::patterns::{has_dmy_date_prefix, starts_with_digit};
use super::url::BASE_ORIGIN;
use crate::columns::{CUID, DATE, IP_ADDRESS, MA_PATH, MA_URL, MESSAGE_ID};
use crate::error::SchemaError;
use crate::records::RecordSet;

/// Marker some exports leave in `cuid` when the real id slid into `Message Id`.
pub const VYT_MARKER: &str = "/vyt/";

/// Move values that the export wrote into the wrong column.
///
/// * `MA URL` starting with a digit on a row whose `Date` is `dd-mm-yyyy`
///   shaped is rebuilt from `ma_path`.
/// * `cuid == "/vyt/"` takes `Message Id`'s value; `Message Id` becomes null.
/// * a `dd-mm-yyyy` value in `IP Address` is copied into `Date`. The IP
///   column keeps its value, so both columns end up holding the date.
///
/// The IP-in-URL check reads `Date` before the last rule can overwrite it.
#[instrument(skip_all, fields(rows = set.len()))]
pub fn correct_misplaced(mut set: RecordSet) -> Result<RecordSet, SchemaError> {
    let ma_url = set.column(MA_URL)?;
    let ma_path = set.column(MA_PATH)?;
    let date = set.column(DATE)?;
    let cuid = set.column(CUID)?;
    let message_id = set.column(MESSAGE_ID)?;
    let ip = set.column(IP_ADDRESS)?;

    let (mut urls_rebuilt, mut cuids_moved, mut dates_recovered) = (0usize, 0usize, 0usize);
    for row in set.rows_mut() {
        let shifted = matches!(
            (row.get(ma_url), row.get(date)),
            (Some(u), Some(d)) if starts_with_digit(u) && has_dmy_date_prefix(d)
        );
        if shifted {
            if let Some(rebuilt) = row.get(ma_path).map(|p| format!("{BASE_ORIGIN}/{p}")) {
                row.set(ma_url, Some(rebuilt));
                urls_rebuilt += 1;
            }
        }

        if row.get(cuid) == Some(VYT_MARKER) {
            let moved = row.take(message_id);
            row.set(cuid, moved);
            cuids_moved += 1;
        }

        let recovered = row
            .get(ip)
            .filter(|v| has_dmy_date_prefix(v))
            .map(str::to_owned);
        if let Some(value) = recovered {
            row.set(date, Some(value));
            dates_recovered += 1;
        }
    }

    debug!(urls_rebuilt, cuids_moved, dates_recovered, "misplaced values corrected");
    Ok(set)
}
