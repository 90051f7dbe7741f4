use tracing::{debug, instrument};

use crate::columns::{NAME, TITLE};
use crate::error::SchemaError;
use crate::records::RecordSet;

/// Fill a null Title from Name and a null Name from Title.
///
/// Rows where both are null or both are set are left as they are; there is
/// no equality enforcement between two populated values.
#[instrument(skip_all, fields(rows = set.len()))]
pub fn reconcile_identity(mut set: RecordSet) -> Result<RecordSet, SchemaError> {
    let title = set.column(TITLE)?;
    let name = set.column(NAME)?;

    let mut titles_filled = 0usize;
    let mut names_filled = 0usize;
    for row in set.rows_mut() {
        match (row.is_null(title), row.is_null(name)) {
            (true, false) => {
                let value = row.get(name).map(str::to_owned);
                row.set(title, value);
                titles_filled += 1;
            }
            (false, true) => {
                let value = row.get(title).map(str::to_owned);
                row.set(name, value);
                names_filled += 1;
            }
            _ => {}
        }
    }

    debug!(titles_filled, names_filled, "identity columns reconciled");
    Ok(set)
}
