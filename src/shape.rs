use tracing::{info, instrument};

use crate::columns::{DROPPED, RENAMED};
use crate::error::SchemaError;
use crate::records::RecordSet;

/// Drop export-only columns and rename the rest to database-safe names.
///
/// Purely structural. Any column in either list that is absent from the set
/// means an upstream stage broke its contract, so this fails instead of
/// skipping it.
#[instrument(skip_all, fields(rows = set.len()))]
pub fn shape_for_output(mut set: RecordSet) -> Result<RecordSet, SchemaError> {
    for column in DROPPED {
        set.drop_column(column)?;
    }
    for (from, to) in RENAMED {
        set.rename_column(from, to)?;
    }
    info!(
        columns = ?set.columns().collect::<Vec<_>>(),
        "records shaped for output"
    );
    Ok(set)
}
