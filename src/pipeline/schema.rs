use crate::data_model::{RawTable, ValidatedTable, REQUIRED_COLUMNS};
use crate::error::{AnalysisError, Result};

use tracing::warn;

/// Check the loaded table against the required-column contract.
///
/// Column names match case-sensitively. A failing table reports every absent
/// column at once so callers can surface the full list instead of one name
/// per attempt. Type coercion is deliberately not done here; that is the
/// deriver's job.
pub fn validate(table: RawTable) -> Result<ValidatedTable> {
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|required| !table.headers.iter().any(|h| h == *required))
        .map(|required| required.to_string())
        .collect();

    if !missing.is_empty() {
        warn!(?missing, "input table failed the schema contract");
        return Err(AnalysisError::Schema { missing });
    }

    Ok(ValidatedTable {
        headers: table.headers,
        rows: table.rows,
        optional: table.optional,
    })
}
