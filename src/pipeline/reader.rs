use crate::data_model::{OptionalColumns, RawPost, RawTable};
use crate::error::Result;

use csv::ReaderBuilder;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Reads the annotated-posts table from a delimited file with a header row.
///
/// Reading only materializes rows; the required-column contract is checked
/// afterwards by the schema validator, and all value coercion belongs to the
/// deriver. Failures here are load-level and fatal to the session.
#[derive(Debug)]
pub struct TableReader {
    path: PathBuf,
}

impl TableReader {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        TableReader {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Read the whole table into memory, in file order.
    pub fn read(&self) -> Result<RawTable> {
        // `flexible(true)` lets the reader tolerate rows with varying column
        // counts instead of failing hard on minor format issues.
        let mut rdr = ReaderBuilder::new()
            .flexible(true)
            .from_path(&self.path)?;

        let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.to_string()).collect();

        let optional = OptionalColumns {
            views: headers.iter().any(|h| h == "views"),
            shares: headers.iter().any(|h| h == "shares"),
            user: headers.iter().any(|h| h == "user"),
        };

        let mut rows: Vec<RawPost> = Vec::new();
        for result in rdr.deserialize::<RawPost>() {
            rows.push(result?);
        }

        debug!(
            path = %self.path.display(),
            rows = rows.len(),
            "loaded input table"
        );

        Ok(RawTable {
            headers,
            rows,
            optional,
        })
    }
}
