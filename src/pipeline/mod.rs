// src/pipeline/mod.rs

pub mod aggregate;
pub mod derive;
pub mod filter;
pub mod reader;
pub mod reports;
pub mod schema;
pub mod text_stats;

use crate::config::AnalysisConfig;
use crate::data_model::PostTable;
use crate::error::Result;

/// One session-start pass: read the table, enforce the schema contract and
/// derive every computed column. Everything after this point is pure
/// filtering/aggregation over the returned immutable table.
pub fn load_posts<P: AsRef<std::path::Path>>(
    path: P,
    config: &AnalysisConfig,
) -> Result<PostTable> {
    let raw = reader::TableReader::new(path).read()?;
    let validated = schema::validate(raw)?;
    Ok(derive::derive(
        validated,
        &derive::DeriveOptions::from_config(config),
    ))
}
