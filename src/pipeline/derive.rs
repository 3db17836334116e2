use crate::config::AnalysisConfig;
use crate::data_model::{HateClass, Post, PostTable, RawPost, ValidatedTable};

use chrono::{NaiveDate, NaiveDateTime};
use tracing::debug;

/// Knobs for the derivation pass. All derived values are pure functions of
/// (raw row, options), so deriving twice with the same options always yields
/// the same table.
#[derive(Debug, Clone)]
pub struct DeriveOptions {
    /// Timestamp formats tried in order; first match wins.
    pub timestamp_formats: Vec<String>,
    /// chrono format string for the display timestamp.
    pub display_format: String,
    /// Label value marking a non-hate post.
    pub not_hate_label: String,
}

impl Default for DeriveOptions {
    fn default() -> Self {
        DeriveOptions::from_config(&AnalysisConfig::default())
    }
}

impl DeriveOptions {
    pub fn from_config(config: &AnalysisConfig) -> Self {
        DeriveOptions {
            timestamp_formats: config.timestamps.formats.clone(),
            display_format: config.timestamps.display_format.clone(),
            not_hate_label: config.not_hate_label().to_string(),
        }
    }
}

/// Compute every derived column for the validated table. Total function:
/// bad cells coerce (numbers to 0, timestamps to the unparsed marker), they
/// never fail the pass or drop the row.
pub fn derive(table: ValidatedTable, opts: &DeriveOptions) -> PostTable {
    let optional = table.optional;
    let mut unparsed_timestamps = 0usize;

    let posts: Vec<Post> = table
        .rows
        .into_iter()
        .enumerate()
        .map(|(id, row)| {
            let post = derive_post(id, row, opts, &optional);
            if post.posted_at.is_none() {
                unparsed_timestamps += 1;
            }
            post
        })
        .collect();

    if unparsed_timestamps > 0 {
        debug!(
            unparsed_timestamps,
            total = posts.len(),
            "rows with unparseable timestamps are excluded from date filters"
        );
    }

    PostTable { posts, optional }
}

fn derive_post(
    id: usize,
    row: RawPost,
    opts: &DeriveOptions,
    optional: &crate::data_model::OptionalColumns,
) -> Post {
    let label = row.label.map(|l| l.trim().to_string()).unwrap_or_default();
    let emotion = row
        .emotion
        .map(|e| e.trim().to_string())
        .unwrap_or_default();
    let text = row.text.unwrap_or_default();

    let upvotes = parse_count(row.upvotes.as_deref());
    let comments = parse_count(row.comments.as_deref());
    let views = optional.views.then(|| parse_count(row.views.as_deref()));
    let shares = optional.shares.then(|| parse_count(row.shares.as_deref()));
    let user = if optional.user {
        row.user
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
    } else {
        None
    };

    let posted_at = row
        .posted_at
        .as_deref()
        .and_then(|s| parse_timestamp(s, &opts.timestamp_formats));
    let posted_at_display = posted_at.map(|ts| ts.format(&opts.display_format).to_string());
    let month_bucket = posted_at.map(|ts| ts.format("%Y-%m").to_string());

    let hate_class = if label == opts.not_hate_label {
        HateClass::NotHate
    } else {
        HateClass::HateSpeech
    };

    Post {
        id,
        posted_at,
        posted_at_display,
        label,
        emotion,
        upvotes,
        comments,
        views,
        shares,
        user,
        text,
        engagement: upvotes + comments,
        hate_class,
        month_bucket,
    }
}

/// Lenient non-negative integer coercion: absent, blank, negative or
/// non-numeric cells all become 0 so sums and means never drop a row over a
/// single bad cell.
fn parse_count(raw: Option<&str>) -> u64 {
    let Some(s) = raw else { return 0 };
    let s = s.trim();
    if s.is_empty() {
        return 0;
    }
    if let Ok(n) = s.parse::<u64>() {
        return n;
    }
    // Values exported as floats ("12.0") still count.
    match s.parse::<f64>() {
        Ok(f) if f.is_finite() && f > 0.0 => f.trunc() as u64,
        _ => 0,
    }
}

/// Try each configured format in order; datetime formats first-class, plain
/// date formats midnight-anchored. No match means the unparsed marker.
fn parse_timestamp(raw: &str, formats: &[String]) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    for format in formats {
        if let Ok(ts) = NaiveDateTime::parse_from_str(s, format) {
            return Some(ts);
        }
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            if let Some(ts) = date.and_hms_opt(0, 0, 0) {
                return Some(ts);
            }
        }
    }
    None
}
