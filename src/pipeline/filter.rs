use crate::config::AnalysisConfig;
use crate::data_model::{OptionalColumns, Post, PostTable};
use crate::error::{AnalysisError, Result};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// Inclusive day bounds for the date predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// The conjunction of filter predicates for one query.
///
/// `None` means "predicate not active". An active-but-empty label or emotion
/// set is rejected as invalid rather than silently matching everything or
/// nothing; same for a `max_rows` of 0 and an inverted date range.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub date_range: Option<DateRange>,
    pub labels: Option<HashSet<String>>,
    pub emotions: Option<HashSet<String>>,
    pub max_rows: Option<usize>,
}

impl FilterCriteria {
    /// No predicates active, rows capped at the session's configured bound.
    pub fn from_config(config: &AnalysisConfig) -> Self {
        FilterCriteria {
            max_rows: Some(config.limits.max_rows),
            ..FilterCriteria::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(labels) = &self.labels {
            if labels.is_empty() {
                return Err(AnalysisError::InvalidCriteria(
                    "label filter is active but the label set is empty".to_string(),
                ));
            }
        }
        if let Some(emotions) = &self.emotions {
            if emotions.is_empty() {
                return Err(AnalysisError::InvalidCriteria(
                    "emotion filter is active but the emotion set is empty".to_string(),
                ));
            }
        }
        if let Some(range) = &self.date_range {
            if range.start > range.end {
                return Err(AnalysisError::InvalidCriteria(format!(
                    "date range start {} is after end {}",
                    range.start, range.end
                )));
            }
        }
        if self.max_rows == Some(0) {
            return Err(AnalysisError::InvalidCriteria(
                "max_rows must be greater than 0 when set".to_string(),
            ));
        }
        Ok(())
    }

    /// True when `post` passes every active predicate simultaneously.
    fn matches(&self, post: &Post) -> bool {
        if let Some(range) = &self.date_range {
            // Unparsed timestamps are excluded from any date-bounded view.
            match post.posted_at {
                Some(ts) => {
                    if !range.contains(ts.date()) {
                        return false;
                    }
                }
                None => return false,
            }
        }
        if let Some(labels) = &self.labels {
            if !labels.contains(&post.label) {
                return false;
            }
        }
        if let Some(emotions) = &self.emotions {
            if !emotions.contains(&post.emotion) {
                return false;
            }
        }
        true
    }
}

/// An ordered, borrowed subset of the source table. The source is never
/// mutated; dropping the view costs nothing. The optional-column flags ride
/// along so aggregations can degrade without reaching back to the table.
#[derive(Debug, Clone, Serialize)]
pub struct FilteredView<'a> {
    posts: Vec<&'a Post>,
    optional: OptionalColumns,
}

impl<'a> FilteredView<'a> {
    pub fn posts(&self) -> &[&'a Post] {
        &self.posts
    }

    pub fn optional(&self) -> OptionalColumns {
        self.optional
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    /// Text bodies of the view, in view order. Feeds the frequency analyzer.
    pub fn texts(&self) -> Vec<&'a str> {
        self.posts.iter().map(|p| p.text.as_str()).collect()
    }
}

/// Apply the criteria conjunction to the table, preserving original row
/// order, then cap to `max_rows` if set. Predicate evaluation order cannot
/// change the result: a post survives iff every active predicate passes.
pub fn filter<'a>(table: &'a PostTable, criteria: &FilterCriteria) -> Result<FilteredView<'a>> {
    criteria.validate()?;

    let mut posts: Vec<&Post> = table
        .posts
        .iter()
        .filter(|post| criteria.matches(post))
        .collect();

    if let Some(cap) = criteria.max_rows {
        posts.truncate(cap);
    }

    debug!(
        selected = posts.len(),
        total = table.posts.len(),
        "applied filter criteria"
    );

    Ok(FilteredView {
        posts,
        optional: table.optional,
    })
}

/// One page of a view.
#[derive(Debug, Clone, Serialize)]
pub struct Page<'a> {
    pub posts: Vec<&'a Post>,
    /// 1-based, already clamped.
    pub page_number: usize,
    pub page_count: usize,
    pub page_size: usize,
    pub total_rows: usize,
}

/// Slice one page out of the view. Page numbers are 1-based and clamp into
/// `[1, page_count]`: page 0 and pages past the end never error. An empty
/// view yields a single empty page.
pub fn paginate<'a>(
    view: &FilteredView<'a>,
    page_size: usize,
    page_number: usize,
) -> Result<Page<'a>> {
    if page_size == 0 {
        return Err(AnalysisError::InvalidCriteria(
            "page_size must be greater than 0".to_string(),
        ));
    }

    let total_rows = view.len();
    let page_count = usize::max(1, total_rows.div_ceil(page_size));
    let page_number = page_number.clamp(1, page_count);

    let start = (page_number - 1) * page_size;
    let end = usize::min(start + page_size, total_rows);
    let posts = if start < total_rows {
        view.posts[start..end].to_vec()
    } else {
        Vec::new()
    };

    Ok(Page {
        posts,
        page_number,
        page_count,
        page_size,
        total_rows,
    })
}
