use crate::config::AnalysisConfig;
use crate::data_model::Post;
use crate::error::{AnalysisError, Result};
use crate::pipeline::aggregate::{
    aggregate, top_posts, AggregateOp, AggregateSpec, GroupBy, GroupKey, GroupedResult, Metric,
    RowScope,
};
use crate::pipeline::filter::FilteredView;
use crate::pipeline::text_stats::{word_frequencies, WordCount};
use crate::utils::text::StopwordFilter;

use serde::{Deserialize, Serialize};

/// The fixed set of views the presentation layer can request. Each preset is
/// one parameterization of the aggregation engine (or the text analyzer),
/// so every report shares a single code path instead of one bespoke block
/// per chart.
///
/// Scope rule, applied uniformly: reports characterizing hate-speech
/// subtypes run over hate rows only; reports comparing hate against non-hate
/// include everything.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "type")]
pub enum ReportSpec {
    /// Hate vs. non-hate totals (pie chart).
    HateVsNotHate,
    /// Emotion counts split by hate class (grouped bars).
    EmotionByHateClass,
    /// Emotion counts per hate-speech subtype, hate rows only.
    EmotionByHateLabel,
    /// Hate posts per month; `months` is zero-filled in the given order.
    HateOverTime { months: Vec<String> },
    /// Mean upvotes per hate-speech subtype, hate rows only.
    MeanUpvotesByLabel,
    /// Emotion distribution inside hate speech.
    EmotionDistributionInHate,
    /// Post counts per author (requires the optional `user` column).
    PostsByUser,
    /// The `limit` posts with the highest engagement.
    TopEngagement { limit: usize },
    /// The `limit` most common non-stopword tokens in the view's texts.
    CommonWords { limit: usize },
}

impl ReportSpec {
    /// Returns a string slice representing the name of the report type.
    pub fn name(&self) -> &'static str {
        match self {
            ReportSpec::HateVsNotHate => "HateVsNotHate",
            ReportSpec::EmotionByHateClass => "EmotionByHateClass",
            ReportSpec::EmotionByHateLabel => "EmotionByHateLabel",
            ReportSpec::HateOverTime { .. } => "HateOverTime",
            ReportSpec::MeanUpvotesByLabel => "MeanUpvotesByLabel",
            ReportSpec::EmotionDistributionInHate => "EmotionDistributionInHate",
            ReportSpec::PostsByUser => "PostsByUser",
            ReportSpec::TopEngagement { .. } => "TopEngagement",
            ReportSpec::CommonWords { .. } => "CommonWords",
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            ReportSpec::TopEngagement { limit } | ReportSpec::CommonWords { limit } => {
                if *limit == 0 {
                    return Err(AnalysisError::InvalidCriteria(format!(
                        "{}: limit must be greater than 0",
                        self.name()
                    )));
                }
            }
            _ => {}
        }
        Ok(())
    }
}

/// What a report evaluates to. Structured and format-agnostic; the
/// presentation layer decides how to draw it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ReportOutput<'a> {
    Grouped(GroupedResult),
    Posts(Vec<&'a Post>),
    Words(Vec<WordCount>),
}

impl ReportOutput<'_> {
    /// JSON rendering for presentation layers that want it; the structured
    /// value itself stays the primary interface.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// How many posts the engagement ranking shows, as in the original views.
const TOP_ENGAGEMENT_LIMIT: usize = 10;

/// The standard dashboard: every preset the presentation layer renders by
/// default, sized from the session configuration. `PostsByUser` is included
/// and simply fails with `ColumnUnavailable` on datasets without the `user`
/// column; callers render that one report as "not available".
pub fn standard_reports(months: Vec<String>, config: &AnalysisConfig) -> Vec<ReportSpec> {
    vec![
        ReportSpec::HateVsNotHate,
        ReportSpec::EmotionByHateClass,
        ReportSpec::EmotionByHateLabel,
        ReportSpec::HateOverTime { months },
        ReportSpec::MeanUpvotesByLabel,
        ReportSpec::EmotionDistributionInHate,
        ReportSpec::PostsByUser,
        ReportSpec::TopEngagement {
            limit: TOP_ENGAGEMENT_LIMIT,
        },
        ReportSpec::CommonWords {
            limit: config.limits.top_n,
        },
    ]
}

/// Evaluate one report preset against an already-filtered view.
pub fn run_report<'a>(
    view: &FilteredView<'a>,
    spec: &ReportSpec,
    stopwords: &StopwordFilter,
) -> Result<ReportOutput<'a>> {
    spec.validate()?;

    let grouped = |group_by, op, scope, expected_keys| {
        aggregate(
            view,
            &AggregateSpec {
                group_by,
                op,
                scope,
                expected_keys,
            },
        )
        .map(ReportOutput::Grouped)
    };

    match spec {
        ReportSpec::HateVsNotHate => grouped(
            GroupBy::One(GroupKey::HateClass),
            AggregateOp::Count,
            RowScope::All,
            None,
        ),
        ReportSpec::EmotionByHateClass => grouped(
            GroupBy::Two(GroupKey::HateClass, GroupKey::Emotion),
            AggregateOp::Count,
            RowScope::All,
            None,
        ),
        ReportSpec::EmotionByHateLabel => grouped(
            GroupBy::Two(GroupKey::Label, GroupKey::Emotion),
            AggregateOp::Count,
            RowScope::HateOnly,
            None,
        ),
        ReportSpec::HateOverTime { months } => grouped(
            GroupBy::One(GroupKey::MonthBucket),
            AggregateOp::Count,
            RowScope::HateOnly,
            if months.is_empty() {
                None
            } else {
                Some(months.clone())
            },
        ),
        ReportSpec::MeanUpvotesByLabel => grouped(
            GroupBy::One(GroupKey::Label),
            AggregateOp::Mean(Metric::Upvotes),
            RowScope::HateOnly,
            None,
        ),
        ReportSpec::EmotionDistributionInHate => grouped(
            GroupBy::One(GroupKey::Emotion),
            AggregateOp::Count,
            RowScope::HateOnly,
            None,
        ),
        ReportSpec::PostsByUser => grouped(
            GroupBy::One(GroupKey::User),
            AggregateOp::Count,
            RowScope::All,
            None,
        ),
        ReportSpec::TopEngagement { limit } => {
            top_posts(view, Metric::Engagement, *limit).map(ReportOutput::Posts)
        }
        ReportSpec::CommonWords { limit } => Ok(ReportOutput::Words(word_frequencies(
            &view.texts(),
            stopwords,
            *limit,
        ))),
    }
}
