use crate::data_model::{OptionalColumns, Post};
use crate::error::{AnalysisError, Result};
use crate::pipeline::filter::FilteredView;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::HashMap;
use tracing::debug;

/// Columns a view can be grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GroupKey {
    Label,
    Emotion,
    HateClass,
    MonthBucket,
    User,
}

impl GroupKey {
    pub fn name(&self) -> &'static str {
        match self {
            GroupKey::Label => "label",
            GroupKey::Emotion => "emotion",
            GroupKey::HateClass => "hate_class",
            GroupKey::MonthBucket => "month_bucket",
            GroupKey::User => "user",
        }
    }
}

/// One or two grouping keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupBy {
    One(GroupKey),
    Two(GroupKey, GroupKey),
}

/// Numeric column a reduction runs over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Metric {
    Upvotes,
    Comments,
    Engagement,
    Views,
    Shares,
}

impl Metric {
    pub fn name(&self) -> &'static str {
        match self {
            Metric::Upvotes => "upvotes",
            Metric::Comments => "comments",
            Metric::Engagement => "engagement",
            Metric::Views => "views",
            Metric::Shares => "shares",
        }
    }
}

/// The reduction applied per group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AggregateOp {
    Count,
    Sum(Metric),
    Mean(Metric),
    /// Keep only the `limit` groups with the largest summed metric,
    /// descending, ties broken by first occurrence in the view.
    TopN { metric: Metric, limit: usize },
}

impl AggregateOp {
    fn metric(&self) -> Option<Metric> {
        match self {
            AggregateOp::Count => None,
            AggregateOp::Sum(m) | AggregateOp::Mean(m) => Some(*m),
            AggregateOp::TopN { metric, .. } => Some(*metric),
        }
    }
}

/// Which rows of the view take part in the aggregation.
///
/// Aggregations characterizing hate-speech subtypes run `HateOnly`;
/// aggregations comparing hate against non-hate totals run `All`. The rule
/// is carried explicitly on every spec so no call site can drift.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowScope {
    #[default]
    All,
    HateOnly,
}

/// Full description of one aggregation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateSpec {
    pub group_by: GroupBy,
    pub op: AggregateOp,
    #[serde(default)]
    pub scope: RowScope,
    /// Keys that must appear in the result even with zero matching rows
    /// (count/sum backfill to 0, mean to the NoData sentinel). Output follows
    /// this list's order. Single-key grouping only.
    #[serde(default)]
    pub expected_keys: Option<Vec<String>>,
}

impl AggregateSpec {
    pub fn validate(&self) -> Result<()> {
        if let AggregateOp::TopN { limit, .. } = self.op {
            if limit == 0 {
                return Err(AnalysisError::InvalidCriteria(
                    "top_n limit must be greater than 0".to_string(),
                ));
            }
        }
        if self.expected_keys.is_some() {
            if let GroupBy::Two(..) = self.group_by {
                return Err(AnalysisError::InvalidCriteria(
                    "expected_keys is only supported for single-key grouping".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Group identity in a result row. `secondary` is set for two-key grouping.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct GroupKeyValue {
    pub primary: String,
    pub secondary: Option<String>,
}

impl GroupKeyValue {
    fn single(primary: String) -> Self {
        GroupKeyValue {
            primary,
            secondary: None,
        }
    }
}

/// The reduced value of one group. `NoData` is the sentinel for a mean over
/// an empty group; it must never surface as NaN or a fake zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum AggregateValue {
    Count(u64),
    Sum(u64),
    Mean(f64),
    NoData,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupRow {
    pub key: GroupKeyValue,
    pub value: AggregateValue,
}

/// Ordered group → value mapping. Row order is deterministic: expected keys
/// first (caller's order), then remaining groups by first occurrence in the
/// view; `TopN` re-ranks descending by value.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct GroupedResult {
    pub rows: Vec<GroupRow>,
}

impl GroupedResult {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Lookup by primary key, for single-key results.
    pub fn get(&self, primary: &str) -> Option<&AggregateValue> {
        self.rows
            .iter()
            .find(|row| row.key.primary == primary && row.key.secondary.is_none())
            .map(|row| &row.value)
    }
}

#[derive(Default)]
struct GroupAcc {
    count: u64,
    sum: u64,
}

/// Run one group-by/reduce over the view.
///
/// An empty view (or an empty group after scoping) is a representable state,
/// not an error: the result is empty unless `expected_keys` backfills it.
pub fn aggregate(view: &FilteredView<'_>, spec: &AggregateSpec) -> Result<GroupedResult> {
    spec.validate()?;

    let optional = view.optional();
    match spec.group_by {
        GroupBy::One(key) => ensure_key_available(key, optional)?,
        GroupBy::Two(first, second) => {
            ensure_key_available(first, optional)?;
            ensure_key_available(second, optional)?;
        }
    }
    if let Some(metric) = spec.op.metric() {
        ensure_metric_available(metric, optional)?;
    }

    let mut order: Vec<GroupKeyValue> = Vec::new();
    let mut accs: HashMap<GroupKeyValue, GroupAcc> = HashMap::new();

    if let Some(expected) = &spec.expected_keys {
        for key in expected {
            let key = GroupKeyValue::single(key.clone());
            if !accs.contains_key(&key) {
                order.push(key.clone());
                accs.insert(key, GroupAcc::default());
            }
        }
    }

    for post in view.posts() {
        if spec.scope == RowScope::HateOnly && !post.is_hate() {
            continue;
        }
        let Some(key) = key_value(post, spec.group_by) else {
            // Rows without the grouping key (unparsed month, missing user)
            // do not belong to any bucket of this grouping.
            continue;
        };
        let acc = accs.entry(key.clone()).or_insert_with(|| {
            order.push(key);
            GroupAcc::default()
        });
        acc.count += 1;
        if let Some(metric) = spec.op.metric() {
            acc.sum += metric_value(post, metric);
        }
    }

    let mut rows: Vec<GroupRow> = order
        .into_iter()
        .map(|key| {
            let acc = &accs[&key];
            let value = match spec.op {
                AggregateOp::Count => AggregateValue::Count(acc.count),
                AggregateOp::Sum(_) => AggregateValue::Sum(acc.sum),
                AggregateOp::Mean(_) => {
                    if acc.count == 0 {
                        AggregateValue::NoData
                    } else {
                        AggregateValue::Mean(acc.sum as f64 / acc.count as f64)
                    }
                }
                AggregateOp::TopN { .. } => AggregateValue::Sum(acc.sum),
            };
            GroupRow { key, value }
        })
        .collect();

    if let AggregateOp::TopN { limit, .. } = spec.op {
        // sorted_by_key is stable, so ties keep first-occurrence order.
        rows = rows
            .into_iter()
            .sorted_by_key(|row| Reverse(sum_of(&row.value)))
            .collect();
        rows.truncate(limit);
    }

    debug!(groups = rows.len(), "aggregation complete");

    Ok(GroupedResult { rows })
}

/// Rank individual posts (not groups) by a metric, descending, ties broken
/// by original row order. Drives "top N posts by engagement" style reports.
pub fn top_posts<'a>(
    view: &FilteredView<'a>,
    metric: Metric,
    limit: usize,
) -> Result<Vec<&'a Post>> {
    if limit == 0 {
        return Err(AnalysisError::InvalidCriteria(
            "top_n limit must be greater than 0".to_string(),
        ));
    }
    ensure_metric_available(metric, view.optional())?;

    let mut ranked: Vec<&Post> = view
        .posts()
        .iter()
        .copied()
        .sorted_by_key(|post| Reverse(metric_value(post, metric)))
        .collect();
    ranked.truncate(limit);
    Ok(ranked)
}

fn ensure_key_available(key: GroupKey, optional: OptionalColumns) -> Result<()> {
    if key == GroupKey::User && !optional.user {
        return Err(AnalysisError::ColumnUnavailable {
            column: key.name().to_string(),
        });
    }
    Ok(())
}

fn ensure_metric_available(metric: Metric, optional: OptionalColumns) -> Result<()> {
    let missing = match metric {
        Metric::Views => !optional.views,
        Metric::Shares => !optional.shares,
        _ => false,
    };
    if missing {
        return Err(AnalysisError::ColumnUnavailable {
            column: metric.name().to_string(),
        });
    }
    Ok(())
}

fn key_part(post: &Post, key: GroupKey) -> Option<String> {
    match key {
        GroupKey::Label => Some(post.label.clone()),
        GroupKey::Emotion => Some(post.emotion.clone()),
        GroupKey::HateClass => Some(post.hate_class.as_str().to_string()),
        GroupKey::MonthBucket => post.month_bucket.clone(),
        GroupKey::User => post.user.clone(),
    }
}

fn key_value(post: &Post, group_by: GroupBy) -> Option<GroupKeyValue> {
    match group_by {
        GroupBy::One(key) => key_part(post, key).map(GroupKeyValue::single),
        GroupBy::Two(first, second) => {
            let primary = key_part(post, first)?;
            let secondary = key_part(post, second)?;
            Some(GroupKeyValue {
                primary,
                secondary: Some(secondary),
            })
        }
    }
}

fn metric_value(post: &Post, metric: Metric) -> u64 {
    match metric {
        Metric::Upvotes => post.upvotes,
        Metric::Comments => post.comments,
        Metric::Engagement => post.engagement,
        Metric::Views => post.views.unwrap_or(0),
        Metric::Shares => post.shares.unwrap_or(0),
    }
}

fn sum_of(value: &AggregateValue) -> u64 {
    match value {
        AggregateValue::Count(n) | AggregateValue::Sum(n) => *n,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_model::{HateClass, PostTable, NOT_HATE_LABEL};
    use crate::pipeline::filter::{filter, FilterCriteria};
    use chrono::NaiveDate;

    fn post(
        id: usize,
        label: &str,
        emotion: &str,
        month: Option<&str>,
        upvotes: u64,
        user: Option<&str>,
    ) -> Post {
        let posted_at = month.map(|m| {
            NaiveDate::parse_from_str(&format!("{}-15", m), "%Y-%m-%d")
                .unwrap()
                .and_hms_opt(8, 0, 0)
                .unwrap()
        });
        Post {
            id,
            posted_at,
            posted_at_display: None,
            label: label.to_string(),
            emotion: emotion.to_string(),
            upvotes,
            comments: 2,
            views: None,
            shares: None,
            user: user.map(|u| u.to_string()),
            text: String::new(),
            engagement: upvotes + 2,
            hate_class: HateClass::from_label(label),
            month_bucket: month.map(|m| m.to_string()),
        }
    }

    fn table(posts: Vec<Post>, optional: OptionalColumns) -> PostTable {
        PostTable { posts, optional }
    }

    fn full_view(table: &PostTable) -> FilteredView<'_> {
        filter(table, &FilterCriteria::default()).unwrap()
    }

    fn sample_table() -> PostTable {
        table(
            vec![
                post(0, "racismo", "raiva", Some("2024-01"), 10, None),
                post(1, NOT_HATE_LABEL, "alegria", Some("2024-01"), 50, None),
                post(2, "racismo", "medo", Some("2024-02"), 30, None),
                post(3, "homofobia", "raiva", None, 20, None),
                post(4, NOT_HATE_LABEL, "raiva", Some("2024-03"), 5, None),
            ],
            OptionalColumns::default(),
        )
    }

    #[test]
    fn test_count_by_hate_class_partitions_the_view() {
        let table = sample_table();
        let view = full_view(&table);
        let result = aggregate(
            &view,
            &AggregateSpec {
                group_by: GroupBy::One(GroupKey::HateClass),
                op: AggregateOp::Count,
                scope: RowScope::All,
                expected_keys: None,
            },
        )
        .unwrap();

        assert_eq!(
            result.get("Discurso de Ódio"),
            Some(&AggregateValue::Count(3))
        );
        assert_eq!(
            result.get("Não é Discurso de Ódio"),
            Some(&AggregateValue::Count(2))
        );
        let total: u64 = result
            .rows
            .iter()
            .map(|row| match row.value {
                AggregateValue::Count(n) => n,
                _ => 0,
            })
            .sum();
        assert_eq!(total as usize, view.len());
    }

    #[test]
    fn test_hate_only_scope_excludes_not_hate() {
        let table = sample_table();
        let view = full_view(&table);
        let result = aggregate(
            &view,
            &AggregateSpec {
                group_by: GroupBy::One(GroupKey::Label),
                op: AggregateOp::Count,
                scope: RowScope::HateOnly,
                expected_keys: None,
            },
        )
        .unwrap();

        assert_eq!(result.get(NOT_HATE_LABEL), None);
        assert_eq!(result.get("racismo"), Some(&AggregateValue::Count(2)));
        assert_eq!(result.get("homofobia"), Some(&AggregateValue::Count(1)));
    }

    #[test]
    fn test_expected_keys_backfill_zero_counts() {
        let table = table(
            vec![post(0, "racismo", "raiva", Some("2024-01"), 1, None)],
            OptionalColumns::default(),
        );
        let view = full_view(&table);
        let expected = vec![
            "racismo".to_string(),
            "homofobia".to_string(),
            "sexismo".to_string(),
        ];
        let result = aggregate(
            &view,
            &AggregateSpec {
                group_by: GroupBy::One(GroupKey::Label),
                op: AggregateOp::Count,
                scope: RowScope::HateOnly,
                expected_keys: Some(expected),
            },
        )
        .unwrap();

        assert_eq!(result.len(), 3);
        assert_eq!(result.rows[0].key.primary, "racismo");
        assert_eq!(result.rows[0].value, AggregateValue::Count(1));
        assert_eq!(result.rows[1].key.primary, "homofobia");
        assert_eq!(result.rows[1].value, AggregateValue::Count(0));
        assert_eq!(result.rows[2].key.primary, "sexismo");
        assert_eq!(result.rows[2].value, AggregateValue::Count(0));
    }

    #[test]
    fn test_mean_over_backfilled_group_is_no_data() {
        let table = table(
            vec![post(0, "racismo", "raiva", Some("2024-01"), 12, None)],
            OptionalColumns::default(),
        );
        let view = full_view(&table);
        let result = aggregate(
            &view,
            &AggregateSpec {
                group_by: GroupBy::One(GroupKey::Label),
                op: AggregateOp::Mean(Metric::Upvotes),
                scope: RowScope::HateOnly,
                expected_keys: Some(vec!["racismo".to_string(), "homofobia".to_string()]),
            },
        )
        .unwrap();

        assert_eq!(result.get("racismo"), Some(&AggregateValue::Mean(12.0)));
        assert_eq!(result.get("homofobia"), Some(&AggregateValue::NoData));
    }

    #[test]
    fn test_mean_and_sum_values() {
        let table = sample_table();
        let view = full_view(&table);
        let mean = aggregate(
            &view,
            &AggregateSpec {
                group_by: GroupBy::One(GroupKey::Label),
                op: AggregateOp::Mean(Metric::Upvotes),
                scope: RowScope::HateOnly,
                expected_keys: None,
            },
        )
        .unwrap();
        // racismo: (10 + 30) / 2
        assert_eq!(mean.get("racismo"), Some(&AggregateValue::Mean(20.0)));

        let sum = aggregate(
            &view,
            &AggregateSpec {
                group_by: GroupBy::One(GroupKey::Label),
                op: AggregateOp::Sum(Metric::Upvotes),
                scope: RowScope::All,
                expected_keys: None,
            },
        )
        .unwrap();
        assert_eq!(sum.get(NOT_HATE_LABEL), Some(&AggregateValue::Sum(55)));
    }

    #[test]
    fn test_month_bucket_grouping_skips_unparsed_dates() {
        let table = sample_table();
        let view = full_view(&table);
        let result = aggregate(
            &view,
            &AggregateSpec {
                group_by: GroupBy::One(GroupKey::MonthBucket),
                op: AggregateOp::Count,
                scope: RowScope::All,
                expected_keys: None,
            },
        )
        .unwrap();

        // Post 3 has no month bucket and lands in no group.
        let total: u64 = result
            .rows
            .iter()
            .map(|row| sum_of(&row.value))
            .sum();
        assert_eq!(total, 4);
        assert_eq!(result.get("2024-01"), Some(&AggregateValue::Count(2)));
    }

    #[test]
    fn test_time_series_zero_fill_in_caller_order() {
        let table = sample_table();
        let view = full_view(&table);
        let months = vec![
            "2024-01".to_string(),
            "2024-02".to_string(),
            "2024-03".to_string(),
            "2024-04".to_string(),
        ];
        let result = aggregate(
            &view,
            &AggregateSpec {
                group_by: GroupBy::One(GroupKey::MonthBucket),
                op: AggregateOp::Count,
                scope: RowScope::HateOnly,
                expected_keys: Some(months.clone()),
            },
        )
        .unwrap();

        let keys: Vec<&str> = result.rows.iter().map(|r| r.key.primary.as_str()).collect();
        assert_eq!(keys, months.iter().map(|m| m.as_str()).collect::<Vec<_>>());
        // Hate posts: 2024-01 (racismo), 2024-02 (racismo); homofobia has no
        // parsed month. 2024-03 is not-hate only, 2024-04 has no rows.
        assert_eq!(result.get("2024-01"), Some(&AggregateValue::Count(1)));
        assert_eq!(result.get("2024-02"), Some(&AggregateValue::Count(1)));
        assert_eq!(result.get("2024-03"), Some(&AggregateValue::Count(0)));
        assert_eq!(result.get("2024-04"), Some(&AggregateValue::Count(0)));
    }

    #[test]
    fn test_two_key_grouping() {
        let table = sample_table();
        let view = full_view(&table);
        let result = aggregate(
            &view,
            &AggregateSpec {
                group_by: GroupBy::Two(GroupKey::HateClass, GroupKey::Emotion),
                op: AggregateOp::Count,
                scope: RowScope::All,
                expected_keys: None,
            },
        )
        .unwrap();

        let raiva_hate = result
            .rows
            .iter()
            .find(|row| {
                row.key.primary == "Discurso de Ódio"
                    && row.key.secondary.as_deref() == Some("raiva")
            })
            .expect("group should exist");
        assert_eq!(raiva_hate.value, AggregateValue::Count(2));
    }

    #[test]
    fn test_top_n_orders_descending_with_stable_ties() {
        let table = table(
            vec![
                post(0, "medo", "raiva", None, 5, None),
                post(1, "raiva", "raiva", None, 9, None),
                post(2, "nojo", "raiva", None, 5, None),
            ],
            OptionalColumns::default(),
        );
        let view = full_view(&table);
        let result = aggregate(
            &view,
            &AggregateSpec {
                group_by: GroupBy::One(GroupKey::Label),
                op: AggregateOp::TopN {
                    metric: Metric::Upvotes,
                    limit: 2,
                },
                scope: RowScope::All,
                expected_keys: None,
            },
        )
        .unwrap();

        assert_eq!(result.rows[0].key.primary, "raiva");
        // "medo" and "nojo" tie at 5; "medo" appeared first and wins.
        assert_eq!(result.rows[1].key.primary, "medo");
    }

    #[test]
    fn test_empty_view_aggregates_to_empty_result() {
        let table = sample_table();
        let criteria = FilterCriteria {
            labels: Some(["capacitismo".to_string()].into_iter().collect()),
            ..FilterCriteria::default()
        };
        let view = filter(&table, &criteria).unwrap();
        assert!(view.is_empty());

        let result = aggregate(
            &view,
            &AggregateSpec {
                group_by: GroupBy::One(GroupKey::Label),
                op: AggregateOp::Count,
                scope: RowScope::All,
                expected_keys: None,
            },
        )
        .unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_user_grouping_unavailable_without_column() {
        let table = sample_table();
        let view = full_view(&table);
        let result = aggregate(
            &view,
            &AggregateSpec {
                group_by: GroupBy::One(GroupKey::User),
                op: AggregateOp::Count,
                scope: RowScope::All,
                expected_keys: None,
            },
        );
        match result {
            Err(AnalysisError::ColumnUnavailable { column }) => assert_eq!(column, "user"),
            other => panic!("Expected ColumnUnavailable, got {:?}", other),
        }
    }

    #[test]
    fn test_views_metric_unavailable_without_column() {
        let table = sample_table();
        let view = full_view(&table);
        let result = aggregate(
            &view,
            &AggregateSpec {
                group_by: GroupBy::One(GroupKey::Label),
                op: AggregateOp::Sum(Metric::Views),
                scope: RowScope::All,
                expected_keys: None,
            },
        );
        assert!(matches!(
            result,
            Err(AnalysisError::ColumnUnavailable { .. })
        ));
    }

    #[test]
    fn test_user_grouping_with_column_present() {
        let optional = OptionalColumns {
            user: true,
            ..OptionalColumns::default()
        };
        let table = table(
            vec![
                post(0, "racismo", "raiva", None, 1, Some("ana")),
                post(1, "racismo", "raiva", None, 1, Some("bruno")),
                post(2, "racismo", "raiva", None, 1, Some("ana")),
                post(3, "racismo", "raiva", None, 1, None),
            ],
            optional,
        );
        let view = full_view(&table);
        let result = aggregate(
            &view,
            &AggregateSpec {
                group_by: GroupBy::One(GroupKey::User),
                op: AggregateOp::Count,
                scope: RowScope::All,
                expected_keys: None,
            },
        )
        .unwrap();
        assert_eq!(result.get("ana"), Some(&AggregateValue::Count(2)));
        assert_eq!(result.get("bruno"), Some(&AggregateValue::Count(1)));
        // The row with no user value belongs to no bucket.
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_expected_keys_rejected_for_two_key_grouping() {
        let table = sample_table();
        let view = full_view(&table);
        let result = aggregate(
            &view,
            &AggregateSpec {
                group_by: GroupBy::Two(GroupKey::Label, GroupKey::Emotion),
                op: AggregateOp::Count,
                scope: RowScope::All,
                expected_keys: Some(vec!["racismo".to_string()]),
            },
        );
        assert!(matches!(result, Err(AnalysisError::InvalidCriteria(_))));
    }

    #[test]
    fn test_top_posts_ranking_is_stable() {
        let table = table(
            vec![
                post(0, "racismo", "raiva", None, 5, None),
                post(1, "racismo", "raiva", None, 9, None),
                post(2, "racismo", "raiva", None, 5, None),
                post(3, "racismo", "raiva", None, 7, None),
            ],
            OptionalColumns::default(),
        );
        let view = full_view(&table);
        let ranked = top_posts(&view, Metric::Upvotes, 3).unwrap();
        let ids: Vec<usize> = ranked.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 3, 0]);
    }

    #[test]
    fn test_top_posts_zero_limit_is_invalid() {
        let table = sample_table();
        let view = full_view(&table);
        assert!(matches!(
            top_posts(&view, Metric::Engagement, 0),
            Err(AnalysisError::InvalidCriteria(_))
        ));
    }
}
