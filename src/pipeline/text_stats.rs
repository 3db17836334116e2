use crate::utils::text::{tokenize, StopwordFilter};

use serde::Serialize;
use std::cmp::Reverse;
use std::collections::HashMap;

/// One token and how often it occurred across the whole input sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WordCount {
    pub token: String,
    pub count: u64,
}

/// Count token frequencies across `texts` and keep the `top_n` most common.
///
/// Tokens are case-folded and split at non-alphanumeric boundaries; anything
/// in `stopwords` is excluded before counting. Counts accumulate over the
/// whole sequence, not per document. Ordering is descending by count with
/// ties broken by first occurrence, so the output is deterministic for both
/// bar-chart and word-cloud rendering. Empty input yields an empty vector.
pub fn word_frequencies<S: AsRef<str>>(
    texts: &[S],
    stopwords: &StopwordFilter,
    top_n: usize,
) -> Vec<WordCount> {
    let mut counts: HashMap<String, (u64, usize)> = HashMap::new();
    let mut next_rank = 0usize;

    for text in texts {
        for token in tokenize(text.as_ref()) {
            if stopwords.contains(&token) {
                continue;
            }
            let entry = counts.entry(token).or_insert_with(|| {
                let rank = next_rank;
                next_rank += 1;
                (0, rank)
            });
            entry.0 += 1;
        }
    }

    let mut ranked: Vec<(String, u64, usize)> = counts
        .into_iter()
        .map(|(token, (count, first_seen))| (token, count, first_seen))
        .collect();
    ranked.sort_by_key(|(_, count, first_seen)| (Reverse(*count), *first_seen));
    ranked.truncate(top_n);

    ranked
        .into_iter()
        .map(|(token, count, _)| WordCount { token, count })
        .collect()
}
