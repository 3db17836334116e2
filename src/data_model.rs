use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Sentinel label marking a post that was classified as NOT hate speech.
/// Every other label value is treated as a hate-speech subtype.
pub const NOT_HATE_LABEL: &str = "não é discurso de ódio";

/// Columns every input table must carry (case-sensitive match).
pub const REQUIRED_COLUMNS: &[&str] = &[
    "label",
    "emotion",
    "posted_at",
    "upvotes",
    "comments",
    "text",
];

/// Columns that unlock extra aggregations when present.
pub const OPTIONAL_COLUMNS: &[&str] = &["views", "shares", "user"];

/// One row exactly as it comes out of the CSV, before any coercion.
///
/// Every field is optional at this stage: a missing column, an empty cell and
/// a garbage cell all look the same to the deriver, which owns the coercion
/// rules.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPost {
    pub label: Option<String>,
    pub emotion: Option<String>,
    pub posted_at: Option<String>,
    pub upvotes: Option<String>,
    pub comments: Option<String>,
    pub views: Option<String>,
    pub shares: Option<String>,
    pub user: Option<String>,
    pub text: Option<String>,
}

/// Which of the optional columns were present in the input header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OptionalColumns {
    pub views: bool,
    pub shares: bool,
    pub user: bool,
}

/// Binary classification derived from the label column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HateClass {
    HateSpeech,
    NotHate,
}

impl HateClass {
    pub fn from_label(label: &str) -> Self {
        if label == NOT_HATE_LABEL {
            HateClass::NotHate
        } else {
            HateClass::HateSpeech
        }
    }

    /// Display name used as the grouping key for this bucket.
    pub fn as_str(&self) -> &'static str {
        match self {
            HateClass::HateSpeech => "Discurso de Ódio",
            HateClass::NotHate => "Não é Discurso de Ódio",
        }
    }
}

/// A fully derived post record. Immutable after derivation; every derived
/// field is a pure function of the raw fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Post {
    /// Stable row ordinal (0-based position in the source table).
    pub id: usize,
    /// `None` marks an unparseable timestamp; such rows are excluded from
    /// date-bounded filters but stay visible in non-date-filtered views.
    pub posted_at: Option<NaiveDateTime>,
    /// Timestamp formatted for display, when it parsed.
    pub posted_at_display: Option<String>,
    pub label: String,
    pub emotion: String,
    pub upvotes: u64,
    pub comments: u64,
    pub views: Option<u64>,
    pub shares: Option<u64>,
    pub user: Option<String>,
    pub text: String,
    /// upvotes + comments.
    pub engagement: u64,
    pub hate_class: HateClass,
    /// "YYYY-MM" time-series key, when the timestamp parsed.
    pub month_bucket: Option<String>,
}

impl Post {
    pub fn is_hate(&self) -> bool {
        self.hate_class == HateClass::HateSpeech
    }
}

/// The table as loaded from disk: header row plus raw rows, in file order.
#[derive(Debug, Clone)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<RawPost>,
    pub optional: OptionalColumns,
}

/// A raw table whose header passed the required-column contract.
/// Only the schema validator constructs this.
#[derive(Debug, Clone)]
pub struct ValidatedTable {
    pub headers: Vec<String>,
    pub rows: Vec<RawPost>,
    pub optional: OptionalColumns,
}

/// The derived, session-immutable table every filter and aggregation reads.
#[derive(Debug, Clone)]
pub struct PostTable {
    pub posts: Vec<Post>,
    pub optional: OptionalColumns,
}

impl PostTable {
    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }
}
