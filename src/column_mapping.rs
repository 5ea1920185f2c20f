//! Column Mapping - Resolves uploaded column names to semantic fields
//!
//! Each input file has a closed set of fields the engine needs (page name,
//! likes, follower count, ...). A [`ColumnMapping`] records which actual column
//! supplies each field; [`ColumnMapping::auto_detect`] proposes one from the
//! column names, and `resolve()` turns a complete mapping into the typed column
//! set a pipeline stage consumes.
//!
//! Auto-detection works in two passes:
//! 1. Pattern match: each field has an ordered list of name fragments; the
//!    first column (in file order) whose normalized name contains the first
//!    matching fragment wins.
//! 2. Fuzzy fallback: Jaro-Winkler similarity between the field key and each
//!    column name, accepted above a threshold.

use crate::dataset::Dataset;
use crate::error::{LeaderboardError, Result};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use strsim::jaro_winkler;

lazy_static! {
    static ref NON_ALPHANUMERIC: Regex = Regex::new(r"[^a-z0-9]+").expect("static regex is valid");
}

/// Which uploaded file a field belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetKind {
    Performance,
    Prior,
    Followers,
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DatasetKind::Performance => "performance",
            DatasetKind::Prior => "prior",
            DatasetKind::Followers => "followers",
        };
        f.write_str(name)
    }
}

/// A required field with no column assigned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnmappedField {
    pub dataset: DatasetKind,
    pub field: &'static str,
}

impl fmt::Display for UnmappedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.dataset, self.field)
    }
}

/// A semantic role a column can play in one kind of dataset
pub trait SemanticField: Copy + Eq + Hash + fmt::Debug + 'static {
    /// Every field of this dataset kind, in declaration order
    const ALL: &'static [Self];

    const DATASET: DatasetKind;

    /// Stable identifier used in mapping files
    fn key(self) -> &'static str;

    /// Human readable name
    fn label(self) -> &'static str;

    /// Ordered name fragments used by auto-detection
    fn patterns(self) -> &'static [&'static str];

    fn is_optional(self) -> bool {
        false
    }

    fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|field| field.key() == key)
    }
}

/// Fields of the per-post performance file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PerformanceField {
    PageName,
    PostId,
    Date,
    Likes,
    Comments,
    Shares,
}

impl SemanticField for PerformanceField {
    const ALL: &'static [Self] = &[
        PerformanceField::PageName,
        PerformanceField::PostId,
        PerformanceField::Date,
        PerformanceField::Likes,
        PerformanceField::Comments,
        PerformanceField::Shares,
    ];

    const DATASET: DatasetKind = DatasetKind::Performance;

    fn key(self) -> &'static str {
        match self {
            PerformanceField::PageName => "page_name",
            PerformanceField::PostId => "post_id",
            PerformanceField::Date => "date",
            PerformanceField::Likes => "likes",
            PerformanceField::Comments => "comments",
            PerformanceField::Shares => "shares",
        }
    }

    fn label(self) -> &'static str {
        match self {
            PerformanceField::PageName => "Page/Profile/Channel Name",
            PerformanceField::PostId => "Post ID/Name",
            PerformanceField::Date => "Post Date",
            PerformanceField::Likes => "Likes",
            PerformanceField::Comments => "Comments",
            PerformanceField::Shares => "Shares",
        }
    }

    fn patterns(self) -> &'static [&'static str] {
        match self {
            PerformanceField::PageName => &["page", "profile", "channel", "account", "name"],
            PerformanceField::PostId => &["post", "id", "post_id", "post_name", "content"],
            PerformanceField::Date => &["date", "post_date", "published", "time", "posted"],
            PerformanceField::Likes => &["like", "likes", "love", "reactions"],
            PerformanceField::Comments => &["comment", "comments", "replies"],
            PerformanceField::Shares => &["share", "shares", "repost", "reposts"],
        }
    }
}

/// Fields of the prior-period (last fortnight) summary file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PriorField {
    PageName,
    Engagement,
    PostCount,
    DayWon,
    Rank,
}

impl SemanticField for PriorField {
    const ALL: &'static [Self] = &[
        PriorField::PageName,
        PriorField::Engagement,
        PriorField::PostCount,
        PriorField::DayWon,
        PriorField::Rank,
    ];

    const DATASET: DatasetKind = DatasetKind::Prior;

    fn key(self) -> &'static str {
        match self {
            PriorField::PageName => "page_name",
            PriorField::Engagement => "engagement",
            PriorField::PostCount => "post_count",
            PriorField::DayWon => "day_won",
            PriorField::Rank => "rank",
        }
    }

    fn label(self) -> &'static str {
        match self {
            PriorField::PageName => "Page/Profile/Channel Name",
            PriorField::Engagement => "Total Engagement",
            PriorField::PostCount => "Post Count",
            PriorField::DayWon => "Day Won",
            PriorField::Rank => "Rank",
        }
    }

    fn patterns(self) -> &'static [&'static str] {
        match self {
            PriorField::PageName => &["page", "profile", "channel", "account", "name"],
            PriorField::Engagement => &["engagement", "total_engagement", "eng"],
            PriorField::PostCount => &["post_count", "post", "posts", "count"],
            PriorField::DayWon => &["day_won", "days_won", "won", "days"],
            PriorField::Rank => &["rank", "ranking", "position"],
        }
    }

    fn is_optional(self) -> bool {
        matches!(self, PriorField::DayWon | PriorField::Rank)
    }
}

/// Fields of the follower count file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FollowerField {
    PageName,
    Followers,
}

impl SemanticField for FollowerField {
    const ALL: &'static [Self] = &[FollowerField::PageName, FollowerField::Followers];

    const DATASET: DatasetKind = DatasetKind::Followers;

    fn key(self) -> &'static str {
        match self {
            FollowerField::PageName => "page_name",
            FollowerField::Followers => "followers",
        }
    }

    fn label(self) -> &'static str {
        match self {
            FollowerField::PageName => "Page/Profile/Channel Name",
            FollowerField::Followers => "Followers Count",
        }
    }

    fn patterns(self) -> &'static [&'static str] {
        match self {
            FollowerField::PageName => &["page", "profile", "channel", "account", "name"],
            FollowerField::Followers => &["follower", "followers", "fans", "subscribers"],
        }
    }
}

/// Field → column assignments for one dataset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping<F: SemanticField> {
    columns: HashMap<F, String>,
}

impl<F: SemanticField> Default for ColumnMapping<F> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<F: SemanticField> ColumnMapping<F> {
    pub fn empty() -> Self {
        Self {
            columns: HashMap::new(),
        }
    }

    /// Build from `field key → column` pairs, e.g. from a mapping file
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Result<Self>
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut mapping = Self::empty();
        for (key, column) in pairs {
            let field = F::from_key(key.as_ref()).ok_or_else(|| {
                LeaderboardError::Config(format!(
                    "Unknown {} field '{}' (expected one of: {})",
                    F::DATASET,
                    key.as_ref(),
                    F::ALL.iter().map(|f| f.key()).collect::<Vec<_>>().join(", ")
                ))
            })?;
            mapping.set(field, column);
        }
        Ok(mapping)
    }

    /// Propose a mapping from the dataset's column names
    pub fn auto_detect(dataset: &Dataset, fuzzy_threshold: f64) -> Self {
        let columns = dataset.column_names();
        let mut mapping = Self::empty();
        for &field in F::ALL {
            if let Some(column) = detect_column(&columns, field, fuzzy_threshold) {
                mapping.set(field, column);
            }
        }
        mapping
    }

    /// Every field mapped to a column named after its own key
    pub fn canonical() -> Self {
        let mut mapping = Self::empty();
        for &field in F::ALL {
            mapping.set(field, field.key());
        }
        mapping
    }

    pub fn set(&mut self, field: F, column: impl Into<String>) -> &mut Self {
        self.columns.insert(field, column.into());
        self
    }

    pub fn clear(&mut self, field: F) -> &mut Self {
        self.columns.remove(&field);
        self
    }

    /// Column assigned to a field; blank assignments count as unset
    pub fn get(&self, field: F) -> Option<&str> {
        self.columns
            .get(&field)
            .map(|column| column.as_str())
            .filter(|column| !column.trim().is_empty())
    }

    /// Copy every assignment from `other` over this mapping
    pub fn overlay(&mut self, other: &ColumnMapping<F>) -> &mut Self {
        for (field, column) in &other.columns {
            self.columns.insert(*field, column.clone());
        }
        self
    }

    /// Assignments in field declaration order
    pub fn entries(&self) -> Vec<(F, Option<&str>)> {
        F::ALL.iter().map(|&field| (field, self.get(field))).collect()
    }

    /// Required fields that have no column, in declaration order
    pub fn unmapped(&self) -> Vec<UnmappedField> {
        F::ALL
            .iter()
            .filter(|field| !field.is_optional() && self.get(**field).is_none())
            .map(|field| UnmappedField {
                dataset: F::DATASET,
                field: field.key(),
            })
            .collect()
    }

    fn required(&self, field: F) -> String {
        self.get(field).unwrap_or_default().to_string()
    }

    fn optional(&self, field: F) -> Option<String> {
        self.get(field).map(|column| column.to_string())
    }
}

/// Lowercase, collapse punctuation and whitespace runs to `_`
pub fn normalize_column_name(name: &str) -> String {
    NON_ALPHANUMERIC
        .replace_all(&name.to_lowercase(), "_")
        .trim_matches('_')
        .to_string()
}

/// Best column for a field, or `None` when nothing is close enough
pub fn detect_column<F: SemanticField>(columns: &[String], field: F, fuzzy_threshold: f64) -> Option<String> {
    let normalized: Vec<String> = columns.iter().map(|c| normalize_column_name(c)).collect();

    for pattern in field.patterns() {
        let pattern = normalize_column_name(pattern);
        if let Some(idx) = normalized.iter().position(|column| column.contains(&pattern)) {
            return Some(columns[idx].clone());
        }
    }

    let mut best: Option<(usize, f64)> = None;
    for (idx, column) in normalized.iter().enumerate() {
        let score = jaro_winkler(field.key(), column);
        if score >= fuzzy_threshold && best.map_or(true, |(_, top)| score > top) {
            best = Some((idx, score));
        }
    }
    best.map(|(idx, _)| columns[idx].clone())
}

/// Resolved columns of the performance file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PerformanceColumns {
    pub page: String,
    pub post_id: String,
    pub date: String,
    pub likes: String,
    pub comments: String,
    pub shares: String,
}

impl PerformanceColumns {
    /// `(field key, column)` pairs that must exist in the dataset
    pub fn required(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("page_name", self.page.as_str()),
            ("post_id", self.post_id.as_str()),
            ("date", self.date.as_str()),
            ("likes", self.likes.as_str()),
            ("comments", self.comments.as_str()),
            ("shares", self.shares.as_str()),
        ]
    }
}

/// Resolved columns of the prior-period file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriorColumns {
    pub page: String,
    pub engagement: String,
    pub post_count: String,
    pub day_won: Option<String>,
    pub rank: Option<String>,
}

/// Resolved columns of the follower file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowerColumns {
    pub page: String,
    pub followers: String,
}

impl FollowerColumns {
    pub fn required(&self) -> Vec<(&'static str, &str)> {
        vec![("page_name", self.page.as_str()), ("followers", self.followers.as_str())]
    }
}

impl ColumnMapping<PerformanceField> {
    pub fn resolve(&self) -> std::result::Result<PerformanceColumns, Vec<UnmappedField>> {
        let missing = self.unmapped();
        if !missing.is_empty() {
            return Err(missing);
        }
        Ok(PerformanceColumns {
            page: self.required(PerformanceField::PageName),
            post_id: self.required(PerformanceField::PostId),
            date: self.required(PerformanceField::Date),
            likes: self.required(PerformanceField::Likes),
            comments: self.required(PerformanceField::Comments),
            shares: self.required(PerformanceField::Shares),
        })
    }
}

impl ColumnMapping<PriorField> {
    pub fn resolve(&self) -> std::result::Result<PriorColumns, Vec<UnmappedField>> {
        let missing = self.unmapped();
        if !missing.is_empty() {
            return Err(missing);
        }
        Ok(PriorColumns {
            page: self.required(PriorField::PageName),
            engagement: self.required(PriorField::Engagement),
            post_count: self.required(PriorField::PostCount),
            day_won: self.optional(PriorField::DayWon),
            rank: self.optional(PriorField::Rank),
        })
    }
}

impl ColumnMapping<FollowerField> {
    pub fn resolve(&self) -> std::result::Result<FollowerColumns, Vec<UnmappedField>> {
        let missing = self.unmapped();
        if !missing.is_empty() {
            return Err(missing);
        }
        Ok(FollowerColumns {
            page: self.required(FollowerField::PageName),
            followers: self.required(FollowerField::Followers),
        })
    }
}
