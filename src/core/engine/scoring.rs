//! Engagement Scoring
//!
//! Builds the canonical scored-post frame from the performance dataset:
//! page, post id, calendar day, the three coerced metrics and
//! `engagement = 1×likes + 2×comments + 3×shares`.
//!
//! Dirty cells never fail the stage. Non-numeric or missing metrics become 0,
//! unreadable dates become a null day, and a missing page becomes the empty
//! page `""`. Every such substitution is counted in a [`CoercionReport`].

use super::columns::{COMMENTS, DAY, ENGAGEMENT, LIKES, PAGE, POST_ID, SHARES};
use crate::column_mapping::PerformanceColumns;
use crate::data_utils::{coerce_numeric, day_key_values, numeric_values, text_values};
use crate::dataset::Dataset;
use crate::error::Result;
use crate::time::{day_from_key, day_key, DayParser};
use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub const LIKE_WEIGHT: f64 = 1.0;
pub const COMMENT_WEIGHT: f64 = 2.0;
pub const SHARE_WEIGHT: f64 = 3.0;

/// Substitutions made while coercing one metric column
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricCoercion {
    /// Empty cells
    pub missing: usize,

    /// Cells present but not readable as a number
    pub non_numeric: usize,
}

impl MetricCoercion {
    fn tally(source: &Series, coerced: &[Option<f64>]) -> Self {
        let missing = source.null_count();
        let unreadable = coerced.iter().filter(|v| v.is_none()).count();
        Self {
            missing,
            non_numeric: unreadable.saturating_sub(missing),
        }
    }

    pub fn total(&self) -> usize {
        self.missing + self.non_numeric
    }
}

/// Data-quality degradations observed while scoring
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoercionReport {
    pub rows: usize,
    pub likes: MetricCoercion,
    pub comments: MetricCoercion,
    pub shares: MetricCoercion,
    pub missing_pages: usize,
    pub missing_dates: usize,
    pub unparseable_dates: usize,
}

impl CoercionReport {
    pub fn is_clean(&self) -> bool {
        self.likes.total() + self.comments.total() + self.shares.total() == 0
            && self.missing_pages == 0
            && self.missing_dates == 0
            && self.unparseable_dates == 0
    }
}

/// One post with its engagement score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredRow {
    pub page: String,
    pub post_id: Option<String>,
    pub date: Option<NaiveDate>,
    pub likes: f64,
    pub comments: f64,
    pub shares: f64,
    pub engagement: f64,
}

/// Scored posts in input order, plus the coercion tally
#[derive(Debug, Clone)]
pub struct ScoredPosts {
    frame: DataFrame,
    report: CoercionReport,
}

impl ScoredPosts {
    /// Canonical frame: page, post_id, day, likes, comments, shares, engagement
    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn report(&self) -> &CoercionReport {
        &self.report
    }

    pub fn len(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    /// Materialize the scored rows, in input order
    pub fn rows(&self) -> Result<Vec<ScoredRow>> {
        let pages = text_values(&self.frame, PAGE)?;
        let post_ids = text_values(&self.frame, POST_ID)?;
        let days = day_key_values(&self.frame, DAY)?;
        let likes = numeric_values(&self.frame, LIKES)?;
        let comments = numeric_values(&self.frame, COMMENTS)?;
        let shares = numeric_values(&self.frame, SHARES)?;
        let engagement = numeric_values(&self.frame, ENGAGEMENT)?;

        let rows = (0..self.frame.height())
            .map(|i| ScoredRow {
                page: pages[i].clone().unwrap_or_default(),
                post_id: post_ids[i].clone(),
                date: days[i].and_then(day_from_key),
                likes: coerce_numeric(likes[i]),
                comments: coerce_numeric(comments[i]),
                shares: coerce_numeric(shares[i]),
                engagement: coerce_numeric(engagement[i]),
            })
            .collect();
        Ok(rows)
    }
}

/// Score every post of the performance dataset
///
/// The dataset itself is left untouched; the result is a new frame.
pub fn score_posts(dataset: &Dataset, columns: &PerformanceColumns, parser: &DayParser) -> Result<ScoredPosts> {
    let source = dataset.frame();

    let pages = text_values(source, &columns.page)?;
    let missing_pages = pages.iter().filter(|p| p.is_none()).count();
    let pages: Vec<String> = pages.into_iter().map(|p| p.unwrap_or_default()).collect();

    let post_ids = text_values(source, &columns.post_id)?;

    let date_column = source.column(&columns.date)?;
    let days = parser.day_column(date_column)?;
    let missing_dates = date_column.null_count();
    let unparseable_dates = days.iter().filter(|d| d.is_none()).count().saturating_sub(missing_dates);
    let day_keys: Vec<Option<i32>> = days.iter().map(|d| d.map(day_key)).collect();

    let likes = numeric_values(source, &columns.likes)?;
    let comments = numeric_values(source, &columns.comments)?;
    let shares = numeric_values(source, &columns.shares)?;

    let report = CoercionReport {
        rows: source.height(),
        likes: MetricCoercion::tally(source.column(&columns.likes)?, &likes),
        comments: MetricCoercion::tally(source.column(&columns.comments)?, &comments),
        shares: MetricCoercion::tally(source.column(&columns.shares)?, &shares),
        missing_pages,
        missing_dates,
        unparseable_dates,
    };

    let zero_filled = |values: Vec<Option<f64>>| -> Vec<f64> { values.into_iter().map(coerce_numeric).collect() };

    let frame = DataFrame::new(vec![
        Series::new(PAGE, pages),
        Series::new(POST_ID, post_ids),
        Series::new(DAY, day_keys),
        Series::new(LIKES, zero_filled(likes)),
        Series::new(COMMENTS, zero_filled(comments)),
        Series::new(SHARES, zero_filled(shares)),
    ])?
    .lazy()
    .with_column(
        (col(LIKES) * lit(LIKE_WEIGHT) + col(COMMENTS) * lit(COMMENT_WEIGHT) + col(SHARES) * lit(SHARE_WEIGHT))
            .alias(ENGAGEMENT),
    )
    .collect()?;

    if !report.is_clean() {
        warn!(
            "Coerced dirty performance cells: likes {:?}, comments {:?}, shares {:?}, {} missing pages, {} missing dates, {} unparseable dates",
            report.likes, report.comments, report.shares, report.missing_pages, report.missing_dates, report.unparseable_dates
        );
    }
    debug!("Scored {} posts", frame.height());

    Ok(ScoredPosts { frame, report })
}
