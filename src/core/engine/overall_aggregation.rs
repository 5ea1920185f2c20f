//! Overall Aggregation
//!
//! Per-page totals over the whole period. Current-period posts define the set
//! of pages; days won are tallied from the resolved daily records and default
//! to zero.

use super::columns::{ENGAGEMENT, PAGE, POST_COUNT, TOTAL_ENGAGEMENT};
use super::daily_aggregation::DailyRecord;
use super::scoring::ScoredPosts;
use crate::data_utils::{coerce_numeric, count_values, numeric_values, text_values};
use crate::error::Result;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Whole-period totals for one page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    pub page: String,
    pub total_engagement: f64,
    pub total_posts: u64,
    pub days_won: u32,
}

/// Aggregate scored posts per page and attach the days-won tally
///
/// Records are sorted by page.
pub fn aggregate_overall(posts: &ScoredPosts, daily: &[DailyRecord]) -> Result<Vec<PageRecord>> {
    let grouped = posts
        .frame()
        .clone()
        .lazy()
        .group_by([col(PAGE)])
        .agg([
            col(ENGAGEMENT).sum().alias(TOTAL_ENGAGEMENT),
            len().alias(POST_COUNT),
        ])
        .collect()?;

    let mut wins: HashMap<&str, u32> = HashMap::new();
    for record in daily.iter().filter(|r| r.day_won) {
        *wins.entry(record.page.as_str()).or_insert(0) += 1;
    }

    let pages = text_values(&grouped, PAGE)?;
    let totals = numeric_values(&grouped, TOTAL_ENGAGEMENT)?;
    let counts = count_values(&grouped, POST_COUNT)?;

    let mut records: Vec<PageRecord> = (0..grouped.height())
        .map(|i| {
            let page = pages[i].clone().unwrap_or_default();
            let days_won = wins.get(page.as_str()).copied().unwrap_or(0);
            PageRecord {
                page,
                total_engagement: coerce_numeric(totals[i]),
                total_posts: counts[i],
                days_won,
            }
        })
        .collect();

    records.sort_by(|a, b| a.page.cmp(&b.page));

    debug!("Aggregated {} pages", records.len());
    Ok(records)
}
