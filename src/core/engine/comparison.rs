//! Prior-Period Comparison
//!
//! Compares current page totals with the previous fortnight's summary:
//! - percentage change in posts and engagement
//! - last fortnight's days won and rank, carried forward as-is
//!
//! The prior dataset is optional in practice. When its page, post count or
//! engagement column is missing the comparison runs in a degraded mode where
//! every derived field is 0. Pages absent from the prior data also get 0s.

use super::overall_aggregation::PageRecord;
use crate::column_mapping::PriorColumns;
use crate::data_utils::{coerce_integer, numeric_values, text_values};
use crate::dataset::Dataset;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Previous-period figures for one page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorPeriodRecord {
    /// `None` when the cell was empty or not a number
    pub post_count: Option<f64>,
    pub engagement: Option<f64>,
    pub day_won: i64,
    pub rank: i64,
}

/// Lookup of prior-period figures by page
#[derive(Debug, Clone, PartialEq)]
pub enum PriorPeriod {
    /// Comparison not possible; every page gets zeros
    Unavailable { reason: String },
    Available(HashMap<String, PriorPeriodRecord>),
}

impl PriorPeriod {
    /// Index the prior dataset by page
    ///
    /// Duplicate pages keep their first occurrence. Optional columns that are
    /// mapped but absent from the dataset are ignored.
    pub fn from_dataset(dataset: &Dataset, columns: &PriorColumns) -> Result<Self> {
        let required = [
            columns.page.as_str(),
            columns.post_count.as_str(),
            columns.engagement.as_str(),
        ];
        let missing = dataset.missing_columns(&required);
        if !missing.is_empty() {
            let reason = format!("{} has no column(s) {}", dataset.label(), missing.join(", "));
            warn!("Prior-period comparison disabled: {}", reason);
            return Ok(PriorPeriod::Unavailable { reason });
        }

        let optional_values = |column: &Option<String>| -> Result<Option<Vec<Option<f64>>>> {
            match column {
                Some(name) if dataset.has_column(name) => Ok(Some(numeric_values(dataset.frame(), name)?)),
                Some(name) => {
                    warn!("Prior column '{}' not found in {}; treating as unmapped", name, dataset.label());
                    Ok(None)
                }
                None => Ok(None),
            }
        };

        let frame = dataset.frame();
        let pages = text_values(frame, &columns.page)?;
        let post_counts = numeric_values(frame, &columns.post_count)?;
        let engagement = numeric_values(frame, &columns.engagement)?;
        let days_won = optional_values(&columns.day_won)?;
        let ranks = optional_values(&columns.rank)?;

        let mut records = HashMap::with_capacity(pages.len());
        let mut duplicates = 0usize;
        for (i, page) in pages.into_iter().enumerate() {
            let page = page.unwrap_or_default();
            if records.contains_key(&page) {
                duplicates += 1;
                continue;
            }
            records.insert(
                page,
                PriorPeriodRecord {
                    post_count: post_counts[i],
                    engagement: engagement[i],
                    day_won: days_won.as_ref().map(|v| coerce_integer(v[i])).unwrap_or(0),
                    rank: ranks.as_ref().map(|v| coerce_integer(v[i])).unwrap_or(0),
                },
            );
        }

        if duplicates > 0 {
            warn!("{} duplicate page rows in {} ignored (first occurrence kept)", duplicates, dataset.label());
        }
        debug!("Indexed {} prior-period pages", records.len());
        Ok(PriorPeriod::Available(records))
    }

    pub fn is_available(&self) -> bool {
        matches!(self, PriorPeriod::Available(_))
    }

    pub fn lookup(&self, page: &str) -> Option<&PriorPeriodRecord> {
        match self {
            PriorPeriod::Available(records) => records.get(page),
            PriorPeriod::Unavailable { .. } => None,
        }
    }
}

/// `((current - previous) / previous) * 100`, or 0 when previous is 0 or unknown
pub fn percentage_change(current: f64, previous: Option<f64>) -> f64 {
    match previous {
        Some(prev) if prev != 0.0 && prev.is_finite() => ((current - prev) / prev) * 100.0,
        _ => 0.0,
    }
}

/// Page totals plus the prior-period deltas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparedPage {
    pub page: PageRecord,
    pub posts_change_pct: f64,
    pub engagement_change_pct: f64,
    pub last_fortnight_day_won: i64,
    pub last_fortnight_rank: i64,
}

/// Left-join current pages onto the prior period
pub fn compare_with_prior(pages: Vec<PageRecord>, prior: &PriorPeriod) -> Vec<ComparedPage> {
    let mut matched = 0usize;
    let compared: Vec<ComparedPage> = pages
        .into_iter()
        .map(|page| match prior.lookup(&page.page) {
            Some(previous) => {
                matched += 1;
                ComparedPage {
                    posts_change_pct: percentage_change(page.total_posts as f64, previous.post_count),
                    engagement_change_pct: percentage_change(page.total_engagement, previous.engagement),
                    last_fortnight_day_won: previous.day_won,
                    last_fortnight_rank: previous.rank,
                    page,
                }
            }
            None => ComparedPage {
                page,
                posts_change_pct: 0.0,
                engagement_change_pct: 0.0,
                last_fortnight_day_won: 0,
                last_fortnight_rank: 0,
            },
        })
        .collect();

    if prior.is_available() {
        info!("🔁 Compared {} pages with prior period ({} matched)", compared.len(), matched);
    }
    compared
}
