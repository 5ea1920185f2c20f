//! Leaderboard Pipeline
//!
//! The single entry point of the engine. A [`LeaderboardRequest`] bundles the
//! three uploaded datasets with their column mappings; [`LeaderboardPipeline::run`]
//! validates every mapping up front and then runs the stages in order:
//!
//! 1. score posts
//! 2. aggregate per (page, day)
//! 3. resolve daily winners
//! 4. aggregate per page
//! 5. compare with the prior period
//! 6. join follower counts
//! 7. rank
//!
//! A run either returns a complete [`Leaderboard`] or an error; nothing is
//! published halfway.

use crate::column_mapping::{ColumnMapping, FollowerField, PerformanceField, PriorField, SemanticField};
use crate::config::LeaderboardConfig;
use crate::core::engine::{
    aggregate_daily, aggregate_overall, compare_with_prior, join_followers, rank_pages, resolve_daily_winners,
    score_posts, CoercionReport, DailyRecord, FollowerIndex, LeaderboardRow, PriorPeriod,
};
use crate::dataset::Dataset;
use crate::error::{LeaderboardError, Result};
use crate::time::DayParser;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, info_span, warn};
use uuid::Uuid;

/// A dataset together with the columns chosen for its fields
#[derive(Debug, Clone)]
pub struct MappedDataset<F: SemanticField> {
    pub dataset: Dataset,
    pub mapping: ColumnMapping<F>,
}

impl<F: SemanticField> MappedDataset<F> {
    pub fn new(dataset: Dataset, mapping: ColumnMapping<F>) -> Self {
        Self { dataset, mapping }
    }

    /// Map columns by auto-detection alone
    pub fn auto_detected(dataset: Dataset, fuzzy_threshold: f64) -> Self {
        let mapping = ColumnMapping::auto_detect(&dataset, fuzzy_threshold);
        Self { dataset, mapping }
    }
}

impl MappedDataset<PriorField> {
    /// Stand-in for a run without prior-period data; comparisons come out as 0
    pub fn no_prior_period() -> Self {
        Self::new(Dataset::empty("prior"), ColumnMapping::canonical())
    }

    /// Keep the prior file if its required fields are mapped, otherwise run
    /// without prior-period data
    pub fn or_no_prior_period(self) -> Self {
        match self.mapping.resolve() {
            Ok(_) => self,
            Err(missing) => {
                let fields = missing.iter().map(|f| f.to_string()).collect::<Vec<_>>().join(", ");
                warn!(
                    "Ignoring {}: no column for {}; comparisons will be 0",
                    self.dataset.label(),
                    fields
                );
                Self::no_prior_period()
            }
        }
    }
}

/// Everything one leaderboard run needs
#[derive(Debug, Clone)]
pub struct LeaderboardRequest {
    pub performance: MappedDataset<PerformanceField>,
    pub prior: MappedDataset<PriorField>,
    pub followers: MappedDataset<FollowerField>,
}

/// Result of one pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Leaderboard {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,

    /// Ranked pages, rank order
    pub rows: Vec<LeaderboardRow>,

    /// Per (page, day) totals with the winner flags
    pub daily: Vec<DailyRecord>,

    /// Dirty performance cells that were coerced
    pub diagnostics: CoercionReport,
}

pub struct LeaderboardPipeline {
    config: LeaderboardConfig,
    parser: DayParser,
}

impl Default for LeaderboardPipeline {
    fn default() -> Self {
        Self::new(LeaderboardConfig::default())
    }
}

impl LeaderboardPipeline {
    pub fn new(config: LeaderboardConfig) -> Self {
        let parser = DayParser::new(&config.dates);
        Self { config, parser }
    }

    pub fn config(&self) -> &LeaderboardConfig {
        &self.config
    }

    pub fn run(&self, request: &LeaderboardRequest) -> Result<Leaderboard> {
        let run_id = Uuid::new_v4();
        let span = info_span!("leaderboard", %run_id);
        let _guard = span.enter();

        // Fail fast: every unmapped field across the three files at once
        let performance = request.performance.mapping.resolve();
        let prior = request.prior.mapping.resolve();
        let followers = request.followers.mapping.resolve();

        let mut unmapped = Vec::new();
        for missing in [performance.as_ref().err(), prior.as_ref().err(), followers.as_ref().err()]
            .into_iter()
            .flatten()
        {
            unmapped.extend(missing.iter().cloned());
        }
        let (performance_columns, prior_columns, follower_columns) = match (performance, prior, followers) {
            (Ok(p), Ok(q), Ok(f)) if unmapped.is_empty() => (p, q, f),
            _ => return Err(LeaderboardError::MissingMapping(unmapped)),
        };

        ensure_columns(&request.performance.dataset, &performance_columns.required())?;
        ensure_columns(&request.followers.dataset, &follower_columns.required())?;

        info!(
            "🚀 Building leaderboard from {} posts, {} prior rows, {} follower rows",
            request.performance.dataset.height(),
            request.prior.dataset.height(),
            request.followers.dataset.height()
        );

        let posts = stage("scoring", score_posts(&request.performance.dataset, &performance_columns, &self.parser))?;
        let daily = stage("daily_aggregation", aggregate_daily(&posts))?;
        let daily = resolve_daily_winners(daily);
        let pages = stage("overall_aggregation", aggregate_overall(&posts, &daily))?;
        info!("📊 {} pages over {} daily records", pages.len(), daily.len());

        let prior_period = stage("comparison", PriorPeriod::from_dataset(&request.prior.dataset, &prior_columns))?;
        let compared = compare_with_prior(pages, &prior_period);

        let follower_index =
            stage("follower_join", FollowerIndex::from_dataset(&request.followers.dataset, &follower_columns))?;
        let followed = join_followers(compared, &follower_index);

        let rows = rank_pages(followed);
        info!("✅ Leaderboard ready: {} ranked pages", rows.len());

        Ok(Leaderboard {
            run_id,
            generated_at: Utc::now(),
            rows,
            daily,
            diagnostics: posts.report().clone(),
        })
    }
}

/// Run the pipeline with the default configuration
pub fn build_leaderboard(request: &LeaderboardRequest) -> Result<Leaderboard> {
    LeaderboardPipeline::default().run(request)
}

fn ensure_columns(dataset: &Dataset, required: &[(&'static str, &str)]) -> Result<()> {
    match required.iter().find(|(_, column)| !dataset.has_column(column)) {
        Some((field, column)) => Err(LeaderboardError::ColumnNotFound {
            source_label: dataset.label().to_string(),
            field: field.to_string(),
            column: column.to_string(),
        }),
        None => Ok(()),
    }
}

fn stage<T>(name: &'static str, result: Result<T>) -> Result<T> {
    result.map_err(|err| LeaderboardError::Pipeline {
        stage: name,
        message: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column_mapping::DatasetKind;
    use polars::prelude::*;

    fn performance() -> MappedDataset<PerformanceField> {
        let frame = df![
            "Page" => ["A", "B", "A", "B"],
            "Post" => ["1", "2", "3", "4"],
            "Date" => ["2024-01-01", "2024-01-01", "2024-01-02", "2024-01-02"],
            "Likes" => [10i64, 20, 30, 5],
            "Comments" => [0i64, 0, 0, 0],
            "Shares" => [0i64, 0, 0, 0],
        ]
        .unwrap();
        MappedDataset::auto_detected(Dataset::new("posts.csv", frame), 0.85)
    }

    fn followers() -> MappedDataset<FollowerField> {
        let frame = df!["Page" => ["A"], "Followers" => [500i64]].unwrap();
        MappedDataset::auto_detected(Dataset::new("followers.csv", frame), 0.85)
    }

    #[test]
    fn test_end_to_end_two_pages_two_days() {
        let request = LeaderboardRequest {
            performance: performance(),
            prior: MappedDataset::no_prior_period(),
            followers: followers(),
        };

        let board = build_leaderboard(&request).unwrap();
        assert_eq!(board.rows.len(), 2);

        let a = &board.rows[0];
        assert_eq!((a.page.as_str(), a.rank, a.total_engagement, a.days_won), ("A", 1, 40.0, 1));
        assert_eq!(a.followers, 500);

        let b = &board.rows[1];
        assert_eq!((b.page.as_str(), b.rank, b.total_engagement, b.days_won), ("B", 2, 25.0, 1));
        assert_eq!(b.followers, 0);
        assert_eq!(b.engagement_change_pct, 0.0);

        let winners: Vec<&str> = board.daily.iter().filter(|d| d.day_won).map(|d| d.page.as_str()).collect();
        assert_eq!(winners, vec!["B", "A"]);
    }

    #[test]
    fn test_unmapped_fields_from_all_datasets_reported_together() {
        let mut perf = performance();
        perf.mapping.clear(PerformanceField::Shares);
        let request = LeaderboardRequest {
            performance: perf,
            prior: MappedDataset::new(Dataset::empty("prior"), ColumnMapping::empty()),
            followers: MappedDataset::new(Dataset::empty("followers"), ColumnMapping::empty()),
        };

        match build_leaderboard(&request) {
            Err(LeaderboardError::MissingMapping(fields)) => {
                assert_eq!(fields.len(), 1 + 3 + 2);
                assert_eq!(fields[0].dataset, DatasetKind::Performance);
                assert_eq!(fields[0].field, "shares");
                assert!(fields.iter().any(|f| f.dataset == DatasetKind::Followers && f.field == "followers"));
            }
            other => panic!("expected MissingMapping, got {:?}", other.map(|b| b.rows.len())),
        }
    }

    #[test]
    fn test_mapped_column_absent_from_dataset() {
        let mut perf = performance();
        perf.mapping.set(PerformanceField::Likes, "Reactions");
        let request = LeaderboardRequest {
            performance: perf,
            prior: MappedDataset::no_prior_period(),
            followers: followers(),
        };

        match build_leaderboard(&request) {
            Err(LeaderboardError::ColumnNotFound { field, column, .. }) => {
                assert_eq!(field, "likes");
                assert_eq!(column, "Reactions");
            }
            other => panic!("expected ColumnNotFound, got {:?}", other.map(|b| b.rows.len())),
        }
    }

    #[test]
    fn test_prior_without_engagement_column_is_dropped() {
        let frame = df!["Page" => ["A", "B"], "Posts" => [4i64, 1]].unwrap();
        let prior = MappedDataset::<PriorField>::auto_detected(Dataset::new("prior.csv", frame), 0.85);
        assert!(prior.mapping.resolve().is_err());

        let request = LeaderboardRequest {
            performance: performance(),
            prior: prior.or_no_prior_period(),
            followers: followers(),
        };
        let board = build_leaderboard(&request).unwrap();
        for row in &board.rows {
            assert_eq!(row.posts_change_pct, 0.0);
            assert_eq!(row.engagement_change_pct, 0.0);
            assert_eq!(row.last_fortnight_rank, 0);
        }
    }

    #[test]
    fn test_complete_prior_mapping_is_kept() {
        let frame = df!["Page" => ["A"], "Engagement" => [20.0], "Post Count" => [4i64]].unwrap();
        let prior = MappedDataset::<PriorField>::auto_detected(Dataset::new("prior.csv", frame), 0.85);

        let kept = prior.or_no_prior_period();
        assert_eq!(kept.dataset.label(), "prior.csv");

        let request = LeaderboardRequest {
            performance: performance(),
            prior: kept,
            followers: followers(),
        };
        let board = build_leaderboard(&request).unwrap();
        assert_eq!(board.rows[0].posts_change_pct, -50.0);
    }

    #[test]
    fn test_each_run_gets_its_own_id() {
        let request = LeaderboardRequest {
            performance: performance(),
            prior: MappedDataset::no_prior_period(),
            followers: followers(),
        };
        let first = build_leaderboard(&request).unwrap();
        let second = build_leaderboard(&request).unwrap();
        assert_ne!(first.run_id, second.run_id);
        assert_eq!(first.rows, second.rows);
    }
}
