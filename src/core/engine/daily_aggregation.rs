//! Daily Aggregation
//!
//! Rolls scored posts up to one record per (page, calendar day). Posts whose
//! date could not be read share a single `None` day per page.

use super::columns::{DAY, ENGAGEMENT, PAGE, POST_COUNT, TOTAL_ENGAGEMENT};
use super::scoring::ScoredPosts;
use crate::data_utils::{coerce_numeric, count_values, day_key_values, numeric_values, text_values};
use crate::error::Result;
use crate::time::day_from_key;
use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Engagement of one page on one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    pub page: String,

    /// `None` groups the posts whose date was unreadable
    pub date: Option<NaiveDate>,

    pub total_engagement: f64,
    pub post_count: u64,

    /// Set by the winner resolver; always false straight out of aggregation
    pub day_won: bool,
}

/// Group scored posts by (page, day), summing engagement and counting posts
///
/// Records are returned sorted by day then page, with the `None` day first.
pub fn aggregate_daily(posts: &ScoredPosts) -> Result<Vec<DailyRecord>> {
    let grouped = posts
        .frame()
        .clone()
        .lazy()
        .group_by([col(PAGE), col(DAY)])
        .agg([
            col(ENGAGEMENT).sum().alias(TOTAL_ENGAGEMENT),
            len().alias(POST_COUNT),
        ])
        .collect()?;

    let pages = text_values(&grouped, PAGE)?;
    let days = day_key_values(&grouped, DAY)?;
    let totals = numeric_values(&grouped, TOTAL_ENGAGEMENT)?;
    let counts = count_values(&grouped, POST_COUNT)?;

    let mut records: Vec<DailyRecord> = (0..grouped.height())
        .map(|i| DailyRecord {
            page: pages[i].clone().unwrap_or_default(),
            date: days[i].and_then(day_from_key),
            total_engagement: coerce_numeric(totals[i]),
            post_count: counts[i],
            day_won: false,
        })
        .collect();

    records.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.page.cmp(&b.page)));

    debug!("Aggregated {} posts into {} daily records", posts.len(), records.len());
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column_mapping::PerformanceColumns;
    use crate::core::engine::scoring::score_posts;
    use crate::dataset::Dataset;
    use crate::time::DayParser;

    fn scored(frame: DataFrame) -> ScoredPosts {
        let columns = PerformanceColumns {
            page: "page".to_string(),
            post_id: "post".to_string(),
            date: "date".to_string(),
            likes: "likes".to_string(),
            comments: "comments".to_string(),
            shares: "shares".to_string(),
        };
        score_posts(&Dataset::new("posts", frame), &columns, &DayParser::default()).unwrap()
    }

    fn ymd(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn test_groups_by_page_and_calendar_day() {
        let posts = scored(
            df![
                "page" => ["A", "A", "B", "A"],
                "post" => ["1", "2", "3", "4"],
                "date" => ["2024-01-01 08:00:00", "2024-01-01 21:00:00", "2024-01-01", "2024-01-02"],
                "likes" => [1i64, 2, 5, 7],
                "comments" => [0i64, 0, 0, 0],
                "shares" => [0i64, 0, 0, 0],
            ]
            .unwrap(),
        );

        let daily = aggregate_daily(&posts).unwrap();
        assert_eq!(daily.len(), 3);

        assert_eq!(daily[0].page, "A");
        assert_eq!(daily[0].date, ymd(2024, 1, 1));
        assert_eq!(daily[0].total_engagement, 3.0);
        assert_eq!(daily[0].post_count, 2);

        assert_eq!(daily[1].page, "B");
        assert_eq!(daily[1].total_engagement, 5.0);

        assert_eq!(daily[2].date, ymd(2024, 1, 2));
        assert_eq!(daily[2].post_count, 1);
        assert!(daily.iter().all(|r| !r.day_won));
    }

    #[test]
    fn test_unparseable_dates_share_one_bucket() {
        let posts = scored(
            df![
                "page" => ["A", "A", "A"],
                "post" => ["1", "2", "3"],
                "date" => [Some("soon"), None, Some("2024-01-01")],
                "likes" => [4i64, 6, 1],
                "comments" => [0i64, 0, 0],
                "shares" => [0i64, 0, 0],
            ]
            .unwrap(),
        );

        let daily = aggregate_daily(&posts).unwrap();
        assert_eq!(daily.len(), 2);
        assert_eq!(daily[0].date, None);
        assert_eq!(daily[0].post_count, 2);
        assert_eq!(daily[0].total_engagement, 10.0);
    }

    #[test]
    fn test_post_counts_cover_every_row() {
        let posts = scored(
            df![
                "page" => ["A", "B", "C", "A", "B"],
                "post" => ["1", "2", "3", "4", "5"],
                "date" => ["2024-01-01", "2024-01-02", "2024-01-02", "2024-01-03", "bad"],
                "likes" => [1i64, 1, 1, 1, 1],
                "comments" => [0i64, 0, 0, 0, 0],
                "shares" => [0i64, 0, 0, 0, 0],
            ]
            .unwrap(),
        );

        let daily = aggregate_daily(&posts).unwrap();
        let total: u64 = daily.iter().map(|r| r.post_count).sum();
        assert_eq!(total, 5);
    }

    #[test]
    fn test_empty_input() {
        let posts = scored(
            df![
                "page" => Vec::<String>::new(),
                "post" => Vec::<String>::new(),
                "date" => Vec::<String>::new(),
                "likes" => Vec::<i64>::new(),
                "comments" => Vec::<i64>::new(),
                "shares" => Vec::<i64>::new(),
            ]
            .unwrap(),
        );
        assert!(aggregate_daily(&posts).unwrap().is_empty());
    }
}
