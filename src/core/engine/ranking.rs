//! Ranking
//!
//! Min ranking by total engagement, highest first: a page's rank is one plus
//! the number of pages with strictly greater engagement. Ties share a rank
//! and are listed by page identifier.

use super::follower_join::FollowedPage;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;

/// One row of the final leaderboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardRow {
    pub rank: u32,
    pub page: String,
    pub followers: i64,
    pub total_posts: u64,
    pub total_engagement: f64,
    pub days_won: u32,
    pub posts_change_pct: f64,
    pub engagement_change_pct: f64,
    pub last_fortnight_day_won: i64,
    pub last_fortnight_rank: i64,
}

impl From<FollowedPage> for LeaderboardRow {
    fn from(followed: FollowedPage) -> Self {
        let compared = followed.compared;
        LeaderboardRow {
            rank: 0,
            page: compared.page.page,
            followers: followed.followers,
            total_posts: compared.page.total_posts,
            total_engagement: compared.page.total_engagement,
            days_won: compared.page.days_won,
            posts_change_pct: compared.posts_change_pct,
            engagement_change_pct: compared.engagement_change_pct,
            last_fortnight_day_won: compared.last_fortnight_day_won,
            last_fortnight_rank: compared.last_fortnight_rank,
        }
    }
}

fn leaderboard_order(a: &LeaderboardRow, b: &LeaderboardRow) -> Ordering {
    b.total_engagement
        .total_cmp(&a.total_engagement)
        .then_with(|| a.page.cmp(&b.page))
}

/// Rank pages and return them in rank order
pub fn rank_pages(pages: Vec<FollowedPage>) -> Vec<LeaderboardRow> {
    let mut rows: Vec<LeaderboardRow> = pages
        .into_iter()
        .map(LeaderboardRow::from)
        .sorted_by(leaderboard_order)
        .collect();

    let mut previous: Option<f64> = None;
    let mut current_rank = 0u32;
    for (position, row) in rows.iter_mut().enumerate() {
        if previous.map_or(true, |p| p.total_cmp(&row.total_engagement) != Ordering::Equal) {
            current_rank = position as u32 + 1;
            previous = Some(row.total_engagement);
        }
        row.rank = current_rank;
    }

    debug!("Ranked {} pages", rows.len());
    rows
}
