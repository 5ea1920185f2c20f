//! Core Engine Module
//!
//! One file per pipeline stage, in dependency order:
//! scoring → daily aggregation → daily winners → overall aggregation →
//! prior-period comparison → follower join → ranking.
//!
//! Every stage consumes an immutable snapshot and returns a new one.

pub mod scoring;
pub mod daily_aggregation;
pub mod daily_winners;
pub mod overall_aggregation;
pub mod comparison;
pub mod follower_join;
pub mod ranking;

pub use scoring::{score_posts, CoercionReport, MetricCoercion, ScoredPosts, ScoredRow};
pub use daily_aggregation::{aggregate_daily, DailyRecord};
pub use daily_winners::resolve_daily_winners;
pub use overall_aggregation::{aggregate_overall, PageRecord};
pub use comparison::{compare_with_prior, percentage_change, ComparedPage, PriorPeriod, PriorPeriodRecord};
pub use follower_join::{join_followers, FollowedPage, FollowerIndex};
pub use ranking::{rank_pages, LeaderboardRow};

/// Canonical column names of the scored-post frame
pub(crate) mod columns {
    pub const PAGE: &str = "page";
    pub const POST_ID: &str = "post_id";
    pub const DAY: &str = "day";
    pub const LIKES: &str = "likes";
    pub const COMMENTS: &str = "comments";
    pub const SHARES: &str = "shares";
    pub const ENGAGEMENT: &str = "engagement";
    pub const TOTAL_ENGAGEMENT: &str = "total_engagement";
    pub const POST_COUNT: &str = "post_count";
}
