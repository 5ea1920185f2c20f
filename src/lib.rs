pub mod column_mapping;
pub mod config;
pub mod core;
pub mod data_utils;
pub mod dataset;
pub mod error;
pub mod ingestion;
pub mod logging;
pub mod pipeline;
pub mod report;
pub mod time;

pub use column_mapping::{
    ColumnMapping, DatasetKind, FollowerField, PerformanceField, PriorField, SemanticField, UnmappedField,
};
pub use config::LeaderboardConfig;
pub use crate::core::engine::{DailyRecord, LeaderboardRow};
pub use dataset::Dataset;
pub use error::{LeaderboardError, Result};
pub use pipeline::{build_leaderboard, Leaderboard, LeaderboardPipeline, LeaderboardRequest, MappedDataset};
pub use report::LeaderboardSummary;
