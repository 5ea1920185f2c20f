//! Core Leaderboard Modules
//!
//! This module contains the aggregation and ranking stages that turn scored
//! posts into a ranked leaderboard.

pub mod engine;
