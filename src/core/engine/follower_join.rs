//! Follower Join
//!
//! Left-joins follower counts onto the compared pages. A page missing from the
//! follower data keeps its row with 0 followers.

use super::comparison::ComparedPage;
use crate::column_mapping::FollowerColumns;
use crate::data_utils::{coerce_integer, numeric_values, text_values};
use crate::dataset::Dataset;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Follower counts by page, first occurrence wins
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FollowerIndex {
    counts: HashMap<String, i64>,
    duplicates: usize,
}

impl FollowerIndex {
    pub fn from_dataset(dataset: &Dataset, columns: &FollowerColumns) -> Result<Self> {
        let pages = text_values(dataset.frame(), &columns.page)?;
        let followers = numeric_values(dataset.frame(), &columns.followers)?;

        let mut index = FollowerIndex::default();
        for (page, count) in pages.into_iter().zip(followers) {
            let page = page.unwrap_or_default();
            if index.counts.contains_key(&page) {
                index.duplicates += 1;
                continue;
            }
            index.counts.insert(page, coerce_integer(count));
        }

        if index.duplicates > 0 {
            warn!(
                "{} duplicate page rows in {} ignored (first occurrence kept)",
                index.duplicates,
                dataset.label()
            );
        }
        Ok(index)
    }

    /// Followers of a page, 0 when unknown
    pub fn get(&self, page: &str) -> i64 {
        self.counts.get(page).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn duplicates(&self) -> usize {
        self.duplicates
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowedPage {
    pub compared: ComparedPage,
    pub followers: i64,
}

pub fn join_followers(pages: Vec<ComparedPage>, index: &FollowerIndex) -> Vec<FollowedPage> {
    let joined: Vec<FollowedPage> = pages
        .into_iter()
        .map(|compared| {
            let followers = index.get(&compared.page.page);
            FollowedPage { compared, followers }
        })
        .collect();

    let unmatched = joined
        .iter()
        .filter(|p| !index.counts.contains_key(&p.compared.page.page))
        .count();
    if unmatched > 0 {
        debug!("{} pages have no follower entry, defaulting to 0", unmatched);
    }
    joined
}
