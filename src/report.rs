//! Leaderboard Report
//!
//! Summary metrics, top-N insights, tabular views and exports of a finished
//! [`Leaderboard`].

use crate::core::engine::LeaderboardRow;
use crate::error::Result;
use crate::pipeline::Leaderboard;
use itertools::Itertools;
use polars::prelude::*;
use rust_xlsxwriter::{Format, Workbook};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;
use tracing::info;

pub const HEADER_RANK: &str = "Rank";
pub const HEADER_PAGE: &str = "Page/Profile/Channel";
pub const HEADER_FOLLOWER: &str = "Follower";
pub const HEADER_POST: &str = "Post";
pub const HEADER_ENGAGEMENT: &str = "Engagement";
pub const HEADER_DAY_WON: &str = "Day Won";
pub const HEADER_POST_CHANGE: &str = "% Change in Post";
pub const HEADER_ENGAGEMENT_CHANGE: &str = "% Change in Engagement";
pub const HEADER_LAST_DAY_WON: &str = "Last Fortnight Day Won";
pub const HEADER_LAST_RANK: &str = "Last Fortnight Rank";

/// Worksheet name of the Excel export
pub const DASHBOARD_SHEET: &str = "Dashboard";

/// File name used when an Excel export has no explicit destination
pub const DEFAULT_DASHBOARD_FILE: &str = "performance_dashboard.xlsx";

/// Headline numbers across the whole board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardSummary {
    pub total_pages: usize,
    pub total_posts: u64,
    pub total_engagement: f64,

    /// Mean engagement per page, 0 for an empty board
    pub avg_engagement: f64,
}

impl Leaderboard {
    pub fn summary(&self) -> LeaderboardSummary {
        let total_pages = self.rows.len();
        let total_posts = self.rows.iter().map(|r| r.total_posts).sum();
        let total_engagement: f64 = self.rows.iter().map(|r| r.total_engagement).sum();
        let avg_engagement = if total_pages == 0 {
            0.0
        } else {
            total_engagement / total_pages as f64
        };
        LeaderboardSummary {
            total_pages,
            total_posts,
            total_engagement,
            avg_engagement,
        }
    }

    /// First `n` rows in rank order
    pub fn top_by_engagement(&self, n: usize) -> &[LeaderboardRow] {
        &self.rows[..n.min(self.rows.len())]
    }

    /// `n` pages with the most days won; rank order among equals
    pub fn most_days_won(&self, n: usize) -> Vec<&LeaderboardRow> {
        self.rows
            .iter()
            .sorted_by(|a, b| b.days_won.cmp(&a.days_won))
            .take(n)
            .collect()
    }

    /// The board as a dataframe with display headers and raw numbers
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let rows = &self.rows;
        let frame = DataFrame::new(vec![
            Series::new(HEADER_RANK, rows.iter().map(|r| r.rank).collect::<Vec<_>>()),
            Series::new(HEADER_PAGE, rows.iter().map(|r| r.page.as_str()).collect::<Vec<_>>()),
            Series::new(HEADER_FOLLOWER, rows.iter().map(|r| r.followers).collect::<Vec<_>>()),
            Series::new(HEADER_POST, rows.iter().map(|r| r.total_posts).collect::<Vec<_>>()),
            Series::new(HEADER_ENGAGEMENT, rows.iter().map(|r| r.total_engagement).collect::<Vec<_>>()),
            Series::new(HEADER_DAY_WON, rows.iter().map(|r| r.days_won).collect::<Vec<_>>()),
            Series::new(HEADER_POST_CHANGE, rows.iter().map(|r| r.posts_change_pct).collect::<Vec<_>>()),
            Series::new(
                HEADER_ENGAGEMENT_CHANGE,
                rows.iter().map(|r| r.engagement_change_pct).collect::<Vec<_>>(),
            ),
            Series::new(HEADER_LAST_DAY_WON, rows.iter().map(|r| r.last_fortnight_day_won).collect::<Vec<_>>()),
            Series::new(HEADER_LAST_RANK, rows.iter().map(|r| r.last_fortnight_rank).collect::<Vec<_>>()),
        ])?;
        Ok(frame)
    }

    /// Like [`Leaderboard::to_dataframe`] with engagement and percentages rendered as text
    pub fn to_display_dataframe(&self) -> Result<DataFrame> {
        let mut frame = self.to_dataframe()?;
        let engagement: Vec<String> = self.rows.iter().map(|r| format_engagement(r.total_engagement)).collect();
        let posts: Vec<String> = self.rows.iter().map(|r| format_percentage(r.posts_change_pct)).collect();
        let change: Vec<String> = self.rows.iter().map(|r| format_percentage(r.engagement_change_pct)).collect();
        frame.replace(HEADER_ENGAGEMENT, Series::new(HEADER_ENGAGEMENT, engagement))?;
        frame.replace(HEADER_POST_CHANGE, Series::new(HEADER_POST_CHANGE, posts))?;
        frame.replace(HEADER_ENGAGEMENT_CHANGE, Series::new(HEADER_ENGAGEMENT_CHANGE, change))?;
        Ok(frame)
    }

    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut frame = self.to_dataframe()?;
        let mut file = File::create(path)?;
        CsvWriter::new(&mut file)
            .include_header(true)
            .with_separator(b',')
            .finish(&mut frame)?;
        info!("💾 Wrote {} leaderboard rows to {}", frame.height(), path.display());
        Ok(())
    }

    /// One "Dashboard" worksheet with the [`Leaderboard::to_dataframe`] headers in bold
    pub fn write_xlsx(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let frame = self.to_dataframe()?;

        let mut workbook = Workbook::new();
        let header_format = Format::new().set_bold();
        let sheet = workbook.add_worksheet();
        sheet.set_name(DASHBOARD_SHEET)?;

        for (col, header) in frame.get_column_names().into_iter().enumerate() {
            sheet.write_string_with_format(0, col as u16, header, &header_format)?;
        }
        for (idx, row) in self.rows.iter().enumerate() {
            let line = idx as u32 + 1;
            sheet.write_number(line, 0, row.rank as f64)?;
            sheet.write_string(line, 1, &row.page)?;
            sheet.write_number(line, 2, row.followers as f64)?;
            sheet.write_number(line, 3, row.total_posts as f64)?;
            sheet.write_number(line, 4, row.total_engagement)?;
            sheet.write_number(line, 5, row.days_won as f64)?;
            sheet.write_number(line, 6, row.posts_change_pct)?;
            sheet.write_number(line, 7, row.engagement_change_pct)?;
            sheet.write_number(line, 8, row.last_fortnight_day_won as f64)?;
            sheet.write_number(line, 9, row.last_fortnight_rank as f64)?;
        }

        workbook.save(path)?;
        info!("💾 Wrote {} leaderboard rows to {}", self.rows.len(), path.display());
        Ok(())
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        info!("💾 Wrote leaderboard {} to {}", self.run_id, path.display());
        Ok(())
    }
}

/// Engagement in millions, e.g. `1234567.0` → `"1.23M"`
pub fn format_engagement(value: f64) -> String {
    let value = if value.is_finite() { value } else { 0.0 };
    format!("{:.2}M", value / 1_000_000.0)
}

/// Whole-number percentage, e.g. `12.5` → `"12%"` (ties round to even)
pub fn format_percentage(value: f64) -> String {
    if !value.is_finite() {
        return "0%".to_string();
    }
    format!("{}%", value.round_ties_even() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::engine::{CoercionReport, LeaderboardRow};
    use calamine::Reader;
    use chrono::Utc;
    use uuid::Uuid;

    fn row(rank: u32, page: &str, engagement: f64, days_won: u32) -> LeaderboardRow {
        LeaderboardRow {
            rank,
            page: page.to_string(),
            followers: 100,
            total_posts: 2,
            total_engagement: engagement,
            days_won,
            posts_change_pct: 0.0,
            engagement_change_pct: 12.5,
            last_fortnight_day_won: 0,
            last_fortnight_rank: 0,
        }
    }

    fn board(rows: Vec<LeaderboardRow>) -> Leaderboard {
        Leaderboard {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            rows,
            daily: Vec::new(),
            diagnostics: CoercionReport::default(),
        }
    }

    #[test]
    fn test_summary() {
        assert_eq!(board(Vec::new()).summary().avg_engagement, 0.0);

        let summary = board(vec![row(1, "A", 3_000_000.0, 1), row(2, "B", 1_000_000.0, 3)]).summary();
        assert_eq!(summary.total_pages, 2);
        assert_eq!(summary.total_posts, 4);
        assert_eq!(summary.total_engagement, 4_000_000.0);
        assert_eq!(summary.avg_engagement, 2_000_000.0);
    }

    #[test]
    fn test_insights() {
        let board = board(vec![row(1, "A", 30.0, 1), row(2, "B", 20.0, 3), row(3, "C", 10.0, 3)]);

        let top: Vec<&str> = board.top_by_engagement(2).iter().map(|r| r.page.as_str()).collect();
        assert_eq!(top, vec!["A", "B"]);
        assert_eq!(board.top_by_engagement(10).len(), 3);

        let most: Vec<&str> = board.most_days_won(2).iter().map(|r| r.page.as_str()).collect();
        assert_eq!(most, vec!["B", "C"]);
    }

    #[test]
    fn test_dataframe_headers() {
        let frame = board(vec![row(1, "A", 30.0, 1)]).to_dataframe().unwrap();
        assert_eq!(
            frame.get_column_names(),
            vec![
                "Rank",
                "Page/Profile/Channel",
                "Follower",
                "Post",
                "Engagement",
                "Day Won",
                "% Change in Post",
                "% Change in Engagement",
                "Last Fortnight Day Won",
                "Last Fortnight Rank"
            ]
        );

        let display = board(vec![row(1, "A", 2_500_000.0, 1)]).to_display_dataframe().unwrap();
        assert_eq!(display.column(HEADER_ENGAGEMENT).unwrap().str().unwrap().get(0), Some("2.50M"));
        assert_eq!(display.column(HEADER_ENGAGEMENT_CHANGE).unwrap().str().unwrap().get(0), Some("12%"));
    }

    #[test]
    fn test_formatting() {
        assert_eq!(format_engagement(1_234_567.0), "1.23M");
        assert_eq!(format_engagement(0.0), "0.00M");
        assert_eq!(format_percentage(49.6), "50%");
        assert_eq!(format_percentage(-50.0), "-50%");
        assert_eq!(format_percentage(f64::NAN), "0%");
    }

    #[test]
    fn test_exports() {
        let board = board(vec![row(1, "A", 30.0, 1), row(2, "B", 20.0, 0)]);
        let dir = std::env::temp_dir().join(format!("leaderboard_report_{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();

        let csv_path = dir.join("board.csv");
        board.write_csv(&csv_path).unwrap();
        let csv = std::fs::read_to_string(&csv_path).unwrap();
        assert!(csv.starts_with("Rank,Page/Profile/Channel,Follower"));
        assert_eq!(csv.lines().count(), 3);

        let xlsx_path = dir.join(DEFAULT_DASHBOARD_FILE);
        board.write_xlsx(&xlsx_path).unwrap();
        let mut workbook = calamine::open_workbook_auto(&xlsx_path).unwrap();
        assert_eq!(workbook.sheet_names(), vec![DASHBOARD_SHEET.to_string()]);
        let range = workbook.worksheet_range(DASHBOARD_SHEET).unwrap();
        let header: Vec<String> = range.rows().next().unwrap().iter().map(|c| c.to_string()).collect();
        let frame = board.to_dataframe().unwrap();
        assert_eq!(header, frame.get_column_names());
        assert_eq!(range.height(), 3);
        assert_eq!(range.get((2, 1)), Some(&calamine::Data::String("B".to_string())));
        assert_eq!(range.get((1, 4)), Some(&calamine::Data::Float(30.0)));

        let json_path = dir.join("board.json");
        board.write_json(&json_path).unwrap();
        let parsed: Leaderboard = serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(parsed.rows, board.rows);

        std::fs::remove_dir_all(&dir).ok();
    }
}
