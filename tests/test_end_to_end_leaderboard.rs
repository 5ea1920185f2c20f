use engagement_leaderboard::column_mapping::{ColumnMapping, FollowerField, PerformanceField, PriorField};
use engagement_leaderboard::config::LeaderboardConfig;
use engagement_leaderboard::dataset::Dataset;
use engagement_leaderboard::ingestion::load_dataset;
use engagement_leaderboard::pipeline::{build_leaderboard, Leaderboard, LeaderboardRequest, MappedDataset};
use engagement_leaderboard::LeaderboardError;
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

/// Fresh scratch directory for one test
fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("leaderboard_{}_{}", name, uuid::Uuid::new_v4()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn write(dir: &PathBuf, file: &str, content: &str) -> PathBuf {
    let path = dir.join(file);
    fs::write(&path, content).unwrap();
    path
}

fn load(path: &PathBuf) -> Dataset {
    load_dataset(path, &LeaderboardConfig::default().ingestion).unwrap()
}

fn request(performance: &PathBuf, prior: Option<&PathBuf>, followers: &PathBuf) -> LeaderboardRequest {
    LeaderboardRequest {
        performance: MappedDataset::auto_detected(load(performance), 0.85),
        prior: match prior {
            Some(path) => MappedDataset::auto_detected(load(path), 0.85),
            None => MappedDataset::no_prior_period(),
        },
        followers: MappedDataset::auto_detected(load(followers), 0.85),
    }
}

const TWO_BY_TWO: &str = "\
Page Name,Post ID,Post Date,Likes,Comments,Shares
Page A,a1,2024-03-01 09:00:00,10,0,0
Page B,b1,2024-03-01 18:30:00,20,0,0
Page A,a2,2024-03-02 07:15:00,30,0,0
Page B,b2,2024-03-02 22:00:00,5,0,0
";

const FOLLOWERS: &str = "\
Page,Followers
Page A,15000
Page A,99
";

#[test]
fn test_two_pages_two_days() {
    let dir = scratch_dir("two_by_two");
    let performance = write(&dir, "posts.csv", TWO_BY_TWO);
    let followers = write(&dir, "followers.csv", FOLLOWERS);

    let board = build_leaderboard(&request(&performance, None, &followers)).unwrap();

    let day1: Vec<&str> = board
        .daily
        .iter()
        .filter(|d| d.day_won && d.date.map(|d| d.to_string()) == Some("2024-03-01".to_string()))
        .map(|d| d.page.as_str())
        .collect();
    assert_eq!(day1, vec!["Page B"]);

    let a = &board.rows[0];
    assert_eq!(a.page, "Page A");
    assert_eq!(a.rank, 1);
    assert_eq!(a.total_engagement, 40.0);
    assert_eq!(a.days_won, 1);
    assert_eq!(a.followers, 15000);

    let b = &board.rows[1];
    assert_eq!(b.page, "Page B");
    assert_eq!(b.rank, 2);
    assert_eq!(b.total_engagement, 25.0);
    assert_eq!(b.days_won, 1);
    // absent from follower data, row kept
    assert_eq!(b.followers, 0);

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_prior_period_comparison() {
    let dir = scratch_dir("prior");
    let performance = write(&dir, "posts.csv", TWO_BY_TWO);
    let followers = write(&dir, "followers.csv", FOLLOWERS);
    let prior = write(
        &dir,
        "last_fortnight.csv",
        "\
Page,Total Engagement,Post Count,Days Won,Rank
Page A,20,4,6,2
Page B,0,1,8,1
",
    );

    let board = build_leaderboard(&request(&performance, Some(&prior), &followers)).unwrap();

    let a = &board.rows[0];
    assert_eq!(a.engagement_change_pct, 100.0);
    assert_eq!(a.posts_change_pct, -50.0);
    assert_eq!(a.last_fortnight_day_won, 6);
    assert_eq!(a.last_fortnight_rank, 2);

    let b = &board.rows[1];
    // previous engagement of 0 gives 0, not infinity
    assert_eq!(b.engagement_change_pct, 0.0);
    assert_eq!(b.posts_change_pct, 100.0);
    assert_eq!(b.last_fortnight_rank, 1);

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_empty_prior_dataset_gives_zero_comparisons() {
    let dir = scratch_dir("empty_prior");
    let performance = write(&dir, "posts.csv", TWO_BY_TWO);
    let followers = write(&dir, "followers.csv", FOLLOWERS);
    let prior = write(&dir, "prior.csv", "Page,Engagement,Post Count\n");

    for board in [
        build_leaderboard(&request(&performance, Some(&prior), &followers)).unwrap(),
        build_leaderboard(&request(&performance, None, &followers)).unwrap(),
    ] {
        for row in &board.rows {
            assert_eq!(row.posts_change_pct, 0.0);
            assert_eq!(row.engagement_change_pct, 0.0);
            assert_eq!(row.last_fortnight_day_won, 0);
            assert_eq!(row.last_fortnight_rank, 0);
        }
    }

    fs::remove_dir_all(&dir).ok();
}

fn dirty_posts() -> Vec<&'static str> {
    vec![
        "Page A,a1,2024-03-01,10,1,1",
        "Page B,b1,2024-03-01,lots,2,0",
        "Page C,c1,2024-03-02,7,,3",
        "Page A,a2,not a date,100,0,0",
        "Page B,b2,2024-03-03T10:00:00+02:00,5,5,5",
        "Page C,c2,2024-03-03,0,0,0",
        "Page C,c3,2024-03-04,1,0,0",
        "Page A,a3,2024-03-04,1,0,0",
    ]
}

fn board_from_lines(dir: &PathBuf, lines: &[&str]) -> Leaderboard {
    let mut csv = String::from("Page,Post,Date,Likes,Comments,Shares\n");
    for line in lines {
        csv.push_str(line);
        csv.push('\n');
    }
    let performance = write(dir, "posts.csv", &csv);
    let followers = write(dir, "followers.csv", "Page,Fans\nPage C,10\n");
    build_leaderboard(&request(&performance, None, &followers)).unwrap()
}

#[test]
fn test_dirty_data_degrades_instead_of_failing() {
    let dir = scratch_dir("dirty");
    let lines = dirty_posts();
    let board = board_from_lines(&dir, &lines);

    // every input row is counted
    let total_posts: u64 = board.rows.iter().map(|r| r.total_posts).sum();
    assert_eq!(total_posts, lines.len() as u64);

    // one winner per readable day; the unreadable-date bucket never wins
    let days: HashSet<_> = board.daily.iter().filter_map(|d| d.date).collect();
    let days_won: u32 = board.rows.iter().map(|r| r.days_won).sum();
    assert_eq!(days.len(), 4);
    assert_eq!(days_won, 4);
    assert!(board.daily.iter().any(|d| d.date.is_none() && !d.day_won));

    // "lots" likes count as 0; the empty comments cell too
    let b = board.rows.iter().find(|r| r.page == "Page B").unwrap();
    assert_eq!(b.total_engagement, 4.0 + (5.0 + 10.0 + 15.0));
    assert_eq!(board.diagnostics.unparseable_dates, 1);
    assert_eq!(board.diagnostics.comments.missing, 1);

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_row_order_does_not_change_the_result() {
    let dir = scratch_dir("order");
    let lines = dirty_posts();
    let forward = board_from_lines(&dir, &lines);

    let mut reversed = lines.clone();
    reversed.reverse();
    let backward = board_from_lines(&dir, &reversed);

    assert_eq!(forward.rows, backward.rows);
    assert_eq!(forward.daily, backward.daily);

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_tied_pages_share_a_rank() {
    let dir = scratch_dir("ties");
    let board = board_from_lines(
        &dir,
        &[
            "Zeta,z1,2024-03-01,300,0,0",
            "Alpha,a1,2024-03-01,300,0,0",
            "Mid,m1,2024-03-02,100,0,0",
        ],
    );

    let ranked: Vec<(&str, u32)> = board.rows.iter().map(|r| (r.page.as_str(), r.rank)).collect();
    assert_eq!(ranked, vec![("Alpha", 1), ("Zeta", 1), ("Mid", 3)]);

    // equal engagement on the same day goes to the lowest page id
    let alpha = &board.rows[0];
    assert_eq!(alpha.days_won, 1);
    assert_eq!(board.rows[1].days_won, 0);

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_explicit_mapping_overrides_detection() {
    let dir = scratch_dir("explicit");
    let performance = write(
        &dir,
        "posts.csv",
        "Handle,Item,When,Hearts,Replies,Boosts\nP,1,2024-03-01,1,1,1\n",
    );
    let followers = write(&dir, "followers.csv", "Handle,Audience\nP,12\n");

    let performance_mapping = ColumnMapping::<PerformanceField>::from_pairs([
        ("page_name", "Handle"),
        ("post_id", "Item"),
        ("date", "When"),
        ("likes", "Hearts"),
        ("comments", "Replies"),
        ("shares", "Boosts"),
    ])
    .unwrap();
    let follower_mapping =
        ColumnMapping::<FollowerField>::from_pairs([("page_name", "Handle"), ("followers", "Audience")]).unwrap();

    let board = build_leaderboard(&LeaderboardRequest {
        performance: MappedDataset::new(load(&performance), performance_mapping),
        prior: MappedDataset::no_prior_period(),
        followers: MappedDataset::new(load(&followers), follower_mapping),
    })
    .unwrap();

    assert_eq!(board.rows[0].total_engagement, 6.0);
    assert_eq!(board.rows[0].followers, 12);

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_missing_mappings_fail_before_running() {
    let dir = scratch_dir("missing");
    let performance = write(&dir, "posts.csv", "Page,Date,Likes\nA,2024-03-01,1\n");
    let followers = write(&dir, "followers.csv", FOLLOWERS);

    let request = LeaderboardRequest {
        performance: MappedDataset::auto_detected(load(&performance), 0.85),
        prior: MappedDataset::new(Dataset::empty("prior"), ColumnMapping::<PriorField>::empty()),
        followers: MappedDataset::auto_detected(load(&followers), 0.85),
    };

    match build_leaderboard(&request) {
        Err(LeaderboardError::MissingMapping(fields)) => {
            let names: Vec<String> = fields.iter().map(|f| f.to_string()).collect();
            assert!(names.contains(&"performance.comments".to_string()));
            assert!(names.contains(&"performance.shares".to_string()));
            assert!(names.contains(&"prior.page_name".to_string()));
            assert!(!names.iter().any(|n| n == "prior.rank" || n == "prior.day_won"));
        }
        other => panic!("expected MissingMapping, got {:?}", other.map(|b| b.rows.len())),
    }

    fs::remove_dir_all(&dir).ok();
}
