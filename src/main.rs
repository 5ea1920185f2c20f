use engagement_leaderboard::column_mapping::{ColumnMapping, FollowerField, PerformanceField, PriorField, SemanticField};
use engagement_leaderboard::config::{LeaderboardConfig, CONFIG_ENV_VAR};
use engagement_leaderboard::dataset::{Dataset, DEFAULT_PREVIEW_ROWS};
use engagement_leaderboard::ingestion::load_dataset;
use engagement_leaderboard::logging::init_tracing;
use engagement_leaderboard::pipeline::{Leaderboard, LeaderboardPipeline, LeaderboardRequest, MappedDataset};
use engagement_leaderboard::report::{format_engagement, format_percentage, DEFAULT_DASHBOARD_FILE};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use polars::prelude::*;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "leaderboard")]
#[command(about = "Engagement leaderboard for social-media pages")]
#[command(version)]
struct Args {
    /// Debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the leaderboard from the three input files
    Run {
        /// Per-post performance file (current period)
        #[arg(long)]
        performance: PathBuf,

        /// Last fortnight summary; comparisons are 0 when omitted
        #[arg(long)]
        prior: Option<PathBuf>,

        /// Follower counts per page
        #[arg(long)]
        followers: PathBuf,

        /// JSON file with explicit column mappings, applied over auto-detection
        #[arg(long)]
        mapping: Option<PathBuf>,

        /// JSON config file (or set LEADERBOARD_CONFIG)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Write the result here instead of stdout (xlsx defaults to performance_dashboard.xlsx)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// Preview a file and show the columns auto-detection would pick
    Columns {
        file: PathBuf,

        #[arg(long, value_enum, default_value_t = DatasetArg::Performance)]
        kind: DatasetArg,

        /// JSON config file (or set LEADERBOARD_CONFIG)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Csv,
    Json,
    Xlsx,
}

#[derive(Clone, Copy, ValueEnum)]
enum DatasetArg {
    Performance,
    Prior,
    Followers,
}

/// Explicit `field key → column` assignments per dataset
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MappingFile {
    performance: HashMap<String, String>,
    prior: HashMap<String, String>,
    followers: HashMap<String, String>,
}

fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let args = Args::parse();
    init_tracing(args.verbose);

    match args.command {
        Commands::Run {
            performance,
            prior,
            followers,
            mapping,
            config,
            output,
            format,
        } => run_leaderboard(performance, prior, followers, mapping, config, output, format),
        Commands::Columns { file, kind, config } => show_columns(file, kind, config),
    }
}

fn load_config(path: Option<PathBuf>) -> Result<LeaderboardConfig> {
    let path = path.or_else(|| std::env::var(CONFIG_ENV_VAR).ok().map(PathBuf::from));
    match path {
        Some(path) => {
            info!("Loading config from {:?}", path);
            LeaderboardConfig::load(&path).with_context(|| format!("Failed to load config {}", path.display()))
        }
        None => Ok(LeaderboardConfig::default()),
    }
}

fn load_mapping_file(path: &Path) -> Result<MappingFile> {
    let content = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse mapping file {}", path.display()))
}

/// Auto-detect, then apply the explicit assignments on top
fn mapped<F: SemanticField>(
    dataset: Dataset,
    overrides: &HashMap<String, String>,
    threshold: f64,
) -> Result<MappedDataset<F>> {
    let mut mapping = ColumnMapping::<F>::auto_detect(&dataset, threshold);
    mapping.overlay(&ColumnMapping::from_pairs(overrides.iter().map(|(k, v)| (k.as_str(), v.clone())))?);
    Ok(MappedDataset::new(dataset, mapping))
}

fn run_leaderboard(
    performance: PathBuf,
    prior: Option<PathBuf>,
    followers: PathBuf,
    mapping: Option<PathBuf>,
    config: Option<PathBuf>,
    output: Option<PathBuf>,
    format: OutputFormat,
) -> Result<()> {
    let config = load_config(config)?;
    let overrides = match mapping {
        Some(path) => load_mapping_file(&path)?,
        None => MappingFile::default(),
    };
    let threshold = config.mapping.fuzzy_threshold;

    let performance = load_dataset(&performance, &config.ingestion)?;
    let followers = load_dataset(&followers, &config.ingestion)?;
    let prior = match prior {
        Some(path) => {
            mapped::<PriorField>(load_dataset(&path, &config.ingestion)?, &overrides.prior, threshold)?
                .or_no_prior_period()
        }
        None => MappedDataset::no_prior_period(),
    };

    let request = LeaderboardRequest {
        performance: mapped::<PerformanceField>(performance, &overrides.performance, threshold)?,
        prior,
        followers: mapped::<FollowerField>(followers, &overrides.followers, threshold)?,
    };

    let pipeline = LeaderboardPipeline::new(config);
    let board = pipeline.run(&request)?;

    match (format, output) {
        (OutputFormat::Csv, Some(path)) => board.write_csv(&path)?,
        (OutputFormat::Json, Some(path)) => board.write_json(&path)?,
        (OutputFormat::Xlsx, output) => {
            board.write_xlsx(output.unwrap_or_else(|| PathBuf::from(DEFAULT_DASHBOARD_FILE)))?
        }
        (OutputFormat::Csv, None) => {
            let mut frame = board.to_dataframe()?;
            CsvWriter::new(std::io::stdout()).include_header(true).finish(&mut frame)?;
        }
        (OutputFormat::Json, None) => println!("{}", serde_json::to_string_pretty(&board)?),
        (OutputFormat::Table, output) => {
            print_board(&board, pipeline.config().report.top_n)?;
            if let Some(path) = output {
                board.write_csv(&path)?;
            }
        }
    }
    Ok(())
}

fn print_board(board: &Leaderboard, top_n: usize) -> Result<()> {
    let summary = board.summary();

    println!("\n{}", "=".repeat(80));
    println!(" 🏆 PERFORMANCE LEADERBOARD");
    println!("{}", "=".repeat(80));
    println!("   Total Pages:      {}", summary.total_pages);
    println!("   Total Posts:      {}", summary.total_posts);
    println!("   Total Engagement: {}", format_engagement(summary.total_engagement));
    println!("   Avg Engagement:   {}", format_engagement(summary.avg_engagement));

    println!("\n{}", board.to_display_dataframe()?);

    println!("\n 🥇 Top {} by Engagement", top_n);
    for row in board.top_by_engagement(top_n) {
        println!(
            "   {}. {} - {} ({} days won)",
            row.rank,
            row.page,
            format_engagement(row.total_engagement),
            row.days_won
        );
    }

    println!("\n 📅 Most Days Won");
    for row in board.most_days_won(top_n) {
        println!(
            "   {} - {} days (engagement change {})",
            row.page,
            row.days_won,
            format_percentage(row.engagement_change_pct)
        );
    }

    let diagnostics = &board.diagnostics;
    if !diagnostics.is_clean() {
        println!(
            "\n ⚠️  Coerced cells out of {} rows: {} likes, {} comments, {} shares, {} unreadable dates, {} missing pages",
            diagnostics.rows,
            diagnostics.likes.total(),
            diagnostics.comments.total(),
            diagnostics.shares.total(),
            diagnostics.missing_dates + diagnostics.unparseable_dates,
            diagnostics.missing_pages
        );
    }
    Ok(())
}

fn show_columns(file: PathBuf, kind: DatasetArg, config: Option<PathBuf>) -> Result<()> {
    let config = load_config(config)?;
    let dataset = load_dataset(&file, &config.ingestion)?;
    let threshold = config.mapping.fuzzy_threshold;

    println!("\n {} ({} rows)", dataset.label(), dataset.height());
    println!("{}", dataset.preview(DEFAULT_PREVIEW_ROWS));

    println!("\n Detected mapping:");
    match kind {
        DatasetArg::Performance => print_mapping(&ColumnMapping::<PerformanceField>::auto_detect(&dataset, threshold)),
        DatasetArg::Prior => print_mapping(&ColumnMapping::<PriorField>::auto_detect(&dataset, threshold)),
        DatasetArg::Followers => print_mapping(&ColumnMapping::<FollowerField>::auto_detect(&dataset, threshold)),
    }
    Ok(())
}

fn print_mapping<F: SemanticField>(mapping: &ColumnMapping<F>) {
    for (field, column) in mapping.entries() {
        let optional = if field.is_optional() { " (optional)" } else { "" };
        println!(
            "   {:<12} {:<24} {:<28}{}",
            field.key(),
            field.label(),
            column.unwrap_or("-"),
            optional
        );
    }
}
