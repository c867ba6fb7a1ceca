// SPDX-License-Identifier: MIT

//! Command-line interface for the gh-wrapped binary.
//!
//! The CLI exposes subcommands for printing the yearly dashboard, listing
//! ranked language usage, and exporting the shareable card as a PNG. The two
//! upstream data queries run concurrently; every derived statistic waits for
//! both before rendering.

use std::{io, path::PathBuf, process, time::Duration};

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use gh_wrapped::{
    CardExporter, CardInputs, ContributionSummary, DerivedStats, Error, ExportOutcome,
    GithubClient, LanguageBreakdown, LanguageUsage, ResolvedConfig, WrappedConfig,
    build_card_layout, build_cumulative_series, build_daily_series, compute_stats,
    fetch_contributions, fetch_repository_languages, fetch_top_languages_by_repo_count,
    load_config, normalize_contributions, rank_languages, render_ascii_graph, resolve_config,
    total_stars
};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Command line interface for the GitHub Wrapped dashboard.
#[derive(Debug, Parser)]
#[command(name = "gh-wrapped", version, about = "Render a GitHub user's yearly wrapped report")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    common: CommonArgs
}

/// Options shared by every subcommand.
#[derive(Debug, Args)]
struct CommonArgs {
    /// Path to a YAML configuration file supplying defaults.
    #[arg(long = "config", value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// GitHub account to report on.
    #[arg(long = "user", value_name = "LOGIN", global = true)]
    user: Option<String>,

    /// Target calendar year; defaults to the current year.
    #[arg(long = "year", value_name = "YEAR", global = true)]
    year: Option<i32>,

    /// Bearer token for the GraphQL queries.
    #[arg(
        long = "token",
        value_name = "TOKEN",
        env = "GITHUB_TOKEN",
        hide_env_values = true,
        global = true
    )]
    token: Option<String>
}

/// Supported commands exposed by the CLI.
#[derive(Debug, Subcommand)]
enum Command {
    /// Print summary statistics and the ASCII contribution graph.
    Stats(StatsArgs),
    /// Print ranked language usage.
    Languages(LanguagesArgs),
    /// Export the shareable card as a PNG.
    Export(ExportArgs)
}

/// Arguments accepted by the `stats` subcommand.
#[derive(Debug, Args)]
struct StatsArgs {
    /// Emit machine-readable JSON instead of the terminal dashboard.
    #[arg(long = "json", action = ArgAction::SetTrue)]
    json: bool
}

/// Arguments accepted by the `languages` subcommand.
#[derive(Debug, Args)]
struct LanguagesArgs {
    /// Ranking policy: byte sizes from GraphQL or primary-language repo
    /// counts from the REST listing.
    #[arg(long = "by", value_enum, default_value_t = Weighting::Bytes)]
    by: Weighting
}

/// Language weighting policies; both are preserved independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Weighting {
    /// Sum language byte sizes across repositories.
    Bytes,
    /// Count repositories per primary language, top five.
    Repos
}

/// Arguments accepted by the `export` subcommand.
#[derive(Debug, Args)]
struct ExportArgs {
    /// Directory receiving the PNG artifact.
    #[arg(long = "output", value_name = "DIR")]
    output: Option<String>,

    /// Print the card layout as JSON instead of rasterizing it.
    #[arg(long = "dry-run", action = ArgAction::SetTrue)]
    dry_run: bool
}

/// Machine-readable stats report printed by `stats --json`.
#[derive(Debug, Serialize)]
struct StatsReport<'a> {
    username:  &'a str,
    year:      i32,
    stats:     &'a DerivedStats,
    languages: &'a [LanguageUsage],
    stars:     u64,
    graph:     String
}

/// Entry point that reports errors and sets the appropriate exit status.
#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    if let Err(error) = run().await {
        eprintln!("{}", error.to_display_string());
        process::exit(1);
    }
}

/// Executes the CLI using parsed arguments.
///
/// # Errors
///
/// Propagates configuration and upstream query errors; export failures are
/// contained inside the export routine and only logged.
async fn run() -> Result<(), Error> {
    let cli = Cli::parse();

    match cli.command {
        Command::Stats(args) => run_stats(&cli.common, &args).await,
        Command::Languages(args) => run_languages(&cli.common, &args).await,
        Command::Export(args) => run_export(&cli.common, &args).await
    }
}

fn resolve(common: &CommonArgs, output: Option<&str>) -> Result<ResolvedConfig, Error> {
    let file = match common.config.as_deref() {
        Some(path) => load_config(path)?,
        None => WrappedConfig::default()
    };

    resolve_config(
        &file,
        common.user.as_deref(),
        common.year,
        common.token.as_deref(),
        output
    )
}

fn fetch_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("valid template")
    );
    pb.set_message(message.to_owned());
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

/// Runs both upstream queries concurrently and normalizes their results.
///
/// The renderer consumes the combined output, so nothing downstream starts
/// until both queries have settled.
async fn fetch_year(
    client: &GithubClient,
    config: &ResolvedConfig
) -> Result<(ContributionSummary, Option<String>, LanguageBreakdown), Error> {
    let pb = fetch_spinner(&format!(
        "Fetching {} activity for {}...",
        config.year, config.username
    ));

    let result = tokio::try_join!(
        fetch_contributions(client, &config.username, config.year),
        fetch_repository_languages(client, &config.username)
    );
    pb.finish_and_clear();

    let (raw, repos) = result?;
    let summary = normalize_contributions(&raw);
    let breakdown = rank_languages(&repos);

    Ok((summary, raw.avatar_url, breakdown))
}

async fn run_stats(common: &CommonArgs, args: &StatsArgs) -> Result<(), Error> {
    let config = resolve(common, None)?;
    let client = GithubClient::new(config.token.as_deref())?;

    let (summary, _, breakdown) = fetch_year(&client, &config).await?;

    let stats = compute_stats(&summary.contribution_map, summary.total_contributions);
    let daily = build_daily_series(&summary.contribution_map);
    let graph = render_ascii_graph(&daily);
    let stars = total_stars(&breakdown.repos);

    if args.json {
        let report = StatsReport {
            username: &config.username,
            year: config.year,
            stats: &stats,
            languages: &breakdown.ranked,
            stars,
            graph
        };
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        serde_json::to_writer_pretty(&mut handle, &report)?;
        return Ok(());
    }

    println!("{} — GitHub Wrapped {}\n", config.username, config.year);
    println!("  Contributions  {}", stats.total_contributions);
    println!("  Daily average  {:.1}", stats.average_daily);
    println!("  Active days    {}", stats.active_days);
    println!("  Busiest day    {}", stats.max_daily);
    println!("  Stars          {}\n", stars);

    if graph.is_empty() {
        println!("  no contribution data for {}\n", config.year);
    } else {
        println!("  {graph}\n");
    }

    print_language_ranking(&breakdown.ranked);
    Ok(())
}

fn print_language_ranking(ranked: &[LanguageUsage]) {
    if ranked.is_empty() {
        println!("No language data available.");
        return;
    }

    let total: u64 = ranked.iter().map(|language| language.size).sum();
    println!("Top languages");
    for (position, language) in ranked.iter().take(5).enumerate() {
        let share = if total == 0 {
            0.0
        } else {
            language.size as f64 / total as f64 * 100.0
        };
        println!("  {}. {:<14} {:>5.1}%", position + 1, language.name, share);
    }
}

async fn run_languages(common: &CommonArgs, args: &LanguagesArgs) -> Result<(), Error> {
    let config = resolve(common, None)?;
    let client = GithubClient::new(config.token.as_deref())?;

    match args.by {
        Weighting::Bytes => {
            let repos = fetch_repository_languages(&client, &config.username).await?;
            let breakdown = rank_languages(&repos);
            print_language_ranking(&breakdown.ranked);
        }
        Weighting::Repos => {
            let top = fetch_top_languages_by_repo_count(&client, &config.username).await?;
            if top.is_empty() {
                println!("No language data available.");
            } else {
                for (position, (name, count)) in top.iter().enumerate() {
                    println!("  {}. {:<14} {} repositories", position + 1, name, count);
                }
            }
        }
    }

    Ok(())
}

async fn run_export(common: &CommonArgs, args: &ExportArgs) -> Result<(), Error> {
    let config = resolve(common, args.output.as_deref())?;
    let client = GithubClient::new(config.token.as_deref())?;

    let (summary, avatar_url, breakdown) = fetch_year(&client, &config).await?;

    let stats = compute_stats(&summary.contribution_map, summary.total_contributions);
    let daily = build_daily_series(&summary.contribution_map);
    let cumulative = build_cumulative_series(&daily);
    let stars = total_stars(&breakdown.repos);

    let layout = build_card_layout(&CardInputs {
        username: &config.username,
        year: config.year,
        stats: &stats,
        daily: &daily,
        cumulative: &cumulative,
        languages: &breakdown.ranked,
        total_stars: stars,
        avatar_url: avatar_url.as_deref()
    });

    if args.dry_run {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        serde_json::to_writer_pretty(&mut handle, &layout)?;
        return Ok(());
    }

    let output_path = PathBuf::from(&config.output_dir).join(config.card_filename());
    let exporter = CardExporter::new();

    // Export failures are contained: logged, state restored, no partial file.
    match exporter.export_card(&client, &layout, &output_path).await {
        Ok(ExportOutcome::Written(path)) => {
            info!("Card written to {}", path.display());
            println!("{}", path.display());
        }
        Ok(ExportOutcome::SkippedInProgress) => {
            info!("Export skipped; another export was in progress");
        }
        Err(export_error) => {
            error!("Card export failed: {}", export_error.to_display_string());
        }
    }

    Ok(())
}
