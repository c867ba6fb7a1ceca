// SPDX-License-Identifier: MIT

//! Core library for the GitHub Wrapped CLI.
//!
//! The library exposes two cooperating layers: an aggregation layer that
//! queries the GitHub GraphQL and REST endpoints and normalizes the nested
//! responses into flat lookup structures, and a presentation layer that
//! derives summary statistics, chart series, an ASCII mini-chart, and a
//! shareable card layout rasterized to PNG. All public APIs are documented
//! with invariants, error semantics, and minimal examples.

mod ascii;
mod card;
mod client;
mod config;
mod contributions;
mod error;
mod export;
mod languages;
mod stats;

pub use ascii::{DEFAULT_GRAPH_WIDTH, render_ascii_graph, render_ascii_graph_with_width};
pub use card::{
    CARD_HEIGHT, CARD_WIDTH, CardElement, CardInputs, CardLayout, PIXEL_DENSITY,
    build_card_layout
};
pub use client::GithubClient;
pub use config::{
    ResolvedConfig, WrappedConfig, current_year, load_config, parse_config, resolve_config
};
pub use contributions::{
    CalendarDay, CalendarWeek, ContributionMap, ContributionSummary, RawContributions,
    contribution_query, fetch_contributions, normalize_contributions, parse_contributions
};
pub use error::{Error, export_io_error, io_error};
pub use export::{CardExporter, ExportOutcome, rasterize_layout};
pub use languages::{
    LanguageBreakdown, LanguageUsage, RepoDetail, RepoListing, RepoNode,
    count_primary_languages, fetch_repository_languages, fetch_top_languages_by_repo_count,
    parse_repositories, rank_languages, repository_query, total_stars
};
pub use stats::{
    CumulativePoint, DailyPoint, DerivedStats, build_cumulative_series, build_daily_series,
    compute_stats
};
