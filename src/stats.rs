// SPDX-License-Identifier: MIT

//! Derived statistics and chart series for the dashboard view.
//!
//! Everything here is a pure transform over the normalized contribution map:
//! summary numbers for the stat cards, a date-ascending daily series, and a
//! running-total cumulative series. Inputs are never mutated, and degenerate
//! inputs degrade to zero-safe defaults instead of NaN.

use chrono::NaiveDate;
use serde::Serialize;

use crate::contributions::ContributionMap;

/// Summary statistics recomputed on each render pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedStats {
    /// Upstream-reported contribution total.
    pub total_contributions: u32,
    /// Mean contributions per mapped day, rounded to one decimal.
    pub average_daily:       f64,
    /// Days with at least one contribution.
    pub active_days:         usize,
    /// Largest single-day contribution count.
    pub max_daily:           u32
}

/// One day of the date-ascending chart series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyPoint {
    /// Calendar date.
    pub date:          NaiveDate,
    /// Contributions recorded on that date.
    pub contributions: u32
}

/// One day of the running-total series used by the growth chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CumulativePoint {
    /// Calendar date.
    pub date:          NaiveDate,
    /// Contributions recorded on that date.
    pub contributions: u32,
    /// Sum of contributions up to and including this date.
    pub cumulative:    u64
}

/// Derives summary statistics from the contribution map.
///
/// The upstream-reported total is authoritative and passed through; averages
/// and maxima derive from the map. An empty map yields all-zero statistics
/// rather than NaN.
pub fn compute_stats(map: &ContributionMap, total_contributions: u32) -> DerivedStats {
    if map.is_empty() {
        return DerivedStats {
            total_contributions,
            average_daily: 0.0,
            active_days: 0,
            max_daily: 0
        };
    }

    let map_sum: u64 = map.values().map(|count| u64::from(*count)).sum();
    let average_daily = round_one_decimal(map_sum as f64 / map.len() as f64);
    let active_days = map.values().filter(|count| **count > 0).count();
    let max_daily = map.values().copied().max().unwrap_or(0);

    DerivedStats {
        total_contributions,
        average_daily,
        active_days,
        max_daily
    }
}

/// Produces the date-ascending daily series.
///
/// The map keys are unique dates already held in chronological order, so the
/// series is a straight projection.
pub fn build_daily_series(map: &ContributionMap) -> Vec<DailyPoint> {
    map.iter()
        .map(|(date, contributions)| DailyPoint {
            date:          *date,
            contributions: *contributions
        })
        .collect()
}

/// Builds the running-total series over the daily series.
///
/// Single O(n) pass; `cumulative[i]` is the inclusive prefix sum of
/// `contributions[0..=i]`.
pub fn build_cumulative_series(daily: &[DailyPoint]) -> Vec<CumulativePoint> {
    let mut running: u64 = 0;
    daily
        .iter()
        .map(|point| {
            running += u64::from(point.contributions);
            CumulativePoint {
                date:          point.date,
                contributions: point.contributions,
                cumulative:    running
            }
        })
        .collect()
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
