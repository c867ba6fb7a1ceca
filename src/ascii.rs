// SPDX-License-Identifier: MIT

//! Textual mini-chart for environments without graphical rendering.
//!
//! Consumes the same ordered daily series as the chart views and produces a
//! single-line sparkline, bucketing the year down to a fixed width. Purely a
//! function of its input; the series is never mutated.

use crate::stats::DailyPoint;

/// Glyph ramp from quietest to busiest bucket.
const GLYPHS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Default sparkline width; one glyph per week of a full year.
pub const DEFAULT_GRAPH_WIDTH: usize = 52;

/// Renders the daily series as a sparkline at the default width.
pub fn render_ascii_graph(daily: &[DailyPoint]) -> String {
    render_ascii_graph_with_width(daily, DEFAULT_GRAPH_WIDTH)
}

/// Renders the daily series as a sparkline of at most `width` glyphs.
///
/// Days are folded into evenly sized buckets and each bucket's mean is
/// mapped onto the glyph ramp relative to the busiest bucket. An empty
/// series or zero width yields an empty string.
pub fn render_ascii_graph_with_width(daily: &[DailyPoint], width: usize) -> String {
    if daily.is_empty() || width == 0 {
        return String::new();
    }

    let means = bucket_means(daily, width.min(daily.len()));
    let max = means.iter().copied().fold(0.0_f64, f64::max);

    means
        .iter()
        .map(|mean| {
            if max <= 0.0 || *mean <= 0.0 {
                GLYPHS[0]
            } else {
                let last = GLYPHS.len() - 1;
                let index = ((mean / max) * last as f64).ceil() as usize;
                GLYPHS[index.min(last)]
            }
        })
        .collect()
}

/// Folds the series into `buckets` contiguous slices and averages each.
fn bucket_means(daily: &[DailyPoint], buckets: usize) -> Vec<f64> {
    let len = daily.len();
    (0..buckets)
        .map(|bucket| {
            let start = bucket * len / buckets;
            let end = ((bucket + 1) * len / buckets).max(start + 1);
            let slice = &daily[start..end.min(len)];
            let sum: f64 = slice.iter().map(|p| f64::from(p.contributions)).sum();
            sum / slice.len() as f64
        })
        .collect()
}
