// SPDX-License-Identifier: MIT

//! Shareable card layout built as pure drawing instructions.
//!
//! Instead of keeping a second, hidden copy of the dashboard markup solely
//! for export, the card is described once as a flat list of drawing
//! instructions. The PNG rasterizer consumes the same description the
//! `export --dry-run` JSON dump prints, so the two can never diverge.

use serde::Serialize;

use crate::{
    languages::LanguageUsage,
    stats::{CumulativePoint, DailyPoint, DerivedStats}
};

/// Logical card width in pixels before the density multiplier.
pub const CARD_WIDTH: u32 = 600;
/// Logical card height in pixels before the density multiplier.
pub const CARD_HEIGHT: u32 = 660;
/// Fixed pixel-density multiplier for retina-quality output.
pub const PIXEL_DENSITY: u32 = 2;

/// Card background; the rasterizer fills this before drawing.
const BACKGROUND: &str = "#ffffff";
const TEXT_PRIMARY: &str = "#24292f";
const TEXT_MUTED: &str = "#57606a";
const TILE_FILL: &str = "#f6f8fa";
const BAR_COLOR: &str = "#2da44e";
const LINE_COLOR: &str = "#0969da";
/// Fallback swatch for languages GitHub reports without a color.
const LANGUAGE_FALLBACK_COLOR: &str = "#8b949e";

/// Languages shown on the card.
const CARD_LANGUAGE_LIMIT: usize = 5;

/// Complete drawing description of the shareable card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardLayout {
    /// Logical width in pixels.
    pub width:      u32,
    /// Logical height in pixels.
    pub height:     u32,
    /// Background fill as a hex color.
    pub background: String,
    /// Drawing instructions in paint order.
    pub elements:   Vec<CardElement>
}

/// One drawing instruction of the card description.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CardElement {
    /// A line of text anchored at its top-left corner.
    Text {
        x:       i32,
        y:       i32,
        size:    u32,
        color:   String,
        content: String
    },
    /// A filled rectangle.
    Rect {
        x:      i32,
        y:      i32,
        width:  u32,
        height: u32,
        fill:   String
    },
    /// Slot for the user's avatar; the rasterizer resolves the URL.
    Avatar {
        x:    i32,
        y:    i32,
        size: u32,
        url:  Option<String>
    },
    /// Daily contribution bars drawn inside the given region.
    BarChart {
        x:      i32,
        y:      i32,
        width:  u32,
        height: u32,
        color:  String,
        values: Vec<u32>
    },
    /// Cumulative growth line drawn inside the given region.
    LineChart {
        x:      i32,
        y:      i32,
        width:  u32,
        height: u32,
        color:  String,
        values: Vec<u64>
    }
}

/// Inputs consumed by the layout builder.
///
/// Everything is borrowed, immutable data produced by the aggregation and
/// statistics steps; building a layout has no side effects.
#[derive(Debug, Clone, Copy)]
pub struct CardInputs<'a> {
    /// Account the card is generated for.
    pub username:    &'a str,
    /// Target calendar year.
    pub year:        i32,
    /// Derived summary statistics.
    pub stats:       &'a DerivedStats,
    /// Date-ascending daily series.
    pub daily:       &'a [DailyPoint],
    /// Running-total series.
    pub cumulative:  &'a [CumulativePoint],
    /// Byte-size ranked languages.
    pub languages:   &'a [LanguageUsage],
    /// Stars summed across fetched repositories.
    pub total_stars: u64,
    /// Avatar URL to embed, when known.
    pub avatar_url:  Option<&'a str>
}

/// Builds the card layout from normalized data.
///
/// Pure: the same inputs always produce the same instruction list, and no
/// input is mutated. Degenerate inputs (empty series, no languages) produce
/// a card with empty chart regions rather than failing.
pub fn build_card_layout(inputs: &CardInputs<'_>) -> CardLayout {
    let mut elements = Vec::new();

    // Header: avatar, username, report title.
    elements.push(CardElement::Avatar {
        x:    24,
        y:    24,
        size: 64,
        url:  inputs.avatar_url.map(ToOwned::to_owned)
    });
    elements.push(CardElement::Text {
        x:       104,
        y:       32,
        size:    28,
        color:   TEXT_PRIMARY.to_owned(),
        content: inputs.username.to_owned()
    });
    elements.push(CardElement::Text {
        x:       104,
        y:       66,
        size:    16,
        color:   TEXT_MUTED.to_owned(),
        content: format!("GitHub Wrapped {}", inputs.year)
    });

    // Stat tiles: total, daily average, active days, busiest day.
    let tiles = [
        ("Contributions", inputs.stats.total_contributions.to_string()),
        ("Daily average", format!("{:.1}", inputs.stats.average_daily)),
        ("Active days", inputs.stats.active_days.to_string()),
        ("Busiest day", inputs.stats.max_daily.to_string()),
    ];
    let tile_width = 132;
    for (slot, (label, value)) in tiles.iter().enumerate() {
        let x = 24 + slot as i32 * (tile_width + 8);
        elements.push(CardElement::Rect {
            x,
            y: 108,
            width: tile_width as u32,
            height: 72,
            fill: TILE_FILL.to_owned()
        });
        elements.push(CardElement::Text {
            x:       x + 12,
            y:       120,
            size:    22,
            color:   TEXT_PRIMARY.to_owned(),
            content: value.clone()
        });
        elements.push(CardElement::Text {
            x:       x + 12,
            y:       152,
            size:    13,
            color:   TEXT_MUTED.to_owned(),
            content: (*label).to_owned()
        });
    }
    elements.push(CardElement::Text {
        x:       24,
        y:       192,
        size:    13,
        color:   TEXT_MUTED.to_owned(),
        content: format!("{} stars across repositories", inputs.total_stars)
    });

    // Daily bars.
    elements.push(CardElement::Text {
        x:       24,
        y:       220,
        size:    15,
        color:   TEXT_PRIMARY.to_owned(),
        content: "Daily contributions".to_owned()
    });
    elements.push(CardElement::BarChart {
        x:      24,
        y:      244,
        width:  CARD_WIDTH - 48,
        height: 110,
        color:  BAR_COLOR.to_owned(),
        values: inputs.daily.iter().map(|point| point.contributions).collect()
    });

    // Cumulative growth line.
    elements.push(CardElement::Text {
        x:       24,
        y:       372,
        size:    15,
        color:   TEXT_PRIMARY.to_owned(),
        content: "Cumulative".to_owned()
    });
    elements.push(CardElement::LineChart {
        x:      24,
        y:      396,
        width:  CARD_WIDTH - 48,
        height: 110,
        color:  LINE_COLOR.to_owned(),
        values: inputs.cumulative.iter().map(|point| point.cumulative).collect()
    });

    // Top languages as proportional bars.
    elements.push(CardElement::Text {
        x:       24,
        y:       524,
        size:    15,
        color:   TEXT_PRIMARY.to_owned(),
        content: "Top languages".to_owned()
    });
    let top = &inputs.languages[..inputs.languages.len().min(CARD_LANGUAGE_LIMIT)];
    let max_size = top.iter().map(|language| language.size).max().unwrap_or(0);
    for (slot, language) in top.iter().enumerate() {
        let y = 548 + slot as i32 * 22;
        let full_width = 320_u64;
        let width = if max_size == 0 {
            0
        } else {
            (language.size * full_width / max_size).max(2) as u32
        };

        elements.push(CardElement::Text {
            x:       24,
            y,
            size:    13,
            color:   TEXT_PRIMARY.to_owned(),
            content: language.name.clone()
        });
        elements.push(CardElement::Rect {
            x: 160,
            y: y + 2,
            width,
            height: 12,
            fill: language
                .color
                .clone()
                .unwrap_or_else(|| LANGUAGE_FALLBACK_COLOR.to_owned())
        });
    }

    CardLayout {
        width: CARD_WIDTH,
        height: CARD_HEIGHT,
        background: BACKGROUND.to_owned(),
        elements
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Days, NaiveDate};

    use super::{CARD_HEIGHT, CARD_WIDTH, CardElement, CardInputs, build_card_layout};
    use crate::{
        contributions::ContributionMap,
        languages::LanguageUsage,
        stats::{build_cumulative_series, build_daily_series, compute_stats}
    };

    fn sample_map() -> ContributionMap {
        let base: NaiveDate = "2024-01-01".parse().expect("valid date");
        (0..10u64).map(|offset| (base + Days::new(offset), (offset % 4) as u32)).collect()
    }

    fn sample_languages() -> Vec<LanguageUsage> {
        vec![
            LanguageUsage {
                name:  "Rust".to_owned(),
                size:  4000,
                color: Some("#dea584".to_owned())
            },
            LanguageUsage {
                name:  "Shell".to_owned(),
                size:  1000,
                color: None
            },
        ]
    }

    fn layout_for(map: &ContributionMap, languages: &[LanguageUsage]) -> super::CardLayout {
        let stats = compute_stats(map, 100);
        let daily = build_daily_series(map);
        let cumulative = build_cumulative_series(&daily);
        build_card_layout(&CardInputs {
            username: "octocat",
            year: 2024,
            stats: &stats,
            daily: &daily,
            cumulative: &cumulative,
            languages,
            total_stars: 42,
            avatar_url: Some("https://example.com/a.png")
        })
    }

    #[test]
    fn layout_has_fixed_logical_dimensions() {
        let layout = layout_for(&sample_map(), &sample_languages());
        assert_eq!(layout.width, CARD_WIDTH);
        assert_eq!(layout.height, CARD_HEIGHT);
        assert_eq!(layout.background, "#ffffff");
    }

    #[test]
    fn layout_carries_avatar_url_through() {
        let layout = layout_for(&sample_map(), &sample_languages());
        let avatar = layout
            .elements
            .iter()
            .find_map(|element| match element {
                CardElement::Avatar {
                    url, ..
                } => Some(url.clone()),
                _ => None
            })
            .expect("expected avatar element");

        assert_eq!(avatar.as_deref(), Some("https://example.com/a.png"));
    }

    #[test]
    fn bar_chart_values_match_daily_series() {
        let map = sample_map();
        let layout = layout_for(&map, &sample_languages());
        let daily = build_daily_series(&map);

        let bars = layout
            .elements
            .iter()
            .find_map(|element| match element {
                CardElement::BarChart {
                    values, ..
                } => Some(values.clone()),
                _ => None
            })
            .expect("expected bar chart element");

        let expected: Vec<u32> = daily.iter().map(|p| p.contributions).collect();
        assert_eq!(bars, expected);
    }

    #[test]
    fn line_chart_values_are_cumulative() {
        let layout = layout_for(&sample_map(), &sample_languages());

        let line = layout
            .elements
            .iter()
            .find_map(|element| match element {
                CardElement::LineChart {
                    values, ..
                } => Some(values.clone()),
                _ => None
            })
            .expect("expected line chart element");

        for window in line.windows(2) {
            assert!(window[1] >= window[0]);
        }
    }

    #[test]
    fn language_without_color_falls_back_to_neutral_swatch() {
        let layout = layout_for(&sample_map(), &sample_languages());

        let fills: Vec<String> = layout
            .elements
            .iter()
            .filter_map(|element| match element {
                CardElement::Rect {
                    fill, ..
                } if fill != "#f6f8fa" => Some(fill.clone()),
                _ => None
            })
            .collect();

        assert!(fills.contains(&"#dea584".to_owned()));
        assert!(fills.contains(&"#8b949e".to_owned()));
    }

    #[test]
    fn layout_caps_language_rows_at_five() {
        let languages: Vec<LanguageUsage> = (0..8)
            .map(|i| LanguageUsage {
                name:  format!("lang-{i}"),
                size:  1000 - i,
                color: None
            })
            .collect();

        let layout = layout_for(&sample_map(), &languages);
        let language_labels = layout
            .elements
            .iter()
            .filter(|element| {
                matches!(element, CardElement::Text { content, .. } if content.starts_with("lang-"))
            })
            .count();

        assert_eq!(language_labels, 5);
    }

    #[test]
    fn degenerate_inputs_still_produce_a_layout() {
        let layout = layout_for(&ContributionMap::new(), &[]);

        let bars = layout.elements.iter().find_map(|element| match element {
            CardElement::BarChart {
                values, ..
            } => Some(values.len()),
            _ => None
        });
        assert_eq!(bars, Some(0));
    }

    #[test]
    fn layout_is_deterministic() {
        let map = sample_map();
        let languages = sample_languages();
        assert_eq!(layout_for(&map, &languages), layout_for(&map, &languages));
    }

    #[test]
    fn layout_serializes_with_kind_tags() {
        let layout = layout_for(&sample_map(), &sample_languages());
        let json = serde_json::to_string(&layout).expect("serialization failed");

        assert!(json.contains("\"kind\":\"avatar\""));
        assert!(json.contains("\"kind\":\"bar_chart\""));
        assert!(json.contains("\"kind\":\"line_chart\""));
    }
}
