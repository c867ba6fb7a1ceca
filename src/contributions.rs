// SPDX-License-Identifier: MIT

//! Contribution calendar aggregation for a single user and year.
//!
//! Fetches the GraphQL contribution calendar, then flattens the nested
//! week/day arrays into a date-keyed map suitable for statistics and
//! charting. The upstream-reported total is carried through verbatim and is
//! authoritative even if it disagrees with the sum of the map.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{client::GithubClient, error::Error};

/// GraphQL document requesting a full-year contribution calendar.
const CONTRIBUTIONS_QUERY: &str = r"
query($login: String!, $from: DateTime!, $to: DateTime!) {
  user(login: $login) {
    avatarUrl
    contributionsCollection(from: $from, to: $to) {
      contributionCalendar {
        totalContributions
        weeks {
          contributionDays {
            contributionCount
            date
          }
        }
      }
    }
  }
}";

/// Date-keyed lookup of daily contribution counts.
///
/// Keys are unique calendar dates; the ordered map keeps chronological
/// iteration cheap for the series builders.
pub type ContributionMap = BTreeMap<NaiveDate, u32>;

/// Single day within the upstream contribution calendar.
#[derive(Debug, Clone, Deserialize)]
pub struct CalendarDay {
    /// Number of contributions recorded on this date.
    #[serde(rename = "contributionCount")]
    pub contribution_count: u32,
    /// Calendar date of the entry.
    pub date: NaiveDate
}

/// Week grouping as reported upstream; discarded during normalization.
#[derive(Debug, Clone, Deserialize)]
pub struct CalendarWeek {
    /// Days belonging to this week.
    #[serde(rename = "contributionDays")]
    pub contribution_days: Vec<CalendarDay>
}

/// Raw contribution calendar as returned by the GraphQL endpoint.
#[derive(Debug, Clone)]
pub struct RawContributions {
    /// Avatar URL of the queried user, embedded in the exported card.
    pub avatar_url:          Option<String>,
    /// Total contributions as reported upstream.
    pub total_contributions: u32,
    /// Nested week/day groupings.
    pub weeks:               Vec<CalendarWeek>
}

/// Normalized contribution summary consumed by the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContributionSummary {
    /// Upstream-reported total; authoritative over the map sum.
    pub total_contributions: u32,
    /// Flat date-keyed contribution counts.
    pub contribution_map:    ContributionMap
}

#[derive(Debug, Deserialize)]
struct UserEnvelope {
    user: Option<UserNode>
}

#[derive(Debug, Deserialize)]
struct UserNode {
    #[serde(rename = "avatarUrl")]
    avatar_url: Option<String>,
    #[serde(rename = "contributionsCollection")]
    contributions_collection: ContributionsCollection
}

#[derive(Debug, Deserialize)]
struct ContributionsCollection {
    #[serde(rename = "contributionCalendar")]
    contribution_calendar: Calendar
}

#[derive(Debug, Deserialize)]
struct Calendar {
    #[serde(rename = "totalContributions")]
    total_contributions: u32,
    weeks: Vec<CalendarWeek>
}

/// Builds the GraphQL payload for a full-year contribution calendar.
///
/// The range spans Jan 1 00:00:00Z through Dec 31 23:59:59Z of the target
/// year.
pub fn contribution_query(username: &str, year: i32) -> serde_json::Value {
    serde_json::json!({
        "query": CONTRIBUTIONS_QUERY,
        "variables": {
            "login": username,
            "from": format!("{year}-01-01T00:00:00Z"),
            "to": format!("{year}-12-31T23:59:59Z"),
        }
    })
}

/// Fetches the contribution calendar for a user and year.
///
/// A single attempt is made; any transport failure or GraphQL error is
/// surfaced carrying the upstream message. The caller owns user-facing
/// messaging.
///
/// # Arguments
///
/// * `client` - GitHub client with an injected bearer token
/// * `username` - Account to query, already trimmed by configuration
/// * `year` - Target calendar year
///
/// # Errors
///
/// Returns [`Error::Upstream`](Error::Upstream) when the query fails or the
/// user does not exist, and [`Error::Validation`](Error::Validation) when no
/// token is configured.
pub async fn fetch_contributions(
    client: &GithubClient,
    username: &str,
    year: i32
) -> Result<RawContributions, Error> {
    debug!("Fetching {} contribution calendar for {}", year, username);

    let data = client.graphql(&contribution_query(username, year)).await?;
    let raw = parse_contributions(data)?;

    info!(
        "Fetched {} contributions across {} weeks for {}",
        raw.total_contributions,
        raw.weeks.len(),
        username
    );

    Ok(raw)
}

/// Decodes the `data` portion of the contribution query response.
///
/// # Errors
///
/// Returns [`Error::Upstream`](Error::Upstream) when the user is missing or
/// the payload does not match the documented schema.
pub fn parse_contributions(data: serde_json::Value) -> Result<RawContributions, Error> {
    let envelope: UserEnvelope = serde_json::from_value(data)
        .map_err(|e| Error::upstream(format!("unexpected contribution calendar shape: {e}")))?;

    let user = envelope
        .user
        .ok_or_else(|| Error::upstream("user not found"))?;
    let calendar = user.contributions_collection.contribution_calendar;

    Ok(RawContributions {
        avatar_url:          user.avatar_url,
        total_contributions: calendar.total_contributions,
        weeks:               calendar.weeks
    })
}

/// Flattens the nested week/day arrays into a date-keyed summary.
///
/// Pure and idempotent: the week grouping is discarded, keys are unique
/// dates, and the upstream total is preserved unchanged.
pub fn normalize_contributions(raw: &RawContributions) -> ContributionSummary {
    let mut contribution_map = ContributionMap::new();
    for week in &raw.weeks {
        for day in &week.contribution_days {
            contribution_map.insert(day.date, day.contribution_count);
        }
    }

    ContributionSummary {
        total_contributions: raw.total_contributions,
        contribution_map
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{
        CalendarDay, CalendarWeek, RawContributions, contribution_query, normalize_contributions,
        parse_contributions
    };
    use crate::error::Error;

    fn date(text: &str) -> NaiveDate {
        text.parse().expect("valid date")
    }

    fn day(text: &str, count: u32) -> CalendarDay {
        CalendarDay {
            contribution_count: count,
            date:               date(text)
        }
    }

    fn raw_fixture() -> RawContributions {
        RawContributions {
            avatar_url:          Some("https://example.com/avatar.png".to_owned()),
            total_contributions: 10,
            weeks:               vec![
                CalendarWeek {
                    contribution_days: vec![day("2024-01-01", 3), day("2024-01-02", 0)]
                },
                CalendarWeek {
                    contribution_days: vec![day("2024-01-03", 7)]
                },
            ]
        }
    }

    #[test]
    fn normalize_flattens_weeks_into_date_keyed_map() {
        let summary = normalize_contributions(&raw_fixture());

        assert_eq!(summary.contribution_map.len(), 3);
        assert_eq!(summary.contribution_map[&date("2024-01-01")], 3);
        assert_eq!(summary.contribution_map[&date("2024-01-02")], 0);
        assert_eq!(summary.contribution_map[&date("2024-01-03")], 7);
    }

    #[test]
    fn normalize_key_count_matches_total_days_across_weeks() {
        let raw = raw_fixture();
        let total_days: usize = raw.weeks.iter().map(|w| w.contribution_days.len()).sum();

        let summary = normalize_contributions(&raw);
        assert_eq!(summary.contribution_map.len(), total_days);
    }

    #[test]
    fn normalize_preserves_upstream_total_even_when_map_sum_disagrees() {
        let mut raw = raw_fixture();
        raw.total_contributions = 999;

        let summary = normalize_contributions(&raw);
        assert_eq!(summary.total_contributions, 999);

        let map_sum: u32 = summary.contribution_map.values().sum();
        assert_ne!(map_sum, summary.total_contributions);
    }

    #[test]
    fn normalize_is_idempotent() {
        let raw = raw_fixture();
        assert_eq!(normalize_contributions(&raw), normalize_contributions(&raw));
    }

    #[test]
    fn normalize_handles_empty_calendar() {
        let raw = RawContributions {
            avatar_url:          None,
            total_contributions: 0,
            weeks:               Vec::new()
        };

        let summary = normalize_contributions(&raw);
        assert_eq!(summary.total_contributions, 0);
        assert!(summary.contribution_map.is_empty());
    }

    #[test]
    fn contribution_query_spans_the_full_year() {
        let payload = contribution_query("octocat", 2024);
        let variables = &payload["variables"];

        assert_eq!(variables["login"], "octocat");
        assert_eq!(variables["from"], "2024-01-01T00:00:00Z");
        assert_eq!(variables["to"], "2024-12-31T23:59:59Z");
    }

    #[test]
    fn parse_contributions_decodes_documented_shape() {
        let data = serde_json::json!({
            "user": {
                "avatarUrl": "https://example.com/a.png",
                "contributionsCollection": {
                    "contributionCalendar": {
                        "totalContributions": 42,
                        "weeks": [
                            {"contributionDays": [
                                {"contributionCount": 2, "date": "2024-03-04"},
                                {"contributionCount": 5, "date": "2024-03-05"}
                            ]}
                        ]
                    }
                }
            }
        });

        let raw = parse_contributions(data).expect("expected parse success");
        assert_eq!(raw.total_contributions, 42);
        assert_eq!(raw.avatar_url.as_deref(), Some("https://example.com/a.png"));
        assert_eq!(raw.weeks.len(), 1);
        assert_eq!(raw.weeks[0].contribution_days[1].contribution_count, 5);
    }

    #[test]
    fn parse_contributions_reports_missing_user() {
        let data = serde_json::json!({ "user": null });
        let error = parse_contributions(data).expect_err("expected upstream error");

        match error {
            Error::Upstream {
                message
            } => {
                assert_eq!(message, "user not found");
            }
            other => panic!("expected upstream error, got {other:?}")
        }
    }

    #[test]
    fn parse_contributions_rejects_unexpected_shape() {
        let data = serde_json::json!({ "user": {"avatarUrl": 7} });
        let error = parse_contributions(data).expect_err("expected upstream error");
        assert!(matches!(error, Error::Upstream { .. }));
    }

    #[test]
    fn summary_serializes_dates_as_iso_keys() {
        let summary = normalize_contributions(&raw_fixture());
        let json = serde_json::to_string(&summary).expect("serialization failed");

        assert!(json.contains("\"2024-01-01\":3"));
        assert!(json.contains("\"total_contributions\":10"));
    }
}
