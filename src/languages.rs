// SPDX-License-Identifier: MIT

//! Repository language aggregation.
//!
//! Two independent ranking policies live here and must stay separate: the
//! GraphQL path weighs languages by summed byte size across repositories,
//! while the REST path counts how many repositories name a language as their
//! primary one. Both produce descending rankings with stable first-encounter
//! tie-breaks.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{client::GithubClient, error::Error};

/// Upper bound on repositories fetched per user; repositories beyond the cap
/// are silently excluded as an accepted scope limit.
const REPOSITORY_CAP: u8 = 100;
/// Languages fetched per repository in the GraphQL query.
const LANGUAGES_PER_REPOSITORY: u8 = 10;
/// Entries kept by the repo-count ranking.
const TOP_LANGUAGE_LIMIT: usize = 5;

/// GraphQL document requesting owner-affiliated, non-fork repositories with
/// their language byte sizes.
const REPOSITORIES_QUERY: &str = r"
query($login: String!, $repoCount: Int!, $languageCount: Int!) {
  user(login: $login) {
    repositories(first: $repoCount, isFork: false, ownerAffiliations: OWNER) {
      nodes {
        name
        stargazers {
          totalCount
        }
        languages(first: $languageCount, orderBy: {field: SIZE, direction: DESC}) {
          edges {
            size
            node {
              name
              color
            }
          }
        }
      }
    }
  }
}";

/// Aggregated byte-size weight for a single language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LanguageUsage {
    /// Language name as reported upstream.
    pub name:  String,
    /// Summed byte size across all fetched repositories.
    pub size:  u64,
    /// Display color from the first repository that reported one.
    pub color: Option<String>
}

/// Per-repository detail retained alongside the ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepoDetail {
    /// Repository name.
    pub name:       String,
    /// Stargazer count at fetch time.
    pub star_count: u32,
    /// Language names in upstream (size-descending) order.
    pub languages:  Vec<String>
}

/// Byte-size ranking together with the per-repository details it was built
/// from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LanguageBreakdown {
    /// Retained per-repository details.
    pub repos:  Vec<RepoDetail>,
    /// Languages ranked descending by summed byte size.
    pub ranked: Vec<LanguageUsage>
}

/// Raw repository node from the GraphQL response.
#[derive(Debug, Clone, Deserialize)]
pub struct RepoNode {
    /// Repository name.
    pub name:       String,
    /// Stargazer connection.
    pub stargazers: StargazerCount,
    /// Language connection; absent for empty repositories.
    #[serde(default)]
    pub languages:  Option<LanguageConnection>
}

/// Stargazer count wrapper.
#[derive(Debug, Clone, Deserialize)]
pub struct StargazerCount {
    /// Total stargazers.
    #[serde(rename = "totalCount")]
    pub total_count: u32
}

/// Language edge list for one repository.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LanguageConnection {
    /// Weighted language edges.
    #[serde(default)]
    pub edges: Vec<LanguageEdge>
}

/// Weighted edge between a repository and a language.
#[derive(Debug, Clone, Deserialize)]
pub struct LanguageEdge {
    /// Bytes of code written in this language.
    pub size: u64,
    /// Language descriptor.
    pub node: LanguageNode
}

/// Language descriptor.
#[derive(Debug, Clone, Deserialize)]
pub struct LanguageNode {
    /// Language name.
    pub name:  String,
    /// Display color assigned by GitHub.
    pub color: Option<String>
}

/// Repository entry from the unauthenticated REST listing.
#[derive(Debug, Clone, Deserialize)]
pub struct RepoListing {
    /// Primary language, absent for repositories GitHub cannot classify.
    pub language: Option<String>
}

#[derive(Debug, Deserialize)]
struct UserEnvelope {
    user: Option<UserNode>
}

#[derive(Debug, Deserialize)]
struct UserNode {
    repositories: RepositoryConnection
}

#[derive(Debug, Deserialize)]
struct RepositoryConnection {
    #[serde(default)]
    nodes: Vec<RepoNode>
}

/// Builds the GraphQL payload for the repository language query.
pub fn repository_query(username: &str) -> serde_json::Value {
    serde_json::json!({
        "query": REPOSITORIES_QUERY,
        "variables": {
            "login": username,
            "repoCount": REPOSITORY_CAP,
            "languageCount": LANGUAGES_PER_REPOSITORY,
        }
    })
}

/// Fetches up to 100 non-fork, owner-affiliated repositories with up to 10
/// languages each.
///
/// Single attempt, no retry; failures carry the upstream message.
///
/// # Errors
///
/// Returns [`Error::Upstream`](Error::Upstream) when the query fails or the
/// user does not exist, and [`Error::Validation`](Error::Validation) when no
/// token is configured.
pub async fn fetch_repository_languages(
    client: &GithubClient,
    username: &str
) -> Result<Vec<RepoNode>, Error> {
    debug!("Fetching repository languages for {}", username);

    let data = client.graphql(&repository_query(username)).await?;
    let repos = parse_repositories(data)?;

    info!("Fetched {} repositories for {}", repos.len(), username);
    Ok(repos)
}

/// Decodes the `data` portion of the repository query response.
///
/// # Errors
///
/// Returns [`Error::Upstream`](Error::Upstream) when the user is missing or
/// the payload does not match the documented schema.
pub fn parse_repositories(data: serde_json::Value) -> Result<Vec<RepoNode>, Error> {
    let envelope: UserEnvelope = serde_json::from_value(data)
        .map_err(|e| Error::upstream(format!("unexpected repository listing shape: {e}")))?;

    let user = envelope
        .user
        .ok_or_else(|| Error::upstream("user not found"))?;

    Ok(user.repositories.nodes)
}

/// Ranks languages by summed byte size across repositories.
///
/// Pure transform: extracts a [`RepoDetail`] per repository, accumulates a
/// language name to byte-size mapping, and sorts descending. Languages with
/// equal size keep their first-encountered relative order.
pub fn rank_languages(repos: &[RepoNode]) -> LanguageBreakdown {
    let mut details = Vec::with_capacity(repos.len());
    let mut ranked: Vec<LanguageUsage> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for repo in repos {
        let edges = repo
            .languages
            .as_ref()
            .map(|connection| connection.edges.as_slice())
            .unwrap_or_default();

        let mut names = Vec::with_capacity(edges.len());
        for edge in edges {
            names.push(edge.node.name.clone());

            match index.get(&edge.node.name) {
                Some(&slot) => {
                    ranked[slot].size += edge.size;
                    if ranked[slot].color.is_none() {
                        ranked[slot].color = edge.node.color.clone();
                    }
                }
                None => {
                    index.insert(edge.node.name.clone(), ranked.len());
                    ranked.push(LanguageUsage {
                        name:  edge.node.name.clone(),
                        size:  edge.size,
                        color: edge.node.color.clone()
                    });
                }
            }
        }

        details.push(RepoDetail {
            name:       repo.name.clone(),
            star_count: repo.stargazers.total_count,
            languages:  names
        });
    }

    // sort_by is stable, so equal sizes keep accumulation order.
    ranked.sort_by(|a, b| b.size.cmp(&a.size));

    LanguageBreakdown {
        repos: details,
        ranked
    }
}

/// Sums stargazers across the fetched repositories.
pub fn total_stars(repos: &[RepoDetail]) -> u64 {
    repos.iter().map(|repo| u64::from(repo.star_count)).sum()
}

/// Fetches the top languages weighted by repository count.
///
/// Uses the unauthenticated REST listing and counts how many repositories
/// report each primary language. This is a deliberately separate aggregation
/// policy from [`rank_languages`] and must not be collapsed into it.
///
/// # Errors
///
/// Returns [`Error::Upstream`](Error::Upstream) when the listing request
/// fails.
pub async fn fetch_top_languages_by_repo_count(
    client: &GithubClient,
    username: &str
) -> Result<Vec<(String, u32)>, Error> {
    debug!("Fetching repository listing for {}", username);

    let listings: Vec<RepoListing> = client
        .rest_get(&format!("/users/{username}/repos?per_page={REPOSITORY_CAP}"))
        .await?;

    info!("Fetched {} listed repositories for {}", listings.len(), username);
    Ok(count_primary_languages(&listings))
}

/// Counts repositories per primary language and keeps the top five.
///
/// Repositories without a primary language are excluded. Ties keep
/// first-encounter order.
pub fn count_primary_languages(listings: &[RepoListing]) -> Vec<(String, u32)> {
    let mut counts: Vec<(String, u32)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for listing in listings {
        let Some(language) = listing.language.as_deref() else {
            continue;
        };

        match index.get(language) {
            Some(&slot) => counts[slot].1 += 1,
            None => {
                index.insert(language.to_owned(), counts.len());
                counts.push((language.to_owned(), 1));
            }
        }
    }

    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.truncate(TOP_LANGUAGE_LIMIT);
    counts
}

#[cfg(test)]
mod tests {
    use super::{
        LanguageConnection, LanguageEdge, LanguageNode, RepoListing, RepoNode, StargazerCount,
        count_primary_languages, parse_repositories, rank_languages, repository_query,
        total_stars
    };
    use crate::error::Error;

    fn edge(name: &str, size: u64, color: Option<&str>) -> LanguageEdge {
        LanguageEdge {
            size,
            node: LanguageNode {
                name:  name.to_owned(),
                color: color.map(ToOwned::to_owned)
            }
        }
    }

    fn repo(name: &str, stars: u32, edges: Vec<LanguageEdge>) -> RepoNode {
        RepoNode {
            name:       name.to_owned(),
            stargazers: StargazerCount {
                total_count: stars
            },
            languages:  Some(LanguageConnection {
                edges
            })
        }
    }

    fn listing(language: Option<&str>) -> RepoListing {
        RepoListing {
            language: language.map(ToOwned::to_owned)
        }
    }

    #[test]
    fn rank_languages_sorts_descending_by_summed_size() {
        let repos = vec![
            repo("alpha", 1, vec![edge("Rust", 500, Some("#dea584")), edge("Go", 100, None)]),
            repo("beta", 2, vec![edge("Go", 900, Some("#00add8"))]),
        ];

        let breakdown = rank_languages(&repos);
        let names: Vec<_> = breakdown.ranked.iter().map(|l| l.name.as_str()).collect();

        assert_eq!(names, ["Go", "Rust"]);
        assert_eq!(breakdown.ranked[0].size, 1000);
        assert_eq!(breakdown.ranked[1].size, 500);
    }

    #[test]
    fn rank_languages_breaks_ties_by_first_encounter() {
        let repos = vec![
            repo("alpha", 0, vec![edge("TypeScript", 300, None)]),
            repo("beta", 0, vec![edge("Python", 300, None)]),
        ];

        let breakdown = rank_languages(&repos);
        let names: Vec<_> = breakdown.ranked.iter().map(|l| l.name.as_str()).collect();

        assert_eq!(names, ["TypeScript", "Python"]);
    }

    #[test]
    fn rank_languages_keeps_first_reported_color() {
        let repos = vec![
            repo("alpha", 0, vec![edge("Rust", 100, None)]),
            repo("beta", 0, vec![edge("Rust", 100, Some("#dea584"))]),
        ];

        let breakdown = rank_languages(&repos);
        assert_eq!(breakdown.ranked[0].color.as_deref(), Some("#dea584"));
    }

    #[test]
    fn rank_languages_retains_per_repo_details() {
        let repos = vec![repo(
            "alpha",
            7,
            vec![edge("Rust", 500, None), edge("Shell", 20, None)]
        )];

        let breakdown = rank_languages(&repos);
        assert_eq!(breakdown.repos.len(), 1);
        assert_eq!(breakdown.repos[0].name, "alpha");
        assert_eq!(breakdown.repos[0].star_count, 7);
        assert_eq!(breakdown.repos[0].languages, ["Rust", "Shell"]);
    }

    #[test]
    fn rank_languages_handles_empty_input() {
        let breakdown = rank_languages(&[]);
        assert!(breakdown.repos.is_empty());
        assert!(breakdown.ranked.is_empty());
    }

    #[test]
    fn rank_languages_handles_repositories_without_languages() {
        let mut bare = repo("bare", 3, Vec::new());
        bare.languages = None;

        let breakdown = rank_languages(&[bare]);
        assert_eq!(breakdown.repos[0].languages.len(), 0);
        assert!(breakdown.ranked.is_empty());
    }

    #[test]
    fn total_stars_sums_across_repositories() {
        let repos = vec![
            repo("alpha", 5, Vec::new()),
            repo("beta", 12, Vec::new()),
        ];

        let breakdown = rank_languages(&repos);
        assert_eq!(total_stars(&breakdown.repos), 17);
    }

    #[test]
    fn count_primary_languages_counts_and_excludes_null() {
        let listings = vec![
            listing(Some("Go")),
            listing(Some("Go")),
            listing(None),
            listing(Some("Rust")),
        ];

        let top = count_primary_languages(&listings);
        assert_eq!(top, vec![("Go".to_owned(), 2), ("Rust".to_owned(), 1)]);
    }

    #[test]
    fn count_primary_languages_truncates_to_five() {
        let listings: Vec<_> = ["A", "B", "C", "D", "E", "F", "G"]
            .iter()
            .map(|name| listing(Some(name)))
            .collect();

        let top = count_primary_languages(&listings);
        assert_eq!(top.len(), 5);
    }

    #[test]
    fn count_primary_languages_breaks_ties_by_first_encounter() {
        let listings = vec![listing(Some("Zig")), listing(Some("Nim"))];

        let top = count_primary_languages(&listings);
        assert_eq!(top[0].0, "Zig");
        assert_eq!(top[1].0, "Nim");
    }

    #[test]
    fn repository_query_caps_repositories_and_languages() {
        let payload = repository_query("octocat");
        let variables = &payload["variables"];

        assert_eq!(variables["login"], "octocat");
        assert_eq!(variables["repoCount"], 100);
        assert_eq!(variables["languageCount"], 10);
    }

    #[test]
    fn parse_repositories_decodes_documented_shape() {
        let data = serde_json::json!({
            "user": {
                "repositories": {
                    "nodes": [
                        {
                            "name": "alpha",
                            "stargazers": {"totalCount": 4},
                            "languages": {"edges": [
                                {"size": 1200, "node": {"name": "Rust", "color": "#dea584"}}
                            ]}
                        }
                    ]
                }
            }
        });

        let repos = parse_repositories(data).expect("expected parse success");
        assert_eq!(repos.len(), 1);
        assert_eq!(repos[0].name, "alpha");
        assert_eq!(repos[0].stargazers.total_count, 4);
    }

    #[test]
    fn parse_repositories_reports_missing_user() {
        let data = serde_json::json!({ "user": null });
        let error = parse_repositories(data).expect_err("expected upstream error");
        assert!(matches!(error, Error::Upstream { .. }));
    }
}
