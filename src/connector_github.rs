//! GitHub repository connector.
//!
//! Lists directories through the GitHub contents API and downloads raw file
//! content from each entry's `download_url`.
//!
//! # Configuration
//!
//! ```toml
//! [github]
//! api_url = "https://api.github.com"
//! timeout_secs = 30
//! ```
//!
//! # Environment Variables
//!
//! - `GITHUB_TOKEN` — optional; sent as a bearer token so private
//!   repositories and higher rate limits are available.
//!
//! # Entry Types
//!
//! | `type` | Handling |
//! |--------|----------|
//! | `file` | listed; downloaded via `download_url` |
//! | `dir` | listed; traversed by the tree fetcher |
//! | `symlink`, `submodule` | ignored |

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::Url;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::config::GithubConfig;
use crate::error::FetchError;
use crate::models::{EntryKind, RepositoryRef, TreeEntry};
use crate::traits::{Listing, RepoSource};

/// [`RepoSource`] backed by the GitHub REST API.
pub struct GitHubSource {
    client: reqwest::Client,
    api_url: String,
    token: Option<String>,
}

impl GitHubSource {
    /// Create a connector; `token` is typically `GITHUB_TOKEN`.
    pub fn new(config: &GithubConfig, token: Option<String>) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| FetchError::Transport {
                path: config.api_url.clone(),
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.trim().is_empty()),
        })
    }

    /// Create a connector reading the token from `GITHUB_TOKEN`.
    pub fn from_env(config: &GithubConfig) -> Result<Self, FetchError> {
        Self::new(config, std::env::var("GITHUB_TOKEN").ok())
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        let req = self
            .client
            .get(url)
            .header(USER_AGENT, concat!("repo-analyzer/", env!("CARGO_PKG_VERSION")))
            .header(ACCEPT, "application/vnd.github+json");
        match &self.token {
            Some(token) => req.header(AUTHORIZATION, format!("Bearer {}", token)),
            None => req,
        }
    }

    async fn get_text(&self, url: &str, path: &str) -> Result<String, FetchError> {
        let response = self.get(url).send().await.map_err(|e| FetchError::Transport {
            path: path.to_string(),
            message: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                path: path.to_string(),
                status: status.as_u16(),
                message: body.trim().to_string(),
            });
        }

        response.text().await.map_err(|e| FetchError::Transport {
            path: path.to_string(),
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl RepoSource for GitHubSource {
    async fn list(&self, repo: &RepositoryRef, path: &str) -> Result<Listing, FetchError> {
        let url = contents_url(&self.api_url, repo, path).map_err(|message| {
            FetchError::Transport {
                path: display_path(path).to_string(),
                message,
            }
        })?;
        debug!("listing {}", url);
        let body = self.get_text(url.as_str(), display_path(path)).await?;
        parse_listing(&body).map_err(|message| FetchError::Payload {
            path: display_path(path).to_string(),
            message,
        })
    }

    async fn fetch(&self, content_ref: &str) -> Result<String, FetchError> {
        self.get_text(content_ref, content_ref).await
    }
}

/// `{api_url}/repos/{owner}/{name}/contents/{path}` with every segment
/// percent-encoded. The root listing keeps its trailing slash.
fn contents_url(api_url: &str, repo: &RepositoryRef, path: &str) -> Result<Url, String> {
    let mut url = Url::parse(api_url).map_err(|e| format!("invalid api_url {}: {}", api_url, e))?;
    url.path_segments_mut()
        .map_err(|_| format!("api_url {} cannot take a path", api_url))?
        .pop_if_empty()
        .extend(["repos", repo.owner.as_str(), repo.name.as_str(), "contents"])
        .extend(path.split('/'));
    Ok(url)
}

fn display_path(path: &str) -> &str {
    if path.is_empty() {
        "/"
    } else {
        path
    }
}

/// One item of a contents API response.
#[derive(Debug, Deserialize)]
struct ContentItem {
    path: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    download_url: Option<String>,
}

impl ContentItem {
    fn into_entry(self) -> Option<TreeEntry> {
        match self.kind.as_str() {
            "file" => self.download_url.map(|url| TreeEntry {
                path: self.path,
                kind: EntryKind::File,
                content_ref: url,
            }),
            "dir" => Some(TreeEntry {
                path: self.path,
                kind: EntryKind::Directory,
                content_ref: String::new(),
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ContentsResponse {
    Directory(Vec<ContentItem>),
    Single(ContentItem),
}

/// Parse a contents API body into a [`Listing`].
fn parse_listing(body: &str) -> Result<Listing, String> {
    let parsed: ContentsResponse = serde_json::from_str(body).map_err(|e| e.to_string())?;
    match parsed {
        ContentsResponse::Directory(items) => Ok(Listing::Directory(
            items.into_iter().filter_map(ContentItem::into_entry).collect(),
        )),
        ContentsResponse::Single(item) => {
            let kind = item.kind.clone();
            item.into_entry()
                .filter(|e| e.kind == EntryKind::File)
                .map(Listing::File)
                .ok_or_else(|| format!("path is a {} without downloadable content", kind))
        }
    }
}
