// crates/tracker-services/src/github.rs

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use tracker_core::{
    AppError, ConfigError, GitHubConfig, GitHubError, NetworkError, ReqwestErrorExt, SyncConfig,
};
use url::Url;

use crate::gateway::{FetchGateway, FetchRequest};
use crate::issue::{Comment, IssueKind, IssueRecord};
use crate::retry::{with_retry, RetryConfig};

/// GitHub caps `per_page` at this value.
pub const GITHUB_MAX_PER_PAGE: u32 = 100;
const SOURCE_NAME: &str = "GitHub";

/// GitHub issue as returned by the issues and search endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubIssue {
    pub id: i64,
    pub number: i64,
    pub title: String,
    pub body: Option<String>,
    pub state: String,
    pub html_url: String,
    #[serde(default)]
    pub labels: Vec<GitHubLabel>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    /// Present only when the "issue" is really a pull request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pull_request: Option<serde_json::Value>,
}

/// GitHub label
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubLabel {
    pub name: String,
    #[serde(default)]
    pub color: String,
}

/// GitHub issue comment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubComment {
    pub id: i64,
    pub user: Option<GitHubUser>,
    pub body: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubUser {
    pub login: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PageWindow {
    per_page: u32,
    first_page: u32,
    last_page: u32,
    skip: usize,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<GitHubIssue>,
}

impl GitHubIssue {
    fn into_record(self) -> IssueRecord {
        let kind = IssueKind::from_labels(self.labels.iter().map(|l| l.name.as_str()));
        IssueRecord {
            id: self.number.to_string(),
            title: self.title,
            description: self.body,
            url: Some(self.html_url),
            created_at: self.created_at,
            updated_at: self.updated_at,
            comments: None,
            repository_source: SOURCE_NAME.to_string(),
            is_closed: self.state.eq_ignore_ascii_case("closed"),
            kind,
        }
    }
}

impl From<GitHubComment> for Comment {
    fn from(comment: GitHubComment) -> Self {
        Comment {
            author: comment
                .user
                .map(|u| u.login)
                .unwrap_or_else(|| "ghost".to_string()),
            text: comment.body.unwrap_or_default(),
            created_at: comment.created_at,
        }
    }
}

/// Issue gateway backed by the GitHub REST API
#[derive(Debug, Clone)]
pub struct GitHubIssueGateway {
    base_url: Url,
    client: Arc<Client>,
    token: Option<String>,
    owner: String,
    repo: String,
    retry: RetryConfig,
}

impl GitHubIssueGateway {
    /// Create a gateway for one repository.
    pub fn new(
        base_url: &str,
        owner: impl Into<String>,
        repo: impl Into<String>,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Network(e.into_network_error()))?;

        // Url::join drops the last path segment unless it ends in '/'
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        let base_url = Url::parse(&normalized)
            .map_err(|e| ConfigError::Invalid(format!("github.api_url: {}", e)))?;

        Ok(Self {
            base_url,
            client: Arc::new(client),
            token,
            owner: owner.into(),
            repo: repo.into(),
            retry: RetryConfig::default(),
        })
    }

    /// Build from the `[github]` and `[sync]` config sections.
    pub fn from_config(github: &GitHubConfig, sync: &SyncConfig) -> Result<Self, AppError> {
        if !github.is_configured() {
            return Err(ConfigError::MissingSetting("github.owner / github.repo".into()).into());
        }
        let gateway = Self::new(
            &github.api_url,
            github.owner.trim(),
            github.repo.trim(),
            github.effective_token(),
            Duration::from_secs(sync.request_timeout_secs),
        )?;
        let retry = RetryConfig {
            max_retries: sync.max_retries,
            ..RetryConfig::default()
        };
        Ok(gateway.with_retry_config(retry))
    }

    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    /// Build request with auth headers
    fn build_request(&self, req: reqwest::RequestBuilder, force: bool) -> reqwest::RequestBuilder {
        let mut req = req
            .header(header::ACCEPT, "application/vnd.github+json")
            .header(header::USER_AGENT, "issuetracker")
            .header("X-GitHub-Api-Version", "2022-11-28");
        if let Some(token) = &self.token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        if force {
            req = req.header(header::CACHE_CONTROL, "no-cache");
        }
        req
    }

    /// Check response status and map failures onto the error hierarchy
    async fn check_response(&self, response: reqwest::Response) -> Result<reqwest::Response, AppError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let remaining = response
            .headers()
            .get("x-ratelimit-remaining")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let reset_time = response
            .headers()
            .get("x-ratelimit-reset")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
            .to_string();

        let error = match status.as_u16() {
            401 => GitHubError::Unauthorized,
            429 => GitHubError::RateLimited { reset_time },
            403 if remaining.as_deref() == Some("0") => GitHubError::RateLimited { reset_time },
            403 => GitHubError::Forbidden,
            404 => GitHubError::RepoNotFound {
                owner: self.owner.clone(),
                repo: self.repo.clone(),
            },
            code => GitHubError::ApiError {
                status: code,
                message: response.text().await.unwrap_or_default(),
            },
        };
        Err(error.into())
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, AppError> {
        response
            .json::<T>()
            .await
            .map_err(|e| AppError::Network(NetworkError::InvalidResponse(e.to_string())))
    }

    /// Map an offset/limit window onto GitHub's 1-based fixed-size pages.
    ///
    /// Returns the page size, the first and last page covering the window,
    /// and how many items of the first page fall before `offset`.
    fn page_window(request: &FetchRequest) -> PageWindow {
        let per_page = request.limit.clamp(1, GITHUB_MAX_PER_PAGE);
        let end = request.offset.saturating_add(request.limit.max(1)) - 1;
        PageWindow {
            per_page,
            first_page: request.offset / per_page + 1,
            last_page: end / per_page + 1,
            skip: (request.offset % per_page) as usize,
        }
    }

    /// Fetch one raw page, from the search API when a query is given.
    async fn fetch_page(
        &self,
        request: &FetchRequest,
        per_page: u32,
        page: u32,
    ) -> Result<Vec<GitHubIssue>, AppError> {
        let per_page_s = per_page.to_string();
        let page_s = page.to_string();

        match request.query.as_deref() {
            None => {
                let url = self
                    .base_url
                    .join(&format!("repos/{}/{}/issues", self.owner, self.repo))
                    .map_err(|e| GitHubError::message(e.to_string()))?;
                let response = with_retry(&self.retry, || {
                    self.build_request(
                        self.client.get(url.clone()).query(&[
                            ("state", "all"),
                            ("sort", "updated"),
                            ("per_page", per_page_s.as_str()),
                            ("page", page_s.as_str()),
                        ]),
                        request.force,
                    )
                    .send()
                })
                .await?;
                let response = self.check_response(response).await?;
                Self::decode(response).await
            }
            Some(query) => {
                let url = self
                    .base_url
                    .join("search/issues")
                    .map_err(|e| GitHubError::message(e.to_string()))?;
                let q = format!("{} repo:{}/{} is:issue", query, self.owner, self.repo);
                let response = with_retry(&self.retry, || {
                    self.build_request(
                        self.client.get(url.clone()).query(&[
                            ("q", q.as_str()),
                            ("per_page", per_page_s.as_str()),
                            ("page", page_s.as_str()),
                        ]),
                        request.force,
                    )
                    .send()
                })
                .await?;
                let response = self.check_response(response).await?;
                let search: SearchResponse = Self::decode(response).await?;
                Ok(search.items)
            }
        }
    }

    /// List the issues in the request's offset/limit window.
    ///
    /// Offsets count positions in GitHub's listing, where pull requests take
    /// slots too; they are dropped after the window is cut, so a page holding
    /// pull requests comes back shorter than `limit`.
    #[instrument(skip(self), level = "info")]
    pub async fn list_issues(&self, request: &FetchRequest) -> Result<Vec<IssueRecord>, AppError> {
        if request.limit == 0 {
            return Ok(Vec::new());
        }

        let window = Self::page_window(request);
        let mut raw: Vec<GitHubIssue> = Vec::new();
        for page in window.first_page..=window.last_page {
            let items = self.fetch_page(request, window.per_page, page).await?;
            let short = items.len() < window.per_page as usize;
            raw.extend(items);
            if short {
                break;
            }
        }

        let issues: Vec<IssueRecord> = raw
            .into_iter()
            .skip(window.skip)
            .take(request.limit as usize)
            .filter(|issue| issue.pull_request.is_none())
            .map(GitHubIssue::into_record)
            .collect();

        tracing::info!("Fetched {} issues from {}", issues.len(), self.full_name());
        Ok(issues)
    }

    /// Fetch the comment thread of an issue by number
    #[instrument(skip(self), level = "info")]
    pub async fn list_comments(&self, number: u64) -> Result<Vec<Comment>, AppError> {
        let url = self
            .base_url
            .join(&format!(
                "repos/{}/{}/issues/{}/comments",
                self.owner, self.repo, number
            ))
            .map_err(|e| GitHubError::message(e.to_string()))?;

        let response = with_retry(&self.retry, || {
            self.build_request(
                self.client
                    .get(url.clone())
                    .query(&[("per_page", GITHUB_MAX_PER_PAGE.to_string())]),
                false,
            )
            .send()
        })
        .await?;
        let response = self.check_response(response).await?;
        let comments: Vec<GitHubComment> = Self::decode(response).await?;

        tracing::debug!("Fetched {} comments for #{}", comments.len(), number);
        Ok(comments.into_iter().map(Comment::from).collect())
    }
}

#[async_trait]
impl FetchGateway for GitHubIssueGateway {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    async fn get_issues(&self, request: &FetchRequest) -> Result<Vec<IssueRecord>, AppError> {
        self.list_issues(request).await
    }

    async fn get_comments(&self, issue: &IssueRecord) -> Result<Vec<Comment>, AppError> {
        let number: u64 = issue.id.trim_start_matches('#').parse().map_err(|_| {
            AppError::from(GitHubError::message(format!(
                "Not a GitHub issue number: {}",
                issue.id
            )))
        })?;
        self.list_comments(number).await
    }
}
