//! The backend contract the presenter fetches through.

use async_trait::async_trait;
use tracker_core::AppError;

use crate::issue::{Comment, IssueRecord};

/// Issues per page when the caller does not say otherwise.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Parameters of one fetch. Lives only as long as the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Backend filter; `None` lists everything.
    pub query: Option<String>,
    pub offset: u32,
    pub limit: u32,
    /// Bypass any backend-side caching.
    pub force: bool,
}

impl FetchRequest {
    pub fn new(query: Option<String>, offset: u32, limit: u32, force: bool) -> Self {
        Self {
            query: query.filter(|q| !q.trim().is_empty()),
            offset,
            limit,
            force,
        }
    }

    /// First page with the default size.
    pub fn first_page(query: Option<String>, force: bool) -> Self {
        Self::new(query, 0, DEFAULT_PAGE_SIZE, force)
    }
}

/// Async source of issue pages.
///
/// Implementations are called from worker tasks. An absent result is
/// reported as an empty vector.
#[async_trait]
pub trait FetchGateway: Send + Sync {
    /// Label shown as the repository column for issues from this backend.
    fn name(&self) -> &str;

    /// Fetch one page of issues.
    async fn get_issues(&self, request: &FetchRequest) -> Result<Vec<IssueRecord>, AppError>;

    /// Fetch the comment thread of one issue.
    async fn get_comments(&self, issue: &IssueRecord) -> Result<Vec<Comment>, AppError>;
}

/// Gateway over an in-process record set.
///
/// Queries match case-insensitively against id, title and description.
#[derive(Debug, Default)]
pub struct MemoryGateway {
    name: String,
    issues: Vec<IssueRecord>,
}

impl MemoryGateway {
    pub fn new(name: impl Into<String>, issues: Vec<IssueRecord>) -> Self {
        Self {
            name: name.into(),
            issues,
        }
    }

    fn matches(issue: &IssueRecord, needle: &str) -> bool {
        issue.id.to_lowercase().contains(needle)
            || issue.title.to_lowercase().contains(needle)
            || issue
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(needle))
    }
}

#[async_trait]
impl FetchGateway for MemoryGateway {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get_issues(&self, request: &FetchRequest) -> Result<Vec<IssueRecord>, AppError> {
        let needle = request.query.as_deref().map(str::to_lowercase);
        let page = self
            .issues
            .iter()
            .filter(|issue| needle.as_deref().map_or(true, |n| Self::matches(issue, n)))
            .skip(request.offset as usize)
            .take(request.limit as usize)
            .map(|issue| IssueRecord {
                comments: None,
                ..issue.clone()
            })
            .collect();
        Ok(page)
    }

    async fn get_comments(&self, issue: &IssueRecord) -> Result<Vec<Comment>, AppError> {
        self.issues
            .iter()
            .find(|candidate| candidate.same_issue(issue))
            .map(|found| found.comments.clone().unwrap_or_default())
            .ok_or_else(|| AppError::Service(format!("Issue {} not found", issue.id)))
    }
}
