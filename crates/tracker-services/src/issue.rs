//! Issue records as the panel sees them, independent of the backend they came from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Coarse classification shown as the row icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum IssueKind {
    Bug,
    Exception,
    Feature,
    #[default]
    Other,
}

impl IssueKind {
    pub fn label(self) -> &'static str {
        match self {
            IssueKind::Bug => "bug",
            IssueKind::Exception => "exception",
            IssueKind::Feature => "feature",
            IssueKind::Other => "other",
        }
    }

    /// Classify from backend label names, first match wins.
    pub fn from_labels<'a>(labels: impl IntoIterator<Item = &'a str>) -> Self {
        for label in labels {
            match label.to_lowercase().as_str() {
                "bug" | "defect" => return IssueKind::Bug,
                "crash" | "exception" => return IssueKind::Exception,
                "enhancement" | "feature" | "feature request" => return IssueKind::Feature,
                _ => {}
            }
        }
        IssueKind::Other
    }
}

/// One comment on an issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub author: String,
    pub text: String,
    pub created_at: Option<DateTime<Utc>>,
}

/// A single issue. Two records with the same `id` are the same issue,
/// whatever their other fields say.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRecord {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub url: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    /// `None` until comments have been fetched for this issue.
    #[serde(default)]
    pub comments: Option<Vec<Comment>>,
    pub repository_source: String,
    #[serde(default)]
    pub is_closed: bool,
    #[serde(default)]
    pub kind: IssueKind,
}

impl IssueRecord {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            url: None,
            created_at: None,
            updated_at: None,
            comments: None,
            repository_source: String::new(),
            is_closed: false,
            kind: IssueKind::Other,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.repository_source = source.into();
        self
    }

    pub fn with_comments(mut self, comments: Vec<Comment>) -> Self {
        self.comments = Some(comments);
        self
    }

    /// Identity comparison used by merges.
    pub fn same_issue(&self, other: &IssueRecord) -> bool {
        self.id == other.id
    }

    /// `"{id}: {title}"`, the name column text.
    pub fn presentable_name(&self) -> String {
        format!("{}: {}", self.id, self.title)
    }

    /// URL if present and non-blank.
    pub fn browsable_url(&self) -> Option<&str> {
        self.url.as_deref().map(str::trim).filter(|u| !u.is_empty())
    }
}
