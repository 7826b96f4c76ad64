//! Column model for the issue table: headers, cell text, ordering, filtering.

use std::cmp::Ordering;

use chrono::{DateTime, Duration, Utc};
use tracker_services::IssueRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssueColumn {
    Kind,
    Name,
    CreatedOn,
    UpdatedOn,
    Repository,
}

impl IssueColumn {
    pub const ALL: [IssueColumn; 5] = [
        IssueColumn::Kind,
        IssueColumn::Name,
        IssueColumn::CreatedOn,
        IssueColumn::UpdatedOn,
        IssueColumn::Repository,
    ];

    pub fn header(self) -> &'static str {
        match self {
            IssueColumn::Kind => "",
            IssueColumn::Name => "Name",
            IssueColumn::CreatedOn => "Created On",
            IssueColumn::UpdatedOn => "Last Updated On",
            IssueColumn::Repository => "Repository",
        }
    }

    /// Cell text. Dates are rendered relative to `now`.
    pub fn value_of(self, issue: &IssueRecord, now: DateTime<Utc>) -> String {
        match self {
            IssueColumn::Kind => issue.kind.label().to_string(),
            IssueColumn::Name => issue.presentable_name(),
            IssueColumn::CreatedOn => format_pretty_date(issue.created_at, now),
            IssueColumn::UpdatedOn => format_pretty_date(issue.updated_at, now),
            IssueColumn::Repository => issue.repository_source.clone(),
        }
    }

    /// Ascending order for this column. Missing dates sort first.
    pub fn compare(self, a: &IssueRecord, b: &IssueRecord) -> Ordering {
        match self {
            IssueColumn::Kind => a.kind.cmp(&b.kind),
            IssueColumn::Name => a
                .presentable_name()
                .to_lowercase()
                .cmp(&b.presentable_name().to_lowercase()),
            IssueColumn::CreatedOn => a.created_at.cmp(&b.created_at),
            IssueColumn::UpdatedOn => a.updated_at.cmp(&b.updated_at),
            IssueColumn::Repository => a.repository_source.cmp(&b.repository_source),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// Stable sort, so equal rows keep the store's order.
pub fn sort_issues(issues: &mut [IssueRecord], column: IssueColumn, order: SortOrder) {
    issues.sort_by(|a, b| {
        let ordering = column.compare(a, b);
        match order {
            SortOrder::Ascending => ordering,
            SortOrder::Descending => ordering.reverse(),
        }
    });
}

/// Case-insensitive match on the name and repository columns. A blank filter matches all.
pub fn matches_filter(issue: &IssueRecord, filter: &str) -> bool {
    let needle = filter.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    issue.presentable_name().to_lowercase().contains(&needle)
        || issue.repository_source.to_lowercase().contains(&needle)
}

/// "Today 14:05", "Yesterday 09:30", otherwise "Oct 20, 2016". Empty when absent.
pub fn format_pretty_date(date: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(date) = date else {
        return String::new();
    };

    let day = date.date_naive();
    if day == now.date_naive() {
        format!("Today {}", date.format("%H:%M"))
    } else if day == (now - Duration::days(1)).date_naive() {
        format!("Yesterday {}", date.format("%H:%M"))
    } else {
        date.format("%b %d, %Y").to_string()
    }
}
