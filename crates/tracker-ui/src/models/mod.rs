pub mod issue_table;

pub use issue_table::{format_pretty_date, matches_filter, sort_issues, IssueColumn, SortOrder};
