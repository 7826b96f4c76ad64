//! Toolbar actions of the issues panel.

use crate::presenter::SyncPresenter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssueAction {
    OpenInBrowser,
    CreateTask,
    Refresh,
    ToggleDetailsPanel,
}

/// How a toolbar button should look right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionPresentation {
    pub text: String,
    pub enabled: bool,
    /// Only meaningful for toggle actions.
    pub selected: bool,
}

impl IssueAction {
    pub const ALL: [IssueAction; 4] = [
        IssueAction::OpenInBrowser,
        IssueAction::CreateTask,
        IssueAction::Refresh,
        IssueAction::ToggleDetailsPanel,
    ];

    pub fn id(self) -> &'static str {
        match self {
            IssueAction::OpenInBrowser => "IssueTracker.OpenIssueInBrowser",
            IssueAction::CreateTask => "IssueTracker.CreateTask",
            IssueAction::Refresh => "IssueTracker.RefreshIssueList",
            IssueAction::ToggleDetailsPanel => "IssueTracker.ShowDetailsPanel",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|action| action.id() == id)
    }

    pub fn presentation(self, presenter: &SyncPresenter) -> ActionPresentation {
        let selected_issue = presenter.selected_issue();
        match self {
            IssueAction::OpenInBrowser => {
                let text = selected_issue
                    .as_ref()
                    .map(|issue| issue.repository_source.as_str())
                    .filter(|source| !source.is_empty())
                    .map(|source| format!("Open in {}", source))
                    .unwrap_or_else(|| "Open in Browser".to_string());
                ActionPresentation {
                    text,
                    enabled: selected_issue.is_some(),
                    selected: false,
                }
            }
            IssueAction::CreateTask => ActionPresentation {
                text: "Create Task".to_string(),
                enabled: selected_issue.is_some(),
                selected: false,
            },
            IssueAction::Refresh => ActionPresentation {
                text: "Refresh".to_string(),
                enabled: true,
                selected: false,
            },
            IssueAction::ToggleDetailsPanel => ActionPresentation {
                text: "Show Details".to_string(),
                enabled: true,
                selected: presenter.is_details_panel_shown(),
            },
        }
    }

    /// Run the action against the current selection.
    pub fn perform(self, presenter: &mut SyncPresenter) {
        tracing::debug!("Action {}", self.id());
        match self {
            IssueAction::OpenInBrowser => {
                if let Some(issue) = presenter.selected_issue() {
                    presenter.open_url(&issue);
                }
            }
            IssueAction::CreateTask => {
                if let Some(issue) = presenter.selected_issue() {
                    presenter.create_task(&issue);
                }
            }
            IssueAction::Refresh => presenter.pull_issues(None, true),
            IssueAction::ToggleDetailsPanel => {
                let shown = presenter.is_details_panel_shown();
                presenter.show_details_panel(!shown);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip() {
        for action in IssueAction::ALL {
            assert_eq!(IssueAction::from_id(action.id()), Some(action));
        }
        assert_eq!(IssueAction::from_id("IssueTracker.Unknown"), None);
    }
}
