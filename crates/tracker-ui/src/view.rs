//! The surface the presenter drives.

use tracker_services::{Comment, IssueRecord};

/// What the issue list currently shows. Exactly one at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewState {
    Loading,
    Empty,
    Populated(Vec<IssueRecord>),
    /// Last load failed; carries the message shown to the user.
    Failed(String),
}

/// Rendering side of the issues panel.
///
/// Every push hands over owned data; the view never shares state with the
/// presenter's store. All methods are called on the owner thread.
pub trait IssuesView {
    fn show_loading_screen(&mut self, shown: bool);

    fn show_empty_issue_list_screen(&mut self);

    /// Show `issues`. With `force_replace` the previous rows are discarded,
    /// otherwise the view may keep its selection and scroll position.
    fn update_issue_list(&mut self, issues: Vec<IssueRecord>, force_replace: bool);

    /// `comments` is `None` while they are still being fetched.
    fn show_details(
        &mut self,
        description: Option<String>,
        url: Option<String>,
        comments: Option<Vec<Comment>>,
    );

    fn show_details_panel(&mut self, shown: bool);

    fn is_details_panel_shown(&self) -> bool;

    fn get_selected_issue(&self) -> Option<IssueRecord>;

    fn open_in_browser(&mut self, url: &str);

    fn clear_search_field(&mut self);

    /// Remember whatever is in the search field.
    fn save_search_to_history(&mut self);

    fn show_load_error(&mut self, message: &str);

    /// Hand the issue to the host's task dialog. Hosts without one ignore it.
    fn open_task_dialog(&mut self, issue: &IssueRecord) {
        tracing::debug!("No task dialog for issue {}", issue.id);
    }
}
