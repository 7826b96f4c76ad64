pub mod actions;
pub mod details;
pub mod models;
pub mod presenter;
pub mod services;
pub mod view;

pub use actions::{ActionPresentation, IssueAction};
pub use details::{BasicMarkdown, DetailsDocument, MarkdownRenderer};
pub use presenter::{PresenterSettings, SyncPresenter};
pub use view::{IssuesView, ViewState};
