pub mod gateway;
pub mod github;
pub mod issue;
pub mod retry;
pub mod store;

pub use gateway::{FetchGateway, FetchRequest, MemoryGateway, DEFAULT_PAGE_SIZE};
pub use github::{GitHubComment, GitHubIssue, GitHubIssueGateway, GitHubLabel, GitHubUser};
pub use issue::{Comment, IssueKind, IssueRecord};
pub use retry::RetryConfig;
pub use store::IssueStore;
