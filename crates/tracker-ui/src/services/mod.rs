pub mod issue_service;

pub use issue_service::{
    request_comments, request_fetch, IssueServiceMessage, LoadKind, LoadTicket,
};
