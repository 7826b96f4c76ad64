//! Issue backend: async fetches for the presenter.
//! All network work runs off the owner thread; results sent via mpsc.

use std::sync::mpsc::Sender;
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tracker_core::AppError;
use tracker_services::{Comment, FetchGateway, FetchRequest, IssueRecord};

/// Why a fetch was issued; decides how its result is merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadKind {
    Initial,
    Pull,
    Search,
}

/// Identifies one issued fetch.
#[derive(Debug, Clone)]
pub struct LoadTicket {
    pub generation: u64,
    pub kind: LoadKind,
    pub request: FetchRequest,
}

/// Messages sent from async operations back to the owner thread
#[derive(Debug)]
pub enum IssueServiceMessage {
    /// Result of fetching a page of issues
    FetchDone {
        ticket: LoadTicket,
        result: Result<Vec<IssueRecord>, AppError>,
    },
    /// Result of fetching the comments of one issue
    CommentsDone {
        issue_id: String,
        result: Result<Vec<Comment>, AppError>,
    },
}

/// Request a page of issues asynchronously.
///
/// Sends exactly one `FetchDone`, unless `cancel` fires first.
pub fn request_fetch(
    tx: &Sender<IssueServiceMessage>,
    runtime: &Handle,
    cancel: &CancellationToken,
    gateway: Arc<dyn FetchGateway>,
    ticket: LoadTicket,
) {
    let tx = tx.clone();
    let cancel = cancel.clone();

    runtime.spawn(async move {
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!("Fetch generation {} cancelled", ticket.generation);
                return;
            }
            result = gateway.get_issues(&ticket.request) => result,
        };
        if let Err(e) = &result {
            tracing::warn!("{} fetch failed: {}", gateway.name(), e);
        }
        let _ = tx.send(IssueServiceMessage::FetchDone { ticket, result });
    });
}

/// Request the comments of `issue` asynchronously.
pub fn request_comments(
    tx: &Sender<IssueServiceMessage>,
    runtime: &Handle,
    cancel: &CancellationToken,
    gateway: Arc<dyn FetchGateway>,
    issue: IssueRecord,
) {
    let tx = tx.clone();
    let cancel = cancel.clone();

    runtime.spawn(async move {
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            result = gateway.get_comments(&issue) => result,
        };
        let _ = tx.send(IssueServiceMessage::CommentsDone {
            issue_id: issue.id,
            result,
        });
    });
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;
    use tracker_services::MemoryGateway;

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap()
    }

    #[test]
    fn fetch_delivers_one_message() {
        let rt = runtime();
        let (tx, rx) = mpsc::channel();
        let gateway = Arc::new(MemoryGateway::new(
            "Memory",
            vec![IssueRecord::new("1", "One")],
        ));
        let ticket = LoadTicket {
            generation: 7,
            kind: LoadKind::Pull,
            request: FetchRequest::first_page(None, false),
        };

        request_fetch(&tx, rt.handle(), &CancellationToken::new(), gateway, ticket);

        match rx.recv_timeout(Duration::from_secs(5)).unwrap() {
            IssueServiceMessage::FetchDone { ticket, result } => {
                assert_eq!(ticket.generation, 7);
                assert_eq!(result.unwrap().len(), 1);
            }
            other => panic!("unexpected message {:?}", other),
        }
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
    }

    #[test]
    fn cancelled_fetch_sends_nothing() {
        let rt = runtime();
        let (tx, rx) = mpsc::channel();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let ticket = LoadTicket {
            generation: 1,
            kind: LoadKind::Initial,
            request: FetchRequest::first_page(None, true),
        };

        request_fetch(
            &tx,
            rt.handle(),
            &cancel,
            Arc::new(MemoryGateway::default()),
            ticket,
        );

        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
    }

    #[test]
    fn comments_carry_issue_id() {
        let rt = runtime();
        let (tx, rx) = mpsc::channel();
        let issue = IssueRecord::new("3", "Three").with_comments(vec![Comment {
            author: "ana".into(),
            text: "+1".into(),
            created_at: None,
        }]);
        let gateway = Arc::new(MemoryGateway::new("Memory", vec![issue.clone()]));

        request_comments(&tx, rt.handle(), &CancellationToken::new(), gateway, issue);

        match rx.recv_timeout(Duration::from_secs(5)).unwrap() {
            IssueServiceMessage::CommentsDone { issue_id, result } => {
                assert_eq!(issue_id, "3");
                assert_eq!(result.unwrap()[0].author, "ana");
            }
            other => panic!("unexpected message {:?}", other),
        }
    }
}
