//! Synchronizes fetched issues with the local store and drives the view.
//!
//! The presenter lives on one owner thread. Fetches run on the injected
//! runtime and report back over a channel; nothing is merged or pushed until
//! the owner calls [`SyncPresenter::pump`] or [`SyncPresenter::pump_blocking`].

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tracker_core::{AppError, SyncConfig};
use tracker_services::{Comment, FetchGateway, FetchRequest, IssueRecord, IssueStore};

use crate::services::{request_comments, request_fetch, IssueServiceMessage, LoadKind, LoadTicket};
use crate::view::{IssuesView, ViewState};

/// Tunables taken from the `[sync]` config section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresenterSettings {
    pub page_size: u32,
    /// Drop list loads issued before the latest forced reload, and search
    /// results that a newer search or a cleared search field has replaced.
    pub discard_stale_results: bool,
}

impl Default for PresenterSettings {
    fn default() -> Self {
        Self::from(&SyncConfig::default())
    }
}

impl From<&SyncConfig> for PresenterSettings {
    fn from(config: &SyncConfig) -> Self {
        Self {
            page_size: config.page_size.max(1),
            discard_stale_results: config.discard_stale_results,
        }
    }
}

pub struct SyncPresenter {
    runtime: Handle,
    gateway: Option<Arc<dyn FetchGateway>>,
    settings: PresenterSettings,
    store: IssueStore,
    view: Option<Box<dyn IssuesView>>,
    view_state: Option<ViewState>,
    tx: Sender<IssueServiceMessage>,
    rx: Receiver<IssueServiceMessage>,
    cancel: CancellationToken,
    next_generation: u64,
    /// Generation of the latest initial load or forced pull.
    list_reload_generation: u64,
    /// Generation of the search whose results the view still wants.
    search_generation: Option<u64>,
    pending: usize,
    loading_shown: bool,
    /// Issue whose details are on screen; late comment results for others are dropped.
    details_issue: Option<IssueRecord>,
}

impl SyncPresenter {
    /// A presenter without a gateway skips every backend operation.
    pub fn new(
        runtime: Handle,
        gateway: Option<Arc<dyn FetchGateway>>,
        settings: PresenterSettings,
    ) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            runtime,
            gateway,
            settings,
            store: IssueStore::new(),
            view: None,
            view_state: None,
            tx,
            rx,
            cancel: CancellationToken::new(),
            next_generation: 0,
            list_reload_generation: 0,
            search_generation: None,
            pending: 0,
            loading_shown: false,
            details_issue: None,
        }
    }

    pub fn attach_view(&mut self, view: Box<dyn IssuesView>) {
        self.view = Some(view);
    }

    pub fn detach_view(&mut self) -> Option<Box<dyn IssuesView>> {
        self.view.take()
    }

    pub fn store(&self) -> &IssueStore {
        &self.store
    }

    /// Last state pushed to the list; `None` before the first load.
    pub fn view_state(&self) -> Option<&ViewState> {
        self.view_state.as_ref()
    }

    pub fn has_pending_loads(&self) -> bool {
        self.pending > 0
    }

    /// Show the loading screen and fetch the first page, replacing the store.
    pub fn load_initial_issues(&mut self) {
        let Some(gateway) = self.backend("load initial issues") else {
            return;
        };

        self.loading_shown = true;
        self.view_state = Some(ViewState::Loading);
        if let Some(view) = self.view.as_mut() {
            view.show_loading_screen(true);
        }

        let request = FetchRequest::new(None, 0, self.settings.page_size, true);
        self.dispatch_fetch(gateway, LoadKind::Initial, request);
    }

    /// Fetch the first page. `force` replaces the store, otherwise results merge.
    pub fn pull_issues(&mut self, query: Option<&str>, force: bool) {
        let request = FetchRequest::new(
            query.map(str::to_string),
            0,
            self.settings.page_size,
            force,
        );
        self.pull_issues_page(request);
    }

    pub fn pull_issues_page(&mut self, request: FetchRequest) {
        let Some(gateway) = self.backend("pull issues") else {
            return;
        };
        self.dispatch_fetch(gateway, LoadKind::Pull, request);
    }

    /// Search the backend. A blank query shows everything already known instead.
    pub fn search_for_issues(&mut self, query: &str) {
        let query = query.trim();
        if query.is_empty() {
            self.show_all_issues();
            return;
        }

        let Some(gateway) = self.backend("search issues") else {
            return;
        };
        if let Some(view) = self.view.as_mut() {
            view.save_search_to_history();
        }

        let request = FetchRequest::new(
            Some(query.to_string()),
            0,
            self.settings.page_size,
            true,
        );
        self.dispatch_fetch(gateway, LoadKind::Search, request);
    }

    /// Push the whole store and clear the search field. No backend call.
    pub fn show_all_issues(&mut self) {
        self.search_generation = None;
        let issues = self.store.snapshot();
        self.push_issues(issues, true);
        if let Some(view) = self.view.as_mut() {
            view.clear_search_field();
        }
    }

    /// Show `issue` in the details panel, fetching its comments if needed.
    pub fn show_details(&mut self, issue: &IssueRecord) {
        let known = issue.comments.clone().or_else(|| {
            self.store
                .get(&issue.id)
                .and_then(|stored| stored.comments.clone())
        });

        self.details_issue = Some(issue.clone());
        let description = issue.description.clone();
        let url = issue.url.clone();

        if let Some(comments) = known {
            if let Some(view) = self.view.as_mut() {
                view.show_details(description, url, Some(comments));
            }
            return;
        }

        if let Some(view) = self.view.as_mut() {
            view.show_details(description, url, None);
        }

        let Some(gateway) = self.backend("fetch comments") else {
            return;
        };
        self.pending += 1;
        request_comments(&self.tx, &self.runtime, &self.cancel, gateway, issue.clone());
    }

    /// Open the issue page. Issues without a URL are ignored.
    pub fn open_url(&mut self, issue: &IssueRecord) {
        let Some(url) = issue.browsable_url() else {
            tracing::debug!("Issue {} has no URL", issue.id);
            return;
        };
        if let Some(view) = self.view.as_mut() {
            view.open_in_browser(url);
        }
    }

    /// Create a task from `issue` through the host's dialog.
    pub fn create_task(&mut self, issue: &IssueRecord) {
        if let Some(view) = self.view.as_mut() {
            view.open_task_dialog(issue);
        }
    }

    pub fn show_details_panel(&mut self, shown: bool) {
        if let Some(view) = self.view.as_mut() {
            view.show_details_panel(shown);
        }
    }

    pub fn is_details_panel_shown(&self) -> bool {
        self.view
            .as_ref()
            .is_some_and(|view| view.is_details_panel_shown())
    }

    pub fn selected_issue(&self) -> Option<IssueRecord> {
        self.view.as_ref().and_then(|view| view.get_selected_issue())
    }

    /// Handle every completion already delivered. Returns how many were handled.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(message) = self.rx.try_recv() {
            self.handle_message(message);
            handled += 1;
        }
        handled
    }

    /// Handle completions until nothing is in flight or `timeout` passes.
    pub fn pump_blocking(&mut self, timeout: Duration) -> usize {
        let deadline = Instant::now() + timeout;
        let mut handled = 0;

        while self.pending > 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                tracing::debug!("Gave up waiting on {} pending loads", self.pending);
                break;
            }
            match self.rx.recv_timeout(remaining) {
                Ok(message) => {
                    self.handle_message(message);
                    handled += 1;
                }
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        handled + self.pump()
    }

    /// Cancel in-flight work. Completions that still arrive are discarded.
    pub fn shutdown(&mut self) {
        if self.cancel.is_cancelled() {
            return;
        }
        tracing::info!("Shutting down issue presenter ({} pending)", self.pending);
        self.cancel.cancel();
        self.pending = 0;
        while self.rx.try_recv().is_ok() {}
    }

    fn backend(&self, operation: &str) -> Option<Arc<dyn FetchGateway>> {
        if self.cancel.is_cancelled() {
            tracing::debug!("Presenter shut down, cannot {}", operation);
            return None;
        }
        let gateway = self.gateway.clone();
        if gateway.is_none() {
            tracing::warn!("No issue backend configured, cannot {}", operation);
        }
        gateway
    }

    fn dispatch_fetch(
        &mut self,
        gateway: Arc<dyn FetchGateway>,
        kind: LoadKind,
        request: FetchRequest,
    ) {
        self.next_generation += 1;
        let generation = self.next_generation;
        match kind {
            LoadKind::Initial => self.list_reload_generation = generation,
            LoadKind::Pull if request.force => self.list_reload_generation = generation,
            LoadKind::Pull => {}
            LoadKind::Search => self.search_generation = Some(generation),
        }
        self.pending += 1;

        tracing::debug!(
            "Fetch generation {} ({:?}, query={:?}, offset={}, limit={}, force={})",
            generation,
            kind,
            request.query,
            request.offset,
            request.limit,
            request.force
        );

        let ticket = LoadTicket {
            generation,
            kind,
            request,
        };
        request_fetch(&self.tx, &self.runtime, &self.cancel, gateway, ticket);
    }

    fn handle_message(&mut self, message: IssueServiceMessage) {
        if self.cancel.is_cancelled() {
            return;
        }
        self.pending = self.pending.saturating_sub(1);

        match message {
            IssueServiceMessage::FetchDone { ticket, result } => self.on_fetch_done(ticket, result),
            IssueServiceMessage::CommentsDone { issue_id, result } => {
                self.on_comments_done(issue_id, result)
            }
        }
    }

    fn on_fetch_done(&mut self, ticket: LoadTicket, result: Result<Vec<IssueRecord>, AppError>) {
        if self.settings.discard_stale_results && self.is_superseded(&ticket) {
            tracing::debug!(
                "Dropping stale {:?} fetch generation {} (list reload {}, search {:?})",
                ticket.kind,
                ticket.generation,
                self.list_reload_generation,
                self.search_generation
            );
            return;
        }

        let issues = match result {
            Ok(issues) => issues,
            Err(e) => {
                tracing::error!("Failed to load issues: {}", e);
                self.push_failure(e.user_message());
                return;
            }
        };

        tracing::info!(
            "Fetched {} issues ({:?}, generation {})",
            issues.len(),
            ticket.kind,
            ticket.generation
        );

        match ticket.kind {
            LoadKind::Initial => {
                self.store.refresh_issues(issues);
                let snapshot = self.store.snapshot();
                self.push_issues(snapshot, true);
            }
            LoadKind::Pull => {
                if ticket.request.force {
                    self.store.refresh_issues(issues);
                } else {
                    self.store.update_issues(issues);
                }
                let snapshot = self.store.snapshot();
                self.push_issues(snapshot, ticket.request.force);
            }
            LoadKind::Search => {
                self.store.update_issues(issues.clone());
                self.push_issues(issues, true);
            }
        }
    }

    /// List loads only yield to newer list reloads; searches only to newer
    /// searches or to the search being cleared.
    fn is_superseded(&self, ticket: &LoadTicket) -> bool {
        match ticket.kind {
            LoadKind::Initial | LoadKind::Pull => ticket.generation < self.list_reload_generation,
            LoadKind::Search => self.search_generation != Some(ticket.generation),
        }
    }

    fn on_comments_done(&mut self, issue_id: String, result: Result<Vec<Comment>, AppError>) {
        let comments = match result {
            Ok(comments) => comments,
            Err(e) => {
                tracing::warn!("Failed to load comments for issue {}: {}", issue_id, e);
                return;
            }
        };

        self.store.attach_comments(&issue_id, comments.clone());

        let Some(current) = self.details_issue.as_mut() else {
            return;
        };
        if current.id != issue_id {
            tracing::debug!("Details moved on from issue {}, dropping comments", issue_id);
            return;
        }
        current.comments = Some(comments.clone());

        let description = current.description.clone();
        let url = current.url.clone();
        if let Some(view) = self.view.as_mut() {
            view.show_details(description, url, Some(comments));
        }
    }

    fn clear_loading(&mut self) {
        if self.loading_shown {
            self.loading_shown = false;
            if let Some(view) = self.view.as_mut() {
                view.show_loading_screen(false);
            }
        }
    }

    fn push_issues(&mut self, issues: Vec<IssueRecord>, force_replace: bool) {
        self.clear_loading();

        if issues.is_empty() {
            self.view_state = Some(ViewState::Empty);
            if let Some(view) = self.view.as_mut() {
                view.show_empty_issue_list_screen();
            }
            return;
        }

        self.view_state = Some(ViewState::Populated(issues.clone()));
        if let Some(view) = self.view.as_mut() {
            view.update_issue_list(issues, force_replace);
        }
    }

    fn push_failure(&mut self, message: &str) {
        self.clear_loading();
        self.view_state = Some(ViewState::Failed(message.to_string()));
        if let Some(view) = self.view.as_mut() {
            view.show_load_error(message);
        }
    }
}

impl Drop for SyncPresenter {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
