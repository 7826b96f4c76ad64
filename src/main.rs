use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use parking_lot::Mutex;
use tracker_core::Config;
use tracker_services::{Comment, FetchGateway, GitHubIssueGateway, IssueRecord};
use tracker_ui::models::{matches_filter, sort_issues, IssueColumn, SortOrder};
use tracker_ui::{
    BasicMarkdown, DetailsDocument, IssueAction, IssuesView, PresenterSettings, SyncPresenter,
};

const PUMP_TIMEOUT: Duration = Duration::from_secs(30);

/// State shared between the console loop and the view the presenter drives.
#[derive(Default)]
struct ConsoleState {
    rows: Vec<IssueRecord>,
    selected: Option<IssueRecord>,
    details_panel: bool,
    search_field: String,
    history: VecDeque<String>,
}

#[derive(Clone)]
struct ConsoleView {
    state: Arc<Mutex<ConsoleState>>,
    history_size: usize,
}

impl ConsoleView {
    fn print_rows(rows: &[IssueRecord]) {
        let now = Utc::now();
        println!(
            "{:<10} {:<50} {:<20} {:<20} {}",
            "Kind",
            IssueColumn::Name.header(),
            IssueColumn::CreatedOn.header(),
            IssueColumn::UpdatedOn.header(),
            IssueColumn::Repository.header()
        );
        for issue in rows {
            println!(
                "{:<10} {:<50} {:<20} {:<20} {}",
                IssueColumn::Kind.value_of(issue, now),
                IssueColumn::Name.value_of(issue, now),
                IssueColumn::CreatedOn.value_of(issue, now),
                IssueColumn::UpdatedOn.value_of(issue, now),
                IssueColumn::Repository.value_of(issue, now)
            );
        }
    }
}

impl IssuesView for ConsoleView {
    fn show_loading_screen(&mut self, shown: bool) {
        if shown {
            println!("Loading...");
        }
    }

    fn show_empty_issue_list_screen(&mut self) {
        self.state.lock().rows.clear();
        println!("No issues found.");
    }

    fn update_issue_list(&mut self, issues: Vec<IssueRecord>, _force_replace: bool) {
        Self::print_rows(&issues);
        self.state.lock().rows = issues;
    }

    fn show_details(
        &mut self,
        description: Option<String>,
        url: Option<String>,
        comments: Option<Vec<Comment>>,
    ) {
        if !self.state.lock().details_panel {
            return;
        }
        let pending = comments.is_none();
        let document = DetailsDocument::new(description, url, comments);
        println!("{}", document.to_html(&BasicMarkdown, Utc::now()));
        if pending {
            println!("(loading comments...)");
        }
    }

    fn show_details_panel(&mut self, shown: bool) {
        self.state.lock().details_panel = shown;
        println!("Details panel {}", if shown { "shown" } else { "hidden" });
    }

    fn is_details_panel_shown(&self) -> bool {
        self.state.lock().details_panel
    }

    fn get_selected_issue(&self) -> Option<IssueRecord> {
        self.state.lock().selected.clone()
    }

    fn open_in_browser(&mut self, url: &str) {
        if let Err(e) = webbrowser::open(url) {
            tracing::warn!("Failed to open browser: {}", e);
            println!("Open {} manually", url);
        }
    }

    fn clear_search_field(&mut self) {
        self.state.lock().search_field.clear();
    }

    fn save_search_to_history(&mut self) {
        let mut state = self.state.lock();
        let query = state.search_field.trim().to_string();
        if query.is_empty() {
            return;
        }
        state.history.retain(|q| q != &query);
        state.history.push_front(query);
        state.history.truncate(self.history_size);
    }

    fn show_load_error(&mut self, message: &str) {
        println!("Error: {}", message);
    }

    fn open_task_dialog(&mut self, issue: &IssueRecord) {
        println!("New task: {}", issue.presentable_name());
    }
}

fn build_gateway(config: &Config) -> Option<Arc<dyn FetchGateway>> {
    if !config.github.is_configured() {
        tracing::warn!(
            "No repository configured in {}, issues will not load",
            config.config_dir.join("config.toml").display()
        );
        return None;
    }
    match GitHubIssueGateway::from_config(&config.github, &config.sync) {
        Ok(gateway) => {
            tracing::info!("Using GitHub repository {}", gateway.full_name());
            Some(Arc::new(gateway))
        }
        Err(e) => {
            tracing::error!("Failed to create GitHub gateway: {}", e);
            None
        }
    }
}

fn print_help() {
    println!("Commands:");
    println!("  refresh            reload from the backend");
    println!("  pull               merge the first page into the list");
    println!("  search <query>     search the backend (empty shows all)");
    println!("  filter <text>      filter the shown rows locally");
    println!("  sort <column> [desc]  kind | name | created | updated | repository");
    println!("  show <id>          select an issue and show its details");
    println!("  open               open the selected issue in the browser");
    println!("  task               create a task from the selected issue");
    println!("  details            toggle the details panel");
    println!("  history            list recent searches");
    println!("  quit");
}

fn parse_column(name: &str) -> Option<IssueColumn> {
    match name {
        "kind" => Some(IssueColumn::Kind),
        "name" => Some(IssueColumn::Name),
        "created" => Some(IssueColumn::CreatedOn),
        "updated" => Some(IssueColumn::UpdatedOn),
        "repository" | "repo" => Some(IssueColumn::Repository),
        _ => None,
    }
}

fn main() -> Result<()> {
    tracker_core::init()?;

    let (config, _validation) = Config::load_validated()?;
    let runtime = tokio::runtime::Runtime::new()?;

    let state = Arc::new(Mutex::new(ConsoleState {
        details_panel: config.ui.show_details_panel,
        ..ConsoleState::default()
    }));
    let view = ConsoleView {
        state: Arc::clone(&state),
        history_size: config.ui.search_history_size,
    };

    let mut presenter = SyncPresenter::new(
        runtime.handle().clone(),
        build_gateway(&config),
        PresenterSettings::from(&config.sync),
    );
    presenter.attach_view(Box::new(view));

    tracing::info!("Issue tracker started");
    presenter.load_initial_issues();
    presenter.pump_blocking(PUMP_TIMEOUT);
    print_help();

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        io::stdout().flush()?;
        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        let input = line.trim();
        let (command, arg) = input.split_once(' ').unwrap_or((input, ""));
        let arg = arg.trim();

        match command {
            "" => {}
            "quit" | "exit" => break,
            "refresh" => IssueAction::Refresh.perform(&mut presenter),
            "pull" => presenter.pull_issues(None, false),
            "search" => {
                state.lock().search_field = arg.to_string();
                presenter.search_for_issues(arg);
            }
            "filter" => {
                let rows: Vec<IssueRecord> = state
                    .lock()
                    .rows
                    .iter()
                    .filter(|issue| matches_filter(issue, arg))
                    .cloned()
                    .collect();
                ConsoleView::print_rows(&rows);
            }
            "sort" => {
                let (name, order) = arg.split_once(' ').unwrap_or((arg, ""));
                match parse_column(name) {
                    Some(column) => {
                        let order = if order.trim() == "desc" {
                            SortOrder::Descending
                        } else {
                            SortOrder::Ascending
                        };
                        let mut rows = state.lock().rows.clone();
                        sort_issues(&mut rows, column, order);
                        ConsoleView::print_rows(&rows);
                    }
                    None => println!("Unknown column '{}'", name),
                }
            }
            "show" => {
                let issue = presenter.store().get(arg.trim_start_matches('#')).cloned();
                match issue {
                    Some(issue) => {
                        state.lock().selected = Some(issue.clone());
                        presenter.show_details(&issue);
                    }
                    None => println!("No issue '{}'", arg),
                }
            }
            "open" | "task" | "details" => {
                let action = match command {
                    "open" => IssueAction::OpenInBrowser,
                    "task" => IssueAction::CreateTask,
                    _ => IssueAction::ToggleDetailsPanel,
                };
                let presentation = action.presentation(&presenter);
                if presentation.enabled {
                    action.perform(&mut presenter);
                } else {
                    println!("'{}' needs a selected issue (use show <id>)", presentation.text);
                }
            }
            "history" => {
                for query in state.lock().history.iter() {
                    println!("  {}", query);
                }
            }
            _ => print_help(),
        }

        presenter.pump_blocking(PUMP_TIMEOUT);
    }

    presenter.shutdown();
    tracing::info!("Issue tracker stopped");
    Ok(())
}
