use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::config::DataSourceKind;
use crate::medal::{MedalRecord, RankedMedalRecord};
use crate::query_store::{MemoryQueryStore, QueryStore};
use crate::ranking::Standings;
use crate::sort_state::{Column, SortController, SortDirection, SortEvent};

const MAX_LOGS: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataStatus {
    Loading,
    Ready,
    Failed(String),
}

pub type ViewStore = Box<dyn QueryStore + Send>;

pub struct AppState {
    pub source: DataSourceKind,
    pub status: DataStatus,
    pub fetch_in_flight: bool,
    pub standings: Standings,
    pub fetched_at: Option<Instant>,
    pub updated_label: Option<String>,
    pub stale_after: Duration,
    pub sort: SortController<ViewStore>,
    pub focused_column: Column,
    pub selected: usize,
    pub logs: VecDeque<String>,
    pub help_overlay: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(
            Box::new(MemoryQueryStore::default()),
            DataSourceKind::Bundled,
            Duration::from_secs(300),
        )
    }
}

impl AppState {
    pub fn new(store: ViewStore, source: DataSourceKind, stale_after: Duration) -> Self {
        Self {
            source,
            status: DataStatus::Loading,
            fetch_in_flight: false,
            standings: Standings::default(),
            fetched_at: None,
            updated_label: None,
            stale_after,
            sort: SortController::new(store),
            focused_column: Column::Gold,
            selected: 0,
            logs: VecDeque::with_capacity(MAX_LOGS),
            help_overlay: false,
        }
    }

    /// Rows in the order the grid shows them.
    pub fn display_rows(&self) -> Vec<&RankedMedalRecord> {
        self.sort.display_order(&self.standings.rows)
    }

    pub fn selected_code(&self) -> Option<String> {
        self.display_rows()
            .get(self.selected)
            .map(|row| row.code.clone())
    }

    pub fn is_loading(&self) -> bool {
        self.status == DataStatus::Loading
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.status {
            DataStatus::Failed(message) => Some(message.as_str()),
            _ => None,
        }
    }

    /// Mark a fetch as in flight. Returns `false` if one already is.
    pub fn begin_fetch(&mut self) -> bool {
        if self.fetch_in_flight {
            return false;
        }
        self.fetch_in_flight = true;
        self.status = DataStatus::Loading;
        true
    }

    /// Cached standings are older than the validity window.
    pub fn needs_refresh(&self, now: Instant) -> bool {
        if self.status != DataStatus::Ready {
            return false;
        }
        self.fetched_at
            .map(|at| now.saturating_duration_since(at) >= self.stale_after)
            .unwrap_or(false)
    }

    pub fn select_next(&mut self) {
        let total = self.standings.country_count();
        if total == 0 {
            self.selected = 0;
            return;
        }
        self.selected = (self.selected + 1) % total;
    }

    pub fn select_prev(&mut self) {
        let total = self.standings.country_count();
        if total == 0 {
            self.selected = 0;
            return;
        }
        if self.selected == 0 {
            self.selected = total - 1;
        } else {
            self.selected -= 1;
        }
    }

    pub fn clamp_selection(&mut self) {
        let total = self.standings.country_count();
        if total == 0 {
            self.selected = 0;
        } else if self.selected >= total {
            self.selected = total - 1;
        }
    }

    pub fn focus_next_column(&mut self) {
        self.focused_column = self.focused_column.next();
    }

    pub fn focus_prev_column(&mut self) {
        self.focused_column = self.focused_column.prev();
    }

    /// Header click on the focused column.
    pub fn progress_focused_sort(&mut self) {
        let column = self.focused_column;
        self.resort_keeping_selection(|sort| sort.progress(column));
    }

    pub fn sort_focused(&mut self, direction: SortDirection) {
        let event = SortEvent::Sort {
            column: self.focused_column,
            direction,
        };
        self.resort_keeping_selection(|sort| sort.apply(event));
    }

    pub fn clear_sort(&mut self) {
        self.resort_keeping_selection(|sort| sort.apply(SortEvent::Clear));
    }

    fn resort_keeping_selection(
        &mut self,
        change: impl FnOnce(&mut SortController<ViewStore>) -> bool,
    ) {
        let selected_code = self.selected_code();
        if !change(&mut self.sort) {
            let label = self.focused_column.config().label;
            self.push_log(format!("[INFO] {label} column is not sortable"));
            return;
        }
        let description = self.sort.describe();
        self.push_log(format!("[INFO] {description}"));
        self.reselect(selected_code);
    }

    fn reselect(&mut self, code: Option<String>) {
        let pos = code.and_then(|code| self.display_rows().iter().position(|row| row.code == code));
        match pos {
            Some(pos) => self.selected = pos,
            None => self.clamp_selection(),
        }
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        let msg = msg.into();
        tracing::debug!(target: "console", "{msg}");
        self.logs.push_back(msg);
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }
}

#[derive(Debug, Clone)]
pub enum Delta {
    SetMedals(Vec<MedalRecord>),
    FetchFailed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderCommand {
    FetchMedals,
    /// Forget cached responses, then fetch.
    Retry,
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::SetMedals(records) => {
            let selected_code = state.selected_code();
            state.fetch_in_flight = false;
            state.standings = Standings::from_records(&records);
            state.status = DataStatus::Ready;
            state.fetched_at = Some(Instant::now());
            state.updated_label = Some(chrono::Local::now().format("%H:%M:%S").to_string());
            state.reselect(selected_code);
            let count = state.standings.country_count();
            state.push_log(format!("[INFO] Loaded {count} countries"));
        }
        Delta::FetchFailed(message) => {
            state.fetch_in_flight = false;
            state.push_log(format!("[WARN] Medals fetch failed: {message}"));
            state.status = DataStatus::Failed(message);
        }
    }
}
