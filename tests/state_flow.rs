use std::sync::mpsc;
use std::time::{Duration, Instant};

use medal_terminal::config::DataSourceKind;
use medal_terminal::medal::MedalRecord;
use medal_terminal::medals_fetch::MedalsSource;
use medal_terminal::provider::{handle_command, spawn_medals_provider};
use medal_terminal::query_store::MemoryQueryStore;
use medal_terminal::sort_state::{Column, SortColumn, SortDirection, SortState};
use medal_terminal::state::{AppState, DataStatus, Delta, ProviderCommand, apply_delta};

fn scenario_records() -> Vec<MedalRecord> {
    vec![
        MedalRecord::new("USA", 10, 5, 3),
        MedalRecord::new("CHN", 10, 5, 3),
        MedalRecord::new("GER", 9, 9, 9),
    ]
}

fn loaded_state() -> AppState {
    let mut state = AppState::default();
    assert!(state.begin_fetch());
    apply_delta(&mut state, Delta::SetMedals(scenario_records()));
    state
}

fn shown_codes(state: &AppState) -> Vec<String> {
    state
        .display_rows()
        .into_iter()
        .map(|row| row.code.clone())
        .collect()
}

#[test]
fn set_medals_makes_standings_ready() {
    let state = loaded_state();
    assert_eq!(state.status, DataStatus::Ready);
    assert!(!state.fetch_in_flight);
    assert_eq!(state.standings.country_count(), 3);
    assert_eq!(state.standings.totals.total, 63);
    assert!(state.updated_label.is_some());
    assert_eq!(state.logs.back().map(String::as_str), Some("[INFO] Loaded 3 countries"));
}

#[test]
fn only_one_fetch_is_in_flight() {
    let mut state = AppState::default();
    assert!(state.is_loading());
    assert!(state.begin_fetch());
    assert!(!state.begin_fetch());
    apply_delta(&mut state, Delta::FetchFailed("network error: down".to_string()));
    assert!(state.begin_fetch());
}

#[test]
fn failure_keeps_previous_rows_and_exposes_message() {
    let mut state = loaded_state();
    assert!(state.begin_fetch());
    assert!(state.is_loading());
    apply_delta(
        &mut state,
        Delta::FetchFailed("server responded 503: busy".to_string()),
    );

    assert_eq!(state.error_message(), Some("server responded 503: busy"));
    assert!(!state.fetch_in_flight);
    assert_eq!(state.standings.country_count(), 3);
    assert!(
        state
            .logs
            .iter()
            .any(|line| line.starts_with("[WARN] Medals fetch failed"))
    );
}

#[test]
fn refresh_is_due_only_after_the_window() {
    let mut state = loaded_state();
    let now = Instant::now();
    assert!(!state.needs_refresh(now));
    assert!(!state.needs_refresh(now + Duration::from_secs(60)));
    assert!(state.needs_refresh(now + Duration::from_secs(301)));

    assert!(state.begin_fetch());
    assert!(!state.needs_refresh(now + Duration::from_secs(900)));

    apply_delta(&mut state, Delta::FetchFailed("down".to_string()));
    assert!(!state.needs_refresh(now + Duration::from_secs(900)));
}

#[test]
fn never_loaded_state_does_not_refresh() {
    let state = AppState::default();
    assert!(!state.needs_refresh(Instant::now() + Duration::from_secs(3600)));
}

#[test]
fn selection_follows_country_across_sorts() {
    let mut state = loaded_state();
    state.select_next();
    assert_eq!(state.selected_code().as_deref(), Some("CHN"));

    state.focused_column = Column::Bronze;
    state.sort_focused(SortDirection::Desc);
    assert_eq!(shown_codes(&state), ["GER", "USA", "CHN"]);
    assert_eq!(state.selected, 2);
    assert_eq!(state.selected_code().as_deref(), Some("CHN"));

    state.clear_sort();
    assert_eq!(state.selected, 1);
}

#[test]
fn progress_on_focused_column_and_rank_is_rejected() {
    let mut state = loaded_state();
    state.focus_next_column();
    assert_eq!(state.focused_column, Column::Silver);
    state.progress_focused_sort();
    assert_eq!(
        state.sort.state(),
        SortState::explicit(SortColumn::Silver, SortDirection::Asc)
    );

    state.focus_prev_column();
    state.focus_prev_column();
    state.focus_prev_column();
    assert_eq!(state.focused_column, Column::Rank);
    state.progress_focused_sort();
    assert_eq!(
        state.logs.back().map(String::as_str),
        Some("[INFO] Rank column is not sortable")
    );
    assert_eq!(
        state.sort.state(),
        SortState::explicit(SortColumn::Silver, SortDirection::Asc)
    );
}

#[test]
fn selection_wraps_and_clamps() {
    let mut state = loaded_state();
    state.select_prev();
    assert_eq!(state.selected, 2);
    state.select_next();
    assert_eq!(state.selected, 0);

    state.selected = 2;
    apply_delta(
        &mut state,
        Delta::SetMedals(vec![MedalRecord::new("NOR", 11, 5, 10)]),
    );
    assert_eq!(state.selected, 0);
}

#[test]
fn persisted_sort_is_restored_on_start() {
    let store = MemoryQueryStore::new("sort=total&dir=asc");
    let state = AppState::new(
        Box::new(store),
        DataSourceKind::Bundled,
        Duration::from_secs(300),
    );
    assert_eq!(
        state.sort.state(),
        SortState::explicit(SortColumn::Total, SortDirection::Asc)
    );
}

#[test]
fn bundled_source_serves_medals() {
    let delta = handle_command(&MedalsSource::Bundled, ProviderCommand::Retry);
    let Delta::SetMedals(records) = delta else {
        panic!("expected medals, got {delta:?}");
    };
    assert_eq!(records.len(), 13);
}

#[test]
fn provider_thread_answers_commands_and_stops() {
    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    let handle = spawn_medals_provider(MedalsSource::Bundled, tx, cmd_rx);

    cmd_tx.send(ProviderCommand::FetchMedals).unwrap();
    let delta = rx
        .recv_timeout(Duration::from_secs(5))
        .expect("provider should answer");
    assert!(matches!(delta, Delta::SetMedals(ref records) if records.len() == 13));

    drop(cmd_tx);
    handle.join().expect("provider thread should exit cleanly");
}
