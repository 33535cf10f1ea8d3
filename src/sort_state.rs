use std::cmp::Ordering;

use crate::medal::{MedalKind, RankedMedalRecord};
use crate::query_store::{QueryParams, QueryStore};

pub const SORT_PARAM: &str = "sort";
pub const DIR_PARAM: &str = "dir";
pub const DEFAULT_SORT_KEY: &str = "default";

/// Grid columns, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Rank,
    Code,
    Gold,
    Silver,
    Bronze,
    Total,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnConfig {
    pub key: &'static str,
    pub label: &'static str,
    pub sortable: bool,
    pub medal: Option<MedalKind>,
}

const RANK_CONFIG: ColumnConfig = ColumnConfig {
    key: "rank",
    label: "Rank",
    sortable: false,
    medal: None,
};
const CODE_CONFIG: ColumnConfig = ColumnConfig {
    key: "code",
    label: "Country",
    sortable: true,
    medal: None,
};
const GOLD_CONFIG: ColumnConfig = ColumnConfig {
    key: "gold",
    label: "Gold",
    sortable: true,
    medal: Some(MedalKind::Gold),
};
const SILVER_CONFIG: ColumnConfig = ColumnConfig {
    key: "silver",
    label: "Silver",
    sortable: true,
    medal: Some(MedalKind::Silver),
};
const BRONZE_CONFIG: ColumnConfig = ColumnConfig {
    key: "bronze",
    label: "Bronze",
    sortable: true,
    medal: Some(MedalKind::Bronze),
};
const TOTAL_CONFIG: ColumnConfig = ColumnConfig {
    key: "total",
    label: "Total",
    sortable: true,
    medal: None,
};

impl Column {
    pub const ALL: [Column; 6] = [
        Column::Rank,
        Column::Code,
        Column::Gold,
        Column::Silver,
        Column::Bronze,
        Column::Total,
    ];

    pub fn config(self) -> &'static ColumnConfig {
        match self {
            Column::Rank => &RANK_CONFIG,
            Column::Code => &CODE_CONFIG,
            Column::Gold => &GOLD_CONFIG,
            Column::Silver => &SILVER_CONFIG,
            Column::Bronze => &BRONZE_CONFIG,
            Column::Total => &TOTAL_CONFIG,
        }
    }

    pub fn from_key(raw: &str) -> Option<Column> {
        let raw = raw.trim();
        Column::ALL
            .into_iter()
            .find(|col| col.config().key.eq_ignore_ascii_case(raw))
    }

    /// `None` for columns the user may not sort by.
    pub fn sort_column(self) -> Option<SortColumn> {
        match self {
            Column::Rank => None,
            Column::Code => Some(SortColumn::Code),
            Column::Gold => Some(SortColumn::Gold),
            Column::Silver => Some(SortColumn::Silver),
            Column::Bronze => Some(SortColumn::Bronze),
            Column::Total => Some(SortColumn::Total),
        }
    }

    pub fn next(self) -> Column {
        let idx = Column::ALL.iter().position(|c| *c == self).unwrap_or(0);
        Column::ALL[(idx + 1) % Column::ALL.len()]
    }

    pub fn prev(self) -> Column {
        let idx = Column::ALL.iter().position(|c| *c == self).unwrap_or(0);
        Column::ALL[(idx + Column::ALL.len() - 1) % Column::ALL.len()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortColumn {
    Code,
    Gold,
    Silver,
    Bronze,
    Total,
}

impl SortColumn {
    pub fn column(self) -> Column {
        match self {
            SortColumn::Code => Column::Code,
            SortColumn::Gold => Column::Gold,
            SortColumn::Silver => Column::Silver,
            SortColumn::Bronze => Column::Bronze,
            SortColumn::Total => Column::Total,
        }
    }

    pub fn key(self) -> &'static str {
        self.column().config().key
    }

    pub fn label(self) -> &'static str {
        self.column().config().label
    }

    pub fn from_key(raw: &str) -> Option<SortColumn> {
        Column::from_key(raw).and_then(Column::sort_column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn from_param(raw: &str) -> Option<SortDirection> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "asc" => Some(SortDirection::Asc),
            "desc" => Some(SortDirection::Desc),
            _ => None,
        }
    }

    pub fn as_param(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            SortDirection::Asc => "↑",
            SortDirection::Desc => "↓",
        }
    }

    fn apply(self, ord: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortKey {
    /// Olympic order.
    Default,
    Column(SortColumn),
}

/// A user's sort gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortEvent {
    Sort {
        column: Column,
        direction: SortDirection,
    },
    Clear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SortState {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl Default for SortState {
    fn default() -> Self {
        Self {
            key: SortKey::Default,
            direction: SortDirection::Desc,
        }
    }
}

impl SortState {
    /// Explicit sort on `column`. Gold descending is the Olympic order and
    /// resolves to the default state.
    pub fn explicit(column: SortColumn, direction: SortDirection) -> Self {
        if column == SortColumn::Gold && direction == SortDirection::Desc {
            return Self::default();
        }
        Self {
            key: SortKey::Column(column),
            direction,
        }
    }

    pub fn is_default(self) -> bool {
        self.key == SortKey::Default
    }

    /// `None` when the event names a column that cannot be sorted.
    pub fn apply(self, event: SortEvent) -> Option<SortState> {
        match event {
            SortEvent::Clear => Some(Self::default()),
            SortEvent::Sort { column, direction } => column
                .sort_column()
                .map(|col| Self::explicit(col, direction)),
        }
    }

    /// Header click: asc, then desc, then back to the default order.
    pub fn progress(self, column: Column) -> Option<SortState> {
        let target = column.sort_column()?;
        let next = match self.key {
            SortKey::Column(active) if active == target => match self.direction {
                SortDirection::Asc => Self::explicit(target, SortDirection::Desc),
                SortDirection::Desc => Self::default(),
            },
            _ => Self::explicit(target, SortDirection::Asc),
        };
        Some(next)
    }

    pub fn from_query(params: &QueryParams) -> SortState {
        let direction = params
            .get(DIR_PARAM)
            .and_then(SortDirection::from_param)
            .unwrap_or(SortDirection::Desc);
        match params.get(SORT_PARAM) {
            Some(raw) if raw.trim().eq_ignore_ascii_case(DEFAULT_SORT_KEY) => Self::default(),
            Some(raw) => SortColumn::from_key(raw)
                .map(|col| Self::explicit(col, direction))
                .unwrap_or_default(),
            None => Self::default(),
        }
    }

    /// Write this state's parameters into `params`, keeping unrelated keys.
    pub fn write_query(self, params: &mut QueryParams) {
        let key = match self.key {
            SortKey::Default => DEFAULT_SORT_KEY,
            SortKey::Column(col) => col.key(),
        };
        params.set(SORT_PARAM, key);
        params.set(DIR_PARAM, self.direction.as_param());
    }

    /// Direction indicator a column header should show.
    pub fn active_direction(self, column: Column) -> Option<SortDirection> {
        match self.key {
            SortKey::Default if column == Column::Gold => Some(SortDirection::Desc),
            SortKey::Default => None,
            SortKey::Column(active) if active.column() == column => Some(self.direction),
            SortKey::Column(_) => None,
        }
    }

    /// Rows in the order they should be shown. Never touches `rank`.
    pub fn display_order<'a>(self, rows: &'a [RankedMedalRecord]) -> Vec<&'a RankedMedalRecord> {
        let mut ordered: Vec<&RankedMedalRecord> = rows.iter().collect();
        ordered.sort_by_key(|row| row.rank);
        let SortKey::Column(column) = self.key else {
            return ordered;
        };
        ordered.sort_by(|a, b| {
            self.direction
                .apply(primary_cmp(column, a, b))
                .then_with(|| tie_break_cmp(column, a, b))
        });
        ordered
    }

    pub fn describe(self) -> String {
        match self.key {
            SortKey::Default => "Olympic order: Gold (desc), then Silver, then Bronze".to_string(),
            SortKey::Column(column) => {
                let mut text = format!("Sorted by {} ({})", column.label(), self.direction.as_param());
                for kind in tie_break_kinds(column) {
                    text.push_str(", then ");
                    text.push_str(kind.label());
                }
                text
            }
        }
    }
}

fn column_value(column: SortColumn, row: &RankedMedalRecord) -> u32 {
    match column {
        SortColumn::Gold => row.gold,
        SortColumn::Silver => row.silver,
        SortColumn::Bronze => row.bronze,
        SortColumn::Total => row.total,
        SortColumn::Code => 0,
    }
}

fn primary_cmp(column: SortColumn, a: &RankedMedalRecord, b: &RankedMedalRecord) -> Ordering {
    match column {
        SortColumn::Code => a.code.cmp(&b.code),
        _ => column_value(column, a).cmp(&column_value(column, b)),
    }
}

fn tie_break_kinds(column: SortColumn) -> Vec<MedalKind> {
    let driving = match column {
        SortColumn::Code => return Vec::new(),
        SortColumn::Gold => Some(MedalKind::Gold),
        SortColumn::Silver => Some(MedalKind::Silver),
        SortColumn::Bronze => Some(MedalKind::Bronze),
        SortColumn::Total => None,
    };
    MedalKind::CASCADE
        .into_iter()
        .filter(|kind| Some(*kind) != driving)
        .collect()
}

// Olympic cascade without the driving column, then Olympic rank.
fn tie_break_cmp(column: SortColumn, a: &RankedMedalRecord, b: &RankedMedalRecord) -> Ordering {
    tie_break_kinds(column)
        .into_iter()
        .map(|kind| b.count(kind).cmp(&a.count(kind)))
        .find(|ord| ord.is_ne())
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.rank.cmp(&b.rank))
}

/// Column metadata for the grid header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnHeader {
    pub column: Column,
    pub key: &'static str,
    pub label: &'static str,
    pub sortable: bool,
    pub medal: Option<MedalKind>,
    pub sort: Option<SortDirection>,
}

/// Owns the active [`SortState`] and mirrors it into a [`QueryStore`].
pub struct SortController<S: QueryStore> {
    state: SortState,
    store: S,
}

impl<S: QueryStore> SortController<S> {
    pub fn new(store: S) -> Self {
        let state = SortState::from_query(&store.read());
        tracing::debug!(?state, "sort state restored");
        Self { state, store }
    }

    pub fn state(&self) -> SortState {
        self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns `false` when the event was ignored.
    pub fn apply(&mut self, event: SortEvent) -> bool {
        match self.state.apply(event) {
            Some(next) => {
                self.commit(next);
                true
            }
            None => {
                tracing::debug!(?event, "ignored sort on non-sortable column");
                false
            }
        }
    }

    /// Sort request by column key, as it arrives from text input.
    pub fn request(&mut self, column_key: &str, direction: SortDirection) -> bool {
        let Some(column) = Column::from_key(column_key) else {
            tracing::debug!(column_key, "ignored sort on unknown column");
            return false;
        };
        self.apply(SortEvent::Sort { column, direction })
    }

    pub fn progress(&mut self, column: Column) -> bool {
        match self.state.progress(column) {
            Some(next) => {
                self.commit(next);
                true
            }
            None => false,
        }
    }

    pub fn columns(&self) -> Vec<ColumnHeader> {
        Column::ALL
            .into_iter()
            .map(|column| {
                let config = column.config();
                ColumnHeader {
                    column,
                    key: config.key,
                    label: config.label,
                    sortable: config.sortable,
                    medal: config.medal,
                    sort: self.state.active_direction(column),
                }
            })
            .collect()
    }

    pub fn display_order<'a>(&self, rows: &'a [RankedMedalRecord]) -> Vec<&'a RankedMedalRecord> {
        self.state.display_order(rows)
    }

    pub fn describe(&self) -> String {
        self.state.describe()
    }

    fn commit(&mut self, next: SortState) {
        if next != self.state {
            tracing::info!(from = ?self.state, to = ?next, "sort state changed");
        }
        self.state = next;
        let mut params = self.store.read();
        next.write_query(&mut params);
        if let Err(err) = self.store.replace(&params) {
            tracing::warn!("failed to persist sort state: {err:#}");
        }
    }
}
