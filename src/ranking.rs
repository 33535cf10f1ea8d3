use std::cmp::Ordering;

use crate::medal::{MedalKind, MedalRecord, MedalTotals, RankedMedalRecord};

/// Ranked rows plus the aggregates the summary cards show.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Standings {
    pub rows: Vec<RankedMedalRecord>,
    pub totals: MedalTotals,
}

impl Standings {
    pub fn from_records(records: &[MedalRecord]) -> Self {
        let rows = rank_medals(records);
        let totals = medal_totals(&rows);
        Self { rows, totals }
    }

    pub fn country_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Place records in Olympic order: gold, then silver, then bronze, all
/// descending. Records level on all three keep their input order and get
/// consecutive ranks.
pub fn rank_medals(records: &[MedalRecord]) -> Vec<RankedMedalRecord> {
    let mut sorted: Vec<&MedalRecord> = records.iter().collect();
    // `sort_by` is stable; rank determinism depends on it.
    sorted.sort_by(|a, b| olympic_cmp(a, b));

    sorted
        .into_iter()
        .enumerate()
        .map(|(idx, rec)| RankedMedalRecord {
            code: rec.code.clone(),
            gold: rec.gold,
            silver: rec.silver,
            bronze: rec.bronze,
            total: rec.total(),
            rank: idx + 1,
        })
        .collect()
}

/// Column sums, saturating at `u32::MAX`.
pub fn medal_totals(rows: &[RankedMedalRecord]) -> MedalTotals {
    rows.iter().fold(MedalTotals::default(), |acc, row| MedalTotals {
        gold: acc.gold.saturating_add(row.gold),
        silver: acc.silver.saturating_add(row.silver),
        bronze: acc.bronze.saturating_add(row.bronze),
        total: acc.total.saturating_add(row.total),
    })
}

fn olympic_cmp(a: &MedalRecord, b: &MedalRecord) -> Ordering {
    MedalKind::CASCADE
        .iter()
        .map(|kind| b.count(*kind).cmp(&a.count(*kind)))
        .find(|ord| ord.is_ne())
        .unwrap_or(Ordering::Equal)
}
