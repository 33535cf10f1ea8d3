use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use medal_terminal::medal::{MedalRecord, MedalTotals};
use medal_terminal::ranking::{Standings, medal_totals, rank_medals};

fn scenario_records() -> Vec<MedalRecord> {
    vec![
        MedalRecord::new("USA", 10, 5, 3),
        MedalRecord::new("CHN", 10, 5, 3),
        MedalRecord::new("GER", 9, 9, 9),
    ]
}

fn codes<'a>(rows: impl IntoIterator<Item = &'a String>) -> Vec<&'a str> {
    rows.into_iter().map(String::as_str).collect()
}

#[test]
fn scenario_olympic_order_and_totals() {
    let ranked = rank_medals(&scenario_records());
    assert_eq!(codes(ranked.iter().map(|r| &r.code)), ["USA", "CHN", "GER"]);
    assert_eq!(
        ranked.iter().map(|r| (r.rank, r.total)).collect::<Vec<_>>(),
        [(1, 18), (2, 18), (3, 27)]
    );

    let totals = medal_totals(&ranked);
    assert_eq!(
        totals,
        MedalTotals {
            gold: 29,
            silver: 19,
            bronze: 15,
            total: 63,
        }
    );
}

#[test]
fn silver_then_bronze_break_gold_ties() {
    let ranked = rank_medals(&[
        MedalRecord::new("AAA", 3, 1, 9),
        MedalRecord::new("BBB", 3, 2, 0),
        MedalRecord::new("CCC", 3, 1, 10),
        MedalRecord::new("DDD", 4, 0, 0),
    ]);
    assert_eq!(
        codes(ranked.iter().map(|r| &r.code)),
        ["DDD", "BBB", "CCC", "AAA"]
    );
}

#[test]
fn full_ties_keep_input_order() {
    let forward = rank_medals(&scenario_records());
    let mut reversed_input = scenario_records();
    reversed_input.swap(0, 1);
    let reversed = rank_medals(&reversed_input);

    assert_eq!(forward[0].code, "USA");
    assert_eq!(reversed[0].code, "CHN");
    assert_eq!(reversed[1].code, "USA");
    assert_eq!(reversed[1].rank, 2);
}

#[test]
fn ranking_is_permutation_invariant_for_distinct_records() {
    let mut rng = StdRng::seed_from_u64(2014);
    let mut records: Vec<MedalRecord> = (0..40)
        .map(|idx| {
            // Unique gold count per record keeps the expected order unambiguous.
            MedalRecord::new(
                format!("C{idx:02}"),
                idx * 2 + rng.gen_range(0..2),
                rng.gen_range(0..15),
                rng.gen_range(0..15),
            )
        })
        .collect();
    let baseline: Vec<String> = rank_medals(&records).into_iter().map(|r| r.code).collect();

    for _ in 0..25 {
        records.shuffle(&mut rng);
        let ranked: Vec<String> = rank_medals(&records).into_iter().map(|r| r.code).collect();
        assert_eq!(ranked, baseline);
    }
}

#[test]
fn ranks_are_dense_and_totals_add_up() {
    let mut rng = StdRng::seed_from_u64(42);
    for size in [1usize, 2, 7, 50] {
        let records: Vec<MedalRecord> = (0..size)
            .map(|idx| {
                MedalRecord::new(
                    format!("R{idx}"),
                    rng.gen_range(0..4),
                    rng.gen_range(0..4),
                    rng.gen_range(0..4),
                )
            })
            .collect();
        let ranked = rank_medals(&records);
        let ranks: Vec<usize> = ranked.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, (1..=size).collect::<Vec<_>>());

        for pair in ranked.windows(2) {
            let a = (pair[0].gold, pair[0].silver, pair[0].bronze);
            let b = (pair[1].gold, pair[1].silver, pair[1].bronze);
            assert!(a >= b, "{a:?} ranked above {b:?}");
        }

        let totals = medal_totals(&ranked);
        assert_eq!(totals.total, totals.gold + totals.silver + totals.bronze);
        assert_eq!(totals.total, ranked.iter().map(|r| r.total).sum::<u32>());
    }
}

#[test]
fn empty_input_gives_empty_standings() {
    let standings = Standings::from_records(&[]);
    assert!(standings.is_empty());
    assert_eq!(standings.country_count(), 0);
    assert_eq!(standings.totals, MedalTotals::default());
}

#[test]
fn standings_bundle_rows_and_totals() {
    let standings = Standings::from_records(&scenario_records());
    assert_eq!(standings.country_count(), 3);
    assert_eq!(standings.totals.total, 63);
    assert_eq!(standings.rows[2].code, "GER");
}

#[test]
fn huge_counts_saturate_instead_of_overflowing() {
    let standings = Standings::from_records(&[
        MedalRecord::new("AAA", u32::MAX, 1, 0),
        MedalRecord::new("BBB", 7, 0, 0),
    ]);
    assert_eq!(standings.rows[0].code, "AAA");
    assert_eq!(standings.rows[0].total, u32::MAX);
    assert_eq!(standings.totals.gold, u32::MAX);
    assert_eq!(standings.totals.total, u32::MAX);
    assert_eq!(standings.rows[1].total, 7);
}
