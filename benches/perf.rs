use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use medal_terminal::medal::MedalRecord;
use medal_terminal::medals_fetch::{bundled_medals, parse_medals_json};
use medal_terminal::ranking::rank_medals;
use medal_terminal::sort_state::{SortColumn, SortDirection, SortState};

fn synthetic_records(count: u32) -> Vec<MedalRecord> {
    (0..count)
        .map(|idx| {
            MedalRecord::new(
                format!("C{idx:03}"),
                (idx * 7) % 40,
                (idx * 11) % 35,
                (idx * 13) % 30,
            )
        })
        .collect()
}

fn bench_rank_medals(c: &mut Criterion) {
    let records = synthetic_records(250);
    c.bench_function("rank_medals_250", |b| {
        b.iter(|| {
            let ranked = rank_medals(black_box(&records));
            black_box(ranked.len());
        })
    });
}

fn bench_display_order(c: &mut Criterion) {
    let rows = rank_medals(&synthetic_records(250));
    let states = [
        SortState::default(),
        SortState::explicit(SortColumn::Bronze, SortDirection::Desc),
        SortState::explicit(SortColumn::Total, SortDirection::Asc),
        SortState::explicit(SortColumn::Code, SortDirection::Asc),
    ];
    c.bench_function("display_order_250", |b| {
        b.iter(|| {
            for state in states {
                let shown = state.display_order(black_box(&rows));
                black_box(shown.len());
            }
        })
    });
}

fn bench_parse_bundled(c: &mut Criterion) {
    let raw = serde_json::to_string(&serde_json::json!({
        "record": { "medals": bundled_medals().unwrap() }
    }))
    .unwrap();
    c.bench_function("parse_wrapped_medals", |b| {
        b.iter(|| {
            let records = parse_medals_json(black_box(&raw)).unwrap();
            black_box(records.len());
        })
    });
}

criterion_group!(
    benches,
    bench_rank_medals,
    bench_display_order,
    bench_parse_bundled
);
criterion_main!(benches);
