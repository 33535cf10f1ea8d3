use anyhow::{Context, Result};

use medal_terminal::config::{AppConfig, DataSourceKind};
use medal_terminal::medals_fetch::MedalsSource;
use medal_terminal::query_store::MemoryQueryStore;
use medal_terminal::ranking::Standings;
use medal_terminal::sort_state::SortController;

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let mut config = AppConfig::from_env();
    if has_flag("--remote") {
        config.source = DataSourceKind::Remote;
    }
    let query = parse_query_arg()
        .or_else(|| config.query.clone())
        .unwrap_or_default();

    let source = MedalsSource::from_config(&config);
    let records = source
        .load()
        .with_context(|| format!("load medals from {} source", config.source.label()))?;
    let standings = Standings::from_records(&records);
    let sort = SortController::new(MemoryQueryStore::new(&query));

    println!("Olympics Medal Table ({})", config.source.label());
    println!("Total Countries: {}", standings.country_count());
    println!("{}", sort.describe());
    println!();
    println!(
        "{:>5}  {:<8} {:>6} {:>6} {:>6} {:>6}",
        "Rank", "Country", "Gold", "Silver", "Bronze", "Total"
    );
    for row in sort.display_order(&standings.rows) {
        println!(
            "{:>5}  {:<8} {:>6} {:>6} {:>6} {:>6}",
            format!("#{}", row.rank),
            row.code,
            row.gold,
            row.silver,
            row.bronze,
            row.total
        );
    }
    let totals = standings.totals;
    println!(
        "{:>5}  {:<8} {:>6} {:>6} {:>6} {:>6}",
        "", "ALL", totals.gold, totals.silver, totals.bronze, totals.total
    );

    Ok(())
}

fn has_flag(flag: &str) -> bool {
    std::env::args().skip(1).any(|arg| arg == flag)
}

fn parse_query_arg() -> Option<String> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(raw) = arg.strip_prefix("--query=") {
            let trimmed = raw.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == "--query" {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(next.trim().to_string());
            }
        }
    }
    None
}
