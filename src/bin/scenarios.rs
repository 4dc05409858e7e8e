//! Seeded sweep over filter settings.
//!
//! Draws random selections and thresholds within the dashboard's slider
//! ranges and prints one JSON line per trial, then an aggregate line.
//! `SEED` (default 42) and `TRIALS` (default 200) control the run.

use anyhow::Result;
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use serde::Serialize;

use aegis::data::{base_table, Category, Department, Priority};
use aegis::filter::{filter_rows, FilterSet, BUDGET_SLIDER, ROI_SLIDER};
use aegis::logging::{log, obj, v_num, Domain, Level};
use aegis::metrics::PortfolioSummary;

#[derive(Debug, Serialize)]
struct Trial {
    trial: usize,
    filters: FilterSet,
    summary: PortfolioSummary,
}

#[derive(Debug, Serialize)]
struct Aggregate {
    seed: u64,
    trials: usize,
    mean_count: f64,
    empty_trials: usize,
    best_avg_value_score: Option<f64>,
    best_trial: Option<usize>,
}

/// A non-empty random subset, in catalogue order.
fn subset<T: Copy + Ord>(rng: &mut StdRng, all: &[T]) -> Vec<T> {
    let n = rng.gen_range(1..=all.len());
    let mut picked: Vec<T> = all.choose_multiple(rng, n).copied().collect();
    picked.sort();
    picked
}

fn random_filters(rng: &mut StdRng) -> FilterSet {
    FilterSet::default()
        .with_departments(subset(rng, Department::ALL))
        .with_categories(subset(rng, Category::ALL))
        .with_priorities(subset(rng, Priority::ALL))
        .with_max_budget(BUDGET_SLIDER.snap(rng.gen_range(BUDGET_SLIDER.min..=BUDGET_SLIDER.max)))
        .with_min_roi(ROI_SLIDER.snap(rng.gen_range(ROI_SLIDER.min..=ROI_SLIDER.max)))
}

fn main() -> Result<()> {
    let seed: u64 = std::env::var("SEED").ok().and_then(|v| v.parse().ok()).unwrap_or(42);
    let trials: usize = std::env::var("TRIALS").ok().and_then(|v| v.parse().ok()).unwrap_or(200);

    let table = base_table();
    let mut rng = StdRng::seed_from_u64(seed);
    let mut total_count = 0usize;
    let mut empty_trials = 0usize;
    let mut best: Option<(usize, f64)> = None;

    for trial in 0..trials {
        let filters = random_filters(&mut rng);
        let summary = PortfolioSummary::from_table(&filter_rows(&table, &filters));
        total_count += summary.count;
        if summary.count == 0 {
            empty_trials += 1;
        } else if best.map_or(true, |(_, v)| summary.avg_value_score > v) {
            best = Some((trial, summary.avg_value_score));
        }
        println!(
            "{}",
            serde_json::to_string(&Trial {
                trial,
                filters,
                summary
            })?
        );
    }

    let aggregate = Aggregate {
        seed,
        trials,
        mean_count: if trials > 0 {
            total_count as f64 / trials as f64
        } else {
            0.0
        },
        empty_trials,
        best_avg_value_score: best.map(|(_, v)| v),
        best_trial: best.map(|(t, _)| t),
    };
    log(
        Level::Info,
        Domain::System,
        "scenarios_done",
        obj(&[
            ("trials", v_num(trials as f64)),
            ("mean_count", v_num(aggregate.mean_count)),
        ]),
    );
    println!("{}", serde_json::to_string(&aggregate)?);
    Ok(())
}
