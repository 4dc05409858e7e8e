use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};

use aegis::data::{base_table, Category, Department, Priority, Table};
use aegis::filter::{filter_rows, FilterSet, Preset};

fn pick<T: Copy>(rng: &mut StdRng, all: &[T]) -> Vec<T> {
    let n = rng.gen_range(0..=all.len());
    all.choose_multiple(rng, n).copied().collect()
}

fn random_filters(rng: &mut StdRng) -> FilterSet {
    let depts: Vec<Department> = pick(rng, Department::ALL);
    let cats: Vec<Category> = pick(rng, Category::ALL);
    let prios: Vec<Priority> = pick(rng, Priority::ALL);
    FilterSet::default()
        .with_departments(depts)
        .with_categories(cats)
        .with_priorities(prios)
        .with_max_budget(rng.gen_range(20.0..100.0))
        .with_min_roi(rng.gen_range(1.5..3.5))
}

#[test]
fn filtered_rows_satisfy_every_predicate() {
    let table = base_table();
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..500 {
        let filters = random_filters(&mut rng);
        let kept = filter_rows(&table, &filters);
        for row in &kept {
            assert!(filters.matches(row));
            assert!(row.cost_m <= filters.max_budget);
            assert!(row.roi >= filters.min_roi);
        }
        // rows dropped really fail a predicate
        let dropped = table.iter().filter(|r| kept.get(&r.upgrade_id).is_none());
        for row in dropped {
            assert!(!filters.matches(row));
        }
    }
}

#[test]
fn filtering_preserves_order_and_is_idempotent() {
    let table = base_table();
    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..200 {
        let filters = random_filters(&mut rng);
        let once = filter_rows(&table, &filters);
        let twice = filter_rows(&once, &filters);
        assert_eq!(once, twice);
        let positions: Vec<usize> = once
            .iter()
            .map(|r| table.iter().position(|t| t.upgrade_id == r.upgrade_id).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }
}

#[test]
fn tighter_thresholds_never_add_rows() {
    let table = base_table();
    let loose = FilterSet::default().with_max_budget(80.0).with_min_roi(2.0);
    let tight = loose.clone().with_max_budget(60.0).with_min_roi(2.5);
    let loose_rows = filter_rows(&table, &loose);
    let tight_rows = filter_rows(&table, &tight);
    assert!(tight_rows.len() <= loose_rows.len());
    assert!(tight_rows.iter().all(|r| loose_rows.get(&r.upgrade_id).is_some()));
}

#[test]
fn empty_input_yields_empty_output() {
    assert!(filter_rows(&Table::default(), &FilterSet::default()).is_empty());
}

#[test]
fn presets_on_fixed_data() {
    let table = base_table();
    assert_eq!(filter_rows(&table, &Preset::FullPortfolio.filters()).len(), 20);
    assert_eq!(filter_rows(&table, &Preset::HighValueOnly.filters()).len(), 20);
    assert_eq!(filter_rows(&table, &Preset::BudgetConstrained.filters()).len(), 14);
}
