//! Row filtering: categorical selections plus budget and ROI thresholds.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::data::{Category, Department, EquipmentRecord, Priority, Table};
use crate::error::ValidationError;
use crate::logging::log_filter;

pub const DEFAULT_MAX_BUDGET: f64 = 300.0;
pub const DEFAULT_MIN_ROI: f64 = 1.2;

/// Bounds of a threshold control.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SliderRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub suffix: &'static str,
}

impl SliderRange {
    /// Clamp into range and snap to the nearest step.
    pub fn snap(&self, value: f64) -> f64 {
        let clamped = value.clamp(self.min, self.max);
        let steps = ((clamped - self.min) / self.step).round();
        (self.min + steps * self.step).min(self.max)
    }
}

pub const BUDGET_SLIDER: SliderRange = SliderRange {
    min: 100.0,
    max: 400.0,
    step: 20.0,
    suffix: "M",
};

pub const ROI_SLIDER: SliderRange = SliderRange {
    min: 1.0,
    max: 1.8,
    step: 0.1,
    suffix: "x",
};

/// The active filter. An empty selection set constrains nothing; both
/// thresholds are inclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterSet {
    pub departments: BTreeSet<Department>,
    pub categories: BTreeSet<Category>,
    pub priorities: BTreeSet<Priority>,
    pub max_budget: f64,
    pub min_roi: f64,
}

impl Default for FilterSet {
    fn default() -> Self {
        Self {
            departments: Department::ALL.iter().copied().collect(),
            categories: Category::ALL.iter().copied().collect(),
            priorities: Priority::ALL.iter().copied().collect(),
            max_budget: DEFAULT_MAX_BUDGET,
            min_roi: DEFAULT_MIN_ROI,
        }
    }
}

impl FilterSet {
    /// No selections and thresholds that admit every row.
    pub fn unrestricted() -> Self {
        Self {
            departments: BTreeSet::new(),
            categories: BTreeSet::new(),
            priorities: BTreeSet::new(),
            max_budget: f64::INFINITY,
            min_roi: f64::NEG_INFINITY,
        }
    }

    pub fn with_departments<I: IntoIterator<Item = Department>>(mut self, items: I) -> Self {
        self.departments = items.into_iter().collect();
        self
    }

    pub fn with_categories<I: IntoIterator<Item = Category>>(mut self, items: I) -> Self {
        self.categories = items.into_iter().collect();
        self
    }

    pub fn with_priorities<I: IntoIterator<Item = Priority>>(mut self, items: I) -> Self {
        self.priorities = items.into_iter().collect();
        self
    }

    pub fn with_max_budget(mut self, max_budget: f64) -> Self {
        self.max_budget = max_budget;
        self
    }

    pub fn with_min_roi(mut self, min_roi: f64) -> Self {
        self.min_roi = min_roi;
        self
    }

    pub fn matches(&self, record: &EquipmentRecord) -> bool {
        (self.departments.is_empty() || self.departments.contains(&record.department))
            && (self.categories.is_empty() || self.categories.contains(&record.category))
            && (self.priorities.is_empty() || self.priorities.contains(&record.priority))
            && record.cost_m <= self.max_budget
            && record.roi >= self.min_roi
    }
}

/// Keep the rows matching `filters`, in their original order.
pub fn filter_rows(table: &Table, filters: &FilterSet) -> Table {
    let kept: Table = table
        .iter()
        .filter(|row| filters.matches(row))
        .cloned()
        .collect();
    log_filter(filters, table.len(), kept.len());
    kept
}

/// Named filter configurations offered as one-click shortcuts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Preset {
    FullPortfolio,
    BudgetConstrained,
    HighValueOnly,
}

impl Preset {
    pub const ALL: [Preset; 3] = [
        Preset::FullPortfolio,
        Preset::BudgetConstrained,
        Preset::HighValueOnly,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Preset::FullPortfolio => "Full Portfolio",
            Preset::BudgetConstrained => "Budget Constrained",
            Preset::HighValueOnly => "High Value Only",
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            Preset::FullPortfolio => "full",
            Preset::BudgetConstrained => "budget",
            Preset::HighValueOnly => "value",
        }
    }

    pub fn filters(&self) -> FilterSet {
        let all = FilterSet::default();
        match self {
            Preset::FullPortfolio => all.with_max_budget(400.0).with_min_roi(1.0),
            Preset::BudgetConstrained => all
                .with_priorities([Priority::Critical, Priority::High])
                .with_max_budget(200.0)
                .with_min_roi(1.3),
            Preset::HighValueOnly => all.with_max_budget(300.0).with_min_roi(1.4),
        }
    }

    /// Accepts the slug or the label, case-insensitively.
    pub fn parse(name: &str) -> Result<Preset, ValidationError> {
        let name = name.trim();
        Preset::ALL
            .iter()
            .copied()
            .find(|p| p.slug().eq_ignore_ascii_case(name) || p.label().eq_ignore_ascii_case(name))
            .ok_or_else(|| ValidationError::UnknownPreset(name.to_string()))
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::base_table;

    #[test]
    fn default_keeps_whole_dataset() {
        let table = base_table();
        assert_eq!(filter_rows(&table, &FilterSet::default()).len(), 20);
        assert_eq!(filter_rows(&table, &FilterSet::unrestricted()).len(), 20);
    }

    #[test]
    fn empty_selection_constrains_nothing() {
        let table = base_table();
        let filters = FilterSet::default().with_departments(Vec::<Department>::new());
        assert_eq!(filter_rows(&table, &filters).len(), 20);
    }

    #[test]
    fn department_membership() {
        let table = base_table();
        let navy = filter_rows(&table, &FilterSet::default().with_departments([Department::Navy]));
        assert_eq!(navy.ids(), vec!["U03", "U11", "U14", "U18"]);
    }

    #[test]
    fn thresholds_are_inclusive() {
        let table = base_table();
        let capped = filter_rows(&table, &FilterSet::default().with_max_budget(28.0));
        assert_eq!(capped.ids(), vec!["U16"]);
        let roi = filter_rows(&table, &FilterSet::default().with_min_roi(3.27));
        assert_eq!(roi.ids(), vec!["U18"]);
    }

    #[test]
    fn combined_predicates() {
        let table = base_table();
        let filters = FilterSet::default()
            .with_categories([Category::Aircraft])
            .with_priorities([Priority::Critical])
            .with_min_roi(2.5);
        assert_eq!(filter_rows(&table, &filters).ids(), vec!["U02", "U13"]);
    }

    #[test]
    fn budget_preset_drops_medium_priority() {
        let table = base_table();
        let rows = filter_rows(&table, &Preset::BudgetConstrained.filters());
        assert_eq!(rows.len(), 14);
        assert!(rows.iter().all(|r| r.priority != Priority::Medium));
    }

    #[test]
    fn preset_parse() {
        assert_eq!(Preset::parse("budget").unwrap(), Preset::BudgetConstrained);
        assert_eq!(Preset::parse("high value only").unwrap(), Preset::HighValueOnly);
        assert!(Preset::parse("cheap").is_err());
    }

    #[test]
    fn slider_snaps_to_step() {
        assert_eq!(BUDGET_SLIDER.snap(95.0), 100.0);
        assert_eq!(BUDGET_SLIDER.snap(131.0), 140.0);
        assert_eq!(BUDGET_SLIDER.snap(1000.0), 400.0);
        assert!((ROI_SLIDER.snap(1.26) - 1.3).abs() < 1e-9);
    }
}
