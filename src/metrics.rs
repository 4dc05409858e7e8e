use serde::{Deserialize, Serialize};

use crate::data::{EquipmentRecord, Table};

/// Financial metrics derived from a record's base columns. All money values
/// are in $M.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    pub total_ownership_cost: f64,
    pub lifetime_return: f64,
    pub net_value: f64,
    pub value_score: f64,
}

impl DerivedMetrics {
    pub fn compute(record: &EquipmentRecord) -> Self {
        let total_ownership_cost =
            record.cost_m * (1.0 + record.maintenance_pct * record.lifespan_years as f64);
        let lifetime_return = record.cost_m * record.roi;
        let net_value = lifetime_return - total_ownership_cost;
        // Net value per $M invested; a zero-cost record scores zero.
        let value_score = if record.cost_m != 0.0 {
            net_value / record.cost_m
        } else {
            0.0
        };
        Self {
            total_ownership_cost,
            lifetime_return,
            net_value,
            value_score,
        }
    }
}

/// Attach derived metrics to every row. Recomputes rows that already carry
/// metrics, so the result only depends on the base columns.
pub fn derive_metrics(table: Table) -> Table {
    table
        .into_rows()
        .into_iter()
        .map(|mut row| {
            row.metrics = Some(DerivedMetrics::compute(&row));
            row
        })
        .collect()
}

/// Headline figures shown above the chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub count: usize,
    pub total_cost: f64,
    pub avg_roi: f64,
    pub avg_value_score: f64,
}

impl PortfolioSummary {
    pub fn from_table(table: &Table) -> Self {
        let count = table.len();
        if count == 0 {
            return Self {
                count: 0,
                total_cost: 0.0,
                avg_roi: 0.0,
                avg_value_score: 0.0,
            };
        }
        let total_cost: f64 = table.iter().map(|r| r.cost_m).sum();
        let roi_sum: f64 = table.iter().map(|r| r.roi).sum();
        let value_sum: f64 = table.iter().map(|r| r.derived().value_score).sum();
        Self {
            count,
            total_cost,
            avg_roi: roi_sum / count as f64,
            avg_value_score: value_sum / count as f64,
        }
    }

    pub fn cards(&self) -> Vec<SummaryCard> {
        vec![
            SummaryCard::new("Items Count", self.count.to_string()),
            SummaryCard::new("Total Cost", format_currency(self.total_cost)),
            SummaryCard::new("Average ROI", format_multiple(self.avg_roi)),
            SummaryCard::new("Avg Value Score", format!("{:.3}", self.avg_value_score)),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryCard {
    pub label: String,
    pub value: String,
}

impl SummaryCard {
    fn new(label: &str, value: String) -> Self {
        Self {
            label: label.to_string(),
            value,
        }
    }
}

/// `$123.4M`
pub fn format_currency(value: f64) -> String {
    format!("${:.1}M", value)
}

/// `2.45x`
pub fn format_multiple(value: f64) -> String {
    format!("{:.2}x", value)
}
