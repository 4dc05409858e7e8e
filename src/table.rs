//! Formatted, sortable view of the filtered rows.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use crate::data::{EquipmentRecord, Table};
use crate::error::ValidationError;

pub const EMPTY_TABLE_MESSAGE: &str = "No items match current filters";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Column {
    Id,
    Name,
    Dept,
    Category,
    Cost,
    Roi,
    Maint,
    Age,
    Lifespan,
    Value,
}

impl Column {
    pub const ALL: [Column; 10] = [
        Column::Id,
        Column::Name,
        Column::Dept,
        Column::Category,
        Column::Cost,
        Column::Roi,
        Column::Maint,
        Column::Age,
        Column::Lifespan,
        Column::Value,
    ];

    pub fn header(&self) -> &'static str {
        match self {
            Column::Id => "ID",
            Column::Name => "Name",
            Column::Dept => "Dept",
            Column::Category => "Category",
            Column::Cost => "Cost",
            Column::Roi => "ROI",
            Column::Maint => "Maint",
            Column::Age => "Age",
            Column::Lifespan => "Lifespan",
            Column::Value => "Value",
        }
    }

    /// Header lookup, case-insensitive.
    pub fn parse(name: &str) -> Result<Column, ValidationError> {
        Column::ALL
            .iter()
            .copied()
            .find(|c| c.header().eq_ignore_ascii_case(name.trim()))
            .ok_or_else(|| ValidationError::UnknownValue {
                what: "column",
                value: name.to_string(),
            })
    }

    fn cell(&self, row: &EquipmentRecord) -> String {
        match self {
            Column::Id => row.upgrade_id.clone(),
            Column::Name => row.upgrade_name.clone(),
            Column::Dept => row.department.to_string(),
            Column::Category => row.category.to_string(),
            Column::Cost => format!("${:.0}M", row.cost_m),
            Column::Roi => format!("{:.2}x", row.roi),
            Column::Maint => format!("{:.0}%", row.maintenance_pct * 100.0),
            Column::Age => row.age_years.to_string(),
            Column::Lifespan => row.lifespan_years.to_string(),
            Column::Value => format!("{:.3}", row.derived().value_score),
        }
    }

    /// Compares underlying values, not the formatted text.
    fn compare(&self, a: &EquipmentRecord, b: &EquipmentRecord) -> Ordering {
        match self {
            Column::Id => a.upgrade_id.cmp(&b.upgrade_id),
            Column::Name => a.upgrade_name.cmp(&b.upgrade_name),
            Column::Dept => a.department.as_str().cmp(b.department.as_str()),
            Column::Category => a.category.as_str().cmp(b.category.as_str()),
            Column::Cost => a.cost_m.total_cmp(&b.cost_m),
            Column::Roi => a.roi.total_cmp(&b.roi),
            Column::Maint => a.maintenance_pct.total_cmp(&b.maintenance_pct),
            Column::Age => a.age_years.cmp(&b.age_years),
            Column::Lifespan => a.lifespan_years.cmp(&b.lifespan_years),
            Column::Value => a.derived().value_score.total_cmp(&b.derived().value_score),
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

impl std::str::FromStr for Column {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Column::parse(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortOrder {
    pub column: Column,
    pub descending: bool,
}

impl Default for SortOrder {
    fn default() -> Self {
        Self {
            column: Column::Value,
            descending: true,
        }
    }
}

impl SortOrder {
    pub fn ascending(column: Column) -> Self {
        Self {
            column,
            descending: false,
        }
    }

    pub fn descending(column: Column) -> Self {
        Self {
            column,
            descending: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Set instead of rows when nothing matched.
    pub message: Option<String>,
}

impl DisplayTable {
    pub fn build(table: &Table, order: SortOrder) -> Self {
        if table.is_empty() {
            return Self {
                columns: vec!["Message".to_string()],
                rows: vec![vec![EMPTY_TABLE_MESSAGE.to_string()]],
                message: Some(EMPTY_TABLE_MESSAGE.to_string()),
            };
        }

        let mut sorted: Vec<&EquipmentRecord> = table.iter().collect();
        sorted.sort_by(|a, b| {
            let ord = order.column.compare(a, b);
            if order.descending {
                ord.reverse()
            } else {
                ord
            }
        });

        Self {
            columns: Column::ALL.iter().map(|c| c.header().to_string()).collect(),
            rows: sorted
                .into_iter()
                .map(|row| Column::ALL.iter().map(|c| c.cell(row)).collect())
                .collect(),
            message: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.message.is_some()
    }

    /// Left-aligned plain-text columns separated by two spaces.
    pub fn to_text(&self) -> String {
        let mut widths: Vec<usize> = self.columns.iter().map(|c| c.chars().count()).collect();
        for row in &self.rows {
            for (w, cell) in widths.iter_mut().zip(row) {
                *w = (*w).max(cell.chars().count());
            }
        }

        let line = |cells: &[String]| {
            cells
                .iter()
                .zip(&widths)
                .map(|(cell, w)| format!("{:<width$}", cell, width = *w))
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_string()
        };

        let mut out = line(&self.columns);
        out.push('\n');
        out.push_str(
            &widths
                .iter()
                .map(|w| "-".repeat(*w))
                .collect::<Vec<_>>()
                .join("  "),
        );
        for row in &self.rows {
            out.push('\n');
            out.push_str(&line(row));
        }
        out.push('\n');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::base_table;

    #[test]
    fn cells_are_formatted() {
        let table = DisplayTable::build(&base_table(), SortOrder::ascending(Column::Id));
        assert_eq!(
            table.rows[0],
            vec![
                "U01",
                "M1 Abrams Tank Modernization",
                "Army",
                "Vehicles",
                "$75M",
                "2.45x",
                "6%",
                "8",
                "18",
                "0.370"
            ]
        );
    }

    #[test]
    fn default_sort_is_value_descending() {
        let table = DisplayTable::build(&base_table(), SortOrder::default());
        let values: Vec<f64> = table.rows.iter().map(|r| r[9].parse().unwrap()).collect();
        assert!(values.windows(2).all(|w| w[0] >= w[1]));
        // negative scores sort below positive ones
        assert!(values.last().unwrap() < &0.0);
    }

    #[test]
    fn numeric_sort_on_cost() {
        let table = DisplayTable::build(&base_table(), SortOrder::descending(Column::Cost));
        assert_eq!(table.rows[0][4], "$84M");
        assert_eq!(table.rows[19][4], "$28M");
    }

    #[test]
    fn empty_table_message() {
        let table = DisplayTable::build(&Table::default(), SortOrder::default());
        assert!(table.is_empty());
        assert_eq!(table.rows, vec![vec![EMPTY_TABLE_MESSAGE.to_string()]]);
        assert!(table.to_text().contains(EMPTY_TABLE_MESSAGE));
    }

    #[test]
    fn text_rendering_aligns_columns() {
        let text = DisplayTable::build(&base_table(), SortOrder::default()).to_text();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 22);
        assert!(lines[0].starts_with("ID   Name"));
        assert!(lines[1].starts_with("---  ----"));
    }

    #[test]
    fn column_parse() {
        assert_eq!(Column::parse("roi").unwrap(), Column::Roi);
        assert!(Column::parse("weight").is_err());
    }
}
