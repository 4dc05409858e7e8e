//! The equipment-upgrade dataset.
//!
//! Twenty fixed records; the constants below are the whole dataset. Derived
//! columns are attached later by [`crate::metrics::derive_metrics`].

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::error::ValidationError;
use crate::logging::log_dataset_loaded;
use crate::metrics::{derive_metrics, DerivedMetrics};
use crate::schema::Field;

pub const ROW_COUNT: usize = 20;

/// Column order of the base table, `upgrade_id` first.
pub const BASE_COLUMNS: [&str; 10] = [
    "upgrade_id",
    "upgrade_name",
    "department",
    "category",
    "priority",
    "cost_m",
    "roi",
    "maintenance_pct",
    "age_years",
    "lifespan_years",
];

pub const DERIVED_COLUMNS: [&str; 4] = [
    "total_ownership_cost",
    "lifetime_return",
    "net_value",
    "value_score",
];

macro_rules! labelled_enum {
    ($name:ident, $what:literal, { $($variant:ident => ($label:literal, $color:literal)),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $label)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }

            /// Palette colour used for chart traces grouped by this value.
            pub fn color(&self) -> &'static str {
                match self {
                    $($name::$variant => $color),+
                }
            }

            pub fn parse(label: &str) -> Result<Self, ValidationError> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(label.trim()))
                    .ok_or_else(|| ValidationError::UnknownValue {
                        what: $what,
                        value: label.to_string(),
                    })
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }
    };
}

labelled_enum!(Department, "department", {
    Army => ("Army", "#36d399"),
    Navy => ("Navy", "#4c9aff"),
    AirForce => ("Air Force", "#9c6ade"),
    Marines => ("Marines", "#ff5e6c"),
});

labelled_enum!(Category, "category", {
    Vehicles => ("Vehicles", "#36d399"),
    Aircraft => ("Aircraft", "#4c9aff"),
    Communications => ("Communications", "#ff9f43"),
    Weapons => ("Weapons", "#ff5e6c"),
});

labelled_enum!(Priority, "priority", {
    Critical => ("Critical", "#ff5e6c"),
    High => ("High", "#ff9f43"),
    Medium => ("Medium", "#4c9aff"),
});

/// A single cell value looked up by [`Field`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    Number(f64),
}

impl<'a> FieldValue<'a> {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(_) => None,
        }
    }

    /// Label used for grouping and category axes.
    pub fn label(&self) -> String {
        match self {
            FieldValue::Text(s) => s.to_string(),
            FieldValue::Number(n) => format!("{}", n),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentRecord {
    pub upgrade_id: String,
    pub upgrade_name: String,
    pub department: Department,
    pub category: Category,
    pub priority: Priority,
    pub cost_m: f64,
    pub roi: f64,
    /// Annual maintenance as a fraction of initial cost.
    pub maintenance_pct: f64,
    pub age_years: u32,
    pub lifespan_years: u32,
    #[serde(flatten, default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<DerivedMetrics>,
}

impl EquipmentRecord {
    /// Derived fields are `None` until metrics have been derived.
    pub fn value(&self, field: Field) -> Option<FieldValue<'_>> {
        let v = match field {
            Field::UpgradeName => FieldValue::Text(&self.upgrade_name),
            Field::Department => FieldValue::Text(self.department.as_str()),
            Field::Category => FieldValue::Text(self.category.as_str()),
            Field::Priority => FieldValue::Text(self.priority.as_str()),
            Field::CostM => FieldValue::Number(self.cost_m),
            Field::Roi => FieldValue::Number(self.roi),
            Field::MaintenancePct => FieldValue::Number(self.maintenance_pct),
            Field::AgeYears => FieldValue::Number(self.age_years as f64),
            Field::LifespanYears => FieldValue::Number(self.lifespan_years as f64),
            Field::TotalOwnershipCost => FieldValue::Number(self.metrics?.total_ownership_cost),
            Field::LifetimeReturn => FieldValue::Number(self.metrics?.lifetime_return),
            Field::NetValue => FieldValue::Number(self.metrics?.net_value),
            Field::ValueScore => FieldValue::Number(self.metrics?.value_score),
        };
        Some(v)
    }

    pub fn number(&self, field: Field) -> Option<f64> {
        self.value(field).and_then(|v| v.as_number())
    }

    /// Stored metrics, or computed on the spot for an underived record.
    pub fn derived(&self) -> DerivedMetrics {
        self.metrics.unwrap_or_else(|| DerivedMetrics::compute(self))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    rows: Vec<EquipmentRecord>,
}

impl Table {
    pub fn new(rows: Vec<EquipmentRecord>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[EquipmentRecord] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<EquipmentRecord> {
        self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EquipmentRecord> {
        self.rows.iter()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.upgrade_id.as_str()).collect()
    }

    pub fn get(&self, upgrade_id: &str) -> Option<&EquipmentRecord> {
        self.rows.iter().find(|r| r.upgrade_id == upgrade_id)
    }

    pub fn is_derived(&self) -> bool {
        !self.rows.is_empty() && self.rows.iter().all(|r| r.metrics.is_some())
    }

    /// SHA-256 of the rows' JSON encoding, derived fields included when present.
    pub fn fingerprint(&self) -> String {
        // plain data with string keys; encoding cannot fail
        let encoded = serde_json::to_vec(&self.rows).unwrap_or_default();
        hex::encode(Sha256::digest(&encoded))
    }

    pub fn manifest(&self) -> DatasetManifest {
        let derived = self.is_derived();
        let mut columns: Vec<String> = BASE_COLUMNS.iter().map(|s| s.to_string()).collect();
        if derived {
            columns.extend(DERIVED_COLUMNS.iter().map(|s| s.to_string()));
        }
        DatasetManifest {
            row_count: self.rows.len() as u64,
            columns,
            hash_sha256: self.fingerprint(),
            derived,
            generated_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

impl<'a> IntoIterator for &'a Table {
    type Item = &'a EquipmentRecord;
    type IntoIter = std::slice::Iter<'a, EquipmentRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

impl FromIterator<EquipmentRecord> for Table {
    fn from_iter<I: IntoIterator<Item = EquipmentRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetManifest {
    pub row_count: u64,
    pub columns: Vec<String>,
    pub hash_sha256: String,
    pub derived: bool,
    pub generated_at: String,
}

const NAMES: [&str; ROW_COUNT] = [
    "M1 Abrams Tank Modernization",
    "F-35 Avionics Upgrade",
    "Aegis Combat System Enhancement",
    "M4 Carbine Replacement Program",
    "CH-47 Chinook Rotor Upgrade",
    "THAAD Radar Modernization",
    "Bradley Fighting Vehicle Armor",
    "V-22 Osprey Engine Overhaul",
    "Patriot Missile System Update",
    "Amphibious Assault Vehicle Refit",
    "F/A-18 Weapons Integration",
    "Satellite Communication Array",
    "Apache Helicopter Targeting System",
    "Naval Strike Missile Program",
    "Tactical Data Link Upgrade",
    "M777 Howitzer Precision Kit",
    "C-130 Hercules Modernization",
    "Submarine Sonar Enhancement",
    "Joint Light Tactical Vehicle",
    "B-2 Stealth Coating Refresh",
];

const DEPARTMENTS: [Department; ROW_COUNT] = {
    use Department::*;
    [
        Army, AirForce, Navy, Army, Army, Army, Army, Marines, Army, Marines, Navy, AirForce,
        Army, Navy, AirForce, Army, AirForce, Navy, Army, AirForce,
    ]
};

const CATEGORIES: [Category; ROW_COUNT] = {
    use Category::*;
    [
        Vehicles, Aircraft, Weapons, Weapons, Aircraft, Weapons, Vehicles, Aircraft, Weapons,
        Vehicles, Aircraft, Communications, Aircraft, Weapons, Communications, Weapons, Aircraft,
        Communications, Vehicles, Aircraft,
    ]
};

const PRIORITIES: [Priority; ROW_COUNT] = {
    use Priority::*;
    [
        Critical, Critical, Critical, High, High, Critical, Medium, High, Critical, Medium, High,
        High, Critical, High, Medium, Medium, Medium, Critical, High, Medium,
    ]
};

const COSTS: [f64; ROW_COUNT] = [
    75.0, 82.0, 68.0, 35.0, 58.0, 71.0, 45.0, 63.0, 77.0, 42.0, 55.0, 48.0, 61.0, 52.0, 39.0,
    28.0, 67.0, 79.0, 44.0, 84.0,
];

const ROIS: [f64; ROW_COUNT] = [
    2.45, 2.52, 2.81, 2.18, 2.68, 2.95, 1.92, 2.24, 2.98, 1.89, 2.71, 2.47, 3.12, 2.23, 2.15, 1.87,
    2.61, 3.27, 2.19, 2.79,
];

const MAINTENANCE: [f64; ROW_COUNT] = [
    0.06, 0.07, 0.04, 0.05, 0.07, 0.05, 0.08, 0.06, 0.04, 0.09, 0.06, 0.05, 0.07, 0.05, 0.07, 0.09,
    0.06, 0.03, 0.08, 0.04,
];

const AGES: [u32; ROW_COUNT] = [
    8, 5, 12, 6, 9, 7, 14, 10, 11, 15, 7, 8, 6, 9, 13, 16, 10, 4, 12, 3,
];

const LIFESPANS: [u32; ROW_COUNT] = [
    18, 20, 22, 15, 19, 21, 16, 18, 20, 14, 19, 17, 21, 18, 16, 12, 19, 24, 15, 22,
];

/// The fixed 20-row table, without derived metrics.
pub fn load_dataset() -> Table {
    (0..ROW_COUNT)
        .map(|i| EquipmentRecord {
            upgrade_id: format!("U{:02}", i + 1),
            upgrade_name: NAMES[i].to_string(),
            department: DEPARTMENTS[i],
            category: CATEGORIES[i],
            priority: PRIORITIES[i],
            cost_m: COSTS[i],
            roi: ROIS[i],
            maintenance_pct: MAINTENANCE[i],
            age_years: AGES[i],
            lifespan_years: LIFESPANS[i],
            metrics: None,
        })
        .collect()
}

/// The dataset with metrics derived, as every view consumes it.
pub fn base_table() -> Table {
    let table = derive_metrics(load_dataset());
    log_dataset_loaded(table.len(), &table.fingerprint());
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dataset_has_twenty_sequential_ids() {
        let table = load_dataset();
        assert_eq!(table.len(), ROW_COUNT);
        assert_eq!(table.rows()[0].upgrade_id, "U01");
        assert_eq!(table.rows()[19].upgrade_id, "U20");
        assert!(!table.is_derived());
    }

    #[test]
    fn dataset_is_deterministic() {
        assert_eq!(load_dataset(), load_dataset());
        assert_eq!(load_dataset().fingerprint(), load_dataset().fingerprint());
    }

    #[test]
    fn derived_fields_absent_until_derived() {
        let raw = load_dataset();
        let row = &raw.rows()[0];
        assert!(row.value(Field::ValueScore).is_none());
        assert_eq!(row.number(Field::CostM), Some(75.0));
        assert_eq!(row.value(Field::Department), Some(FieldValue::Text("Army")));

        let derived = base_table();
        assert!(derived.rows()[0].value(Field::ValueScore).is_some());
        assert_ne!(raw.fingerprint(), derived.fingerprint());
    }

    #[test]
    fn labels_parse_case_insensitively() {
        assert_eq!(Department::parse("air force").unwrap(), Department::AirForce);
        assert_eq!(Category::parse("Communications").unwrap(), Category::Communications);
        assert!(Priority::parse("Low").is_err());
    }

    #[test]
    fn manifest_lists_derived_columns() {
        let manifest = base_table().manifest();
        assert_eq!(manifest.row_count, 20);
        assert!(manifest.derived);
        assert_eq!(manifest.columns.len(), BASE_COLUMNS.len() + DERIVED_COLUMNS.len());
        assert_eq!(manifest.hash_sha256.len(), 64);
    }

    #[test]
    fn fingerprint_hashes_json_rows() {
        let table = load_dataset();
        let expected = hex::encode(Sha256::digest(serde_json::to_vec(table.rows()).unwrap()));
        assert_eq!(table.fingerprint(), expected);
    }

    #[test]
    fn fingerprint_separates_commas_in_text() {
        let mut a = load_dataset().rows()[0].clone();
        let mut b = a.clone();
        a.upgrade_id = "U01,Tank".to_string();
        a.upgrade_name = "Refit".to_string();
        b.upgrade_id = "U01".to_string();
        b.upgrade_name = "Tank,Refit".to_string();
        assert_ne!(Table::new(vec![a]).fingerprint(), Table::new(vec![b]).fingerprint());
    }

    #[test]
    fn serde_uses_display_labels() {
        let json = serde_json::to_value(&load_dataset().rows()[1]).unwrap();
        assert_eq!(json["department"], "Air Force");
        assert!(json.get("value_score").is_none());
        let json = serde_json::to_value(&base_table().rows()[1]).unwrap();
        assert!(json.get("value_score").is_some());
    }
}
