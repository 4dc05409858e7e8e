//! Field catalogue for the equipment table.
//!
//! Every chartable column is a [`Field`]; its wire name is the snake_case
//! column name used in JSON chart configurations and on the command line.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Numeric,
    Categorical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    UpgradeName,
    Department,
    Category,
    Priority,
    CostM,
    Roi,
    MaintenancePct,
    AgeYears,
    LifespanYears,
    TotalOwnershipCost,
    LifetimeReturn,
    NetValue,
    ValueScore,
}

impl Field {
    /// Categorical fields first, then numeric, in catalogue order.
    pub const ALL: [Field; 13] = [
        Field::UpgradeName,
        Field::Department,
        Field::Category,
        Field::Priority,
        Field::CostM,
        Field::Roi,
        Field::MaintenancePct,
        Field::AgeYears,
        Field::LifespanYears,
        Field::TotalOwnershipCost,
        Field::LifetimeReturn,
        Field::NetValue,
        Field::ValueScore,
    ];

    pub const CATEGORICAL: [Field; 4] = [
        Field::UpgradeName,
        Field::Department,
        Field::Category,
        Field::Priority,
    ];

    pub const NUMERIC: [Field; 9] = [
        Field::CostM,
        Field::Roi,
        Field::MaintenancePct,
        Field::AgeYears,
        Field::LifespanYears,
        Field::TotalOwnershipCost,
        Field::LifetimeReturn,
        Field::NetValue,
        Field::ValueScore,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::UpgradeName => "upgrade_name",
            Field::Department => "department",
            Field::Category => "category",
            Field::Priority => "priority",
            Field::CostM => "cost_m",
            Field::Roi => "roi",
            Field::MaintenancePct => "maintenance_pct",
            Field::AgeYears => "age_years",
            Field::LifespanYears => "lifespan_years",
            Field::TotalOwnershipCost => "total_ownership_cost",
            Field::LifetimeReturn => "lifetime_return",
            Field::NetValue => "net_value",
            Field::ValueScore => "value_score",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Field::UpgradeName => "Equipment Name",
            Field::Department => "Department",
            Field::Category => "Category",
            Field::Priority => "Priority Level",
            Field::CostM => "Initial Cost ($M)",
            Field::Roi => "Return on Investment",
            Field::MaintenancePct => "Maintenance Rate (%)",
            Field::AgeYears => "Age (Years)",
            Field::LifespanYears => "Lifespan (Years)",
            Field::TotalOwnershipCost => "Total Ownership Cost ($M)",
            Field::LifetimeReturn => "Lifetime Return ($M)",
            Field::NetValue => "Net Value ($M)",
            Field::ValueScore => "Value Score",
        }
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            Field::UpgradeName | Field::Department | Field::Category | Field::Priority => {
                FieldKind::Categorical
            }
            _ => FieldKind::Numeric,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.kind() == FieldKind::Numeric
    }

    pub fn is_categorical(&self) -> bool {
        self.kind() == FieldKind::Categorical
    }

    /// Fields that only exist after metric derivation.
    pub fn is_derived(&self) -> bool {
        matches!(
            self,
            Field::TotalOwnershipCost | Field::LifetimeReturn | Field::NetValue | Field::ValueScore
        )
    }

    /// Exact wire-name lookup.
    pub fn parse(name: &str) -> Result<Field, ValidationError> {
        Field::ALL
            .iter()
            .copied()
            .find(|f| f.as_str() == name)
            .ok_or_else(|| ValidationError::UnknownField(name.to_string()))
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Field {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::parse(s)
    }
}

/// Grouping used to colour chart traces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ColorBy {
    #[default]
    #[serde(rename = "None")]
    None,
    #[serde(rename = "department")]
    Department,
    #[serde(rename = "category")]
    Category,
    #[serde(rename = "priority")]
    Priority,
}

impl ColorBy {
    pub const ALL: [ColorBy; 4] = [
        ColorBy::None,
        ColorBy::Department,
        ColorBy::Category,
        ColorBy::Priority,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ColorBy::None => "None",
            ColorBy::Department => "department",
            ColorBy::Category => "category",
            ColorBy::Priority => "priority",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ColorBy::None => "No Color",
            ColorBy::Department => "By Department",
            ColorBy::Category => "By Category",
            ColorBy::Priority => "By Priority",
        }
    }

    pub fn field(&self) -> Option<Field> {
        match self {
            ColorBy::None => None,
            ColorBy::Department => Some(Field::Department),
            ColorBy::Category => Some(Field::Category),
            ColorBy::Priority => Some(Field::Priority),
        }
    }

    pub fn parse(name: &str) -> Result<ColorBy, ValidationError> {
        ColorBy::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == name)
            .ok_or_else(|| ValidationError::UnknownColor(name.to_string()))
    }
}

impl fmt::Display for ColorBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ColorBy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ColorBy::parse(s)
    }
}
