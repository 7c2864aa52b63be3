//! Transaction record types
//!
//! A record is one parsed CSV row: column name -> loosely typed cell.

use std::borrow::Cow;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::tier::PaymentTier;

/// A single cell value, coerced at parse time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
}

impl CellValue {
    /// Coerce a raw cell: finite numbers become `Number`, everything else stays text
    pub fn coerce(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return CellValue::Text(String::new());
        }

        match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() => CellValue::Number(value),
            _ => CellValue::Text(trimmed.to_string()),
        }
    }

    /// Numeric value, if this cell is a number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(value) => Some(*value),
            CellValue::Text(_) => None,
        }
    }

    /// Render the cell as a label. Empty text yields `None`.
    pub fn as_label(&self) -> Option<Cow<'_, str>> {
        match self {
            CellValue::Text(text) if text.is_empty() => None,
            CellValue::Text(text) => Some(Cow::Borrowed(text.as_str())),
            CellValue::Number(value) => Some(Cow::Owned(value.to_string())),
        }
    }
}

/// Semantic columns the analyses rely on.
///
/// Columns are resolved by name; each field accepts the source (Chinese)
/// header and an English alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Date,
    PaymentTier,
    Channel,
    ItemName,
    Amount,
    RoleCount,
    Dau,
}

impl Field {
    /// Header names accepted for this field, in lookup order
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            Self::Date => &["日期", "Date"],
            Self::PaymentTier => &["付费区间", "Payment Tier", "PaymentTier"],
            Self::Channel => &["消耗途径", "Consumption Channel", "Channel"],
            Self::ItemName => &["物品名称", "Item Name", "Item"],
            Self::Amount => &["天玉消耗额", "Consumption Amount", "Amount"],
            Self::RoleCount => &["角色数", "Role Count", "Participant Count"],
            Self::Dau => &["DAU", "日活跃用户", "Daily Active Users"],
        }
    }

    /// Human-readable name used in error messages
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::PaymentTier => "payment tier",
            Self::Channel => "consumption channel",
            Self::ItemName => "item name",
            Self::Amount => "consumption amount",
            Self::RoleCount => "role count",
            Self::Dau => "DAU",
        }
    }

    /// Resolve the header this field maps to, if present
    pub fn resolve<'a>(&self, headers: &'a [String]) -> Option<&'a str> {
        self.aliases()
            .iter()
            .find_map(|alias| headers.iter().find(|h| h.as_str() == *alias))
            .map(|h| h.as_str())
    }
}

/// One parsed transaction row. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    cells: HashMap<String, CellValue>,
}

impl Record {
    /// Build a record from already-coerced cells
    pub fn from_cells(cells: HashMap<String, CellValue>) -> Self {
        Self { cells }
    }

    /// Build a record from raw `(column, text)` pairs, coercing each cell
    pub fn from_raw_pairs(pairs: &[(&str, &str)]) -> Self {
        let cells = pairs
            .iter()
            .map(|(column, raw)| (column.to_string(), CellValue::coerce(raw)))
            .collect();
        Self { cells }
    }

    /// Look up a cell by literal column name
    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.cells.get(column)
    }

    /// Look up a semantic field through its aliases
    pub fn field(&self, field: Field) -> Option<&CellValue> {
        field.aliases().iter().find_map(|alias| self.cells.get(*alias))
    }

    /// Field rendered as a label (numbers are formatted back to text)
    pub fn label(&self, field: Field) -> Option<Cow<'_, str>> {
        self.field(field).and_then(CellValue::as_label)
    }

    /// Numeric field value; text or missing cells count as zero
    pub fn number(&self, field: Field) -> f64 {
        self.field(field).and_then(CellValue::as_number).unwrap_or(0.0)
    }

    /// Recognised payment tier of this record
    pub fn payment_tier(&self) -> Option<PaymentTier> {
        self.label(Field::PaymentTier)
            .and_then(|label| PaymentTier::from_label(&label))
    }

    /// Number of cells in the record
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the record has no cells
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
