//! Template layout for the budget workbook
//!
//! The extractor is bound to one specific document: the "Presupuesto 2026"
//! workbook. Every row and column position it reads lives in
//! [`TemplateLayout`], whose [`Default`] is that document. A YAML file can
//! override any subset of fields, e.g.
//!
//! ```yaml
//! sheet_name: Presupuesto 2027
//! net_result_row: 152
//! ```
//!
//! This is not a general spreadsheet parser; a layout only relocates the
//! fixed positions of the same template.

use crate::error::{BudgetError, BudgetResult};
use crate::types::{ExpenseCategory, MONTHS_PER_YEAR};
use serde::{Deserialize, Serialize};
use std::fs;
use std::ops::RangeInclusive;
use std::path::Path;

/// Inclusive 0-based row range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowSpan {
    pub start: usize,
    pub end: usize,
}

impl RowSpan {
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn rows(&self) -> RangeInclusive<usize> {
        self.start..=self.end
    }
}

/// A single row read under a fixed display name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedRow {
    pub row: usize,
    pub name: String,
}

/// A contiguous block of operating-expense rows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpexSection {
    pub category: ExpenseCategory,
    pub rows: RowSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateLayout {
    /// Preferred worksheet; matched by substring, first sheet otherwise
    pub sheet_name: String,
    /// Rows at or beyond this index are never read
    pub max_rows: usize,
    /// Columns at or beyond this index are never read
    pub max_columns: usize,

    pub label_column: usize,
    /// First of twelve consecutive month columns
    pub first_month_column: usize,
    /// Precomputed annual total
    pub total_column: usize,

    pub client_rows: RowSpan,
    pub revenue_total_row: usize,
    pub direct_cost_lines: Vec<NamedRow>,
    pub direct_cost_total_row: usize,
    pub gross_margin_row: usize,
    pub opex_sections: Vec<OpexSection>,
    pub opex_total_row: usize,
    pub net_result_row: usize,

    /// Labels containing any of these (case-insensitive) are section
    /// headers or subtotals, not clients
    pub client_exclusions: Vec<String>,
    /// Labels containing this literal are spreadsheet error residue
    pub invalid_number_marker: String,
}

impl Default for TemplateLayout {
    fn default() -> Self {
        Self {
            sheet_name: "Presupuesto 2026".to_string(),
            max_rows: 160,
            max_columns: 16,
            label_column: 1,
            first_month_column: 3,
            total_column: 15,
            client_rows: RowSpan::new(2, 50),
            revenue_total_row: 51,
            direct_cost_lines: vec![
                NamedRow {
                    row: 61,
                    name: "Recurring Commissions".to_string(),
                },
                NamedRow {
                    row: 62,
                    name: "Sales Management Commissions".to_string(),
                },
                NamedRow {
                    row: 63,
                    name: "Server Costs".to_string(),
                },
            ],
            direct_cost_total_row: 67,
            gross_margin_row: 69,
            opex_sections: vec![
                OpexSection {
                    category: ExpenseCategory::Consultants,
                    rows: RowSpan::new(72, 78),
                },
                OpexSection {
                    category: ExpenseCategory::Software,
                    rows: RowSpan::new(88, 104),
                },
                OpexSection {
                    category: ExpenseCategory::Other,
                    rows: RowSpan::new(110, 115),
                },
            ],
            opex_total_row: 121,
            net_result_row: 150,
            client_exclusions: ["ingresos", "ventas", "total", "reduccion"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            invalid_number_marker: "NaN".to_string(),
        }
    }
}

impl TemplateLayout {
    /// Load a layout override from YAML; missing fields keep their defaults.
    pub fn from_yaml_file(path: &Path) -> BudgetResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(yaml: &str) -> BudgetResult<Self> {
        let layout: TemplateLayout = serde_yaml::from_str(yaml)?;
        layout.validate()?;
        Ok(layout)
    }

    pub fn to_yaml(&self) -> BudgetResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn month_columns(&self) -> RangeInclusive<usize> {
        self.first_month_column..=self.first_month_column.saturating_add(MONTHS_PER_YEAR - 1)
    }

    /// Whether a client-block label names an actual client
    pub fn is_client_label(&self, label: &str) -> bool {
        let lower = label.to_lowercase();
        !self
            .client_exclusions
            .iter()
            .any(|term| lower.contains(&term.to_lowercase()))
    }

    /// Whether an expense-block label is usable
    pub fn is_expense_label(&self, label: &str) -> bool {
        self.invalid_number_marker.is_empty() || !label.contains(&self.invalid_number_marker)
    }

    /// Check that every position fits inside the readable window
    pub fn validate(&self) -> BudgetResult<()> {
        let last_month = self
            .first_month_column
            .checked_add(MONTHS_PER_YEAR - 1)
            .ok_or_else(|| {
                BudgetError::Layout(format!(
                    "first_month_column ({}) is out of range",
                    self.first_month_column
                ))
            })?;
        for (what, col) in [
            ("label_column", self.label_column),
            ("last month column", last_month),
            ("total_column", self.total_column),
        ] {
            if col >= self.max_columns {
                return Err(BudgetError::Layout(format!(
                    "{} ({}) is outside max_columns ({})",
                    what, col, self.max_columns
                )));
            }
        }

        let mut spans = vec![("client_rows", self.client_rows)];
        for section in &self.opex_sections {
            spans.push(("opex section", section.rows));
        }
        for (what, span) in spans {
            if span.start > span.end {
                return Err(BudgetError::Layout(format!(
                    "{} starts after it ends ({} > {})",
                    what, span.start, span.end
                )));
            }
            self.check_row(what, span.end)?;
        }

        for (what, row) in [
            ("revenue_total_row", self.revenue_total_row),
            ("direct_cost_total_row", self.direct_cost_total_row),
            ("gross_margin_row", self.gross_margin_row),
            ("opex_total_row", self.opex_total_row),
            ("net_result_row", self.net_result_row),
        ] {
            self.check_row(what, row)?;
        }
        for line in &self.direct_cost_lines {
            self.check_row(&line.name, line.row)?;
        }
        Ok(())
    }

    fn check_row(&self, what: &str, row: usize) -> BudgetResult<()> {
        if row >= self.max_rows {
            return Err(BudgetError::Layout(format!(
                "{} (row {}) is outside max_rows ({})",
                what, row, self.max_rows
            )));
        }
        Ok(())
    }
}
