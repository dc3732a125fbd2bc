use serde::{Deserialize, Serialize};
use std::fmt;

//==============================================================================
// Months
//==============================================================================

pub const MONTHS_PER_YEAR: usize = 12;

/// One value per calendar month, January first
pub type Monthly = [f64; MONTHS_PER_YEAR];

pub const MONTH_LABELS: [&str; MONTHS_PER_YEAR] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

pub const ZERO_MONTHS: Monthly = [0.0; MONTHS_PER_YEAR];

/// Sum a slice of figures
pub fn sum(values: &[f64]) -> f64 {
    values.iter().sum()
}

/// `part / whole * 100`, or 0 when `whole` is not positive.
pub fn percentage_of(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        part / whole * 100.0
    } else {
        0.0
    }
}

/// Element-wise combination of two monthly series
pub fn zip_months(a: &Monthly, b: &Monthly, f: impl Fn(f64, f64) -> f64) -> Monthly {
    let mut out = ZERO_MONTHS;
    for (m, slot) in out.iter_mut().enumerate() {
        *slot = f(a[m], b[m]);
    }
    out
}

/// Apply `f` to every month
pub fn map_months(a: &Monthly, f: impl Fn(f64) -> f64) -> Monthly {
    let mut out = ZERO_MONTHS;
    for (m, slot) in out.iter_mut().enumerate() {
        *slot = f(a[m]);
    }
    out
}

//==============================================================================
// Line Items
//==============================================================================

/// Operating-expense grouping in the budget template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExpenseCategory {
    Consultants,
    Software,
    Other,
}

impl ExpenseCategory {
    pub const ALL: [ExpenseCategory; 3] = [
        ExpenseCategory::Consultants,
        ExpenseCategory::Software,
        ExpenseCategory::Other,
    ];

    /// Heading used in detailed reports
    pub fn heading(&self) -> &'static str {
        match self {
            ExpenseCategory::Consultants => "Consultants",
            ExpenseCategory::Software => "Software & Technology",
            ExpenseCategory::Other => "Other Expenses",
        }
    }
}

impl fmt::Display for ExpenseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExpenseCategory::Consultants => "Consultants",
            ExpenseCategory::Software => "Software",
            ExpenseCategory::Other => "Other",
        };
        f.write_str(name)
    }
}

/// One named monthly/annual figure: a client's revenue, a cost, or an expense line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<ExpenseCategory>,
    pub monthly: Monthly,
    /// Sheet-provided annual total when present, else the sum of `monthly`
    pub total: f64,
}

impl LineItem {
    pub fn new(name: impl Into<String>, monthly: Monthly, total: f64) -> Self {
        Self {
            name: name.into(),
            category: None,
            monthly,
            total,
        }
    }

    pub fn with_category(mut self, category: ExpenseCategory) -> Self {
        self.category = Some(category);
        self
    }
}

/// Month-wise and overall totals of a group of line items
pub fn rollup(items: &[LineItem]) -> (Monthly, f64) {
    let mut monthly = ZERO_MONTHS;
    let mut total = 0.0;
    for item in items {
        monthly = zip_months(&monthly, &item.monthly, |a, b| a + b);
        total += item.total;
    }
    (monthly, total)
}

//==============================================================================
// Budget Model
//==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Revenue {
    /// Sorted descending by total; ties keep sheet order
    pub clients: Vec<LineItem>,
    pub monthly: Monthly,
    pub annual: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectCosts {
    pub items: Vec<LineItem>,
    pub monthly: Monthly,
    pub annual: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrossMargin {
    pub monthly: Monthly,
    pub annual: f64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatingExpenses {
    pub consultants: Vec<LineItem>,
    pub software: Vec<LineItem>,
    pub other: Vec<LineItem>,
    pub monthly: Monthly,
    pub annual: f64,
}

impl OperatingExpenses {
    pub fn category(&self, category: ExpenseCategory) -> &[LineItem] {
        match category {
            ExpenseCategory::Consultants => &self.consultants,
            ExpenseCategory::Software => &self.software,
            ExpenseCategory::Other => &self.other,
        }
    }

    pub fn category_mut(&mut self, category: ExpenseCategory) -> &mut Vec<LineItem> {
        match category {
            ExpenseCategory::Consultants => &mut self.consultants,
            ExpenseCategory::Software => &mut self.software,
            ExpenseCategory::Other => &mut self.other,
        }
    }

    /// All opex lines in category order
    pub fn lines(&self) -> impl Iterator<Item = &LineItem> {
        self.consultants
            .iter()
            .chain(self.software.iter())
            .chain(self.other.iter())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetResult {
    pub monthly: Monthly,
    pub annual: f64,
    pub operating_margin: f64,
}

/// Structured extraction result for one budget workbook
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetModel {
    pub revenue: Revenue,
    pub direct_costs: DirectCosts,
    pub gross_margin: GrossMargin,
    pub operating_expenses: OperatingExpenses,
    pub net_result: NetResult,
    /// Direct costs and opex lines with a positive total, largest first
    pub expenses: Vec<LineItem>,
}

//==============================================================================
// Sales Vector
//==============================================================================

/// Monthly product sales entered by the user, independent of the workbook
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SalesVector(Monthly);

impl SalesVector {
    pub fn new(values: Monthly) -> Self {
        Self(values)
    }

    pub fn zero() -> Self {
        Self(ZERO_MONTHS)
    }

    /// Same amount every month
    pub fn uniform(value: f64) -> Self {
        Self([value; MONTHS_PER_YEAR])
    }

    /// Build from user input; exactly twelve values are required.
    pub fn from_slice(values: &[f64]) -> crate::error::BudgetResult<Self> {
        let months: Monthly = values.try_into().map_err(|_| {
            crate::error::BudgetError::Validation(format!(
                "Expected {} monthly sales values, got {}",
                MONTHS_PER_YEAR,
                values.len()
            ))
        })?;
        if let Some(bad) = months.iter().find(|v| !v.is_finite()) {
            return Err(crate::error::BudgetError::Validation(format!(
                "Sales values must be finite numbers, got {}",
                bad
            )));
        }
        Ok(Self(months))
    }

    pub fn values(&self) -> &Monthly {
        &self.0
    }

    pub fn total(&self) -> f64 {
        sum(&self.0)
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|v| *v == 0.0)
    }
}

impl Default for SalesVector {
    fn default() -> Self {
        Self::zero()
    }
}
