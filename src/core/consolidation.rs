//! Consolidated profit-and-loss: recurring budget figures blended with
//! user-entered product sales under a fixed gross-margin assumption.

use crate::types::{
    map_months, percentage_of, sum, zip_months, BudgetModel, Monthly, SalesVector,
};
use serde::{Deserialize, Serialize};

/// Gross margin assumed on product sales
pub const PRODUCT_GROSS_MARGIN: f64 = 0.30;

/// A monthly series with its annual figure
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Series {
    pub monthly: Monthly,
    pub annual: f64,
}

impl Series {
    /// Annual figure is the month sum
    pub fn summed(monthly: Monthly) -> Self {
        Self {
            monthly,
            annual: sum(&monthly),
        }
    }

    pub fn new(monthly: Monthly, annual: f64) -> Self {
        Self { monthly, annual }
    }
}

/// Totals derived from the sales vector alone
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesSummary {
    pub margin_rate: f64,
    pub sales: Series,
    pub cost: Series,
    pub margin: Series,
}

impl SalesSummary {
    pub fn new(sales: &SalesVector, margin_rate: f64) -> Self {
        let values = sales.values();
        Self {
            margin_rate,
            sales: Series::summed(*values),
            cost: Series::summed(map_months(values, |v| v * (1.0 - margin_rate))),
            margin: Series::summed(map_months(values, |v| v * margin_rate)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsolidatedPnl {
    pub margin_rate: f64,
    pub recurring_revenue: Series,
    pub product_sales: Series,
    pub revenue: Series,
    pub recurring_costs: Series,
    pub sales_cost: Series,
    pub costs: Series,
    pub sales_margin: Series,
    pub gross_margin: Series,
    pub operating_expenses: Series,
    pub net_result: Series,
    pub gross_margin_pct: f64,
    pub operating_margin_pct: f64,
}

/// Blend the budget with product sales at [`PRODUCT_GROSS_MARGIN`]
pub fn consolidate(model: &BudgetModel, sales: &SalesVector) -> ConsolidatedPnl {
    consolidate_with_rate(model, sales, PRODUCT_GROSS_MARGIN)
}

/// Blend the budget with product sales at an arbitrary margin rate.
///
/// Blended lines carry the sum of their own months as the annual figure.
/// The recurring and opex lines keep the sheet's annual values.
pub fn consolidate_with_rate(
    model: &BudgetModel,
    sales: &SalesVector,
    margin_rate: f64,
) -> ConsolidatedPnl {
    let summary = SalesSummary::new(sales, margin_rate);
    let add = |a: f64, b: f64| a + b;

    let recurring_revenue = Series::new(model.revenue.monthly, model.revenue.annual);
    let recurring_costs = Series::new(model.direct_costs.monthly, model.direct_costs.annual);
    let operating_expenses = Series::new(
        model.operating_expenses.monthly,
        model.operating_expenses.annual,
    );

    let revenue = Series::summed(zip_months(
        &recurring_revenue.monthly,
        &summary.sales.monthly,
        add,
    ));
    let costs = Series::summed(zip_months(
        &recurring_costs.monthly,
        &summary.cost.monthly,
        add,
    ));
    let gross_margin = Series::summed(zip_months(
        &model.gross_margin.monthly,
        &summary.margin.monthly,
        add,
    ));
    let net_result = Series::summed(zip_months(
        &gross_margin.monthly,
        &operating_expenses.monthly,
        |a, b| a - b,
    ));

    ConsolidatedPnl {
        margin_rate,
        recurring_revenue,
        product_sales: summary.sales,
        revenue,
        recurring_costs,
        sales_cost: summary.cost,
        costs,
        sales_margin: summary.margin,
        gross_margin,
        operating_expenses,
        net_result,
        gross_margin_pct: percentage_of(gross_margin.annual, revenue.annual),
        operating_margin_pct: percentage_of(net_result.annual, revenue.annual),
    }
}
