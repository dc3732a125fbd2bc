//! Presentation structures derived from a budget model: KPIs, P&L rows,
//! the client table and rankings. Renderers (terminal, HTTP, Excel) only
//! format these.

use crate::core::consolidation::{consolidate, ConsolidatedPnl, Series, PRODUCT_GROSS_MARGIN};
use crate::types::{
    percentage_of, rollup, BudgetModel, MONTHS_PER_YEAR, ExpenseCategory, LineItem, Monthly, SalesVector,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Clients listed individually in the detailed P&L
pub const DETAILED_CLIENT_LIMIT: usize = 20;

/// Default length of ranking lists
pub const DEFAULT_RANKING_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Kpis {
    pub revenue: f64,
    pub gross_margin: f64,
    pub gross_margin_pct: f64,
    pub direct_costs: f64,
    pub operating_expenses: f64,
    pub net_result: f64,
    pub operating_margin_pct: f64,
    pub profitable: bool,
}

impl Kpis {
    pub fn from_model(model: &BudgetModel) -> Self {
        Self {
            revenue: model.revenue.annual,
            gross_margin: model.gross_margin.annual,
            gross_margin_pct: model.gross_margin.percentage,
            direct_costs: model.direct_costs.annual,
            operating_expenses: model.operating_expenses.annual,
            net_result: model.net_result.annual,
            operating_margin_pct: model.net_result.operating_margin,
            profitable: model.net_result.annual >= 0.0,
        }
    }
}

/// Visual weight of a P&L row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RowKind {
    Line,
    Category,
    Subcategory,
    Detail,
    Subtotal,
    Result,
    FinalResult,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlRow {
    pub label: String,
    pub kind: RowKind,
    pub monthly: Monthly,
    pub total: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentage: Option<f64>,
}

impl PlRow {
    fn new(label: impl Into<String>, kind: RowKind, monthly: Monthly, total: f64) -> Self {
        Self {
            label: label.into(),
            kind,
            monthly,
            total,
            percentage: None,
        }
    }

    fn series(label: impl Into<String>, kind: RowKind, series: &Series) -> Self {
        Self::new(label, kind, series.monthly, series.annual)
    }

    fn with_percentage(mut self, pct: f64) -> Self {
        self.percentage = Some(pct);
        self
    }
}

/// Five-line profit-and-loss
pub fn summary_rows(model: &BudgetModel) -> Vec<PlRow> {
    vec![
        PlRow::new(
            "(+) Total Revenue",
            RowKind::Line,
            model.revenue.monthly,
            model.revenue.annual,
        ),
        PlRow::new(
            "(-) Direct Costs",
            RowKind::Line,
            model.direct_costs.monthly,
            model.direct_costs.annual,
        ),
        PlRow::new(
            "(=) Gross Margin",
            RowKind::Subtotal,
            model.gross_margin.monthly,
            model.gross_margin.annual,
        ),
        PlRow::new(
            "(-) Operating Expenses (OPEX)",
            RowKind::Line,
            model.operating_expenses.monthly,
            model.operating_expenses.annual,
        ),
        PlRow::new(
            "(=) Net Result",
            RowKind::FinalResult,
            model.net_result.monthly,
            model.net_result.annual,
        ),
    ]
}

fn detail_rows(items: &[LineItem]) -> impl Iterator<Item = PlRow> + '_ {
    items
        .iter()
        .map(|item| PlRow::new(item.name.clone(), RowKind::Detail, item.monthly, item.total))
}

/// Sectioned P&L with client, cost and expense detail
pub fn detailed_rows(model: &BudgetModel) -> Vec<PlRow> {
    let mut rows = Vec::new();
    let revenue = &model.revenue;

    rows.push(PlRow::new("REVENUE", RowKind::Category, revenue.monthly, revenue.annual));
    let shown = revenue.clients.len().min(DETAILED_CLIENT_LIMIT);
    rows.extend(detail_rows(&revenue.clients[..shown]));
    let rest = &revenue.clients[shown..];
    if !rest.is_empty() {
        let (monthly, total) = rollup(rest);
        rows.push(PlRow::new(
            format!("Other clients ({})", rest.len()),
            RowKind::Detail,
            monthly,
            total,
        ));
    }
    rows.push(PlRow::new("Total Revenue", RowKind::Subtotal, revenue.monthly, revenue.annual));

    let costs = &model.direct_costs;
    rows.push(PlRow::new("DIRECT COSTS", RowKind::Category, costs.monthly, costs.annual));
    rows.extend(detail_rows(&costs.items));
    rows.push(PlRow::new("Total Direct Costs", RowKind::Subtotal, costs.monthly, costs.annual));

    rows.push(
        PlRow::new(
            "GROSS MARGIN",
            RowKind::Result,
            model.gross_margin.monthly,
            model.gross_margin.annual,
        )
        .with_percentage(model.gross_margin.percentage),
    );

    let opex = &model.operating_expenses;
    rows.push(PlRow::new(
        "OPERATING EXPENSES (OPEX)",
        RowKind::Category,
        opex.monthly,
        opex.annual,
    ));
    for category in ExpenseCategory::ALL {
        let items = opex.category(category);
        if items.is_empty() {
            continue;
        }
        let (monthly, total) = rollup(items);
        rows.push(PlRow::new(category.heading(), RowKind::Subcategory, monthly, total));
        rows.extend(detail_rows(items));
    }
    rows.push(PlRow::new("Total OPEX", RowKind::Subtotal, opex.monthly, opex.annual));

    rows.push(
        PlRow::new(
            "NET RESULT",
            RowKind::FinalResult,
            model.net_result.monthly,
            model.net_result.annual,
        )
        .with_percentage(model.net_result.operating_margin),
    );
    rows
}

/// Nine-line consolidated P&L
pub fn consolidated_rows(pnl: &ConsolidatedPnl) -> Vec<PlRow> {
    let cost_label = format!(
        "(-) Cost of Sales ({:.0}%)",
        (1.0 - pnl.margin_rate) * 100.0
    );
    vec![
        PlRow::series("(+) Recurring Revenue", RowKind::Line, &pnl.recurring_revenue),
        PlRow::series("(+) Product Sales", RowKind::Line, &pnl.product_sales),
        PlRow::series("(=) TOTAL REVENUE", RowKind::Subtotal, &pnl.revenue),
        PlRow::series("(-) Recurring Costs", RowKind::Line, &pnl.recurring_costs),
        PlRow::series(cost_label, RowKind::Line, &pnl.sales_cost),
        PlRow::series("(=) TOTAL COSTS", RowKind::Subtotal, &pnl.costs),
        PlRow::series("(=) GROSS MARGIN", RowKind::Result, &pnl.gross_margin)
            .with_percentage(pnl.gross_margin_pct),
        PlRow::series(
            "(-) Operating Expenses (OPEX)",
            RowKind::Line,
            &pnl.operating_expenses,
        ),
        PlRow::series("(=) NET RESULT", RowKind::FinalResult, &pnl.net_result)
            .with_percentage(pnl.operating_margin_pct),
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientRow {
    pub rank: usize,
    pub name: String,
    pub monthly: Monthly,
    pub total: f64,
    /// Share of total revenue, in percent
    pub share: f64,
}

pub fn client_table(model: &BudgetModel) -> Vec<ClientRow> {
    model
        .revenue
        .clients
        .iter()
        .enumerate()
        .map(|(i, client)| ClientRow {
            rank: i + 1,
            name: client.name.clone(),
            monthly: client.monthly,
            total: client.total,
            share: percentage_of(client.total, model.revenue.annual),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CostRow {
    pub name: String,
    pub total: f64,
    /// Share of total direct costs, in percent
    pub share: f64,
}

pub fn cost_table(model: &BudgetModel) -> Vec<CostRow> {
    model
        .direct_costs
        .items
        .iter()
        .map(|item| CostRow {
            name: item.name.clone(),
            total: item.total,
            share: percentage_of(item.total, model.direct_costs.annual),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseRow {
    pub category: ExpenseCategory,
    pub name: String,
    pub total: f64,
    pub monthly_average: f64,
}

/// Operating expense lines grouped by category, in sheet order
pub fn expense_table(model: &BudgetModel) -> Vec<ExpenseRow> {
    ExpenseCategory::ALL
        .iter()
        .flat_map(|&category| {
            model
                .operating_expenses
                .category(category)
                .iter()
                .map(move |item| ExpenseRow {
                    category,
                    name: item.name.clone(),
                    total: item.total,
                    monthly_average: item.total / MONTHS_PER_YEAR as f64,
                })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingEntry {
    pub position: usize,
    pub name: String,
    pub total: f64,
    /// Share of the reference total, in percent
    pub share: f64,
    /// Bar length relative to the leader, 0..=100
    pub bar: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Rankings {
    pub clients: Vec<RankingEntry>,
    pub expenses: Vec<RankingEntry>,
}

fn rank(items: &[LineItem], limit: usize, reference: f64) -> Vec<RankingEntry> {
    let top = &items[..items.len().min(limit)];
    let leader = top
        .first()
        .map(|item| item.total)
        .filter(|total| *total > 0.0)
        .unwrap_or(1.0);
    top.iter()
        .enumerate()
        .map(|(i, item)| RankingEntry {
            position: i + 1,
            name: item.name.clone(),
            total: item.total,
            share: percentage_of(item.total, reference),
            bar: item.total / leader * 100.0,
        })
        .collect()
}

/// Top clients by share of revenue, top expenses by share of costs + opex
pub fn rankings(model: &BudgetModel, limit: usize) -> Rankings {
    let spend = model.direct_costs.annual + model.operating_expenses.annual;
    Rankings {
        clients: rank(&model.revenue.clients, limit, model.revenue.annual),
        expenses: rank(&model.expenses, limit, spend),
    }
}

/// Everything a dashboard renderer needs in one record
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
    pub kpis: Kpis,
    pub model: BudgetModel,
    pub costs: Vec<CostRow>,
    pub expenses: Vec<ExpenseRow>,
    pub product_sales: SalesVector,
    pub product_margin: f64,
    pub consolidated: ConsolidatedPnl,
}

impl DashboardData {
    pub fn new(model: &BudgetModel, sales: &SalesVector, saved_at: Option<DateTime<Utc>>) -> Self {
        Self {
            saved_at,
            kpis: Kpis::from_model(model),
            model: model.clone(),
            costs: cost_table(model),
            expenses: expense_table(model),
            product_sales: *sales,
            product_margin: PRODUCT_GROSS_MARGIN,
            consolidated: consolidate(model, sales),
        }
    }
}

/// Two decimals with thousands separators: `-1,234,567.89`
pub fn format_amount(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    let negative = rounded < 0.0;
    let text = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if negative {
        format!("-{}.{}", grouped, frac_part)
    } else {
        format!("{}.{}", grouped, frac_part)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::extractor::extract_budget;
    use crate::grid::{Cell, CellGrid};

    fn line_row(label: &str, month: f64) -> Vec<Cell> {
        let mut cells = vec![Cell::Empty, Cell::from(label), Cell::Empty];
        cells.extend(std::iter::repeat(Cell::Number(month)).take(12));
        cells
    }

    fn model_with_clients(count: usize) -> BudgetModel {
        let mut grid = CellGrid::new();
        for i in 0..count {
            grid.set_row(2 + i, line_row(&format!("Client {:02}", i), (count - i) as f64));
        }
        grid.set_row(51, line_row("", 1000.0));
        grid.set_row(61, line_row("", 10.0));
        grid.set_row(72, line_row("Consultor", 40.0));
        grid.set_row(110, line_row("Rent", 50.0));
        grid.set_row(67, line_row("", 10.0));
        grid.set_row(121, line_row("", 90.0));
        extract_budget(&grid)
    }

    #[test]
    fn test_cost_shares_and_expense_averages() {
        let model = model_with_clients(2);
        let costs = cost_table(&model);
        let commissions = costs
            .iter()
            .find(|c| c.name == "Recurring Commissions")
            .unwrap();
        assert_eq!(commissions.total, 120.0);
        assert_eq!(commissions.share, 100.0);

        let expenses = expense_table(&model);
        assert_eq!(expenses[0].category, ExpenseCategory::Consultants);
        assert_eq!(expenses[0].name, "Consultor");
        assert_eq!(expenses[0].monthly_average, 40.0);
        let rent = expenses.iter().find(|e| e.name == "Rent").unwrap();
        assert_eq!(rent.category, ExpenseCategory::Other);
        assert_eq!(rent.monthly_average, 50.0);
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(0.0), "0.00");
        assert_eq!(format_amount(12.5), "12.50");
        assert_eq!(format_amount(1234.567), "1,234.57");
        assert_eq!(format_amount(-1234567.891), "-1,234,567.89");
        assert_eq!(format_amount(100.0), "100.00");
        assert_eq!(format_amount(-0.001), "0.00");
    }

    #[test]
    fn test_summary_has_five_rows() {
        let rows = summary_rows(&model_with_clients(1));
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[4].kind, RowKind::FinalResult);
    }

    #[test]
    fn test_detailed_rolls_up_clients_beyond_limit() {
        let model = model_with_clients(23);
        let rows = detailed_rows(&model);
        let details_before_total: Vec<&PlRow> = rows
            .iter()
            .take_while(|r| r.label != "Total Revenue")
            .filter(|r| r.kind == RowKind::Detail)
            .collect();
        assert_eq!(details_before_total.len(), DETAILED_CLIENT_LIMIT + 1);
        let other = details_before_total.last().unwrap();
        assert_eq!(other.label, "Other clients (3)");
        // clients 20..23 have monthly 3, 2, 1
        assert_eq!(other.total, 72.0);
        assert_eq!(other.monthly[0], 6.0);
    }

    #[test]
    fn test_detailed_skips_empty_opex_categories() {
        let rows = detailed_rows(&model_with_clients(2));
        let subcategories: Vec<&str> = rows
            .iter()
            .filter(|r| r.kind == RowKind::Subcategory)
            .map(|r| r.label.as_str())
            .collect();
        assert_eq!(subcategories, vec!["Consultants", "Other Expenses"]);
        assert!(rows.iter().any(|r| r.percentage.is_some()));
    }

    #[test]
    fn test_client_table_shares() {
        let model = model_with_clients(2);
        let table = client_table(&model);
        assert_eq!(table[0].rank, 1);
        assert_eq!(table[0].total, 24.0);
        assert!((table[0].share - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_rankings_limit_and_bars() {
        let model = model_with_clients(15);
        let ranks = rankings(&model, DEFAULT_RANKING_LIMIT);
        assert_eq!(ranks.clients.len(), 10);
        assert_eq!(ranks.clients[0].bar, 100.0);
        assert!(ranks.clients[9].bar < 100.0);
        assert_eq!(ranks.expenses[0].name, "Rent");
        // costs 120 + opex 1080
        assert!((ranks.expenses[0].share - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_rankings_empty_model() {
        let model = extract_budget(&CellGrid::new());
        let ranks = rankings(&model, 10);
        assert!(ranks.clients.is_empty());
        assert!(ranks.expenses.is_empty());
    }

    #[test]
    fn test_consolidated_rows_labels() {
        let model = model_with_clients(1);
        let rows = consolidated_rows(&consolidate(&model, &SalesVector::uniform(10.0)));
        assert_eq!(rows.len(), 9);
        assert_eq!(rows[4].label, "(-) Cost of Sales (70%)");
        assert_eq!(rows[1].total, 120.0);
    }

    #[test]
    fn test_dashboard_data_serializes_camel_case() {
        let model = model_with_clients(1);
        let data = DashboardData::new(&model, &SalesVector::uniform(1.0), None);
        let json = serde_json::to_value(&data).unwrap();
        assert!(json.get("savedAt").is_none());
        assert_eq!(json["productMargin"], 0.3);
        assert!(json["model"]["revenue"]["clients"].is_array());
        assert!(json["consolidated"]["netResult"]["monthly"].is_array());
    }
}
