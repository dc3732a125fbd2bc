//! Positional extraction of a [`BudgetModel`] from a [`CellGrid`]
//!
//! Extraction never fails: missing or malformed cells read as 0 or are
//! skipped, and implausible totals pass through unchanged.

use crate::grid::CellGrid;
use crate::layout::{OpexSection, TemplateLayout};
use crate::types::{
    percentage_of, sum, BudgetModel, DirectCosts, GrossMargin, LineItem, Monthly, NetResult,
    OperatingExpenses, Revenue, ZERO_MONTHS,
};
use tracing::debug;

/// Month values and annual total of one row
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowFigures {
    pub monthly: Monthly,
    pub total: f64,
}

/// Stable descending sort by total
pub fn sort_by_total_desc(items: &mut [LineItem]) {
    items.sort_by(|a, b| b.total.total_cmp(&a.total));
}

#[derive(Debug, Clone, Default)]
pub struct BudgetExtractor {
    layout: TemplateLayout,
}

impl BudgetExtractor {
    pub fn new(layout: TemplateLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &TemplateLayout {
        &self.layout
    }

    /// Build a budget model from the grid
    pub fn extract(&self, grid: &CellGrid) -> BudgetModel {
        let layout = &self.layout;
        debug!(rows = grid.height(), "extracting budget model");

        let mut clients = self.extract_clients(grid);
        sort_by_total_desc(&mut clients);
        debug!(clients = clients.len(), "client lines found");

        let revenue_row = self.read_row(grid, layout.revenue_total_row);
        let revenue = Revenue {
            clients,
            monthly: revenue_row.monthly,
            annual: revenue_row.total,
        };
        debug!(total = revenue.annual, "total revenue");

        let cost_row = self.read_row(grid, layout.direct_cost_total_row);
        let direct_costs = DirectCosts {
            items: self.extract_direct_cost_lines(grid),
            monthly: cost_row.monthly,
            annual: cost_row.total,
        };
        debug!(total = direct_costs.annual, "total direct costs");

        let margin_row = self.read_row(grid, layout.gross_margin_row);
        let gross_margin = GrossMargin {
            monthly: margin_row.monthly,
            annual: margin_row.total,
            percentage: percentage_of(margin_row.total, revenue.annual),
        };
        debug!(total = gross_margin.annual, "gross margin");

        let opex_row = self.read_row(grid, layout.opex_total_row);
        let mut operating_expenses = OperatingExpenses {
            consultants: Vec::new(),
            software: Vec::new(),
            other: Vec::new(),
            monthly: opex_row.monthly,
            annual: opex_row.total,
        };
        for section in &layout.opex_sections {
            let lines = self.extract_opex_section(grid, section);
            operating_expenses
                .category_mut(section.category)
                .extend(lines);
        }
        debug!(total = operating_expenses.annual, "total operating expenses");

        let result_row = self.read_row(grid, layout.net_result_row);
        let net_result = NetResult {
            monthly: result_row.monthly,
            annual: result_row.total,
            operating_margin: percentage_of(result_row.total, revenue.annual),
        };
        debug!(total = net_result.annual, "net result");

        let mut expenses: Vec<LineItem> = direct_costs
            .items
            .iter()
            .chain(operating_expenses.lines())
            .filter(|item| item.total > 0.0)
            .cloned()
            .collect();
        sort_by_total_desc(&mut expenses);

        BudgetModel {
            revenue,
            direct_costs,
            gross_margin,
            operating_expenses,
            net_result,
            expenses,
        }
    }

    /// Read the month columns and total of a row.
    ///
    /// The sheet's own total wins whenever it is a non-zero number, even if
    /// it disagrees with the month sum.
    pub fn read_row(&self, grid: &CellGrid, row: usize) -> RowFigures {
        let monthly = self.read_months(grid, row);
        let computed = sum(&monthly);
        let sheet_total = self.number(grid, row, self.layout.total_column);
        let total = if sheet_total != 0.0 { sheet_total } else { computed };
        RowFigures { monthly, total }
    }

    fn read_months(&self, grid: &CellGrid, row: usize) -> Monthly {
        let mut monthly = ZERO_MONTHS;
        for (slot, col) in monthly.iter_mut().zip(self.layout.month_columns()) {
            *slot = self.number(grid, row, col);
        }
        monthly
    }

    fn number(&self, grid: &CellGrid, row: usize, col: usize) -> f64 {
        if row >= self.layout.max_rows || col >= self.layout.max_columns {
            return 0.0;
        }
        grid.number(row, col)
    }

    fn label<'g>(&self, grid: &'g CellGrid, row: usize) -> Option<&'g str> {
        if row >= self.layout.max_rows || self.layout.label_column >= self.layout.max_columns {
            return None;
        }
        grid.label(row, self.layout.label_column)
    }

    fn extract_clients(&self, grid: &CellGrid) -> Vec<LineItem> {
        let mut clients = Vec::new();
        for row in self.layout.client_rows.rows() {
            let Some(name) = self.label(grid, row) else {
                continue;
            };
            if !self.layout.is_client_label(name) {
                continue;
            }
            let figures = self.read_row(grid, row);
            // qualify on the month sum, not the sheet total
            if sum(&figures.monthly) > 0.0 {
                clients.push(LineItem::new(name, figures.monthly, figures.total));
            }
        }
        clients
    }

    fn extract_direct_cost_lines(&self, grid: &CellGrid) -> Vec<LineItem> {
        self.layout
            .direct_cost_lines
            .iter()
            .filter_map(|line| {
                let figures = self.read_row(grid, line.row);
                (figures.total > 0.0)
                    .then(|| LineItem::new(line.name.clone(), figures.monthly, figures.total))
            })
            .collect()
    }

    fn extract_opex_section(&self, grid: &CellGrid, section: &OpexSection) -> Vec<LineItem> {
        let mut lines = Vec::new();
        for row in section.rows.rows() {
            let Some(name) = self.label(grid, row) else {
                continue;
            };
            if !self.layout.is_expense_label(name) {
                continue;
            }
            let figures = self.read_row(grid, row);
            if figures.total > 0.0 {
                lines.push(
                    LineItem::new(name, figures.monthly, figures.total)
                        .with_category(section.category),
                );
            }
        }
        lines
    }
}

/// Extract with the default template layout
pub fn extract_budget(grid: &CellGrid) -> BudgetModel {
    BudgetExtractor::default().extract(grid)
}
