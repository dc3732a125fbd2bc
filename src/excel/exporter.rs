//! Excel exporter implementation - budget model → .xlsx report

use crate::core::consolidation::ConsolidatedPnl;
use crate::core::report::{self, PlRow};
use crate::error::{BudgetError, BudgetResult};
use crate::types::{BudgetModel, LineItem, MONTH_LABELS};
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use std::path::Path;

const AMOUNT_FORMAT: &str = "#,##0.00";

fn export_err(e: XlsxError) -> BudgetError {
    BudgetError::Export(e.to_string())
}

/// Writes the budget (and optionally the consolidated P&L) as a workbook
pub struct BudgetExporter {
    model: BudgetModel,
    consolidated: Option<ConsolidatedPnl>,
}

impl BudgetExporter {
    pub fn new(model: BudgetModel) -> Self {
        Self {
            model,
            consolidated: None,
        }
    }

    pub fn with_consolidated(mut self, pnl: ConsolidatedPnl) -> Self {
        self.consolidated = Some(pnl);
        self
    }

    /// Export the report to an Excel .xlsx file
    pub fn export(&self, output_path: &Path) -> BudgetResult<()> {
        let mut workbook = Workbook::new();

        self.write_rows_sheet(&mut workbook, "P&L", &report::detailed_rows(&self.model))?;
        self.write_items_sheet(&mut workbook, "Clients", &self.model.revenue.clients, true)?;
        self.write_items_sheet(&mut workbook, "Expenses", &self.model.expenses, false)?;
        if let Some(pnl) = &self.consolidated {
            self.write_rows_sheet(&mut workbook, "Consolidated", &report::consolidated_rows(pnl))?;
        }

        workbook
            .save(output_path)
            .map_err(|e| BudgetError::Export(format!("Failed to save Excel file: {}", e)))?;
        Ok(())
    }

    fn write_header(&self, worksheet: &mut Worksheet, first: &str, last: &[&str]) -> BudgetResult<()> {
        let header = Format::new().set_bold();
        worksheet
            .write_string_with_format(0, 0, first, &header)
            .map_err(export_err)?;
        for (i, month) in MONTH_LABELS.iter().enumerate() {
            worksheet
                .write_string_with_format(0, (i + 1) as u16, *month, &header)
                .map_err(export_err)?;
        }
        for (i, title) in last.iter().enumerate() {
            worksheet
                .write_string_with_format(0, (MONTH_LABELS.len() + 1 + i) as u16, *title, &header)
                .map_err(export_err)?;
        }
        worksheet.set_column_width(0, 36).map_err(export_err)?;
        Ok(())
    }

    fn write_rows_sheet(&self, workbook: &mut Workbook, name: &str, rows: &[PlRow]) -> BudgetResult<()> {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(name).map_err(export_err)?;
        self.write_header(worksheet, "Concept", &["Total", "%"])?;

        let amount = Format::new().set_num_format(AMOUNT_FORMAT);
        let bold_amount = Format::new().set_num_format(AMOUNT_FORMAT).set_bold();
        let bold = Format::new().set_bold();
        let plain = Format::new();
        let percent = Format::new().set_num_format("0.00%");

        for (i, row) in rows.iter().enumerate() {
            let r = (i + 1) as u32;
            let emphasised = !matches!(row.kind, report::RowKind::Line | report::RowKind::Detail);
            let (label_fmt, num_fmt) = if emphasised {
                (&bold, &bold_amount)
            } else {
                (&plain, &amount)
            };
            worksheet
                .write_string_with_format(r, 0, &row.label, label_fmt)
                .map_err(export_err)?;
            for (m, value) in row.monthly.iter().enumerate() {
                worksheet
                    .write_number_with_format(r, (m + 1) as u16, *value, num_fmt)
                    .map_err(export_err)?;
            }
            worksheet
                .write_number_with_format(r, 13, row.total, num_fmt)
                .map_err(export_err)?;
            if let Some(pct) = row.percentage {
                worksheet
                    .write_number_with_format(r, 14, pct / 100.0, &percent)
                    .map_err(export_err)?;
            }
        }
        Ok(())
    }

    fn write_items_sheet(
        &self,
        workbook: &mut Workbook,
        name: &str,
        items: &[LineItem],
        with_share: bool,
    ) -> BudgetResult<()> {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(name).map_err(export_err)?;
        let trailing: &[&str] = if with_share {
            &["Total", "Share"]
        } else {
            &["Total", "Category"]
        };
        self.write_header(worksheet, "Name", trailing)?;

        let amount = Format::new().set_num_format(AMOUNT_FORMAT);
        let percent = Format::new().set_num_format("0.00%");
        for (i, item) in items.iter().enumerate() {
            let r = (i + 1) as u32;
            worksheet.write_string(r, 0, &item.name).map_err(export_err)?;
            for (m, value) in item.monthly.iter().enumerate() {
                worksheet
                    .write_number_with_format(r, (m + 1) as u16, *value, &amount)
                    .map_err(export_err)?;
            }
            worksheet
                .write_number_with_format(r, 13, item.total, &amount)
                .map_err(export_err)?;
            if with_share {
                let share = crate::types::percentage_of(item.total, self.model.revenue.annual);
                worksheet
                    .write_number_with_format(r, 14, share / 100.0, &percent)
                    .map_err(export_err)?;
            } else {
                let category = item
                    .category
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "Direct cost".to_string());
                worksheet.write_string(r, 14, &category).map_err(export_err)?;
            }
        }
        Ok(())
    }
}
