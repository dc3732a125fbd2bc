//! Excel import/export against real workbooks written with rust_xlsxwriter

use budget_lens::core::{consolidate, extract_budget};
use budget_lens::error::BudgetError;
use budget_lens::excel::{BudgetExporter, ExcelImporter};
use budget_lens::types::SalesVector;
use calamine::{open_workbook_auto, DataType, Reader};
use pretty_assertions::assert_eq;
use rust_xlsxwriter::{Workbook, Worksheet};
use std::path::Path;
use tempfile::TempDir;

fn write_month_row(sheet: &mut Worksheet, row: u32, label: &str, value: f64) {
    sheet.write_string(row, 1, label).unwrap();
    for col in 3..=14u16 {
        sheet.write_number(row, col, value).unwrap();
    }
}

fn write_budget_sheet(sheet: &mut Worksheet) {
    sheet.set_name("Presupuesto 2026").unwrap();
    sheet.write_string(0, 1, "CONCEPTO").unwrap();
    write_month_row(sheet, 2, "Acme Corp", 100.0);
    sheet.write_number(2, 15, 1200.0).unwrap();
    write_month_row(sheet, 3, "Beta Ltd", 40.0);
    write_month_row(sheet, 4, "Total Ingresos", 140.0);
    write_month_row(sheet, 51, "TOTAL INGRESOS", 140.0);
    write_month_row(sheet, 61, "Comisiones", 10.0);
    write_month_row(sheet, 67, "TOTAL COSTES", 10.0);
    write_month_row(sheet, 69, "MARGEN BRUTO", 130.0);
    write_month_row(sheet, 72, "Consultor", 20.0);
    write_month_row(sheet, 121, "TOTAL GASTOS", 20.0);
    write_month_row(sheet, 150, "RESULTADO", 110.0);
}

fn write_budget_workbook(path: &Path, leading_sheet: bool) {
    let mut workbook = Workbook::new();
    if leading_sheet {
        let cover = workbook.add_worksheet();
        cover.set_name("Resumen").unwrap();
        write_month_row(cover, 2, "Not A Client", 999.0);
    }
    write_budget_sheet(workbook.add_worksheet());
    workbook.save(path).unwrap();
}

// ═══════════════════════════════════════════════════════════════════════════
// IMPORT
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_import_generated_workbook() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("presupuesto.xlsx");
    write_budget_workbook(&path, false);

    let grid = ExcelImporter::new(&path).import().unwrap();
    let model = extract_budget(&grid);

    let names: Vec<&str> = model
        .revenue
        .clients
        .iter()
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(names, vec!["Acme Corp", "Beta Ltd"]);
    assert_eq!(model.revenue.clients[0].total, 1200.0);
    assert_eq!(model.revenue.clients[1].total, 480.0);
    assert_eq!(model.revenue.annual, 1680.0);
    assert_eq!(model.direct_costs.items[0].name, "Recurring Commissions");
    assert_eq!(model.operating_expenses.consultants[0].total, 240.0);
    assert_eq!(model.net_result.annual, 1320.0);
}

#[test]
fn test_import_prefers_named_sheet() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("with_cover.xlsx");
    write_budget_workbook(&path, true);

    let model = extract_budget(&ExcelImporter::new(&path).import().unwrap());
    assert!(model
        .revenue
        .clients
        .iter()
        .all(|c| c.name != "Not A Client"));
    assert_eq!(model.revenue.clients.len(), 2);
}

#[test]
fn test_import_falls_back_to_first_sheet() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("other_name.xlsx");
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    write_month_row(sheet, 2, "Only Client", 10.0);
    workbook.save(&path).unwrap();

    let model = extract_budget(&ExcelImporter::new(&path).import().unwrap());
    assert_eq!(model.revenue.clients[0].name, "Only Client");
}

#[test]
fn test_import_missing_file_is_import_error() {
    let dir = TempDir::new().unwrap();
    let result = ExcelImporter::new(dir.path().join("nope.xlsx")).import();
    assert!(matches!(result, Err(BudgetError::Import(_))));
}

#[test]
fn test_import_rejects_other_formats() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("budget.ods");
    std::fs::write(&path, "whatever").unwrap();
    let result = ExcelImporter::new(&path).import();
    assert!(matches!(result, Err(BudgetError::Import(_))));
}

// ═══════════════════════════════════════════════════════════════════════════
// EXPORT
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_export_sheets_are_readable() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("presupuesto.xlsx");
    write_budget_workbook(&source, false);
    let model = extract_budget(&ExcelImporter::new(&source).import().unwrap());

    let output = dir.path().join("report.xlsx");
    let pnl = consolidate(&model, &SalesVector::uniform(100.0));
    BudgetExporter::new(model)
        .with_consolidated(pnl)
        .export(&output)
        .unwrap();

    let mut workbook = open_workbook_auto(&output).unwrap();
    assert_eq!(
        workbook.sheet_names().to_vec(),
        vec!["P&L", "Clients", "Expenses", "Consolidated"]
    );

    let clients = workbook.worksheet_range("Clients").unwrap();
    assert_eq!(
        clients.get_value((1, 0)).and_then(|v| v.get_string()),
        Some("Acme Corp")
    );
    assert_eq!(
        clients.get_value((1, 13)).and_then(|v| v.get_float()),
        Some(1200.0)
    );
}

#[test]
fn test_export_without_consolidated_sheet() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("presupuesto.xlsx");
    write_budget_workbook(&source, false);
    let model = extract_budget(&ExcelImporter::new(&source).import().unwrap());

    let output = dir.path().join("plain.xlsx");
    BudgetExporter::new(model).export(&output).unwrap();

    let workbook = open_workbook_auto(&output).unwrap();
    assert_eq!(workbook.sheet_names().len(), 3);
}
