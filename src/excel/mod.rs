//! Excel boundary
//!
//! - Import: workbook (.xlsx/.xls) → cell grid, via calamine
//! - Export: budget model → formatted .xlsx report, via rust_xlsxwriter

mod exporter;
mod importer;

pub use exporter::BudgetExporter;
pub use importer::{ExcelImporter, SUPPORTED_EXTENSIONS};
