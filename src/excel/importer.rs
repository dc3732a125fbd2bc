//! Excel importer implementation - workbook (.xlsx/.xls) → CellGrid

use crate::error::{BudgetError, BudgetResult};
use crate::grid::{Cell, CellGrid};
use crate::layout::TemplateLayout;
use calamine::{open_workbook_auto, Data, Range, Reader};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Extensions accepted by the importer
pub const SUPPORTED_EXTENSIONS: [&str; 2] = ["xlsx", "xls"];

/// Reads the budget worksheet of a workbook into a bounded cell grid
pub struct ExcelImporter {
    path: PathBuf,
    layout: TemplateLayout,
}

impl ExcelImporter {
    /// Create a new Excel importer using the default template layout
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            layout: TemplateLayout::default(),
        }
    }

    /// Use a different sheet name / read window
    pub fn with_layout(mut self, layout: TemplateLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Decode the budget worksheet
    pub fn import(&self) -> BudgetResult<CellGrid> {
        self.check_extension()?;

        let mut workbook = open_workbook_auto(&self.path)
            .map_err(|e| BudgetError::Import(format!("Failed to open Excel file: {}", e)))?;

        let sheet_names = workbook.sheet_names().to_vec();
        debug!(sheets = ?sheet_names, "workbook opened");

        let sheet_name = self.select_sheet(&sheet_names).ok_or_else(|| {
            BudgetError::Import(format!("{} contains no worksheets", self.path.display()))
        })?;
        debug!(sheet = %sheet_name, "using worksheet");

        let range = workbook.worksheet_range(&sheet_name).map_err(|e| {
            BudgetError::Import(format!("Failed to read worksheet '{}': {}", sheet_name, e))
        })?;

        Ok(self.range_to_grid(&range))
    }

    fn check_extension(&self) -> BudgetResult<()> {
        let ext = self
            .path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext {
            Some(ext) if SUPPORTED_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
            _ => Err(BudgetError::Import(format!(
                "{} is not an Excel workbook (.xlsx or .xls)",
                self.path.display()
            ))),
        }
    }

    /// First sheet whose name contains the layout's sheet name, else the first sheet
    fn select_sheet(&self, sheet_names: &[String]) -> Option<String> {
        sheet_names
            .iter()
            .find(|name| name.contains(&self.layout.sheet_name))
            .or_else(|| sheet_names.first())
            .cloned()
    }

    /// Copy the read window (A1 to the layout's last row/column) into a grid.
    ///
    /// Positions are absolute worksheet coordinates, so a used range that
    /// does not start at A1 still lands on the right rows.
    fn range_to_grid(&self, range: &Range<Data>) -> CellGrid {
        let mut grid = CellGrid::new();
        if range.is_empty() {
            return grid;
        }

        for row in 0..self.layout.max_rows {
            for col in 0..self.layout.max_columns {
                if let Some(data) = range.get_value((row as u32, col as u32)) {
                    let cell = self.convert_cell(data);
                    if !cell.is_empty() {
                        grid.set(row, col, cell);
                    }
                }
            }
        }
        grid
    }

    fn convert_cell(&self, data: &Data) -> Cell {
        match data {
            Data::Float(f) => Cell::Number(*f),
            Data::Int(i) => Cell::Number(*i as f64),
            Data::Bool(b) => Cell::Bool(*b),
            Data::String(s) => Cell::from(s.as_str()),
            Data::DateTime(dt) => Cell::Number(dt.as_f64()),
            Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::from(s.as_str()),
            // error values (#DIV/0!, #REF!) keep their text so they never look numeric
            Data::Error(e) => Cell::Text(e.to_string()),
            Data::Empty => Cell::Empty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::CellErrorType;

    fn create_test_importer() -> ExcelImporter {
        ExcelImporter::new(PathBuf::from("budget.xlsx"))
    }

    #[test]
    fn test_extension_check() {
        assert!(ExcelImporter::new("a.xlsx").check_extension().is_ok());
        assert!(ExcelImporter::new("a.XLS").check_extension().is_ok());
        assert!(ExcelImporter::new("a.csv").check_extension().is_err());
        assert!(ExcelImporter::new("noext").check_extension().is_err());
    }

    #[test]
    fn test_wrong_extension_is_import_error() {
        let result = ExcelImporter::new("budget.pdf").import();
        assert!(matches!(result, Err(BudgetError::Import(_))));
    }

    #[test]
    fn test_select_sheet_prefers_layout_name() {
        let importer = create_test_importer();
        let names = vec![
            "Resumen".to_string(),
            "Presupuesto 2026 (final)".to_string(),
        ];
        assert_eq!(
            importer.select_sheet(&names),
            Some("Presupuesto 2026 (final)".to_string())
        );

        let names = vec!["Sheet1".to_string(), "Sheet2".to_string()];
        assert_eq!(importer.select_sheet(&names), Some("Sheet1".to_string()));
        assert_eq!(importer.select_sheet(&[]), None);
    }

    #[test]
    fn test_convert_cell() {
        let importer = create_test_importer();
        assert_eq!(importer.convert_cell(&Data::Float(1.5)), Cell::Number(1.5));
        assert_eq!(importer.convert_cell(&Data::Int(3)), Cell::Number(3.0));
        assert_eq!(
            importer.convert_cell(&Data::String("Acme".to_string())),
            Cell::Text("Acme".to_string())
        );
        assert_eq!(importer.convert_cell(&Data::String(String::new())), Cell::Empty);
        assert_eq!(importer.convert_cell(&Data::Bool(true)), Cell::Bool(true));
        assert_eq!(importer.convert_cell(&Data::Empty), Cell::Empty);
        let err = importer.convert_cell(&Data::Error(CellErrorType::Div0));
        assert_eq!(err.as_number(), 0.0);
        assert!(matches!(err, Cell::Text(_)));
    }

    #[test]
    fn test_range_to_grid_honours_offset_and_window() {
        let importer = create_test_importer();
        let mut range: Range<Data> = Range::new((2, 1), (200, 20));
        range.set_value((2, 1), Data::String("Acme".to_string()));
        range.set_value((2, 3), Data::Float(100.0));
        range.set_value((170, 3), Data::Float(5.0));
        range.set_value((2, 18), Data::Float(5.0));

        let grid = importer.range_to_grid(&range);
        assert_eq!(grid.label(2, 1), Some("Acme"));
        assert_eq!(grid.number(2, 3), 100.0);
        assert_eq!(grid.number(170, 3), 0.0);
        assert_eq!(grid.number(2, 18), 0.0);
        assert_eq!(grid.height(), 3);
    }
}
