use thiserror::Error;

pub type BudgetResult<T> = Result<T, BudgetError>;

#[derive(Error, Debug)]
pub enum BudgetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Unreadable or wrong-format spreadsheet
    #[error("Import error: {0}")]
    Import(String),

    #[error("Export error: {0}")]
    Export(String),

    #[error("Layout error: {0}")]
    Layout(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("No budget loaded - run 'budget-lens import <file>' first")]
    NoBudget,
}
