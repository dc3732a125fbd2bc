//! Budget extraction, consolidation and report views

pub mod consolidation;
pub mod extractor;
pub mod report;

pub use consolidation::{consolidate, consolidate_with_rate, ConsolidatedPnl, PRODUCT_GROSS_MARGIN};
pub use extractor::{extract_budget, BudgetExtractor};
