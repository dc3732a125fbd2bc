//! Budget Lens - annual budget workbooks as a structured P&L
//!
//! Reads a fixed-layout budget worksheet, extracts clients, direct costs,
//! operating expenses and the P&L aggregates into a [`types::BudgetModel`],
//! and blends it with user-entered product sales into a consolidated P&L.
//!
//! # Example
//!
//! ```no_run
//! use budget_lens::excel::ExcelImporter;
//! use budget_lens::core::{consolidate, extract_budget};
//! use budget_lens::types::SalesVector;
//!
//! let grid = ExcelImporter::new("presupuesto.xlsx").import()?;
//! let model = extract_budget(&grid);
//! println!("Clients: {}", model.revenue.clients.len());
//!
//! let pnl = consolidate(&model, &SalesVector::uniform(5_000.0));
//! println!("Net result: {:.2}", pnl.net_result.annual);
//! # Ok::<(), budget_lens::error::BudgetError>(())
//! ```

pub mod api;
pub mod cli;
pub mod core;
pub mod error;
pub mod excel;
pub mod grid;
pub mod layout;
pub mod session;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use error::{BudgetError, BudgetResult};
pub use types::{BudgetModel, LineItem, SalesVector};
