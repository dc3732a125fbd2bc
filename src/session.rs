//! Session state: the current budget, the current sales vector, and where
//! they are persisted.
//!
//! Both values are replaced wholesale. A failed import never touches the
//! budget that was loaded before it.

use crate::core::report::DashboardData;
use crate::core::{consolidate, BudgetExtractor, ConsolidatedPnl};
use crate::error::{BudgetError, BudgetResult};
use crate::excel::ExcelImporter;
use crate::grid::CellGrid;
use crate::layout::TemplateLayout;
use crate::store::{BudgetSnapshot, SnapshotStore};
use crate::types::{BudgetModel, SalesVector};
use std::path::Path;
use tracing::{info, warn};

pub struct Session {
    store: SnapshotStore,
    extractor: BudgetExtractor,
    budget: Option<BudgetSnapshot>,
    sales: SalesVector,
}

impl Session {
    /// Open a session and restore any saved snapshots.
    ///
    /// An unreadable snapshot is logged and treated as absent.
    pub fn open(store: SnapshotStore, layout: TemplateLayout) -> BudgetResult<Self> {
        layout.validate()?;

        let budget = match store.load_budget() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(error = %e, "ignoring unreadable budget snapshot");
                None
            }
        };
        let sales = match store.load_sales() {
            Ok(sales) => sales.unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, "ignoring unreadable sales snapshot");
                SalesVector::zero()
            }
        };

        Ok(Self {
            store,
            extractor: BudgetExtractor::new(layout),
            budget,
            sales,
        })
    }

    pub fn layout(&self) -> &TemplateLayout {
        self.extractor.layout()
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    pub fn snapshot(&self) -> Option<&BudgetSnapshot> {
        self.budget.as_ref()
    }

    pub fn budget(&self) -> Option<&BudgetModel> {
        self.budget.as_ref().map(|s| &s.model)
    }

    pub fn require_budget(&self) -> BudgetResult<&BudgetModel> {
        self.budget().ok_or(BudgetError::NoBudget)
    }

    pub fn sales(&self) -> &SalesVector {
        &self.sales
    }

    /// Decode a workbook, extract it and make it the current budget
    pub fn import_file(&mut self, path: &Path) -> BudgetResult<&BudgetSnapshot> {
        let grid = ExcelImporter::new(path)
            .with_layout(self.layout().clone())
            .import()?;
        info!(file = %path.display(), "workbook decoded");
        self.load_grid(&grid)
    }

    /// Extract a decoded grid and make it the current budget
    pub fn load_grid(&mut self, grid: &CellGrid) -> BudgetResult<&BudgetSnapshot> {
        let model = self.extractor.extract(grid);
        let snapshot = self.store.save_budget(&model)?;
        info!(
            clients = model.revenue.clients.len(),
            revenue = model.revenue.annual,
            "budget replaced"
        );
        Ok(self.budget.insert(snapshot))
    }

    pub fn set_sales(&mut self, sales: SalesVector) -> BudgetResult<()> {
        self.store.save_sales(&sales)?;
        self.sales = sales;
        info!(total = self.sales.total(), "sales vector replaced");
        Ok(())
    }

    pub fn set_sales_uniform(&mut self, value: f64) -> BudgetResult<()> {
        self.set_sales(SalesVector::uniform(value))
    }

    pub fn consolidated(&self) -> BudgetResult<ConsolidatedPnl> {
        Ok(consolidate(self.require_budget()?, &self.sales))
    }

    pub fn dashboard(&self) -> BudgetResult<DashboardData> {
        let snapshot = self.budget.as_ref().ok_or(BudgetError::NoBudget)?;
        Ok(DashboardData::new(
            &snapshot.model,
            &self.sales,
            Some(snapshot.saved_at),
        ))
    }
}
