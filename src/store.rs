//! Flat snapshot storage for the budget model and the sales vector
//!
//! Each snapshot is a single JSON file that is overwritten as a whole.
//! There is no versioning or migration: an unreadable snapshot is an error
//! for the caller to handle.

use crate::error::BudgetResult;
use crate::types::{BudgetModel, SalesVector};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

const BUDGET_FILE: &str = "budget.json";
const SALES_FILE: &str = "sales.json";

/// Budget model plus the time it was extracted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetSnapshot {
    pub saved_at: DateTime<Utc>,
    pub model: BudgetModel,
}

#[derive(Debug, Clone)]
pub struct SnapshotStore {
    root: PathBuf,
}

impl SnapshotStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn budget_path(&self) -> PathBuf {
        self.root.join(BUDGET_FILE)
    }

    pub fn sales_path(&self) -> PathBuf {
        self.root.join(SALES_FILE)
    }

    pub fn save_budget(&self, model: &BudgetModel) -> BudgetResult<BudgetSnapshot> {
        let snapshot = BudgetSnapshot {
            saved_at: Utc::now(),
            model: model.clone(),
        };
        self.write_json(&self.budget_path(), &snapshot)?;
        Ok(snapshot)
    }

    /// `None` when no snapshot has been saved yet
    pub fn load_budget(&self) -> BudgetResult<Option<BudgetSnapshot>> {
        self.read_json(&self.budget_path())
    }

    pub fn save_sales(&self, sales: &SalesVector) -> BudgetResult<()> {
        self.write_json(&self.sales_path(), sales)
    }

    pub fn load_sales(&self) -> BudgetResult<Option<SalesVector>> {
        self.read_json(&self.sales_path())
    }

    fn write_json<T: Serialize>(&self, path: &Path, value: &T) -> BudgetResult<()> {
        fs::create_dir_all(&self.root)?;
        let json = serde_json::to_string_pretty(value)?;
        // Replace the old snapshot only once the new one is fully on disk
        let mut tmp = NamedTempFile::new_in(&self.root)?;
        tmp.write_all(json.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| e.error)?;
        debug!(path = %path.display(), "snapshot written");
        Ok(())
    }

    fn read_json<T: for<'de> Deserialize<'de>>(&self, path: &Path) -> BudgetResult<Option<T>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::extractor::extract_budget;
    use crate::grid::CellGrid;
    use tempfile::TempDir;

    #[test]
    fn test_missing_snapshots_load_as_none() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path().join("nested"));
        assert!(store.load_budget().unwrap().is_none());
        assert!(store.load_sales().unwrap().is_none());
    }

    #[test]
    fn test_budget_snapshot_reloads_verbatim() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path());
        let mut grid = CellGrid::new();
        grid.set(2, 1, "Acme");
        grid.set(2, 3, 10.5);
        let model = extract_budget(&grid);

        let saved = store.save_budget(&model).unwrap();
        let loaded = store.load_budget().unwrap().unwrap();
        assert_eq!(loaded, saved);
        assert_eq!(loaded.model, model);
    }

    #[test]
    fn test_sales_overwrite() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path());
        store.save_sales(&SalesVector::uniform(5.0)).unwrap();
        store.save_sales(&SalesVector::uniform(7.0)).unwrap();
        assert_eq!(store.load_sales().unwrap(), Some(SalesVector::uniform(7.0)));
    }

    #[test]
    fn test_budget_overwrite_leaves_only_snapshot_files() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path());
        let mut grid = CellGrid::new();
        grid.set(2, 1, "Acme");
        grid.set(2, 3, 10.0);
        store.save_budget(&extract_budget(&grid)).unwrap();

        grid.set(2, 3, 20.0);
        let second = extract_budget(&grid);
        store.save_budget(&second).unwrap();
        store.save_sales(&SalesVector::uniform(1.0)).unwrap();

        let mut names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["budget.json", "sales.json"]);
        assert_eq!(store.load_budget().unwrap().unwrap().model, second);
    }

    #[test]
    fn test_corrupt_snapshot_is_an_error() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path());
        fs::write(store.sales_path(), "not json").unwrap();
        assert!(store.load_sales().is_err());
    }
}
