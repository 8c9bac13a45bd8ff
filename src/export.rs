use crate::db::{Expense, ExpenseStore};
use crate::error::{ExpenseError, Result};
use chrono::{Local, NaiveDate};
use std::path::{Path, PathBuf};
use tracing::info;

/// `expenses_<YYYY-MM-DD>.csv` for the given day.
pub fn export_filename(day: NaiveDate) -> String {
    format!("expenses_{}.csv", day.format("%Y-%m-%d"))
}

/// Write expenses as CSV with an `ID,Amount,Category,Date,Notes` header.
///
/// Truncates any existing file at `path`.
pub fn write_csv(path: &Path, expenses: &[Expense]) -> Result<()> {
    let to_export_error = |source: csv::Error| ExpenseError::ExportWrite {
        path: path.to_path_buf(),
        source,
    };

    let mut wtr = csv::Writer::from_path(path).map_err(to_export_error)?;
    for expense in expenses {
        wtr.serialize(expense).map_err(to_export_error)?;
    }
    wtr.flush().map_err(|source| ExpenseError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(())
}

impl ExpenseStore {
    /// Export every expense to today's CSV file in the export directory.
    ///
    /// A second export on the same day overwrites the first.
    pub fn export_to_csv(&self) -> Result<PathBuf> {
        self.export_to_csv_on(Local::now().date_naive())
    }

    /// Same as [`ExpenseStore::export_to_csv`] with an explicit date.
    pub fn export_to_csv_on(&self, day: NaiveDate) -> Result<PathBuf> {
        let expenses = self.list()?;
        if expenses.is_empty() {
            return Err(ExpenseError::NoData);
        }

        let dir = self.export_dir();
        std::fs::create_dir_all(dir).map_err(|source| ExpenseError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let path = dir.join(export_filename(day));
        write_csv(&path, &expenses)?;
        info!(count = expenses.len(), "Exported expenses to {}", path.display());

        Ok(path)
    }
}
