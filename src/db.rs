use crate::error::{ExpenseError, Result};
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// One recorded outlay.
///
/// Field renames double as the CSV export header.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Expense {
    #[serde(rename = "ID")]
    pub id: i64,

    #[serde(rename = "Amount")]
    pub amount: f64,

    #[serde(rename = "Category")]
    pub category: String,

    /// Expected as YYYY-MM-DD, never parsed.
    #[serde(rename = "Date")]
    pub date: String,

    #[serde(rename = "Notes")]
    pub notes: Option<String>,
}

const SELECT_COLUMNS: &str = "SELECT id, amount, category, date, notes FROM expenses";

fn row_to_expense(row: &Row<'_>) -> rusqlite::Result<Expense> {
    Ok(Expense {
        id: row.get(0)?,
        amount: row.get(1)?,
        category: row.get(2)?,
        date: row.get(3)?,
        notes: row.get(4)?,
    })
}

/// Parse user-entered amount text into a float.
pub fn parse_amount(text: &str) -> Result<f64> {
    text.trim()
        .parse::<f64>()
        .map_err(|_| ExpenseError::validation("Amount must be a number."))
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // journal_mode answers with the mode now in effect
    let mode: String =
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
    debug!("Journal mode set to {}", mode);

    conn.execute(
        "CREATE TABLE IF NOT EXISTS expenses (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            amount REAL NOT NULL,
            category TEXT NOT NULL,
            date TEXT NOT NULL,
            notes TEXT
        )",
        [],
    )?;

    Ok(())
}

/// Insert one expense and return its assigned id.
///
/// Constraint violations (NULL in a required column) are reported as
/// validation failures rather than storage failures.
pub fn insert_expense(
    conn: &Connection,
    amount: f64,
    category: &str,
    date: &str,
    notes: Option<&str>,
) -> Result<i64> {
    let result = conn.execute(
        "INSERT INTO expenses (amount, category, date, notes) VALUES (?1, ?2, ?3, ?4)",
        params![amount, category, date, notes],
    );

    match result {
        Ok(_) => Ok(conn.last_insert_rowid()),
        Err(rusqlite::Error::SqliteFailure(err, msg))
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Err(ExpenseError::validation(format!(
                "Expense rejected: {}",
                msg.unwrap_or_else(|| err.to_string())
            )))
        }
        Err(e) => Err(e.into()),
    }
}

pub fn get_all_expenses(conn: &Connection) -> Result<Vec<Expense>> {
    let mut stmt = conn.prepare(SELECT_COLUMNS)?;

    let expenses = stmt
        .query_map([], row_to_expense)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(expenses)
}

/// Substring search over category and date.
///
/// The keyword is wrapped as `%keyword%` and handed to LIKE unescaped, so
/// `%` and `_` inside it act as wildcards. Matching is case-sensitive.
pub fn search_expenses(conn: &Connection, keyword: &str) -> Result<Vec<Expense>> {
    conn.pragma_update(None, "case_sensitive_like", true)?;

    let pattern = format!("%{}%", keyword);
    let mut stmt = conn.prepare(&format!(
        "{} WHERE category LIKE ?1 OR date LIKE ?1",
        SELECT_COLUMNS
    ))?;

    let expenses = stmt
        .query_map(params![pattern], row_to_expense)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(expenses)
}

/// Returns the number of rows removed (0 when the id was absent).
pub fn delete_expense(conn: &Connection, id: i64) -> Result<usize> {
    let affected = conn.execute("DELETE FROM expenses WHERE id = ?1", params![id])?;
    Ok(affected)
}

pub fn verify_count(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM expenses", [], |row| row.get(0))?;

    Ok(count)
}

/// File-backed expense store.
///
/// A value of this type only exists once the schema is in place, so every
/// operation on it runs against a ready table. Each call opens its own
/// connection and closes it before returning.
#[derive(Debug, Clone)]
pub struct ExpenseStore {
    db_path: PathBuf,
    export_dir: PathBuf,
}

impl ExpenseStore {
    /// Create the database file and `expenses` table if missing.
    ///
    /// Safe to call on every start; an existing table is left untouched.
    pub fn initialize(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();

        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| ExpenseError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let conn = Connection::open(&db_path)?;
        setup_database(&conn)?;
        info!("Expense database ready at {}", db_path.display());

        Ok(Self {
            db_path,
            export_dir: PathBuf::from("."),
        })
    }

    /// Directory that receives CSV exports (defaults to the working directory).
    pub fn with_export_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.export_dir = dir.into();
        self
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn export_dir(&self) -> &Path {
        &self.export_dir
    }

    fn connect(&self) -> Result<Connection> {
        Ok(Connection::open(&self.db_path)?)
    }

    /// Record a new expense from user-entered text.
    ///
    /// The amount is parsed before the database is touched. Empty notes are
    /// stored as NULL.
    pub fn add(&self, amount: &str, category: &str, date: &str, notes: &str) -> Result<Expense> {
        let amount = parse_amount(amount)?;
        let notes = Some(notes).filter(|n| !n.is_empty());

        let conn = self.connect()?;
        let id = insert_expense(&conn, amount, category, date, notes)?;
        info!(id, category, date, "Expense added");

        Ok(Expense {
            id,
            amount,
            category: category.to_string(),
            date: date.to_string(),
            notes: notes.map(str::to_string),
        })
    }

    pub fn list(&self) -> Result<Vec<Expense>> {
        let conn = self.connect()?;
        let expenses = get_all_expenses(&conn)?;
        debug!(count = expenses.len(), "Listed expenses");
        Ok(expenses)
    }

    pub fn search(&self, keyword: &str) -> Result<Vec<Expense>> {
        let conn = self.connect()?;
        let expenses = search_expenses(&conn, keyword)?;
        debug!(keyword, count = expenses.len(), "Searched expenses");
        Ok(expenses)
    }

    /// Delete by id. Deleting an unknown id succeeds and reports 0.
    pub fn delete(&self, id: i64) -> Result<usize> {
        let conn = self.connect()?;
        let affected = delete_expense(&conn, id)?;
        info!(id, affected, "Expense delete");
        Ok(affected)
    }

    pub fn count(&self) -> Result<i64> {
        let conn = self.connect()?;
        verify_count(&conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use tempfile::TempDir;

    fn test_store() -> (TempDir, ExpenseStore) {
        let dir = TempDir::new().unwrap();
        let store = ExpenseStore::initialize(dir.path().join("expenses.db")).unwrap();
        (dir, store)
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let (dir, store) = test_store();
        store.add("5", "Food", "2024-01-01", "").unwrap();

        let reopened = ExpenseStore::initialize(dir.path().join("expenses.db")).unwrap();
        assert_eq!(reopened.count().unwrap(), 1);
    }

    #[test]
    fn test_initialize_creates_parent_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("data").join("expenses.db");

        ExpenseStore::initialize(&path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_scenario_single_expense_lifecycle() {
        let (_dir, store) = test_store();

        let added = store.add("12.50", "Food", "2024-01-15", "lunch").unwrap();
        assert_eq!(added.id, 1);

        let expected = Expense {
            id: 1,
            amount: 12.5,
            category: "Food".to_string(),
            date: "2024-01-15".to_string(),
            notes: Some("lunch".to_string()),
        };
        assert_eq!(store.list().unwrap(), vec![expected.clone()]);
        assert_eq!(store.search("Food").unwrap(), vec![expected.clone()]);
        assert_eq!(store.search("2024-01").unwrap(), vec![expected]);

        assert_eq!(store.delete(1).unwrap(), 1);
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_round_trip_assigns_fresh_ids() {
        let (_dir, store) = test_store();

        let first = store.add("3.25", "Coffee", "2024-02-01", "latte").unwrap();
        let second = store.add("3.25", "Coffee", "2024-02-01", "latte").unwrap();
        assert_ne!(first.id, second.id);

        let listed = store.list().unwrap();
        assert_eq!(listed.iter().filter(|e| e.id == second.id).count(), 1);
        assert!(listed.contains(&first));
        assert!(listed.contains(&second));
    }

    #[test]
    fn test_ids_not_reused_after_delete() {
        let (_dir, store) = test_store();

        store.add("1", "A", "2024-01-01", "").unwrap();
        let last = store.add("2", "B", "2024-01-02", "").unwrap();
        store.delete(last.id).unwrap();

        let next = store.add("3", "C", "2024-01-03", "").unwrap();
        assert!(next.id > last.id);
    }

    #[test]
    fn test_empty_notes_stored_as_null() {
        let (_dir, store) = test_store();

        let added = store.add("9.99", "Books", "2024-03-10", "").unwrap();
        assert_eq!(added.notes, None);
        assert_eq!(store.list().unwrap()[0].notes, None);
    }

    #[test]
    fn test_add_rejects_non_numeric_amount() {
        let (_dir, store) = test_store();

        let err = store.add("twelve", "Food", "2024-01-15", "").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_add_accepts_padded_amount() {
        let (_dir, store) = test_store();

        let added = store.add(" 7.5 ", "Taxi", "2024-04-01", "").unwrap();
        assert_eq!(added.amount, 7.5);
    }

    #[test]
    fn test_nan_amount_hits_not_null_constraint() {
        let (_dir, store) = test_store();

        // SQLite stores NaN as NULL, which the amount column refuses.
        let err = store.add("NaN", "Food", "2024-01-15", "").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_delete_twice_reports_zero_second_time() {
        let (_dir, store) = test_store();

        let added = store.add("20", "Rent", "2024-01-01", "").unwrap();
        assert_eq!(store.delete(added.id).unwrap(), 1);
        assert_eq!(store.delete(added.id).unwrap(), 0);
    }

    #[test]
    fn test_delete_unknown_id_is_noop() {
        let (_dir, store) = test_store();

        store.add("20", "Rent", "2024-01-01", "").unwrap();
        assert_eq!(store.delete(999).unwrap(), 0);
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_search_keeps_insertion_order() {
        let (_dir, store) = test_store();

        let a = store.add("10", "Food", "2024-01-01", "").unwrap();
        store.add("800", "Rent", "2024-01-02", "").unwrap();
        let c = store.add("15", "Food", "2024-01-03", "").unwrap();

        assert_eq!(store.search("Food").unwrap(), vec![a, c]);
    }

    #[test]
    fn test_search_matches_category_or_date_substrings() {
        let (_dir, store) = test_store();

        let food = store.add("10", "Fast Food", "2024-01-05", "").unwrap();
        let rent = store.add("800", "Rent", "2023-12-31", "").unwrap();

        assert_eq!(store.search("Food").unwrap(), vec![food.clone()]);
        assert_eq!(store.search("2023").unwrap(), vec![rent]);
        assert_eq!(store.search("-0").unwrap(), vec![food]);
        assert!(store.search("Groceries").unwrap().is_empty());

        // notes are not searched
        store.add("1", "Misc", "2024-06-01", "Food court").unwrap();
        assert!(store.search("court").unwrap().is_empty());
    }

    #[test]
    fn test_search_agrees_with_substring_rule() {
        let (_dir, store) = test_store();

        let categories = ["Food", "food", "Fast Food", "Rent", "Café", "Gym 24/7"];
        let dates = ["2024-01-15", "2023-12-31", "2024-11-01"];

        let mut stored = Vec::new();
        for (i, category) in categories.iter().enumerate() {
            for date in dates.iter().skip(i % 2) {
                stored.push(store.add("1.5", category, date, "Food note").unwrap());
            }
        }

        let keywords = [
            "Food", "food", "F", "oo", "Rent", "rent", "é", "24/7", "2024", "-01", "12-3",
            "1-0", "Food ", "x", "Gym 24/7 extra",
        ];

        for keyword in keywords {
            let expected: Vec<Expense> = stored
                .iter()
                .filter(|e| e.category.contains(keyword) || e.date.contains(keyword))
                .cloned()
                .collect();

            assert_eq!(store.search(keyword).unwrap(), expected, "keyword {:?}", keyword);
        }
    }

    #[test]
    fn test_search_is_case_sensitive() {
        let (_dir, store) = test_store();

        store.add("10", "Food", "2024-01-05", "").unwrap();
        assert!(store.search("food").unwrap().is_empty());
        assert_eq!(store.search("Foo").unwrap().len(), 1);
    }

    #[test]
    fn test_search_wildcards_are_not_escaped() {
        let (_dir, store) = test_store();

        store.add("10", "Food", "2024-01-05", "").unwrap();
        store.add("20", "Fuel", "2024-02-07", "").unwrap();

        // Neither row contains a literal '%' or '_', yet both keywords match.
        assert_eq!(store.search("F%d").unwrap().len(), 1);
        assert_eq!(store.search("%").unwrap().len(), 2);
        assert_eq!(store.search("2024_0").unwrap().len(), 2);
    }

    #[test]
    fn test_empty_keyword_matches_everything() {
        let (_dir, store) = test_store();

        store.add("10", "Food", "2024-01-05", "").unwrap();
        store.add("20", "Fuel", "2024-02-07", "").unwrap();
        assert_eq!(store.search("").unwrap().len(), 2);
    }

    #[test]
    fn test_list_empty_store() {
        let (_dir, store) = test_store();
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_missing_table_is_storage_error() {
        let (dir, store) = test_store();
        let conn = Connection::open(dir.path().join("expenses.db")).unwrap();
        conn.execute("DROP TABLE expenses", []).unwrap();
        drop(conn);

        assert_eq!(store.list().unwrap_err().kind(), ErrorKind::Storage);
    }
}
