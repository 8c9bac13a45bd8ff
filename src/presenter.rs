//! User-facing input checks and text rendering shared by the CLI and the TUI.
//!
//! Front ends hand raw field text to this module before calling the store,
//! and use it to turn store results into the lines and notices users see.

use crate::db::{Expense, ExpenseStore};
use crate::error::{ErrorKind, ExpenseError, Result};
use std::fmt;
use std::path::Path;

pub const NO_EXPENSES: &str = "No expenses found.";
pub const NO_MATCHES: &str = "No matching expenses found.";

/// Raw text of the add-expense form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddForm {
    pub amount: String,
    pub category: String,
    pub date: String,
    pub notes: String,
}

impl AddForm {
    pub fn new(amount: &str, category: &str, date: &str, notes: &str) -> Self {
        Self {
            amount: amount.to_string(),
            category: category.to_string(),
            date: date.to_string(),
            notes: notes.to_string(),
        }
    }

    /// Amount, category and date must all be filled in.
    pub fn validate(&self) -> Result<&Self> {
        if is_blank(&self.amount) || is_blank(&self.category) || is_blank(&self.date) {
            return Err(ExpenseError::validation(
                "Please fill in all required fields.",
            ));
        }
        Ok(self)
    }

    /// Validate, then hand the fields to the store unchanged.
    pub fn submit(&self, store: &ExpenseStore) -> Result<Expense> {
        self.validate()?;
        store.add(&self.amount, &self.category, &self.date, &self.notes)
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

pub fn parse_delete_id(text: &str) -> Result<i64> {
    if is_blank(text) {
        return Err(ExpenseError::validation("Please enter an Expense ID."));
    }
    text.trim()
        .parse::<i64>()
        .map_err(|_| ExpenseError::validation("Expense ID must be a number."))
}

pub fn validate_keyword(text: &str) -> Result<&str> {
    if is_blank(text) {
        return Err(ExpenseError::validation("Please enter a search keyword."));
    }
    Ok(text)
}

/// Whole amounts keep a trailing `.0` (`800.0`), matching the CSV export.
pub fn format_amount(amount: f64) -> String {
    if amount.is_finite() && amount.fract() == 0.0 {
        format!("{:.1}", amount)
    } else {
        amount.to_string()
    }
}

/// `ID: <id> | Amount: <amount> | Category: <category> | Date: <date> | Notes: <notes>`
pub fn render_line(expense: &Expense) -> String {
    format!(
        "ID: {} | Amount: {} | Category: {} | Date: {} | Notes: {}",
        expense.id,
        format_amount(expense.amount),
        expense.category,
        expense.date,
        expense.notes.as_deref().unwrap_or("")
    )
}

/// One line per expense, or `empty_message` alone when there are none.
pub fn render_listing(expenses: &[Expense], empty_message: &str) -> Vec<String> {
    if expenses.is_empty() {
        return vec![empty_message.to_string()];
    }
    expenses.iter().map(render_line).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Warning,
    Error,
}

/// A titled message for the user after an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: Level,
    pub title: String,
    pub message: String,
}

impl Notice {
    fn new(level: Level, title: &str, message: impl Into<String>) -> Self {
        Self {
            level,
            title: title.to_string(),
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == Level::Error
    }

    pub fn added() -> Self {
        Self::new(Level::Success, "Success", "Expense added!")
    }

    pub fn deleted(id: i64, affected: usize) -> Self {
        if affected == 0 {
            Self::new(
                Level::Warning,
                "Not found",
                format!("No expense with ID {} exists.", id),
            )
        } else {
            Self::new(Level::Success, "Success", format!("Expense ID {} deleted!", id))
        }
    }

    pub fn exported(path: &Path) -> Self {
        Self::new(
            Level::Success,
            "Export Successful",
            format!("Data exported to {}", path.display()),
        )
    }

    /// Map a failure to what the user should read.
    pub fn from_error(err: &ExpenseError) -> Self {
        match err.kind() {
            ErrorKind::Validation => Self::new(Level::Error, "Error", err.to_string()),
            ErrorKind::NoData => Self::new(Level::Error, "Error", "No expenses to export!"),
            ErrorKind::Storage => Self::new(Level::Error, "Storage error", err.to_string()),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.message)
    }
}
