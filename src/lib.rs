// Expense Tracker - Core Library
// Storage, search and CSV export for personal expenses, shared by the CLI and TUI

pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod presenter;

// Re-export commonly used types
pub use config::Config;
pub use db::{
    Expense, ExpenseStore,
    parse_amount, setup_database, insert_expense, get_all_expenses,
    search_expenses, delete_expense, verify_count,
};
pub use error::{ErrorKind, ExpenseError, Result};
pub use export::{export_filename, write_csv};
pub use presenter::{AddForm, Level, Notice, format_amount, render_line, render_listing};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
