// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use expense_tracker::presenter::{self, AddForm, Level, Notice, NO_EXPENSES, NO_MATCHES};
use expense_tracker::{Config, Expense, ExpenseStore, VERSION};

#[derive(Parser, Debug)]
#[command(
    name = "expense-tracker",
    version = VERSION,
    about = "Record, search and export personal expenses"
)]
struct CliArgs {
    /// SQLite database file (overrides EXPENSES_DB)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Command {
    /// Record an expense
    Add {
        #[arg(default_value = "", allow_negative_numbers = true)]
        amount: String,
        #[arg(default_value = "")]
        category: String,
        /// Date as YYYY-MM-DD
        #[arg(default_value = "")]
        date: String,
        #[arg(default_value = "")]
        notes: String,
    },
    /// Show every expense
    List {
        #[arg(long)]
        json: bool,
    },
    /// Match category or date
    Search {
        #[arg(default_value = "")]
        keyword: String,
        #[arg(long)]
        json: bool,
    },
    /// Remove an expense by ID
    Delete {
        #[arg(default_value = "", allow_negative_numbers = true)]
        id: String,
    },
    /// Write expenses_<today>.csv
    Export,
    /// Interactive terminal UI (default)
    Ui,
}

fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_logging();

    let mut config = Config::from_env();
    if let Some(path) = args.db {
        config = config.with_db_path(path);
    }

    let store = ExpenseStore::initialize(&config.db_path)
        .with_context(|| format!("Failed to open database {}", config.db_path.display()))?
        .with_export_dir(config.export_dir.clone());

    let command = match args.command {
        None | Some(Command::Ui) => return run_ui_mode(&store),
        Some(command) => command,
    };

    match run_command(&store, command) {
        Ok(output) => {
            for line in output.lines {
                println!("{}", line);
            }
            for warning in output.warnings {
                eprintln!("{}", warning);
            }
            Ok(())
        }
        Err(notice) => {
            eprintln!("{}", notice);
            std::process::exit(1);
        }
    }
}

/// Log to stderr so command output on stdout stays clean.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// What a command prints: result lines to stdout, warnings to stderr.
#[derive(Debug, Default, PartialEq)]
struct Output {
    lines: Vec<String>,
    warnings: Vec<String>,
}

type Outcome = std::result::Result<Output, Notice>;

fn run_command(store: &ExpenseStore, command: Command) -> Outcome {
    match command {
        Command::Add { amount, category, date, notes } => {
            run_add(store, &AddForm::new(&amount, &category, &date, &notes))
        }
        Command::List { json } => run_list(store, json),
        Command::Search { keyword, json } => run_search(store, &keyword, json),
        Command::Delete { id } => run_delete(store, &id),
        Command::Export => run_export(store),
        Command::Ui => Ok(Output::default()),
    }
}

fn run_add(store: &ExpenseStore, form: &AddForm) -> Outcome {
    let expense = form.submit(store).map_err(|e| Notice::from_error(&e))?;

    Ok(Output {
        lines: vec![Notice::added().to_string(), presenter::render_line(&expense)],
        ..Output::default()
    })
}

fn render_expenses(expenses: &[Expense], empty_message: &str, json: bool) -> Outcome {
    let lines = if json {
        let body = serde_json::to_string_pretty(expenses).map_err(|e| Notice {
            level: Level::Error,
            title: "Error".to_string(),
            message: e.to_string(),
        })?;
        vec![body]
    } else {
        presenter::render_listing(expenses, empty_message)
    };

    Ok(Output { lines, ..Output::default() })
}

fn run_list(store: &ExpenseStore, json: bool) -> Outcome {
    let expenses = store.list().map_err(|e| Notice::from_error(&e))?;
    render_expenses(&expenses, NO_EXPENSES, json)
}

fn run_search(store: &ExpenseStore, keyword: &str, json: bool) -> Outcome {
    let keyword = presenter::validate_keyword(keyword).map_err(|e| Notice::from_error(&e))?;
    let expenses = store.search(keyword).map_err(|e| Notice::from_error(&e))?;
    render_expenses(&expenses, NO_MATCHES, json)
}

fn run_delete(store: &ExpenseStore, id: &str) -> Outcome {
    let id = presenter::parse_delete_id(id).map_err(|e| Notice::from_error(&e))?;
    let affected = store.delete(id).map_err(|e| Notice::from_error(&e))?;

    let notice = Notice::deleted(id, affected).to_string();
    Ok(if affected == 0 {
        Output { warnings: vec![notice], ..Output::default() }
    } else {
        Output { lines: vec![notice], ..Output::default() }
    })
}

fn run_export(store: &ExpenseStore) -> Outcome {
    let path = store.export_to_csv().map_err(|e| Notice::from_error(&e))?;
    Ok(Output {
        lines: vec![Notice::exported(&path).to_string()],
        ..Output::default()
    })
}

#[cfg(feature = "tui")]
fn run_ui_mode(store: &ExpenseStore) -> Result<()> {
    let mut app = ui::App::new(store.clone()).context("Failed to load expenses")?;
    ui::run_ui(&mut app)
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_store: &ExpenseStore) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use a command: expense-tracker list");
    std::process::exit(1);
}
