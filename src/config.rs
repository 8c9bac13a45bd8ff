use std::path::PathBuf;
use tracing::debug;

pub const DB_ENV: &str = "EXPENSES_DB";
pub const EXPORT_DIR_ENV: &str = "EXPENSES_EXPORT_DIR";

/// Where the database lives and where exports go.
///
/// Resolution order: built-in defaults, then environment variables, then
/// command-line overrides applied by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub db_path: PathBuf,
    pub export_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("expenses.db"),
            export_dir: PathBuf::from("."),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup. Empty values are ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(path) = get(DB_ENV) {
            config.db_path = PathBuf::from(path);
        }
        if let Some(dir) = get(EXPORT_DIR_ENV) {
            config.export_dir = PathBuf::from(dir);
        }

        debug!(?config, "Resolved configuration");
        config
    }

    pub fn with_db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.db_path = path.into();
        self
    }
}
