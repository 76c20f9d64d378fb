//! Store configuration: where records live and how they are written.

use std::path::{Path, PathBuf};

use crate::store::numbers::NumberFormat;

pub const DEFAULT_TESTS_DIR: &str = "tests";
pub const DEFAULT_RECORD_FILE: &str = "group.yaml";
pub const DEFAULT_COMPONENT_LIST_FILE: &str = "Component_List.yaml";
pub const DEFAULT_WORKERS: usize = 4;

const DATA_DIR_ENV: &str = "LOADBOOK_DATA_DIR";
const WORKERS_ENV: &str = "LOADBOOK_WORKERS";

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &str) -> PathBuf {
    if path == "~" || path.starts_with("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            let mut expanded = PathBuf::from(home);
            if path.len() > 2 {
                expanded.push(&path[2..]);
            }
            return expanded;
        }
    }
    PathBuf::from(path)
}

#[derive(Clone, Debug, PartialEq)]
pub struct StoreConfig {
    /// Directory holding the tests directory and the component list file.
    pub data_dir: PathBuf,
    pub tests_dir_name: String,
    pub record_file_name: String,
    pub component_list_file: String,
    pub numbers: NumberFormat,
    /// Thread count for bulk loads.
    pub workers: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            tests_dir_name: DEFAULT_TESTS_DIR.to_string(),
            record_file_name: DEFAULT_RECORD_FILE.to_string(),
            component_list_file: DEFAULT_COMPONENT_LIST_FILE.to_string(),
            numbers: NumberFormat::default(),
            workers: DEFAULT_WORKERS,
        }
    }
}

impl StoreConfig {
    /// Stock layout rooted at `data_dir`.
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        let data_dir = expand_tilde(&data_dir.as_ref().to_string_lossy());
        Self {
            data_dir,
            ..Self::default()
        }
    }

    /// Build from `LOADBOOK_DATA_DIR` and `LOADBOOK_WORKERS`, falling back to
    /// defaults for unset or unusable values.
    pub fn from_env() -> Self {
        Self::from_vars(
            std::env::var(DATA_DIR_ENV).ok(),
            std::env::var(WORKERS_ENV).ok(),
        )
    }

    fn from_vars(data_dir: Option<String>, workers: Option<String>) -> Self {
        let mut config = match data_dir {
            Some(dir) if !dir.trim().is_empty() => Self::new(dir.trim()),
            _ => Self::default(),
        };
        if let Some(n) = workers.and_then(|v| v.trim().parse::<usize>().ok()) {
            if n > 0 {
                config.workers = n;
            }
        }
        config
    }

    pub fn tests_dir(&self) -> PathBuf {
        self.data_dir.join(&self.tests_dir_name)
    }

    pub fn component_list_path(&self) -> PathBuf {
        self.data_dir.join(&self.component_list_file)
    }
}
