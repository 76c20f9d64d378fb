//! File-backed record store.
//!
//! Layout: `<data_dir>/tests/<test_id>/group.yaml`, one directory per test.
//! The directory name is the test id verbatim, so ids are validated before
//! anything touches the filesystem. Each save rewrites the whole file.

use std::path::{Path, PathBuf};

use serde_yaml::Value;
use tracing::{debug, warn};

use crate::errors::{LoadbookError, LoadbookResult};
use crate::models::TestRecord;
use crate::store::config::StoreConfig;
use crate::store::numbers::NumberFormat;

/// Reject ids that cannot serve as a single directory name.
pub fn validate_test_id(test_id: &str) -> LoadbookResult<()> {
    if test_id.trim().is_empty() {
        return Err(LoadbookError::Validation(
            "test id must not be empty".to_string(),
        ));
    }
    if test_id.contains('/') || test_id.contains('\\') {
        return Err(LoadbookError::InvalidTestId(format!(
            "{test_id:?} contains a path separator"
        )));
    }
    if test_id == "." || test_id == ".." {
        return Err(LoadbookError::InvalidTestId(format!(
            "{test_id:?} is not a usable directory name"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// RecordStore
// ---------------------------------------------------------------------------

/// Maps test ids to persisted [`TestRecord`]s.
///
/// Holds no cached state: every call reads or writes the filesystem directly.
#[derive(Clone, Debug)]
pub struct RecordStore {
    tests_dir: PathBuf,
    record_file_name: String,
    numbers: NumberFormat,
}

impl RecordStore {
    pub fn new(config: &StoreConfig) -> Self {
        Self {
            tests_dir: config.tests_dir(),
            record_file_name: config.record_file_name.clone(),
            numbers: config.numbers,
        }
    }

    /// Store rooted at `data_dir` with the stock layout.
    pub fn at(data_dir: impl AsRef<Path>) -> Self {
        Self::new(&StoreConfig::new(data_dir))
    }

    pub fn tests_dir(&self) -> &Path {
        &self.tests_dir
    }

    pub fn numbers(&self) -> NumberFormat {
        self.numbers
    }

    /// Directory holding a test's record and attachments.
    pub fn test_dir(&self, test_id: &str) -> PathBuf {
        self.tests_dir.join(test_id)
    }

    pub fn record_path(&self, test_id: &str) -> PathBuf {
        self.test_dir(test_id).join(&self.record_file_name)
    }

    /// Every test id currently on disk, sorted.
    ///
    /// A missing tests directory is created and reported as empty.
    pub fn list_keys(&self) -> LoadbookResult<Vec<String>> {
        if !self.tests_dir.exists() {
            std::fs::create_dir_all(&self.tests_dir)?;
            return Ok(Vec::new());
        }

        let mut keys = Vec::new();
        for entry in std::fs::read_dir(&self.tests_dir)?.flatten() {
            if !entry.path().is_dir() {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) => keys.push(name),
                Err(name) => debug!("Skipping non UTF-8 test directory {:?}", name),
            }
        }
        keys.sort();
        Ok(keys)
    }

    /// Load the record stored under `test_id`.
    ///
    /// `Ok(None)` means nothing usable is stored there (no directory, no
    /// file, an empty file, an empty mapping or a document that is not a
    /// mapping). Leaves that are blank or mistyped load as their defaults.
    /// Only YAML that does not parse is a `Malformed` error.
    pub fn load(&self, test_id: &str) -> LoadbookResult<Option<TestRecord>> {
        validate_test_id(test_id)?;
        let path = self.record_path(test_id);
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        parse_record(&path, &content)
    }

    /// Load for editing: a stored record if there is one, otherwise a default
    /// record pre-filled from the id. Never fails.
    pub fn load_or_default(&self, test_id: &str) -> TestRecord {
        if test_id.trim().is_empty() {
            return TestRecord::empty();
        }
        match self.load(test_id) {
            Ok(Some(record)) => record,
            Ok(None) => TestRecord::from_test_id(test_id),
            Err(e) => {
                warn!("Failed to load test {test_id}: {e}; starting from defaults");
                TestRecord::from_test_id(test_id)
            }
        }
    }

    /// Write `record` under `test_id`, creating the test directory if needed
    /// and replacing any previous content. Returns the file written.
    pub fn save(&self, test_id: &str, record: &TestRecord) -> LoadbookResult<PathBuf> {
        validate_test_id(test_id)?;
        if record.test_id != test_id {
            debug!(
                "Saving record with test_id {:?} under key {:?}",
                record.test_id, test_id
            );
        }
        let yaml = self.numbers.to_yaml_string(record)?;
        std::fs::create_dir_all(self.test_dir(test_id))?;
        let path = self.record_path(test_id);
        std::fs::write(&path, yaml)?;
        debug!("Saved test {} to {}", test_id, path.display());
        Ok(path)
    }

    /// Encode the record's id from its fields, then save under it.
    pub fn save_new(&self, record: &mut TestRecord) -> LoadbookResult<PathBuf> {
        let test_id = record.assign_test_id().to_string();
        self.save(&test_id, record)
    }
}

fn parse_record(path: &Path, content: &str) -> LoadbookResult<Option<TestRecord>> {
    if content.trim().is_empty() {
        return Ok(None);
    }
    let malformed = |message: String| LoadbookError::Malformed {
        path: path.to_path_buf(),
        message,
    };
    let value: Value = serde_yaml::from_str(content).map_err(|e| malformed(e.to_string()))?;
    match value {
        Value::Null => Ok(None),
        Value::Mapping(mapping) if mapping.is_empty() => Ok(None),
        Value::Mapping(mapping) => serde_yaml::from_value(Value::Mapping(mapping))
            .map(Some)
            .map_err(|e| malformed(e.to_string())),
        _ => {
            warn!("{} does not hold a mapping; treating it as empty", path.display());
            Ok(None)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
