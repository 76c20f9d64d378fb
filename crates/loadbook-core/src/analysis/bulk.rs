//! Bulk loading of every stored test into flat rows.

use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::analysis::flatten::FlatRow;
use crate::errors::LoadbookResult;
use crate::store::records::RecordStore;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// The key exists but holds no record.
    NotFound,
    /// Reading or parsing the record failed.
    Failed(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkippedRecord {
    pub test_id: String,
    pub reason: SkipReason,
}

/// Rows in key enumeration order, plus the keys that produced none.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BulkLoad {
    pub rows: Vec<FlatRow>,
    pub skipped: Vec<SkippedRecord>,
}

enum LoadOutcome {
    Row(Box<FlatRow>),
    Skipped(SkippedRecord),
}

fn load_one(store: &RecordStore, test_id: &str) -> LoadOutcome {
    match store.load(test_id) {
        Ok(Some(record)) => LoadOutcome::Row(Box::new(FlatRow::from_record(test_id, &record))),
        Ok(None) => {
            debug!("No record stored for test {test_id}; skipping");
            LoadOutcome::Skipped(SkippedRecord {
                test_id: test_id.to_string(),
                reason: SkipReason::NotFound,
            })
        }
        Err(e) => {
            warn!("Error loading test data for {test_id}: {e}");
            LoadOutcome::Skipped(SkippedRecord {
                test_id: test_id.to_string(),
                reason: SkipReason::Failed(e.to_string()),
            })
        }
    }
}

/// Load and flatten every record in `store`.
///
/// A key that is missing or fails to load is logged and skipped; only a
/// failure to enumerate keys is an error. Reads run on up to `workers`
/// threads without changing the output order.
pub fn load_all(store: &RecordStore, workers: usize) -> LoadbookResult<BulkLoad> {
    let started = Instant::now();
    let keys = store.list_keys()?;
    if keys.is_empty() {
        return Ok(BulkLoad::default());
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .build();

    let outcomes: Vec<LoadOutcome> = match pool {
        Ok(pool) => pool.install(|| keys.par_iter().map(|key| load_one(store, key)).collect()),
        Err(e) => {
            debug!("Falling back to sequential bulk load: {e}");
            keys.iter().map(|key| load_one(store, key)).collect()
        }
    };

    let mut result = BulkLoad::default();
    for outcome in outcomes {
        match outcome {
            LoadOutcome::Row(row) => result.rows.push(*row),
            LoadOutcome::Skipped(skipped) => result.skipped.push(skipped),
        }
    }

    info!(
        "Loaded {} tests ({} skipped) in {} ms",
        result.rows.len(),
        result.skipped.len(),
        started.elapsed().as_millis()
    );
    Ok(result)
}
