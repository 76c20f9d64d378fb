//! Python bindings. Records and identifier fields cross the boundary as JSON
//! strings and are decoded with `json.loads` on the Python side.

use std::path::PathBuf;

use pyo3::prelude::*;

use crate::analysis::{bulk, flatten};
use crate::codec::{clean, identifier};
use crate::errors::LoadbookError;
use crate::models::{self, TestRecord};
use crate::store::config::StoreConfig;
use crate::store::records;

// ---------------------------------------------------------------------------
// Functions
// ---------------------------------------------------------------------------

/// Encode identifier fields given as a JSON object. Missing keys default.
#[pyfunction]
pub fn encode_test_id(fields_json: &str) -> PyResult<String> {
    let fields: identifier::IdentifierFields =
        serde_json::from_str(fields_json).map_err(LoadbookError::from)?;
    Ok(identifier::encode_test_id(&fields))
}

/// Decode a test id into a JSON object of identifier fields.
#[pyfunction]
pub fn decode_test_id(test_id: &str) -> PyResult<String> {
    let fields = identifier::decode_test_id(test_id);
    Ok(serde_json::to_string(&fields).map_err(LoadbookError::from)?)
}

#[pyfunction]
pub fn calculate_moa(group_size_mm: f64, distance_m: f64) -> f64 {
    models::calculate_moa(group_size_mm, distance_m)
}

#[pyfunction]
pub fn clean_component(value: &str) -> String {
    clean::clean_component(value)
}

/// Every stored test as a JSON array of flat rows.
#[pyfunction]
#[pyo3(signature = (data_dir, workers=None))]
pub fn load_all_rows_json(data_dir: PathBuf, workers: Option<usize>) -> PyResult<String> {
    let config = StoreConfig::new(data_dir);
    let store = records::RecordStore::new(&config);
    let loaded = bulk::load_all(&store, workers.unwrap_or(config.workers))?;
    Ok(flatten::rows_to_json(&loaded.rows)?)
}

// ---------------------------------------------------------------------------
// RecordStore
// ---------------------------------------------------------------------------

#[pyclass(name = "RecordStore")]
pub struct PyRecordStore {
    inner: records::RecordStore,
}

#[pymethods]
impl PyRecordStore {
    #[new]
    fn new(data_dir: PathBuf) -> Self {
        Self {
            inner: records::RecordStore::at(data_dir),
        }
    }

    #[getter]
    fn tests_dir(&self) -> String {
        self.inner.tests_dir().to_string_lossy().into_owned()
    }

    fn list_keys(&self) -> PyResult<Vec<String>> {
        Ok(self.inner.list_keys()?)
    }

    /// The stored record as JSON, or `None` if nothing is stored.
    fn load_json(&self, test_id: &str) -> PyResult<Option<String>> {
        match self.inner.load(test_id)? {
            Some(record) => Ok(Some(
                serde_json::to_string(&record).map_err(LoadbookError::from)?,
            )),
            None => Ok(None),
        }
    }

    fn load_or_default_json(&self, test_id: &str) -> PyResult<String> {
        let record = self.inner.load_or_default(test_id);
        Ok(serde_json::to_string(&record).map_err(LoadbookError::from)?)
    }

    /// Save a JSON record under `test_id` and return the written path.
    fn save_json(&self, test_id: &str, record_json: &str) -> PyResult<String> {
        let record: TestRecord = serde_json::from_str(record_json).map_err(LoadbookError::from)?;
        let path = self.inner.save(test_id, &record)?;
        Ok(path.to_string_lossy().into_owned())
    }
}

pub fn register(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add("DEFAULT_SHOTS", models::DEFAULT_SHOTS)?;
    m.add_function(wrap_pyfunction!(encode_test_id, m)?)?;
    m.add_function(wrap_pyfunction!(decode_test_id, m)?)?;
    m.add_function(wrap_pyfunction!(calculate_moa, m)?)?;
    m.add_function(wrap_pyfunction!(clean_component, m)?)?;
    m.add_function(wrap_pyfunction!(load_all_rows_json, m)?)?;
    m.add_class::<PyRecordStore>()?;
    Ok(())
}
