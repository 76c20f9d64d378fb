//! Loadbook core library: the record layer behind a load-development
//! logbook for precision rifle ammunition.
//!
//! It covers the test record schema, the test identifier codec, a
//! file-backed record store with component lists, and the bulk loader that
//! flattens every stored test for analysis. With the `python` feature it is
//! also built as the `_loadbook_core` extension module via PyO3.

pub mod analysis;
pub mod codec;
pub mod errors;
mod lenient;
pub mod models;
pub mod store;

#[cfg(feature = "python")]
mod python;

#[cfg(feature = "python")]
use pyo3::prelude::*;

// ---------------------------------------------------------------------------
// Top-level Python module: _loadbook_core
// ---------------------------------------------------------------------------

#[cfg(feature = "python")]
#[pymodule]
fn _loadbook_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    python::register(m)
}
