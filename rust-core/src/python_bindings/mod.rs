//! PyO3 bindings for Python integration (feature `python`)

use pyo3::prelude::*;

mod analyzer_bindings;
mod filter_bindings;

/// Python module definition
#[pymodule]
fn pulse_spectrum(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_class::<analyzer_bindings::PyPulseAnalyzer>()?;
    m.add_class::<filter_bindings::PyBandpassFilter>()?;
    m.add_class::<filter_bindings::PyWindowType>()?;

    Ok(())
}
