//! Python bindings for window types and the band-pass filter

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use numpy::{PyArray1, PyReadonlyArray1};
use crate::filters::{WindowType, RecursiveBandpassFilter, design_butterworth_bandpass};

/// Window type enum exposed to Python
#[pyclass(name = "WindowType")]
#[derive(Clone)]
pub enum PyWindowType {
    Hann,
    Hamming,
    Blackman,
    Rectangular,
}

impl From<PyWindowType> for WindowType {
    fn from(py_win: PyWindowType) -> Self {
        match py_win {
            PyWindowType::Hann => WindowType::Hann,
            PyWindowType::Hamming => WindowType::Hamming,
            PyWindowType::Blackman => WindowType::Blackman,
            PyWindowType::Rectangular => WindowType::Rectangular,
        }
    }
}

/// Recursive Butterworth band-pass exposed to Python
#[pyclass(name = "BandpassFilter")]
pub struct PyBandpassFilter {
    filter: RecursiveBandpassFilter,
}

#[pymethods]
impl PyBandpassFilter {
    /// Create the default pulse filter (0.7-3.9 Hz at 8 Hz)
    #[new]
    fn new() -> Self {
        Self {
            filter: RecursiveBandpassFilter::new(),
        }
    }

    /// Design a filter for another sample rate or band
    ///
    /// Args:
    ///     sample_rate: Sample rate in Hz
    ///     low_hz: Lower corner frequency
    ///     high_hz: Upper corner frequency
    #[staticmethod]
    fn design(sample_rate: f64, low_hz: f64, high_hz: f64) -> PyResult<Self> {
        let coefficients = design_butterworth_bandpass(sample_rate, low_hz, high_hz)
            .map_err(|e| PyValueError::new_err(e.to_string()))?;

        Ok(Self {
            filter: RecursiveBandpassFilter::with_coefficients(coefficients),
        })
    }

    /// Filter a block of samples (history carries over between calls)
    fn process<'py>(
        &mut self,
        py: Python<'py>,
        signal: PyReadonlyArray1<f64>,
    ) -> PyResult<&'py PyArray1<f64>> {
        let mut samples = signal
            .as_slice()
            .map_err(|e| PyValueError::new_err(e.to_string()))?
            .to_vec();
        self.filter.process_block_inplace(&mut samples);

        Ok(PyArray1::from_vec(py, samples))
    }

    /// Clear filter history
    fn reset(&mut self) {
        self.filter.reset();
    }

    /// (gain, feedback coefficients)
    fn coefficients(&self) -> (f64, Vec<f64>) {
        let c = self.filter.coefficients();
        (c.gain, c.feedback.to_vec())
    }
}
