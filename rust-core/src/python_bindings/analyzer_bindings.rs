//! Python bindings for the spectral analyzer

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use numpy::PyArray1;
use crate::error::AnalyzerError;
use crate::spectrum::SpectralAnalyzer;
use super::filter_bindings::PyWindowType;

fn value_error(e: AnalyzerError) -> PyErr {
    PyValueError::new_err(e.to_string())
}

/// Pulse spectrum analyzer exposed to Python
///
/// Unavailable values use sentinels instead of None:
/// `peak()` returns -1 and `index_to_frequency()` returns -1.0 while no
/// spectrum or sample interval is available.
#[pyclass(name = "PulseAnalyzer")]
pub struct PyPulseAnalyzer {
    analyzer: SpectralAnalyzer,
}

#[pymethods]
impl PyPulseAnalyzer {
    /// Create a new analyzer
    ///
    /// Args:
    ///     sample_interval: Milliseconds between samples (optional)
    ///     effective_size: Real samples per window
    ///     zero_padding: Zeros appended per window
    ///     hop_size: New samples between windows (0 = no overlap)
    #[new]
    #[pyo3(signature = (sample_interval=None, effective_size=100, zero_padding=400, hop_size=0))]
    fn new(
        sample_interval: Option<f64>,
        effective_size: usize,
        zero_padding: usize,
        hop_size: usize,
    ) -> PyResult<Self> {
        let mut analyzer = SpectralAnalyzer::new();
        analyzer
            .set_sample_settings(effective_size, zero_padding, hop_size)
            .map_err(value_error)?;
        if let Some(interval) = sample_interval {
            analyzer.set_sample_interval(interval).map_err(value_error)?;
        }

        Ok(Self { analyzer })
    }

    /// Feed one sample; returns True when a new spectrum is available
    fn add_sample(&mut self, sample: f64) -> bool {
        self.analyzer.add_sample(sample)
    }

    fn set_sample_interval(&mut self, sample_interval: f64) -> PyResult<()> {
        self.analyzer
            .set_sample_interval(sample_interval)
            .map_err(value_error)
    }

    fn set_sample_settings(
        &mut self,
        effective_size: usize,
        zero_padding: usize,
        hop_size: usize,
    ) -> PyResult<()> {
        self.analyzer
            .set_sample_settings(effective_size, zero_padding, hop_size)
            .map_err(value_error)
    }

    fn set_frequency_band(&mut self, min_hz: f64, max_hz: f64) -> PyResult<()> {
        self.analyzer
            .set_frequency_band(min_hz, max_hz)
            .map_err(value_error)
    }

    fn set_use_filter(&mut self, enabled: bool) {
        self.analyzer.set_use_filter(enabled);
    }

    /// Window function, or None to disable tapering
    #[pyo3(signature = (window_type=None))]
    fn set_window_function(&mut self, window_type: Option<PyWindowType>) {
        self.analyzer.set_window_function(window_type.map(Into::into));
    }

    fn set_use_frequency_mask(&mut self, enabled: bool) {
        self.analyzer.set_use_frequency_mask(enabled);
    }

    fn set_use_window_gain_correction(&mut self, enabled: bool) {
        self.analyzer.set_use_window_gain_correction(enabled);
    }

    fn ready(&self) -> bool {
        self.analyzer.ready()
    }

    /// Index of the peak bin, -1 if unavailable
    fn peak(&self) -> i64 {
        self.analyzer.peak_index().map_or(-1, |i| i as i64)
    }

    /// Frequency of full-transform bin i, -1.0 if unavailable
    fn index_to_frequency(&self, i: usize) -> f64 {
        self.analyzer.index_to_frequency(i).unwrap_or(-1.0)
    }

    /// Peak rate in beats per minute, None if unavailable
    fn bpm(&self) -> Option<f64> {
        self.analyzer.peak().map(|peak| peak.bpm)
    }

    fn magnitude<'py>(&self, py: Python<'py>) -> &'py PyArray1<f64> {
        PyArray1::from_slice(py, self.analyzer.magnitude())
    }

    fn real_part<'py>(&self, py: Python<'py>) -> &'py PyArray1<f64> {
        PyArray1::from_slice(py, self.analyzer.real_part())
    }

    fn imaginary_part<'py>(&self, py: Python<'py>) -> &'py PyArray1<f64> {
        PyArray1::from_slice(py, self.analyzer.imaginary_part())
    }

    fn sample_rate(&self) -> f64 {
        self.analyzer.properties().sample_rate
    }

    fn total_samples(&self) -> usize {
        self.analyzer.properties().total_samples
    }

    fn frequency_resolution(&self) -> f64 {
        self.analyzer.properties().frequency_resolution
    }
}
