//! Spectral pulse analyzer
//!
//! Turns a stream of brightness samples into a one-sided amplitude spectrum
//! and a band-limited peak. Pipeline per completed window:
//!
//! 1. band-pass filter the raw samples (optional)
//! 2. multiply by a window function (optional)
//! 3. forward FFT over the zero-padded window
//! 4. scale to one-sided amplitudes, DC excluded
//! 5. zero bins outside the peak band (optional)
//! 6. undo the window's coherent gain (optional)

use super::fft::{EngineKind, TransformEngine};
use super::properties::AnalysisProperties;
use super::windowing::{apply_window, window_correction_factor};
use crate::config::AnalyzerSettings;
use crate::error::AnalyzerError;
use crate::filters::windows::WindowType;
use crate::filters::RecursiveBandpassFilter;
use crate::signal::SampleBuffer;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

/// Toggleable processing stages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineStages {
    /// Run the recursive band-pass over the raw window
    pub bandpass_filter: bool,

    /// Window function applied after filtering, `None` for no tapering
    pub window: Option<WindowType>,

    /// Zero every reported bin outside [min_frequency, max_frequency]
    pub frequency_mask: bool,

    /// Divide amplitudes by the window's coherent gain
    pub window_gain_correction: bool,
}

impl Default for PipelineStages {
    fn default() -> Self {
        Self {
            bandpass_filter: true,
            window: Some(WindowType::Hamming),
            frequency_mask: false,
            window_gain_correction: false,
        }
    }
}

impl PipelineStages {
    /// Every stage off: plain scaled FFT of the raw window
    pub fn raw() -> Self {
        Self {
            bandpass_filter: false,
            window: None,
            frequency_mask: false,
            window_gain_correction: false,
        }
    }
}

/// One-sided spectrum of the latest window, DC excluded
///
/// Entry `k` belongs to bin `k + 1` of the full transform.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SpectrumResult {
    pub magnitude: Vec<f64>,
    pub real: Vec<f64>,
    pub imaginary: Vec<f64>,
}

impl SpectrumResult {
    fn zeroed(len: usize) -> Self {
        Self {
            magnitude: vec![0.0; len],
            real: vec![0.0; len],
            imaginary: vec![0.0; len],
        }
    }

    pub fn len(&self) -> usize {
        self.magnitude.len()
    }

    pub fn is_empty(&self) -> bool {
        self.magnitude.is_empty()
    }
}

/// Peak of the latest spectrum
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Peak {
    /// Index into the magnitude array
    pub index: usize,

    pub frequency_hz: f64,

    pub magnitude: f64,

    /// Beats per minute (60 × frequency)
    pub bpm: f64,

    /// `false` when no bin fell inside the band and `index` is only the bin
    /// nearest the band centre
    pub in_band: bool,
}

/// Payload of a completed window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpectrumReport {
    pub magnitude: Vec<f64>,
    pub real: Vec<f64>,
    pub imaginary: Vec<f64>,
    pub peak: Option<usize>,
    pub properties: AnalysisProperties,
}

/// Where the analyzer is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyzerState {
    /// No sample interval yet; frequencies are unknown
    Unconfigured,

    /// Interval known, no window computed since the last size change
    ConfiguredEmpty,

    /// A spectrum is available
    Ready,
}

/// Sliding-window pulse spectrum analyzer
pub struct SpectralAnalyzer {
    properties: AnalysisProperties,
    stages: PipelineStages,
    buffer: SampleBuffer,
    filter: RecursiveBandpassFilter,
    engine_kind: EngineKind,
    engine: Box<dyn TransformEngine>,
    spectrum: SpectrumResult,
    calculated: bool,
}

impl SpectralAnalyzer {
    /// Analyzer with default sizes, stages and filter, no sample interval
    pub fn new() -> Self {
        let buffer = SampleBuffer::default();
        let properties =
            AnalysisProperties::new(buffer.size(), buffer.zero_pad_size(), buffer.hop_size());
        let engine_kind = EngineKind::default();

        Self {
            engine: engine_kind.build(properties.total_samples),
            spectrum: SpectrumResult::zeroed(properties.output_size),
            properties,
            stages: PipelineStages::default(),
            buffer,
            filter: RecursiveBandpassFilter::new(),
            engine_kind,
            calculated: false,
        }
    }

    /// Analyzer configured from settings
    pub fn from_settings(settings: &AnalyzerSettings) -> Result<Self, AnalyzerError> {
        let mut analyzer = Self::new();

        analyzer.engine_kind = settings.engine;
        analyzer.stages = settings.stages;
        analyzer.filter = RecursiveBandpassFilter::new()
            .with_stabilization(settings.stabilization_samples);
        analyzer.set_frequency_band(settings.min_frequency, settings.max_frequency)?;
        analyzer.set_sample_settings(
            settings.effective_size,
            settings.zero_padding,
            settings.hop_size,
        )?;

        if let Some(interval) = settings.sample_interval_ms {
            analyzer.set_sample_interval(interval)?;
        }

        Ok(analyzer)
    }

    /// Set the time between raw samples in milliseconds
    pub fn set_sample_interval(&mut self, sample_interval: f64) -> Result<(), AnalyzerError> {
        if !(sample_interval.is_finite() && sample_interval > 0.0) {
            return Err(AnalyzerError::InvalidSampleInterval(sample_interval));
        }

        self.properties.set_sample_interval(sample_interval);
        log::debug!(
            "sample interval {} ms -> {:.3} Hz, resolution {:.4} Hz ({:.4} Hz padded)",
            sample_interval,
            self.properties.sample_rate,
            self.properties.frequency_resolution,
            self.properties.frequency_resolution_with_zero_padding
        );
        self.check_filter_rate();

        Ok(())
    }

    /// Reconfigure window sizes
    ///
    /// Rebuilds the sample buffer, transform plan and output arrays, clears
    /// filter history, and invalidates the current spectrum.
    pub fn set_sample_settings(
        &mut self,
        effective_size: usize,
        zero_pad: usize,
        hop: usize,
    ) -> Result<(), AnalyzerError> {
        self.buffer.configure(effective_size, zero_pad, hop)?;
        self.properties
            .set_sizes(effective_size, zero_pad, self.buffer.hop_size());

        self.engine = self.engine_kind.build(self.properties.total_samples);
        self.spectrum = SpectrumResult::zeroed(self.properties.output_size);
        self.filter.reset();
        self.calculated = false;

        log::debug!(
            "sample settings: {} samples + {} padding, hop {}",
            effective_size,
            zero_pad,
            self.properties.hop_size
        );

        Ok(())
    }

    /// Switch transform engine; replans at the current length
    pub fn set_engine(&mut self, engine_kind: EngineKind) {
        self.engine_kind = engine_kind;
        self.engine = engine_kind.build(self.properties.total_samples);
    }

    /// Set the band the peak search is restricted to
    pub fn set_frequency_band(&mut self, min_hz: f64, max_hz: f64) -> Result<(), AnalyzerError> {
        let valid = min_hz.is_finite() && max_hz.is_finite() && min_hz >= 0.0 && min_hz <= max_hz;
        if !valid {
            return Err(AnalyzerError::InvalidBand {
                min: min_hz,
                max: max_hz,
            });
        }

        self.properties.min_frequency = min_hz;
        self.properties.max_frequency = max_hz;
        Ok(())
    }

    /// Install a different band-pass filter (fresh history)
    pub fn set_filter(&mut self, filter: RecursiveBandpassFilter) {
        self.filter = filter;
        self.filter.reset();
        self.check_filter_rate();
    }

    pub fn set_stages(&mut self, stages: PipelineStages) {
        self.stages = stages;
    }

    pub fn set_use_filter(&mut self, enabled: bool) {
        self.stages.bandpass_filter = enabled;
    }

    pub fn set_window_function(&mut self, window: Option<WindowType>) {
        self.stages.window = window;
    }

    pub fn set_use_frequency_mask(&mut self, enabled: bool) {
        self.stages.frequency_mask = enabled;
    }

    pub fn set_use_window_gain_correction(&mut self, enabled: bool) {
        self.stages.window_gain_correction = enabled;
    }

    /// Feed one raw sample
    ///
    /// # Returns
    /// `true` when this sample completed a window and a new spectrum is
    /// available
    pub fn add_sample(&mut self, sample: f64) -> bool {
        if self.buffer.add(sample).is_none() {
            return false;
        }

        if self.stages.bandpass_filter {
            self.filter.filter_window(&mut self.buffer);
        }

        if let Some(window_type) = self.stages.window {
            apply_window(&mut self.buffer, window_type);
        }

        let bins = match self.engine.process(self.buffer.window()) {
            Ok(bins) => bins,
            Err(e) => {
                log::error!("dropping window: {}", e);
                return false;
            }
        };

        scale_and_convert(bins, &mut self.spectrum, self.properties.total_samples);

        if self.stages.frequency_mask {
            self.apply_frequency_mask();
        }

        if self.stages.window_gain_correction {
            if let Some(window_type) = self.stages.window {
                let factor =
                    window_correction_factor(window_type, self.properties.number_of_samples);
                self.scale_spectrum(factor);
            }
        }

        self.calculated = true;
        log::debug!("window complete, {} bins", self.spectrum.len());

        true
    }

    /// Zero reported bins whose frequency lies outside the peak band
    fn apply_frequency_mask(&mut self) {
        if !self.ready() {
            // No sample rate, no frequencies to compare against
            return;
        }

        for k in 0..self.spectrum.len() {
            if !self.properties.in_band(self.properties.bin_frequency(k + 1)) {
                self.spectrum.magnitude[k] = 0.0;
                self.spectrum.real[k] = 0.0;
                self.spectrum.imaginary[k] = 0.0;
            }
        }
    }

    fn scale_spectrum(&mut self, factor: f64) {
        let SpectrumResult {
            magnitude,
            real,
            imaginary,
        } = &mut self.spectrum;

        for value in magnitude.iter_mut().chain(real.iter_mut()).chain(imaginary.iter_mut()) {
            *value *= factor;
        }
    }

    fn check_filter_rate(&self) {
        let rate = self.properties.sample_rate;
        let design_rate = self.filter.coefficients().design_rate_hz;

        if self.stages.bandpass_filter && rate > 0.0 && (rate - design_rate).abs() > 1e-9 {
            log::warn!(
                "band-pass filter designed for {} Hz but samples arrive at {:.3} Hz; \
                 its corners are shifted by a factor of {:.3}",
                design_rate,
                rate,
                rate / design_rate
            );
        }
    }

    /// Index of the strongest bin inside the peak band
    ///
    /// `None` before the first window or while the sample interval is unset.
    /// If no bin falls inside the band, the bin nearest the band centre is
    /// returned instead (see [`Peak::in_band`]).
    pub fn peak_index(&self) -> Option<usize> {
        self.find_peak().map(|(index, _)| index)
    }

    /// Peak with frequency, amplitude and bpm
    pub fn peak(&self) -> Option<Peak> {
        let (index, in_band) = self.find_peak()?;
        let frequency_hz = self.properties.bin_frequency(index + 1);

        Some(Peak {
            index,
            frequency_hz,
            magnitude: self.spectrum.magnitude[index],
            bpm: frequency_hz * 60.0,
            in_band,
        })
    }

    fn find_peak(&self) -> Option<(usize, bool)> {
        if !self.calculated || !self.ready() || self.spectrum.is_empty() {
            return None;
        }

        let mut best: Option<(usize, f64)> = None;

        for (k, &magnitude) in self.spectrum.magnitude.iter().enumerate() {
            if !self.properties.in_band(self.properties.bin_frequency(k + 1)) {
                continue;
            }

            if best.map_or(true, |(_, max)| magnitude > max) {
                best = Some((k, magnitude));
            }
        }

        if let Some((index, _)) = best {
            return Some((index, true));
        }

        let centre = (self.properties.min_frequency + self.properties.max_frequency) / 2.0;
        let resolution = self.properties.frequency_resolution_with_zero_padding;
        let bin = (centre / resolution).round() as usize;
        let index = bin.clamp(1, self.spectrum.len()) - 1;

        log::warn!(
            "no bin inside [{}, {}] Hz at {:.4} Hz resolution, using nearest bin {}",
            self.properties.min_frequency,
            self.properties.max_frequency,
            self.properties.frequency_resolution_with_zero_padding,
            index
        );

        Some((index, false))
    }

    /// Frequency (Hz) of bin `i` of the full transform
    ///
    /// `magnitude()[k]` belongs to `index_to_frequency(k + 1)`. `None` while
    /// the sample interval is unset.
    pub fn index_to_frequency(&self, i: usize) -> Option<f64> {
        if !self.ready() {
            return None;
        }

        Some(self.properties.bin_frequency(i))
    }

    /// Whether the sample interval (and so the sample rate) is known
    pub fn ready(&self) -> bool {
        self.properties.sample_interval != 0.0 && self.properties.sample_rate != 0.0
    }

    pub fn state(&self) -> AnalyzerState {
        match (self.ready(), self.calculated) {
            (false, _) => AnalyzerState::Unconfigured,
            (true, false) => AnalyzerState::ConfiguredEmpty,
            (true, true) => AnalyzerState::Ready,
        }
    }

    /// Snapshot of the latest spectrum, `None` before the first window
    pub fn report(&self) -> Option<SpectrumReport> {
        if !self.calculated {
            return None;
        }

        Some(SpectrumReport {
            magnitude: self.spectrum.magnitude.clone(),
            real: self.spectrum.real.clone(),
            imaginary: self.spectrum.imaginary.clone(),
            peak: self.peak_index(),
            properties: self.properties.clone(),
        })
    }

    /// Drop pending samples, filter history and the current spectrum
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.filter.reset();
        self.spectrum = SpectrumResult::zeroed(self.properties.output_size);
        self.calculated = false;
    }

    pub fn spectrum(&self) -> &SpectrumResult {
        &self.spectrum
    }

    pub fn magnitude(&self) -> &[f64] {
        &self.spectrum.magnitude
    }

    pub fn real_part(&self) -> &[f64] {
        &self.spectrum.real
    }

    pub fn imaginary_part(&self) -> &[f64] {
        &self.spectrum.imaginary
    }

    /// Transform input of the latest window, after filtering and windowing
    pub fn input_window(&self) -> &[Complex64] {
        self.buffer.window()
    }

    pub fn properties(&self) -> &AnalysisProperties {
        &self.properties
    }

    pub fn stages(&self) -> &PipelineStages {
        &self.stages
    }

    pub fn filter(&self) -> &RecursiveBandpassFilter {
        &self.filter
    }

    pub fn engine_kind(&self) -> EngineKind {
        self.engine_kind
    }
}

impl Default for SpectralAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// One-sided amplitude spectrum from raw DFT bins
///
/// For bins 1..=N/2: amplitude = 2·X[i]/N. The factor 2 folds the negative
/// frequencies of the two-sided transform onto the positive half.
fn scale_and_convert(bins: &[Complex64], spectrum: &mut SpectrumResult, total_samples: usize) {
    let n = total_samples as f64;

    for k in 0..spectrum.len() {
        let bin = bins[k + 1];
        let real = 2.0 * bin.re / n;
        let imaginary = 2.0 * bin.im / n;

        spectrum.real[k] = real;
        spectrum.imaginary[k] = imaginary;
        spectrum.magnitude[k] = (real * real + imaginary * imaginary).sqrt();
    }
}
