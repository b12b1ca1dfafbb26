//! Derived analysis properties
//!
//! Every size and frequency figure of the analyzer, recomputed as a whole
//! whenever the sample interval or window sizes change.

use crate::filters::design::{MAX_PULSE_FREQUENCY, MIN_PULSE_FREQUENCY};
use serde::Serialize;

/// Default real samples per window
pub const DEFAULT_SAMPLES: usize = 100;

/// Default zero padding (4x the window)
pub const DEFAULT_ZERO_PADDING_SAMPLES: usize = 4 * DEFAULT_SAMPLES;

/// Snapshot of the analyzer configuration and everything derived from it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisProperties {
    /// Real samples per window
    pub number_of_samples: usize,

    /// Zeros appended to each window
    pub zero_padding_samples: usize,

    /// Transform length N = number_of_samples + zero_padding_samples
    pub total_samples: usize,

    /// Reported bins (N / 2, DC excluded)
    pub output_size: usize,

    /// New samples between windows
    pub hop_size: usize,

    /// Milliseconds between raw samples, 0 until configured
    pub sample_interval: f64,

    /// Hz, 0 until configured
    pub sample_rate: f64,

    /// Milliseconds of signal per window
    pub segment_duration: f64,

    /// Hz per bin without zero padding
    pub frequency_resolution: f64,

    /// Hz per bin of the padded transform
    pub frequency_resolution_with_zero_padding: f64,

    /// Lower edge of the admissible peak band (Hz)
    pub min_frequency: f64,

    /// Upper edge of the admissible peak band (Hz)
    pub max_frequency: f64,
}

impl AnalysisProperties {
    /// Properties for the given sizes with no sample interval yet
    pub fn new(number_of_samples: usize, zero_padding_samples: usize, hop_size: usize) -> Self {
        let mut properties = Self {
            number_of_samples: 0,
            zero_padding_samples: 0,
            total_samples: 0,
            output_size: 0,
            hop_size: 0,
            sample_interval: 0.0,
            sample_rate: 0.0,
            segment_duration: 0.0,
            frequency_resolution: 0.0,
            frequency_resolution_with_zero_padding: 0.0,
            min_frequency: MIN_PULSE_FREQUENCY,
            max_frequency: MAX_PULSE_FREQUENCY,
        };
        properties.set_sizes(number_of_samples, zero_padding_samples, hop_size);
        properties
    }

    /// Replace window sizes and recompute everything derived from them
    ///
    /// `hop_size` must already be clamped by the sample buffer.
    pub fn set_sizes(
        &mut self,
        number_of_samples: usize,
        zero_padding_samples: usize,
        hop_size: usize,
    ) {
        self.number_of_samples = number_of_samples;
        self.zero_padding_samples = zero_padding_samples;
        self.total_samples = number_of_samples + zero_padding_samples;
        self.output_size = self.total_samples / 2;
        self.hop_size = hop_size;
        self.recompute_timing();
    }

    /// Replace the sample interval (ms) and recompute timing figures
    ///
    /// Callers validate `sample_interval > 0`.
    pub fn set_sample_interval(&mut self, sample_interval: f64) {
        self.sample_interval = sample_interval;
        self.recompute_timing();
    }

    fn recompute_timing(&mut self) {
        if self.sample_interval <= 0.0 {
            self.sample_rate = 0.0;
            self.segment_duration = 0.0;
            self.frequency_resolution = 0.0;
            self.frequency_resolution_with_zero_padding = 0.0;
            return;
        }

        self.sample_rate = 1000.0 / self.sample_interval;
        self.segment_duration = self.number_of_samples as f64 * self.sample_interval;
        self.frequency_resolution = self.sample_rate / self.number_of_samples as f64;
        self.frequency_resolution_with_zero_padding = self.sample_rate / self.total_samples as f64;
    }

    /// Frequency (Hz) of bin `i` of the full transform
    pub fn bin_frequency(&self, i: usize) -> f64 {
        self.sample_rate * i as f64 / self.total_samples as f64
    }

    /// Whether `frequency` lies in the admissible peak band
    pub fn in_band(&self, frequency: f64) -> bool {
        frequency >= self.min_frequency && frequency <= self.max_frequency
    }
}

impl Default for AnalysisProperties {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLES, DEFAULT_ZERO_PADDING_SAMPLES, DEFAULT_SAMPLES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_invariants() {
        for (n, z) in [(128, 896), (100, 400), (7, 0), (1, 1), (33, 10)] {
            let p = AnalysisProperties::new(n, z, n);
            assert_eq!(p.total_samples, n + z);
            assert_eq!(p.output_size, (n + z) / 2);
        }
    }

    #[test]
    fn test_timing_figures() {
        let mut p = AnalysisProperties::new(128, 896, 128);
        assert_eq!(p.sample_rate, 0.0);

        p.set_sample_interval(125.0);
        assert!((p.sample_rate - 8.0).abs() < 1e-12);
        assert!((p.segment_duration - 16000.0).abs() < 1e-9);
        assert!((p.frequency_resolution - 0.0625).abs() < 1e-12);
        assert!((p.frequency_resolution_with_zero_padding - 8.0 / 1024.0).abs() < 1e-12);
    }

    #[test]
    fn test_resizing_keeps_interval() {
        let mut p = AnalysisProperties::default();
        p.set_sample_interval(40.0);
        p.set_sizes(250, 750, 25);

        assert!((p.sample_rate - 25.0).abs() < 1e-12);
        assert!((p.frequency_resolution - 0.1).abs() < 1e-12);
        assert!((p.frequency_resolution_with_zero_padding - 0.025).abs() < 1e-12);
        assert_eq!(p.hop_size, 25);
    }

    #[test]
    fn test_bin_frequency_strictly_increasing() {
        let mut p = AnalysisProperties::new(100, 400, 100);
        p.set_sample_interval(125.0);

        for i in 1..p.total_samples {
            assert!(p.bin_frequency(i) > p.bin_frequency(i - 1));
        }
    }
}
