//! Recursive (IIR) Butterworth band-pass for pulse signals
//!
//! Direct-form realization with five input taps and five output taps.
//! History is owned by each filter instance and persists across windows.
//! Without overlap that filters the stream as one continuous signal. With
//! overlap, retained samples are filtered again in each window they belong
//! to, continuing from the history the previous window left behind.

use super::design::{BandpassCoefficients, POLES};
use crate::signal::SampleBuffer;

/// Number of history taps (order of the difference equation + 1)
pub const TAPS: usize = POLES + 1;

/// Default number of leading samples discarded after filtering
pub const DEFAULT_STABILIZATION_SAMPLES: usize = 25;

/// Input and output history of one filter instance
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterState {
    inputs: [f64; TAPS],
    outputs: [f64; TAPS],
}

impl FilterState {
    /// Advance the difference equation by one sample
    ///
    /// y[n] = (x[n] + x[n-4] - 2x[n-2]) + Σ feedback[k]·y[n-4+k], x = s / gain
    #[inline]
    pub fn step(&mut self, coefficients: &BandpassCoefficients, sample: f64) -> f64 {
        self.inputs.copy_within(1.., 0);
        self.inputs[POLES] = sample / coefficients.gain;

        self.outputs.copy_within(1.., 0);

        let feed_forward: f64 = BandpassCoefficients::numerator()
            .iter()
            .zip(self.inputs.iter())
            .map(|(b, x)| b * x)
            .sum();
        let feedback: f64 = coefficients
            .feedback
            .iter()
            .zip(self.outputs.iter())
            .map(|(a, y)| a * y)
            .sum();

        let output = feed_forward + feedback;
        self.outputs[POLES] = output;
        output
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Order-2 Butterworth band-pass applied to transform windows
#[derive(Debug, Clone)]
pub struct RecursiveBandpassFilter {
    coefficients: BandpassCoefficients,
    state: FilterState,
    stabilization_samples: usize,
}

impl RecursiveBandpassFilter {
    /// Filter for the default pulse band (0.7-3.9 Hz at 8 Hz)
    pub fn new() -> Self {
        Self::with_coefficients(BandpassCoefficients::default())
    }

    /// Filter with coefficients from [`design_butterworth_bandpass`]
    ///
    /// [`design_butterworth_bandpass`]: super::design_butterworth_bandpass
    pub fn with_coefficients(coefficients: BandpassCoefficients) -> Self {
        Self {
            coefficients,
            state: FilterState::default(),
            stabilization_samples: DEFAULT_STABILIZATION_SAMPLES,
        }
    }

    /// Set how many leading samples are discarded after filtering a window
    pub fn with_stabilization(mut self, samples: usize) -> Self {
        self.stabilization_samples = samples;
        self
    }

    /// Filter a single sample
    #[inline]
    pub fn process_sample(&mut self, sample: f64) -> f64 {
        self.state.step(&self.coefficients, sample)
    }

    /// Filter a block in-place, in arrival order
    pub fn process_block_inplace(&mut self, buffer: &mut [f64]) {
        for sample in buffer.iter_mut() {
            *sample = self.process_sample(*sample);
        }
    }

    /// Filter the effective part of the current window, then trim the
    /// stabilization period
    ///
    /// The first `stabilization_samples` outputs are shifted out of the
    /// window and the freed tail of the effective part is zero-filled.
    pub fn filter_window(&mut self, buffer: &mut SampleBuffer) {
        let size = buffer.size();

        for i in 0..size {
            let filtered = self.process_sample(buffer.value(i));
            buffer.update(i, filtered);
        }

        let cut = self.stabilization_samples.min(size);
        if cut == 0 {
            return;
        }

        for i in 0..size - cut {
            buffer.update(i, buffer.value(i + cut));
        }
        for i in size - cut..size {
            buffer.update(i, 0.0);
        }
    }

    /// Clear history (as if freshly constructed)
    pub fn reset(&mut self) {
        self.state.clear();
    }

    pub fn coefficients(&self) -> &BandpassCoefficients {
        &self.coefficients
    }

    pub fn state(&self) -> &FilterState {
        &self.state
    }

    pub fn stabilization_samples(&self) -> usize {
        self.stabilization_samples
    }
}

impl Default for RecursiveBandpassFilter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::design_butterworth_bandpass;
    use std::f64::consts::PI;

    #[test]
    fn test_impulse_response() {
        let mut filter = RecursiveBandpassFilter::new();
        let gain = filter.coefficients().gain;

        let y0 = filter.process_sample(1.0);
        let y1 = filter.process_sample(0.0);

        assert!((y0 - 1.0 / gain).abs() < 1e-12);
        // y[1] = feedback[3] * y[0]
        assert!((y1 - (-0.6474311512 / gain)).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_dc() {
        let mut filter = RecursiveBandpassFilter::new();
        let mut signal = vec![1.0; 400];
        filter.process_block_inplace(&mut signal);

        assert!(signal[300..].iter().all(|y| y.abs() < 1e-6));
    }

    #[test]
    fn test_passes_band_centre() {
        let mut filter = RecursiveBandpassFilter::new();
        let mut signal: Vec<f64> = (0..600)
            .map(|k| (2.0 * PI * 2.3 * k as f64 / 8.0).sin())
            .collect();
        filter.process_block_inplace(&mut signal);

        let peak = signal[400..].iter().fold(0.0_f64, |m, y| m.max(y.abs()));
        assert!((peak - 1.0).abs() < 1e-3, "peak = {}", peak);
    }

    #[test]
    fn test_history_persists_across_blocks() {
        let input: Vec<f64> = (0..64).map(|k| (k as f64 * 0.7).sin()).collect();

        let mut whole = input.clone();
        RecursiveBandpassFilter::new().process_block_inplace(&mut whole);

        let mut split_filter = RecursiveBandpassFilter::new();
        let mut first = input[..30].to_vec();
        let mut second = input[30..].to_vec();
        split_filter.process_block_inplace(&mut first);
        split_filter.process_block_inplace(&mut second);

        first.extend(second);
        for (a, b) in whole.iter().zip(first.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn test_instances_do_not_share_state() {
        let mut a = RecursiveBandpassFilter::new();
        let mut b = RecursiveBandpassFilter::new();

        a.process_sample(100.0);
        a.process_sample(-50.0);

        assert_eq!(b.state(), &FilterState::default());
        let fresh = RecursiveBandpassFilter::new().process_sample(1.0);
        assert_eq!(b.process_sample(1.0), fresh);
    }

    #[test]
    fn test_reset_clears_history() {
        let mut filter = RecursiveBandpassFilter::new();
        let first = filter.process_sample(1.0);
        filter.process_sample(3.0);

        filter.reset();
        assert_eq!(filter.process_sample(1.0), first);
    }

    #[test]
    fn test_filter_window_trims_stabilization() {
        let mut buffer = SampleBuffer::new(8, 4, 8).unwrap();
        let mut filter = RecursiveBandpassFilter::new().with_stabilization(3);

        for k in 0..8 {
            buffer.add(k as f64);
        }

        // Reference: same samples through a fresh filter
        let mut expected: Vec<f64> = (0..8).map(|k| k as f64).collect();
        RecursiveBandpassFilter::new().process_block_inplace(&mut expected);

        filter.filter_window(&mut buffer);

        for i in 0..5 {
            assert!((buffer.value(i) - expected[i + 3]).abs() < 1e-12);
        }
        for i in 5..12 {
            assert_eq!(buffer.value(i), 0.0);
        }
    }

    #[test]
    fn test_windows_without_overlap_match_continuous_filtering() {
        let size = 64;
        let signal: Vec<f64> = (0..3 * size)
            .map(|k| (2.0 * PI * 1.3 * k as f64 / 8.0).sin())
            .collect();

        let mut continuous = signal.clone();
        RecursiveBandpassFilter::new().process_block_inplace(&mut continuous);

        let mut filter = RecursiveBandpassFilter::new();
        let mut buffer = SampleBuffer::new(size, 0, size).unwrap();
        let cut = filter.stabilization_samples();

        for (j, chunk) in signal.chunks(size).enumerate() {
            for &sample in chunk {
                buffer.add(sample);
            }
            filter.filter_window(&mut buffer);

            for i in 0..size - cut {
                let expected = continuous[j * size + cut + i];
                assert!((buffer.value(i) - expected).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_overlapping_windows_refilter_retained_samples() {
        let size = 64;
        let hop = 16;
        let signal: Vec<f64> = (0..size + hop)
            .map(|k| (2.0 * PI * 1.3 * k as f64 / 8.0).sin())
            .collect();

        let mut continuous = signal.clone();
        RecursiveBandpassFilter::new().process_block_inplace(&mut continuous);

        let mut filter = RecursiveBandpassFilter::new();
        let mut buffer = SampleBuffer::new(size, 0, hop).unwrap();
        let mut windows = 0;
        for &sample in &signal {
            if buffer.add(sample).is_some() {
                filter.filter_window(&mut buffer);
                windows += 1;
            }
        }
        assert_eq!(windows, 2);

        // The second window starts from the first window's history, not from
        // the sample preceding it, so it departs from continuous filtering
        let cut = filter.stabilization_samples();
        let max_error = (0..size - cut)
            .map(|i| (buffer.value(i) - continuous[hop + cut + i]).abs())
            .fold(0.0, f64::max);
        assert!(max_error > 0.0);
        assert!(max_error < 0.1);
    }

    #[test]
    fn test_stabilization_longer_than_window_zeroes_it() {
        let mut buffer = SampleBuffer::new(4, 0, 4).unwrap();
        let mut filter = RecursiveBandpassFilter::new();

        for k in 1..=4 {
            buffer.add(k as f64);
        }
        filter.filter_window(&mut buffer);

        assert!(buffer.window().iter().all(|c| c.re == 0.0));
    }

    #[test]
    fn test_designed_filter_runs() {
        let coeffs = design_butterworth_bandpass(25.0, 0.7, 3.9).unwrap();
        let mut filter = RecursiveBandpassFilter::with_coefficients(coeffs);
        let mut signal = vec![1.0; 800];
        filter.process_block_inplace(&mut signal);

        assert!(signal[700..].iter().all(|y| y.abs() < 1e-6));
    }
}
