//! Sliding-window sample accumulator
//!
//! Collects raw samples into fixed-length, optionally overlapping,
//! optionally zero-padded transform windows.

use crate::error::AnalyzerError;
use crate::spectrum::properties::{DEFAULT_SAMPLES, DEFAULT_ZERO_PADDING_SAMPLES};
use num_complex::Complex64;
use ringbuf::{HeapConsumer, HeapProducer, HeapRb};

/// Accumulates raw samples into transform windows
///
/// Pending samples live in a ring of capacity `effective_size`. When the ring
/// fills, its contents (oldest first) are copied into the window, the tail of
/// the window is zero-padded, and the oldest `hop_size` samples are dropped so
/// the remaining `effective_size - hop_size` overlap with the next window.
pub struct SampleBuffer {
    effective_size: usize,
    zero_pad_size: usize,
    hop_size: usize,

    producer: HeapProducer<f64>,
    consumer: HeapConsumer<f64>,

    /// Transform input, `effective_size + zero_pad_size` long
    window: Vec<Complex64>,
}

impl SampleBuffer {
    /// Create a buffer
    ///
    /// # Arguments
    /// * `effective_size` - Real samples per window, must be positive
    /// * `zero_pad_size` - Zeros appended after the real samples
    /// * `hop_size` - New samples between windows; 0 or anything above
    ///   `effective_size` means no overlap
    pub fn new(
        effective_size: usize,
        zero_pad_size: usize,
        hop_size: usize,
    ) -> Result<Self, AnalyzerError> {
        if effective_size == 0 {
            return Err(AnalyzerError::EmptyWindow);
        }

        Ok(Self::build(effective_size, zero_pad_size, hop_size))
    }

    /// `effective_size` must be non-zero
    fn build(effective_size: usize, zero_pad_size: usize, hop_size: usize) -> Self {
        let (producer, consumer) = HeapRb::<f64>::new(effective_size).split();

        Self {
            effective_size,
            zero_pad_size,
            hop_size: clamp_hop(hop_size, effective_size),
            producer,
            consumer,
            window: vec![Complex64::new(0.0, 0.0); effective_size + zero_pad_size],
        }
    }

    /// Reconfigure sizes, discarding pending samples and the current window
    pub fn configure(
        &mut self,
        effective_size: usize,
        zero_pad_size: usize,
        hop_size: usize,
    ) -> Result<(), AnalyzerError> {
        *self = Self::new(effective_size, zero_pad_size, hop_size)?;
        Ok(())
    }

    /// Append a sample
    ///
    /// # Returns
    /// The completed window when this sample filled it, `None` otherwise
    pub fn add(&mut self, sample: f64) -> Option<&[Complex64]> {
        if self.producer.push(sample).is_err() {
            // Unreachable while the hop invariant holds; drop the sample
            log::warn!("sample buffer full, dropping sample {}", sample);
            return None;
        }

        if self.consumer.len() < self.effective_size {
            return None;
        }

        for (slot, &value) in self.window.iter_mut().zip(self.consumer.iter()) {
            *slot = Complex64::new(value, 0.0);
        }
        self.window[self.effective_size..].fill(Complex64::new(0.0, 0.0));

        self.consumer.skip(self.hop_size);

        Some(&self.window)
    }

    /// Overwrite the real part of window slot `i`; out of range is ignored
    pub fn update(&mut self, i: usize, value: f64) {
        if let Some(slot) = self.window.get_mut(i) {
            slot.re = value;
        }
    }

    /// Real part of window slot `i`, or 0.0 when out of range
    pub fn value(&self, i: usize) -> f64 {
        self.window.get(i).map_or(0.0, |slot| slot.re)
    }

    /// Read-only view of the whole (zero-padded) window
    pub fn window(&self) -> &[Complex64] {
        &self.window
    }

    /// Drop pending samples and clear the window
    pub fn clear(&mut self) {
        self.consumer.clear();
        self.window.fill(Complex64::new(0.0, 0.0));
    }

    /// Number of samples waiting for the next window
    pub fn pending(&self) -> usize {
        self.consumer.len()
    }

    /// Effective (non-padded) window length
    pub fn size(&self) -> usize {
        self.effective_size
    }

    /// Window length including zero padding
    pub fn total_size(&self) -> usize {
        self.effective_size + self.zero_pad_size
    }

    pub fn hop_size(&self) -> usize {
        self.hop_size
    }

    pub fn zero_pad_size(&self) -> usize {
        self.zero_pad_size
    }
}

impl Default for SampleBuffer {
    fn default() -> Self {
        Self::build(DEFAULT_SAMPLES, DEFAULT_ZERO_PADDING_SAMPLES, DEFAULT_SAMPLES)
    }
}

fn clamp_hop(hop_size: usize, effective_size: usize) -> usize {
    if hop_size == 0 || hop_size > effective_size {
        effective_size
    } else {
        hop_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(buffer: &mut SampleBuffer, samples: impl IntoIterator<Item = f64>) -> Vec<usize> {
        samples
            .into_iter()
            .enumerate()
            .filter_map(|(i, s)| buffer.add(s).map(|_| i + 1))
            .collect()
    }

    #[test]
    fn test_window_fills_in_order_with_zero_padding() {
        let mut buffer = SampleBuffer::new(4, 3, 4).unwrap();

        assert!(buffer.add(1.0).is_none());
        assert!(buffer.add(2.0).is_none());
        assert!(buffer.add(3.0).is_none());

        let window = buffer.add(4.0).expect("window should be ready");
        let re: Vec<f64> = window.iter().map(|c| c.re).collect();
        assert_eq!(re, vec![1.0, 2.0, 3.0, 4.0, 0.0, 0.0, 0.0]);
        assert!(window.iter().all(|c| c.im == 0.0));

        // No overlap: queue is empty again
        assert_eq!(buffer.pending(), 0);
    }

    #[test]
    fn test_hop_clamped_to_effective_size() {
        assert_eq!(SampleBuffer::new(8, 0, 0).unwrap().hop_size(), 8);
        assert_eq!(SampleBuffer::new(8, 0, 20).unwrap().hop_size(), 8);
        assert_eq!(SampleBuffer::new(8, 0, 3).unwrap().hop_size(), 3);
    }

    #[test]
    fn test_rejects_empty_window() {
        assert_eq!(
            SampleBuffer::new(0, 16, 1).err(),
            Some(AnalyzerError::EmptyWindow)
        );
    }

    #[test]
    fn test_overlap_retains_newest_samples() {
        let mut buffer = SampleBuffer::new(4, 0, 2).unwrap();

        let ready = feed(&mut buffer, (1..=8).map(f64::from));
        assert_eq!(ready, vec![4, 6, 8]);

        // Last window: samples 5..=8
        let re: Vec<f64> = buffer.window().iter().map(|c| c.re).collect();
        assert_eq!(re, vec![5.0, 6.0, 7.0, 8.0]);
        assert_eq!(buffer.pending(), 2);
    }

    #[test]
    fn test_hop_cadence_after_first_window() {
        let mut buffer = SampleBuffer::new(128, 896, 32).unwrap();

        let ready = feed(&mut buffer, (0..224).map(|k| k as f64));
        assert_eq!(ready, vec![128, 160, 192, 224]);
    }

    #[test]
    fn test_update_and_value_bounds() {
        let mut buffer = SampleBuffer::new(2, 2, 2).unwrap();
        buffer.add(1.0);
        buffer.add(2.0);

        buffer.update(1, 5.0);
        assert_eq!(buffer.value(1), 5.0);

        // Out of range is a no-op / 0.0
        buffer.update(4, 9.0);
        assert_eq!(buffer.value(4), 0.0);
        assert_eq!(buffer.value(usize::MAX), 0.0);
        assert_eq!(buffer.total_size(), 4);
    }

    #[test]
    fn test_configure_discards_partial_window() {
        let mut buffer = SampleBuffer::new(4, 0, 4).unwrap();
        feed(&mut buffer, [1.0, 2.0, 3.0]);

        buffer.configure(3, 1, 0).unwrap();
        assert_eq!(buffer.pending(), 0);

        assert!(buffer.add(10.0).is_none());
        assert!(buffer.add(20.0).is_none());
        let window = buffer.add(30.0).unwrap();
        let re: Vec<f64> = window.iter().map(|c| c.re).collect();
        assert_eq!(re, vec![10.0, 20.0, 30.0, 0.0]);
    }

    #[test]
    fn test_accessors() {
        let buffer = SampleBuffer::new(100, 400, 25).unwrap();
        assert_eq!(buffer.size(), 100);
        assert_eq!(buffer.total_size(), 500);
        assert_eq!(buffer.hop_size(), 25);
        assert_eq!(buffer.zero_pad_size(), 400);
    }
}
