//! Time-domain windowing of transform windows
//!
//! Reduces spectral leakage before the FFT. Only the effective part of a
//! window is tapered; the zero padding stays zero.

use crate::filters::windows::WindowType;
use crate::signal::SampleBuffer;

/// Multiply the effective part of the current window by `window_type`
pub fn apply_window(buffer: &mut SampleBuffer, window_type: WindowType) {
    let size = buffer.size();

    for i in 0..size {
        let w = window_type.coefficient(i, size);
        buffer.update(i, buffer.value(i) * w);
    }
}

/// Amplitude correction factor for a window of `length` samples
///
/// Multiply spectrum magnitudes by this to undo the coherent gain of the
/// window, so a windowed tone reports the amplitude it would have under a
/// rectangular window.
pub fn window_correction_factor(window_type: WindowType, length: usize) -> f64 {
    1.0 / window_type.coherent_gain(length)
}
