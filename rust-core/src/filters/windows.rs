//! Window functions for spectral analysis
//!
//! All windows use the periodic form over the effective window length N,
//! i.e. the cosine argument is 2πn/N rather than 2πn/(N-1). The periodic
//! form tiles cleanly when consecutive windows overlap.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Window function types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowType {
    /// Hamming window: w[n] = 0.54 - 0.46*cos(2πn/N)
    /// Sidelobe attenuation: ~43 dB
    Hamming,

    /// Hann (Hanning) window: w[n] = 0.5 - 0.5*cos(2πn/N)
    /// Sidelobe attenuation: ~31 dB, sidelobes fall off faster than Hamming
    #[serde(alias = "hanning")]
    Hann,

    /// Blackman window: w[n] = 0.42 - 0.5*cos(2πn/N) + 0.08*cos(4πn/N)
    /// Sidelobe attenuation: ~58 dB, widest mainlobe
    Blackman,

    /// Rectangular window (no tapering)
    Rectangular,
}

impl WindowType {
    /// Window coefficient w[n] for a window of length `length`
    #[inline]
    pub fn coefficient(&self, n: usize, length: usize) -> f64 {
        if length == 0 {
            return 0.0;
        }

        let angle = 2.0 * PI * n as f64 / length as f64;

        match self {
            WindowType::Hamming => 0.54 - 0.46 * angle.cos(),
            WindowType::Hann => 0.5 - 0.5 * angle.cos(),
            WindowType::Blackman => 0.42 - 0.5 * angle.cos() + 0.08 * (2.0 * angle).cos(),
            WindowType::Rectangular => 1.0,
        }
    }

    /// Mean of the window coefficients (coherent gain)
    ///
    /// A windowed tone loses this fraction of its amplitude in the spectrum.
    pub fn coherent_gain(&self, length: usize) -> f64 {
        if length == 0 {
            return 1.0;
        }

        let sum: f64 = (0..length).map(|n| self.coefficient(n, length)).sum();
        sum / length as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generate_window(window_type: WindowType, length: usize) -> Vec<f64> {
        (0..length)
            .map(|n| window_type.coefficient(n, length))
            .collect()
    }

    #[test]
    fn test_window_generation() {
        let length = 128;

        let hann = generate_window(WindowType::Hann, length);
        let hamming = generate_window(WindowType::Hamming, length);
        let blackman = generate_window(WindowType::Blackman, length);

        assert_eq!(hann.len(), length);
        assert_eq!(hamming.len(), length);
        assert_eq!(blackman.len(), length);

        // Periodic form: peak of 1.0 sits at n = N/2
        let center = length / 2;
        assert!((hann[center] - 1.0).abs() < 1e-10);
        assert!((hamming[center] - 1.0).abs() < 1e-10);
        assert!((blackman[center] - 1.0).abs() < 1e-10);

        // Periodic symmetry: w[n] == w[N-n]
        for n in 1..length {
            assert!((hamming[n] - hamming[length - n]).abs() < 1e-10);
        }

        // Hamming has non-zero endpoints (0.08), Hann goes to zero
        assert!((hamming[0] - 0.08).abs() < 1e-10);
        assert!(hann[0].abs() < 1e-10);
    }

    #[test]
    fn test_rectangular_window() {
        let window = generate_window(WindowType::Rectangular, 100);
        assert_eq!(window.len(), 100);
        assert!(window.iter().all(|&w| w == 1.0));
    }

    #[test]
    fn test_coherent_gain() {
        // Periodic cosine windows average exactly to their constant term
        assert!((WindowType::Hamming.coherent_gain(128) - 0.54).abs() < 1e-10);
        assert!((WindowType::Hann.coherent_gain(128) - 0.5).abs() < 1e-10);
        assert!((WindowType::Blackman.coherent_gain(128) - 0.42).abs() < 1e-10);
        assert_eq!(WindowType::Rectangular.coherent_gain(128), 1.0);
    }

    #[test]
    fn test_hanning_alias_deserializes() {
        #[derive(Deserialize)]
        struct Holder {
            window: WindowType,
        }

        let parsed: Holder = toml::from_str("window = \"hanning\"").unwrap();
        assert_eq!(parsed.window, WindowType::Hann);
    }
}
