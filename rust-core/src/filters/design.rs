//! Butterworth band-pass design by bilinear transform
//!
//! Produces the coefficient set consumed by [`RecursiveBandpassFilter`].
//! The pulse defaults are baked in as constants; `design_butterworth_bandpass`
//! is the offline derivation, used only when a caller installs a filter for a
//! different sample rate or band.
//!
//! [`RecursiveBandpassFilter`]: super::RecursiveBandpassFilter

use crate::error::AnalyzerError;
use num_complex::Complex64;
use std::f64::consts::PI;

/// Filter order of the prototype low-pass (band-pass has twice as many poles)
pub const BUTTERWORTH_ORDER: usize = 2;

/// Number of poles (and zeros) of the band-pass
pub const POLES: usize = 2 * BUTTERWORTH_ORDER;

/// Lower corner of the default pulse band (42 bpm)
pub const MIN_PULSE_FREQUENCY: f64 = 0.7;

/// Upper corner of the default pulse band (234 bpm)
pub const MAX_PULSE_FREQUENCY: f64 = 3.9;

/// Sample rate the default coefficients were designed for (125 ms interval)
pub const DEFAULT_DESIGN_RATE: f64 = 8.0;

/// Coefficients of an order-2 Butterworth band-pass in direct form
///
/// The numerator is fixed by the band-pass zeros (two at DC, two at Nyquist):
/// `x[n] - 2*x[n-2] + x[n-4]`. `feedback[k]` multiplies `y[n-4+k]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandpassCoefficients {
    /// Passband gain at the band centre; inputs are divided by it
    pub gain: f64,

    /// Recursive coefficients for y[n-4], y[n-3], y[n-2], y[n-1]
    pub feedback: [f64; POLES],

    /// Sample rate (Hz) these coefficients assume
    pub design_rate_hz: f64,

    /// Lower corner frequency (Hz)
    pub low_hz: f64,

    /// Upper corner frequency (Hz)
    pub high_hz: f64,
}

impl BandpassCoefficients {
    /// Pulse band 0.7-3.9 Hz at 8 Hz sample rate
    pub const PULSE_8HZ: Self = Self {
        gain: 1.564354775e+00,
        feedback: [-0.4128015981, 0.2397611203, 0.9889943457, -0.6474311512],
        design_rate_hz: DEFAULT_DESIGN_RATE,
        low_hz: MIN_PULSE_FREQUENCY,
        high_hz: MAX_PULSE_FREQUENCY,
    };

    /// Feed-forward coefficients for x[n-4]..x[n]
    pub const fn numerator() -> [f64; POLES + 1] {
        [1.0, 0.0, -2.0, 0.0, 1.0]
    }

    /// Complex frequency response H(e^jω) at `frequency_hz`
    pub fn frequency_response(&self, frequency_hz: f64) -> Complex64 {
        let omega = 2.0 * PI * frequency_hz / self.design_rate_hz;
        let z_inv = Complex64::from_polar(1.0, -omega);

        // Numerator and denominator in powers of z^-1
        let b = Self::numerator();
        let mut num = Complex64::new(0.0, 0.0);
        let mut den = Complex64::new(1.0, 0.0);
        for (k, &coeff) in b.iter().rev().enumerate() {
            num += coeff * z_inv.powi(k as i32);
        }
        for (k, &coeff) in self.feedback.iter().rev().enumerate() {
            den -= coeff * z_inv.powi(k as i32 + 1);
        }

        num / den / self.gain
    }

    /// Magnitude response in dB at `frequency_hz`
    pub fn magnitude_db(&self, frequency_hz: f64) -> f64 {
        20.0 * self.frequency_response(frequency_hz).norm().max(1e-20).log10()
    }
}

impl Default for BandpassCoefficients {
    fn default() -> Self {
        Self::PULSE_8HZ
    }
}

/// Design an order-2 Butterworth band-pass
///
/// # Algorithm
/// 1. Prewarp both corners: ω = 2·tan(π·f/fs)
/// 2. Place the analog low-pass prototype poles on the unit circle
/// 3. Map each prototype pole to a band-pass pole pair around ω0 = √(ω1·ω2)
/// 4. Bilinear transform z = (2 + s) / (2 - s); zeros land at z = ±1
/// 5. Expand pole polynomial and normalize gain at the arithmetic band centre
///
/// # Arguments
/// * `sample_rate` - Sample rate in Hz
/// * `low_hz` - Lower corner frequency
/// * `high_hz` - Upper corner frequency, below Nyquist
pub fn design_butterworth_bandpass(
    sample_rate: f64,
    low_hz: f64,
    high_hz: f64,
) -> Result<BandpassCoefficients, AnalyzerError> {
    let nyquist = sample_rate / 2.0;
    if !(sample_rate.is_finite() && low_hz > 0.0 && low_hz < high_hz && high_hz < nyquist) {
        return Err(AnalyzerError::InvalidBand {
            min: low_hz,
            max: high_hz,
        });
    }

    let alpha1 = low_hz / sample_rate;
    let alpha2 = high_hz / sample_rate;

    let w1 = 2.0 * (PI * alpha1).tan();
    let w2 = 2.0 * (PI * alpha2).tan();
    let w0 = (w1 * w2).sqrt();
    let bandwidth = w2 - w1;

    let one = Complex64::new(1.0, 0.0);
    let mut z_poles = Vec::with_capacity(POLES);

    for i in 0..2 * BUTTERWORTH_ORDER {
        let theta = if BUTTERWORTH_ORDER % 2 == 1 {
            i as f64 * PI / BUTTERWORTH_ORDER as f64
        } else {
            (i as f64 + 0.5) * PI / BUTTERWORTH_ORDER as f64
        };
        let prototype = Complex64::from_polar(1.0, theta);

        // Left half-plane only
        if prototype.re >= 0.0 {
            continue;
        }

        let hba = prototype * (0.5 * bandwidth);
        let temp = (one - (Complex64::new(w0, 0.0) / hba).powi(2)).sqrt();

        for s in [hba * (one + temp), hba * (one - temp)] {
            z_poles.push((2.0 + s) / (2.0 - s));
        }
    }

    let zeros: Vec<Complex64> = std::iter::repeat(one)
        .take(BUTTERWORTH_ORDER)
        .chain(std::iter::repeat(-one).take(BUTTERWORTH_ORDER))
        .collect();

    let top = expand(&zeros);
    let bottom = expand(&z_poles);

    let theta = PI * (alpha1 + alpha2);
    let z = Complex64::from_polar(1.0, theta);
    let gain = (evaluate(&top, z) / evaluate(&bottom, z)).norm();

    let lead = bottom[POLES].re;
    let mut feedback = [0.0; POLES];
    for (k, coeff) in feedback.iter_mut().enumerate() {
        *coeff = -(bottom[k].re / lead);
    }

    Ok(BandpassCoefficients {
        gain,
        feedback,
        design_rate_hz: sample_rate,
        low_hz,
        high_hz,
    })
}

/// Polynomial coefficients (ascending powers) of Π (z - root)
fn expand(roots: &[Complex64]) -> Vec<Complex64> {
    let mut coeffs = vec![Complex64::new(1.0, 0.0)];

    for &root in roots {
        let mut next = vec![Complex64::new(0.0, 0.0); coeffs.len() + 1];
        for (i, &c) in coeffs.iter().enumerate() {
            next[i + 1] += c;
            next[i] -= root * c;
        }
        coeffs = next;
    }

    coeffs
}

/// Horner evaluation of an ascending-power polynomial
fn evaluate(coeffs: &[Complex64], z: Complex64) -> Complex64 {
    coeffs
        .iter()
        .rev()
        .fold(Complex64::new(0.0, 0.0), |acc, &c| acc * z + c)
}
