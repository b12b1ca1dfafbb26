//! Window functions and the recursive band-pass filter

pub mod butterworth;
pub mod design;
pub mod windows;

pub use butterworth::{FilterState, RecursiveBandpassFilter};
pub use design::{design_butterworth_bandpass, BandpassCoefficients};
pub use windows::WindowType;
