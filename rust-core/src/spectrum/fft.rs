//! Transform engines
//!
//! The analyzer talks to the FFT through [`TransformEngine`]. Each engine owns
//! its plan and output buffer for one transform length; a new length means a
//! new engine.

use crate::error::TransformError;
use num_complex::Complex64;
use realfft::{RealFftPlanner, RealToComplex};
use rustfft::{Fft, FftPlanner};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Forward DFT of a fixed length
pub trait TransformEngine: Send {
    /// Transform length N
    fn len(&self) -> usize;

    /// Forward transform of `input` (length N)
    ///
    /// # Returns
    /// At least bins 0..=N/2 of the unnormalized DFT
    fn process(&mut self, input: &[Complex64]) -> Result<&[Complex64], TransformError>;
}

/// Which engine the analyzer builds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// Complex-to-complex rustfft plan over the full window
    #[default]
    Complex,

    /// Real-to-complex realfft plan, uses only the real parts of the window
    Real,
}

impl EngineKind {
    /// Plan a new engine of length `len`
    pub fn build(self, len: usize) -> Box<dyn TransformEngine> {
        match self {
            EngineKind::Complex => Box::new(ComplexFftEngine::new(len)),
            EngineKind::Real => Box::new(RealFftEngine::new(len)),
        }
    }
}

/// Complex forward FFT (rustfft)
pub struct ComplexFftEngine {
    plan: Arc<dyn Fft<f64>>,

    /// Transform runs in place on this buffer
    output: Vec<Complex64>,

    scratch: Vec<Complex64>,
}

impl ComplexFftEngine {
    pub fn new(len: usize) -> Self {
        let mut planner = FftPlanner::<f64>::new();
        let plan = planner.plan_fft_forward(len);
        let scratch = vec![Complex64::new(0.0, 0.0); plan.get_inplace_scratch_len()];

        Self {
            plan,
            output: vec![Complex64::new(0.0, 0.0); len],
            scratch,
        }
    }
}

impl TransformEngine for ComplexFftEngine {
    fn len(&self) -> usize {
        self.output.len()
    }

    fn process(&mut self, input: &[Complex64]) -> Result<&[Complex64], TransformError> {
        if input.len() != self.output.len() {
            return Err(TransformError::LengthMismatch {
                expected: self.output.len(),
                actual: input.len(),
            });
        }

        self.output.copy_from_slice(input);
        self.plan
            .process_with_scratch(&mut self.output, &mut self.scratch);

        Ok(&self.output)
    }
}

/// Real-input forward FFT (realfft)
///
/// Valid for analyzer windows because their imaginary parts are always 0.
pub struct RealFftEngine {
    len: usize,
    plan: Arc<dyn RealToComplex<f64>>,
    input: Vec<f64>,

    /// Bins 0..=N/2
    output: Vec<Complex64>,
}

impl RealFftEngine {
    pub fn new(len: usize) -> Self {
        let mut planner = RealFftPlanner::<f64>::new();
        let plan = planner.plan_fft_forward(len);
        let input = plan.make_input_vec();
        let output = plan.make_output_vec();

        Self {
            len,
            plan,
            input,
            output,
        }
    }
}

impl TransformEngine for RealFftEngine {
    fn len(&self) -> usize {
        self.len
    }

    fn process(&mut self, input: &[Complex64]) -> Result<&[Complex64], TransformError> {
        if input.len() != self.len {
            return Err(TransformError::LengthMismatch {
                expected: self.len,
                actual: input.len(),
            });
        }

        for (dst, src) in self.input.iter_mut().zip(input.iter()) {
            *dst = src.re;
        }

        self.plan
            .process(&mut self.input, &mut self.output)
            .map_err(|e| TransformError::Engine(e.to_string()))?;

        Ok(&self.output)
    }
}
