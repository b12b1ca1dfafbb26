//! Spectral analysis with FFT

pub mod analysis;
pub mod fft;
pub mod properties;
pub mod windowing;

pub use analysis::{
    AnalyzerState, Peak, PipelineStages, SpectralAnalyzer, SpectrumReport, SpectrumResult,
};
pub use fft::{ComplexFftEngine, EngineKind, RealFftEngine, TransformEngine};
pub use properties::AnalysisProperties;
pub use windowing::apply_window;
