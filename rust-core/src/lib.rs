//! Pulse Spectrum - heart-rate spectral analysis for PPG brightness samples
//!
//! Raw camera brightness samples are band-pass filtered, windowed and
//! transformed; the dominant bin inside the pulse band gives the heart rate.
//! Optional Python bindings are built with the `python` feature.

// Suppress PyO3 non-local impl warnings (harmless macro-generated code)
#![cfg_attr(feature = "python", allow(non_local_definitions))]

pub mod config;
pub mod error;
pub mod filters;
pub mod signal;
pub mod spectrum;

#[cfg(feature = "python")]
pub mod python_bindings;

pub use config::AnalyzerSettings;
pub use error::{AnalyzerError, ConfigError, ProcessorError, TransformError};
pub use filters::{BandpassCoefficients, RecursiveBandpassFilter, WindowType};
pub use signal::{AnalyzerEvent, PulseProcessor, SampleBuffer};
pub use spectrum::{
    AnalyzerState, EngineKind, Peak, PipelineStages, SpectralAnalyzer, SpectrumReport,
};
