//! Error types for configuration and transform failures
//!
//! The sample ingestion path never returns these. Everything that can go
//! wrong is rejected when the analyzer is configured.

use thiserror::Error;

/// Rejected analyzer configuration
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyzerError {
    #[error("Sample interval must be a positive number of milliseconds (got {0})")]
    InvalidSampleInterval(f64),

    #[error("Effective window size must be at least one sample")]
    EmptyWindow,

    #[error("Invalid frequency band [{min}, {max}] Hz")]
    InvalidBand { min: f64, max: f64 },
}

/// Failure inside a transform engine
#[derive(Error, Debug)]
pub enum TransformError {
    #[error("Transform input has {actual} samples, plan expects {expected}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("Transform engine failed: {0}")]
    Engine(String),
}

/// Failure loading analyzer settings
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read settings: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid settings: {0}")]
    Invalid(#[from] AnalyzerError),
}

/// Failure controlling the background processor
#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("Processor is already running")]
    AlreadyRunning,

    #[error("Processor is not running")]
    NotRunning,

    #[error("Analyzer lock was poisoned by a panicking thread")]
    Poisoned,

    #[error(transparent)]
    Config(#[from] AnalyzerError),
}
