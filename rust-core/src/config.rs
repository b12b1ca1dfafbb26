//! Analyzer settings loaded from TOML
//!
//! ```toml
//! sample_interval_ms = 125.0
//! effective_size = 128
//! zero_padding = 896
//! hop_size = 32
//! engine = "real"
//!
//! [stages]
//! bandpass_filter = true
//! window = "hann"
//! frequency_mask = false
//! ```
//!
//! Every field is optional. TOML has no null, so use `window = "rectangular"`
//! to switch tapering off.

use crate::error::ConfigError;
use crate::filters::butterworth::DEFAULT_STABILIZATION_SAMPLES;
use crate::filters::design::{MAX_PULSE_FREQUENCY, MIN_PULSE_FREQUENCY};
use crate::spectrum::analysis::PipelineStages;
use crate::spectrum::fft::EngineKind;
use crate::spectrum::properties::{DEFAULT_SAMPLES, DEFAULT_ZERO_PADDING_SAMPLES};
use crate::spectrum::SpectralAnalyzer;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerSettings {
    /// Milliseconds between samples; usually reported by the sensor later
    #[serde(default)]
    pub sample_interval_ms: Option<f64>,

    #[serde(default = "default_effective_size")]
    pub effective_size: usize,

    #[serde(default = "default_zero_padding")]
    pub zero_padding: usize,

    /// 0 means no overlap
    #[serde(default)]
    pub hop_size: usize,

    #[serde(default = "default_min_frequency")]
    pub min_frequency: f64,

    #[serde(default = "default_max_frequency")]
    pub max_frequency: f64,

    #[serde(default = "default_stabilization_samples")]
    pub stabilization_samples: usize,

    #[serde(default)]
    pub engine: EngineKind,

    #[serde(default)]
    pub stages: PipelineStages,
}

impl Default for AnalyzerSettings {
    fn default() -> Self {
        Self {
            sample_interval_ms: None,
            effective_size: default_effective_size(),
            zero_padding: default_zero_padding(),
            hop_size: 0,
            min_frequency: default_min_frequency(),
            max_frequency: default_max_frequency(),
            stabilization_samples: default_stabilization_samples(),
            engine: EngineKind::default(),
            stages: PipelineStages::default(),
        }
    }
}

impl AnalyzerSettings {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let settings = Self::from_toml_str(&content)?;
        log::debug!("loaded analyzer settings from {}", path.display());
        Ok(settings)
    }

    /// Load a settings file and build an analyzer from it
    pub fn load_analyzer(path: &Path) -> Result<SpectralAnalyzer, ConfigError> {
        let settings = Self::load(path)?;
        Ok(SpectralAnalyzer::from_settings(&settings)?)
    }
}

fn default_effective_size() -> usize { DEFAULT_SAMPLES }
fn default_zero_padding() -> usize { DEFAULT_ZERO_PADDING_SAMPLES }
fn default_min_frequency() -> f64 { MIN_PULSE_FREQUENCY }
fn default_max_frequency() -> f64 { MAX_PULSE_FREQUENCY }
fn default_stabilization_samples() -> usize { DEFAULT_STABILIZATION_SAMPLES }

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalyzerError;
    use crate::filters::WindowType;

    #[test]
    fn test_empty_document_gives_defaults() {
        let settings = AnalyzerSettings::from_toml_str("").unwrap();
        assert_eq!(settings, AnalyzerSettings::default());
    }

    #[test]
    fn test_parse_full_document() {
        let settings = AnalyzerSettings::from_toml_str(
            r#"
            sample_interval_ms = 125.0
            effective_size = 128
            zero_padding = 896
            hop_size = 32
            min_frequency = 0.8
            max_frequency = 3.0
            engine = "real"

            [stages]
            bandpass_filter = false
            window = "hanning"
            frequency_mask = true
            "#,
        )
        .unwrap();

        assert_eq!(settings.sample_interval_ms, Some(125.0));
        assert_eq!(settings.hop_size, 32);
        assert_eq!(settings.engine, EngineKind::Real);
        assert!(!settings.stages.bandpass_filter);
        assert_eq!(settings.stages.window, Some(WindowType::Hann));
        assert!(settings.stages.frequency_mask);
        assert!(!settings.stages.window_gain_correction);

        let analyzer = SpectralAnalyzer::from_settings(&settings).unwrap();
        let p = analyzer.properties();
        assert_eq!(p.total_samples, 1024);
        assert_eq!(p.hop_size, 32);
        assert_eq!(p.sample_rate, 8.0);
        assert_eq!(p.min_frequency, 0.8);
        assert_eq!(analyzer.engine_kind(), EngineKind::Real);
    }

    #[test]
    fn test_invalid_values_are_rejected_by_analyzer() {
        let settings = AnalyzerSettings::from_toml_str("sample_interval_ms = -3.0").unwrap();
        assert!(SpectralAnalyzer::from_settings(&settings).is_err());

        let settings = AnalyzerSettings::from_toml_str("effective_size = 0").unwrap();
        assert!(SpectralAnalyzer::from_settings(&settings).is_err());
    }

    #[test]
    fn test_load_analyzer_reports_invalid_values() {
        let path = std::env::temp_dir().join(format!("pulse-settings-{}.toml", std::process::id()));
        std::fs::write(&path, "min_frequency = 4.0\nmax_frequency = 1.0\n").unwrap();

        let err = AnalyzerSettings::load_analyzer(&path).err().unwrap();
        std::fs::remove_file(&path).unwrap();

        assert!(matches!(
            err,
            ConfigError::Invalid(AnalyzerError::InvalidBand { .. })
        ));
    }

    #[test]
    fn test_parse_error() {
        let err = AnalyzerSettings::from_toml_str("effective_size = \"many\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
