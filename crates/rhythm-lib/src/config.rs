use crate::{
    detectors::ecg::DetectorConfig, error::RhythmResult, metrics::rhythm::RhythmThresholds,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// Everything a single analysis pass needs; deserialized from TOML with per-field defaults.
///
/// ```toml
/// [detector]
/// interval_size_s = 5.0
/// step_size_s = 5.0
///
/// [classifier]
/// tachycardia_above_bpm = 100.0
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub detector: DetectorConfig,
    pub classifier: RhythmThresholds,
}

impl AnalysisConfig {
    pub fn validate(&self) -> RhythmResult<()> {
        self.detector.validate()?;
        self.classifier.validate()
    }
}

pub fn parse_config(text: &str) -> Result<AnalysisConfig> {
    let config: AnalysisConfig = toml::from_str(text).context("parsing analysis config")?;
    config.validate()?;
    Ok(config)
}

pub fn read_config(path: &Path) -> Result<AnalysisConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    parse_config(&contents).with_context(|| format!("invalid config {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(parse_config("").unwrap(), AnalysisConfig::default());
    }

    #[test]
    fn partial_tables_keep_other_defaults() {
        let cfg = parse_config(
            r#"
            [detector]
            step_size_s = 2.5

            [classifier]
            bradycardia_below_bpm = 50.0
            "#,
        )
        .unwrap();
        assert_eq!(cfg.detector.step_size_s, 2.5);
        assert_eq!(cfg.detector.interval_size_s, 5.0);
        assert_eq!(cfg.detector.threshold_scale, 0.7);
        assert_eq!(cfg.classifier.bradycardia_below_bpm, 50.0);
        assert_eq!(cfg.classifier.tachycardia_above_bpm, 100.0);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(parse_config("[detector]\ninterval_size_s = -1.0\n").is_err());
        assert!(parse_config("[classifier]\nbradycardia_below_bpm = 150.0\n").is_err());
    }

    #[test]
    fn reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rhythm.toml");
        fs::write(&path, "[detector]\nmin_rr_s = 0.25\n").unwrap();
        let cfg = read_config(&path).unwrap();
        assert_eq!(cfg.detector.min_rr_s, 0.25);
        assert!(read_config(&dir.path().join("missing.toml")).is_err());
    }
}
