use crate::{
    detectors::ecg::{detect_r_peaks_with_config, DetectorConfig},
    error::{RhythmError, RhythmResult},
    signal::{Beat, RrInterval, Signal},
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Rhythm category of a single RR interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RhythmLabel {
    Bradycardia,
    Normal,
    Tachycardia,
}

impl RhythmLabel {
    /// Every label, in the order segment collections are iterated.
    pub const ALL: [RhythmLabel; 3] = [
        RhythmLabel::Bradycardia,
        RhythmLabel::Normal,
        RhythmLabel::Tachycardia,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RhythmLabel::Bradycardia => "Bradycardia",
            RhythmLabel::Normal => "Normal",
            RhythmLabel::Tachycardia => "Tachycardia",
        }
    }
}

impl fmt::Display for RhythmLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Heart-rate bounds (bpm) separating the three categories. Both bounds count as Normal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RhythmThresholds {
    pub bradycardia_below_bpm: f64,
    pub tachycardia_above_bpm: f64,
}

impl Default for RhythmThresholds {
    fn default() -> Self {
        Self {
            bradycardia_below_bpm: 60.0,
            tachycardia_above_bpm: 100.0,
        }
    }
}

impl RhythmThresholds {
    pub fn validate(&self) -> RhythmResult<()> {
        let brady = self.bradycardia_below_bpm;
        let tachy = self.tachycardia_above_bpm;
        if brady.is_finite() && tachy.is_finite() && brady > 0.0 && brady <= tachy {
            Ok(())
        } else {
            Err(RhythmError::InvalidConfig(format!(
                "rhythm thresholds need 0 < bradycardia ({}) <= tachycardia ({})",
                brady, tachy
            )))
        }
    }

    pub fn label_for_bpm(&self, bpm: f64) -> RhythmLabel {
        if bpm < self.bradycardia_below_bpm {
            RhythmLabel::Bradycardia
        } else if bpm > self.tachycardia_above_bpm {
            RhythmLabel::Tachycardia
        } else {
            RhythmLabel::Normal
        }
    }

    pub fn classify(&self, rr_s: f64) -> RhythmResult<RhythmLabel> {
        Ok(self.label_for_bpm(heart_rate_bpm(rr_s)?))
    }
}

/// Instantaneous heart rate for an RR duration in seconds.
pub fn heart_rate_bpm(rr_s: f64) -> RhythmResult<f64> {
    if rr_s.is_finite() && rr_s > 0.0 {
        Ok(60.0 / rr_s)
    } else {
        Err(RhythmError::NonPositiveInterval(rr_s))
    }
}

/// Classify an RR duration with the standard 60/100 bpm bounds.
pub fn classify_rr(rr_s: f64) -> RhythmResult<RhythmLabel> {
    RhythmThresholds::default().classify(rr_s)
}

impl RrInterval {
    pub fn heart_rate_bpm(&self) -> RhythmResult<f64> {
        heart_rate_bpm(self.duration())
    }

    pub fn label(&self) -> RhythmResult<RhythmLabel> {
        classify_rr(self.duration())
    }
}

/// RR intervals grouped by label, each list in chronological order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SegmentCollection {
    pub bradycardia: Vec<RrInterval>,
    pub normal: Vec<RrInterval>,
    pub tachycardia: Vec<RrInterval>,
}

impl SegmentCollection {
    pub fn get(&self, label: RhythmLabel) -> &[RrInterval] {
        match label {
            RhythmLabel::Bradycardia => &self.bradycardia,
            RhythmLabel::Normal => &self.normal,
            RhythmLabel::Tachycardia => &self.tachycardia,
        }
    }

    fn list_mut(&mut self, label: RhythmLabel) -> &mut Vec<RrInterval> {
        match label {
            RhythmLabel::Bradycardia => &mut self.bradycardia,
            RhythmLabel::Normal => &mut self.normal,
            RhythmLabel::Tachycardia => &mut self.tachycardia,
        }
    }

    pub fn push(&mut self, label: RhythmLabel, interval: RrInterval) {
        self.list_mut(label).push(interval);
    }

    pub fn iter(&self) -> impl Iterator<Item = (RhythmLabel, &[RrInterval])> + '_ {
        RhythmLabel::ALL.into_iter().map(move |label| (label, self.get(label)))
    }

    pub fn counts(&self) -> SegmentCounts {
        SegmentCounts {
            bradycardia: self.bradycardia.len(),
            normal: self.normal.len(),
            tachycardia: self.tachycardia.len(),
        }
    }

    pub fn len(&self) -> usize {
        self.bradycardia.len() + self.normal.len() + self.tachycardia.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentCounts {
    pub bradycardia: usize,
    pub normal: usize,
    pub tachycardia: usize,
}

/// Pair adjacent beats into RR intervals and group them by label.
pub fn aggregate_segments(
    beats: &[Beat],
    thresholds: &RhythmThresholds,
) -> RhythmResult<SegmentCollection> {
    let mut segments = SegmentCollection::default();
    for w in beats.windows(2) {
        let interval = RrInterval::between(&w[0], &w[1]);
        let label = thresholds.classify(interval.duration())?;
        segments.push(label, interval);
    }
    Ok(segments)
}

/// Beats and labelled segments from one pass over a signal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RhythmAnalysis {
    pub beats: Vec<Beat>,
    pub segments: SegmentCollection,
}

/// Detect beats, then classify and group the RR intervals between them.
pub fn analyze_signal(
    signal: &Signal,
    detector: &DetectorConfig,
    thresholds: &RhythmThresholds,
) -> RhythmResult<RhythmAnalysis> {
    thresholds.validate()?;
    let beats = detect_r_peaks_with_config(signal, detector)?;
    let segments = aggregate_segments(&beats, thresholds)?;
    Ok(RhythmAnalysis { beats, segments })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn beats(times: &[f64]) -> Vec<Beat> {
        times.iter().map(|&t| Beat { r_peak_time: t }).collect()
    }

    #[test]
    fn classifies_reference_durations() {
        assert_eq!(classify_rr(1.0).unwrap(), RhythmLabel::Normal);
        assert_eq!(classify_rr(0.5).unwrap(), RhythmLabel::Tachycardia);
        assert_eq!(classify_rr(1.2).unwrap(), RhythmLabel::Bradycardia);
    }

    #[test]
    fn bounds_are_normal() {
        // 60 bpm and 100 bpm exactly.
        assert_eq!(classify_rr(1.0).unwrap(), RhythmLabel::Normal);
        assert_eq!(classify_rr(0.6).unwrap(), RhythmLabel::Normal);
        assert_eq!(classify_rr(0.599).unwrap(), RhythmLabel::Tachycardia);
        assert_eq!(classify_rr(1.001).unwrap(), RhythmLabel::Bradycardia);
    }

    #[test]
    fn rejects_non_positive_durations() {
        for d in [0.0, -0.5, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                classify_rr(d),
                Err(RhythmError::NonPositiveInterval(_))
            ));
        }
    }

    #[test]
    fn custom_thresholds() {
        let thresholds = RhythmThresholds {
            bradycardia_below_bpm: 50.0,
            tachycardia_above_bpm: 120.0,
        };
        assert_eq!(thresholds.classify(1.1).unwrap(), RhythmLabel::Normal);
        assert_eq!(thresholds.classify(0.55).unwrap(), RhythmLabel::Normal);
        assert_eq!(thresholds.classify(0.45).unwrap(), RhythmLabel::Tachycardia);
        assert!(RhythmThresholds {
            bradycardia_below_bpm: 120.0,
            tachycardia_above_bpm: 60.0,
        }
        .validate()
        .is_err());
    }

    fn pairs(list: &[RrInterval]) -> Vec<(f64, f64)> {
        list.iter().map(|rr| (rr.start, rr.end)).collect()
    }

    #[test]
    fn groups_intervals_in_chronological_order() {
        let segments = aggregate_segments(
            &beats(&[0.5, 1.0, 1.5, 2.5, 4.0, 5.0, 5.5]),
            &RhythmThresholds::default(),
        )
        .unwrap();
        assert_eq!(pairs(&segments.tachycardia), vec![(0.5, 1.0), (1.0, 1.5), (5.0, 5.5)]);
        assert_eq!(pairs(&segments.normal), vec![(1.5, 2.5), (4.0, 5.0)]);
        assert_eq!(pairs(&segments.bradycardia), vec![(2.5, 4.0)]);
        assert_eq!(
            segments.counts(),
            SegmentCounts {
                bradycardia: 1,
                normal: 2,
                tachycardia: 3
            }
        );
        assert_eq!(segments.len(), 6);
    }

    #[test]
    fn zero_or_one_beat_gives_empty_segments() {
        let thresholds = RhythmThresholds::default();
        assert!(aggregate_segments(&[], &thresholds).unwrap().is_empty());
        assert!(aggregate_segments(&beats(&[1.0]), &thresholds)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn duplicate_beat_times_fail_loudly() {
        let err = aggregate_segments(&beats(&[1.0, 1.0]), &RhythmThresholds::default())
            .unwrap_err();
        assert_eq!(err, RhythmError::NonPositiveInterval(0.0));
    }

    #[test]
    fn iterates_labels_in_fixed_order() {
        let segments = SegmentCollection::default();
        let labels: Vec<_> = segments.iter().map(|(label, _)| label).collect();
        assert_eq!(labels, RhythmLabel::ALL.to_vec());
        assert_eq!(RhythmLabel::Tachycardia.to_string(), "Tachycardia");
    }

    #[test]
    fn interval_reports_rate_and_label() {
        let rr = RrInterval {
            start: 2.0,
            end: 2.5,
        };
        assert!((rr.heart_rate_bpm().unwrap() - 120.0).abs() < 1e-9);
        assert_eq!(rr.label().unwrap(), RhythmLabel::Tachycardia);
    }

    #[test]
    fn analysis_is_repeatable() {
        let spikes: Vec<(f64, f64)> = (0..=1000)
            .map(|i| {
                let t = i as f64 / 100.0;
                let v = if i > 0 && i % 100 == 0 && i < 1000 { 1.0 } else { 0.0 };
                (t, v)
            })
            .collect();
        let signal = Signal::from_samples(spikes).unwrap();
        let detector = DetectorConfig::default();
        let thresholds = RhythmThresholds::default();
        let first = analyze_signal(&signal, &detector, &thresholds).unwrap();
        let second = analyze_signal(&signal, &detector, &thresholds).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.beats.len(), 9);
        assert_eq!(first.segments.normal.len(), 8);
        assert!(first.segments.bradycardia.is_empty());
        assert!(first.segments.tachycardia.is_empty());
    }
}
