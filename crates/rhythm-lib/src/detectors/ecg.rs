use crate::{
    error::{RhythmError, RhythmResult},
    signal::{Beat, Signal},
};
use log::debug;
use serde::{Deserialize, Serialize};

/// Configurable parameters for the windowed R-peak detector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Width of each threshold window (seconds).
    pub interval_size_s: f64,
    /// Distance between consecutive window starts (seconds).
    pub step_size_s: f64,
    /// Minimum physiological RR distance (seconds).
    pub min_rr_s: f64,
    /// Fraction of `min_rr_s` used as the double-trigger gate.
    pub dedup_fraction: f64,
    /// Fraction of the window maximum a peak has to exceed.
    pub threshold_scale: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            interval_size_s: 5.0,
            step_size_s: 5.0,
            min_rr_s: 0.3,
            dedup_fraction: 0.1,
            threshold_scale: 0.7,
        }
    }
}

impl DetectorConfig {
    pub fn validate(&self) -> RhythmResult<()> {
        positive("interval_size_s", self.interval_size_s)?;
        positive("step_size_s", self.step_size_s)?;
        positive("min_rr_s", self.min_rr_s)?;
        if !self.dedup_fraction.is_finite() || self.dedup_fraction < 0.0 {
            return Err(RhythmError::InvalidConfig(format!(
                "dedup_fraction must be a non-negative number, got {}",
                self.dedup_fraction
            )));
        }
        if !(self.threshold_scale > 0.0 && self.threshold_scale <= 1.0) {
            return Err(RhythmError::InvalidConfig(format!(
                "threshold_scale must lie in (0, 1], got {}",
                self.threshold_scale
            )));
        }
        Ok(())
    }

    /// Candidates closer than this to the previous beat are dropped.
    ///
    /// This is a tenth of `min_rr_s`, so it only suppresses near-simultaneous
    /// re-triggers and does not enforce the physiological minimum RR.
    pub fn dedup_gap_s(&self) -> f64 {
        self.min_rr_s * self.dedup_fraction
    }
}

fn positive(name: &str, value: f64) -> RhythmResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(RhythmError::InvalidConfig(format!(
            "{} must be a positive number, got {}",
            name, value
        )))
    }
}

/// Threshold for the closed window `[start, end]`: a scaled maximum of the voltages inside it.
///
/// The running maximum starts at zero, so an empty or all-negative window gives 0.0.
pub fn window_threshold(signal: &Signal, start: f64, end: f64, scale: f64) -> f64 {
    let range = signal.window_range(start, end);
    let max_voltage = signal.voltage()[range]
        .iter()
        .fold(0.0_f64, |acc, &v| if v > acc { v } else { acc });
    max_voltage * scale
}

/// Detect R-peaks with the default configuration.
pub fn detect_r_peaks(signal: &Signal) -> Vec<Beat> {
    scan_windows(signal, &DetectorConfig::default())
}

/// Detect R-peaks by sliding threshold windows across the signal.
pub fn detect_r_peaks_with_config(signal: &Signal, cfg: &DetectorConfig) -> RhythmResult<Vec<Beat>> {
    cfg.validate()?;
    Ok(scan_windows(signal, cfg))
}

fn scan_windows(signal: &Signal, cfg: &DetectorConfig) -> Vec<Beat> {
    let mut beats: Vec<Beat> = Vec::new();
    let Some((first_time, last_time)) = signal.span() else {
        return beats;
    };
    let time = signal.time();
    let voltage = signal.voltage();
    let last_interior = signal.len().saturating_sub(1);
    let gap = cfg.dedup_gap_s();

    let mut window = 0usize;
    loop {
        // Derive each start from the index so long recordings don't accumulate drift.
        let window_start = first_time + window as f64 * cfg.step_size_s;
        if window_start >= last_time {
            break;
        }
        let window_end = (window_start + cfg.interval_size_s).min(last_time);
        let threshold = window_threshold(signal, window_start, window_end, cfg.threshold_scale);
        let range = signal.window_range(window_start, window_end);
        let before = beats.len();

        for i in range.start.max(1)..range.end.min(last_interior) {
            let v = voltage[i];
            if v > threshold && v > voltage[i - 1] && v > voltage[i + 1] {
                if let Some(prev) = beats.last() {
                    // Also rejects candidates behind the last beat when windows overlap.
                    if time[i] - prev.r_peak_time < gap {
                        continue;
                    }
                }
                beats.push(Beat {
                    r_peak_time: time[i],
                });
            }
        }

        debug!(
            "window [{:.3}, {:.3}] threshold {:.4}: {} beat(s)",
            window_start,
            window_end,
            threshold,
            beats.len() - before
        );
        window += 1;
    }

    beats
}
