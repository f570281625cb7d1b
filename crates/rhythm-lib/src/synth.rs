use crate::{
    error::{RhythmError, RhythmResult},
    signal::Signal,
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Parameters for a synthetic single-lead recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthConfig {
    /// Sampling frequency in Hz.
    pub fs: f64,
    /// RR intervals between consecutive spikes (seconds).
    pub rr_s: Vec<f64>,
    /// Time before the first spike.
    pub lead_in_s: f64,
    /// Time after the last spike.
    pub tail_s: f64,
    pub amplitude: f64,
    /// Standard deviation of the Gaussian R-wave (seconds).
    pub spike_width_s: f64,
    /// Amplitude of a 0.3 Hz baseline wander.
    pub wander_amplitude: f64,
    /// Half-width of the uniform noise added to every sample.
    pub noise_amplitude: f64,
    pub seed: u64,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            fs: 250.0,
            rr_s: vec![1.0; 4],
            lead_in_s: 0.5,
            tail_s: 1.0,
            amplitude: 1.2,
            spike_width_s: 0.02,
            wander_amplitude: 0.05,
            noise_amplitude: 0.0,
            seed: 0,
        }
    }
}

impl SynthConfig {
    pub fn validate(&self) -> RhythmResult<()> {
        if !(self.fs.is_finite() && self.fs > 0.0) {
            return Err(RhythmError::InvalidConfig(format!(
                "fs must be positive, got {}",
                self.fs
            )));
        }
        if let Some(bad) = self.rr_s.iter().find(|rr| !(rr.is_finite() && **rr > 0.0)) {
            return Err(RhythmError::InvalidConfig(format!(
                "rr intervals must be positive, got {}",
                bad
            )));
        }
        for (name, value) in [
            ("lead_in_s", self.lead_in_s),
            ("tail_s", self.tail_s),
            ("spike_width_s", self.spike_width_s),
            ("noise_amplitude", self.noise_amplitude),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(RhythmError::InvalidConfig(format!(
                    "{} must be non-negative, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }

    /// Times of the generated R-waves.
    pub fn beat_times(&self) -> Vec<f64> {
        let mut t = self.lead_in_s;
        let mut beats = Vec::with_capacity(self.rr_s.len() + 1);
        beats.push(t);
        for &rr in &self.rr_s {
            t += rr;
            beats.push(t);
        }
        beats
    }
}

/// Render Gaussian spikes at `cfg.beat_times()` over a slow sinusoidal wander plus seeded noise.
pub fn synthesize(cfg: &SynthConfig) -> RhythmResult<Signal> {
    cfg.validate()?;
    let beats = cfg.beat_times();
    let duration = beats.last().copied().unwrap_or(0.0) + cfg.tail_s;
    let samples = (duration * cfg.fs).floor() as usize + 1;
    let mut rng = StdRng::seed_from_u64(cfg.seed);
    let width = cfg.spike_width_s.max(1e-6);

    let mut time = Vec::with_capacity(samples);
    let mut voltage = Vec::with_capacity(samples);
    for i in 0..samples {
        let t = i as f64 / cfg.fs;
        let mut v = cfg.wander_amplitude * (2.0 * PI * 0.3 * t).sin();
        for &bt in &beats {
            let z = (t - bt) / width;
            if z.abs() < 8.0 {
                v += cfg.amplitude * (-0.5 * z * z).exp();
            }
        }
        if cfg.noise_amplitude > 0.0 {
            v += rng.gen_range(-cfg.noise_amplitude..=cfg.noise_amplitude);
        }
        time.push(t);
        voltage.push(v);
    }
    Signal::new(time, voltage)
}
