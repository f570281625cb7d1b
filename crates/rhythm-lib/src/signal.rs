use crate::error::{RhythmError, RhythmResult};
use serde::Serialize;

/// Single-lead recording stored as parallel time/voltage columns.
///
/// Every sample is finite, time is non-decreasing and both columns always have the same length.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Signal {
    time: Vec<f64>,
    voltage: Vec<f64>,
}

impl Signal {
    pub fn new(time: Vec<f64>, voltage: Vec<f64>) -> RhythmResult<Self> {
        if time.len() != voltage.len() {
            return Err(RhythmError::LengthMismatch {
                time: time.len(),
                voltage: voltage.len(),
            });
        }
        // NaN slips past the ordering check; an infinite time never ends the window scan.
        if let Some(index) = time
            .iter()
            .zip(&voltage)
            .position(|(t, v)| !t.is_finite() || !v.is_finite())
        {
            return Err(RhythmError::NonFinite {
                index,
                time: time[index],
                voltage: voltage[index],
            });
        }
        for (index, w) in time.windows(2).enumerate() {
            if w[1] < w[0] {
                return Err(RhythmError::OutOfOrder {
                    index: index + 1,
                    time: w[1],
                    previous: w[0],
                });
            }
        }
        Ok(Self { time, voltage })
    }

    /// Build from `(time, voltage)` pairs.
    pub fn from_samples<I>(samples: I) -> RhythmResult<Self>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let (time, voltage): (Vec<f64>, Vec<f64>) = samples.into_iter().unzip();
        Self::new(time, voltage)
    }

    pub fn time(&self) -> &[f64] {
        &self.time
    }

    pub fn voltage(&self) -> &[f64] {
        &self.voltage
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// First and last timestamps, if any.
    pub fn span(&self) -> Option<(f64, f64)> {
        Some((*self.time.first()?, *self.time.last()?))
    }

    /// Index range of the samples whose time lies in the closed window `[start, end]`.
    pub fn window_range(&self, start: f64, end: f64) -> std::ops::Range<usize> {
        let lo = self.time.partition_point(|&t| t < start);
        let hi = self.time.partition_point(|&t| t <= end);
        lo..hi.max(lo)
    }
}

/// A detected heartbeat, anchored at its R-peak.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Beat {
    pub r_peak_time: f64,
}

/// Time between two adjacent beats.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RrInterval {
    pub start: f64,
    pub end: f64,
}

impl RrInterval {
    pub fn between(first: &Beat, second: &Beat) -> Self {
        Self {
            start: first.r_peak_time,
            end: second.r_peak_time,
        }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_mismatched_columns() {
        let err = Signal::new(vec![0.0, 1.0], vec![0.0]).unwrap_err();
        assert_eq!(err, RhythmError::LengthMismatch { time: 2, voltage: 1 });
    }

    #[test]
    fn rejects_time_going_backwards() {
        let err = Signal::from_samples([(0.0, 0.0), (0.2, 1.0), (0.1, 0.5)]).unwrap_err();
        assert!(matches!(err, RhythmError::OutOfOrder { index: 2, .. }));
    }

    #[test]
    fn rejects_non_finite_samples() {
        let err = Signal::from_samples([(0.0, 0.0), (1.0, 1.0), (2.0, 0.0), (f64::INFINITY, 0.0)])
            .unwrap_err();
        assert!(matches!(err, RhythmError::NonFinite { index: 3, .. }));

        let err = Signal::from_samples([(0.0, 0.0), (f64::NAN, 1.0), (0.5, 0.0)]).unwrap_err();
        assert!(matches!(err, RhythmError::NonFinite { index: 1, .. }));

        let err = Signal::from_samples([(0.0, 0.0), (0.1, f64::NEG_INFINITY)]).unwrap_err();
        assert!(matches!(err, RhythmError::NonFinite { index: 1, .. }));
    }

    #[test]
    fn window_range_is_closed_on_both_ends() {
        let signal =
            Signal::from_samples((0..=10).map(|i| (i as f64 * 0.5, 0.0))).expect("valid signal");
        assert_eq!(signal.window_range(1.0, 2.0), 2..5);
        assert_eq!(signal.window_range(4.9, 5.0), 10..11);
        assert_eq!(signal.window_range(6.0, 7.0), 11..11);
        assert_eq!(signal.span(), Some((0.0, 5.0)));
    }

    #[test]
    fn interval_duration() {
        let rr = RrInterval::between(&Beat { r_peak_time: 1.5 }, &Beat { r_peak_time: 2.25 });
        assert!((rr.duration() - 0.75).abs() < 1e-12);
    }
}
