/// Result alias for the rhythm pipeline.
pub type RhythmResult<T> = Result<T, RhythmError>;

/// Errors raised by the signal model, detector and classifier.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RhythmError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("time and voltage columns differ in length: {time} vs {voltage}")]
    LengthMismatch { time: usize, voltage: usize },

    #[error("sample {index} is not finite: time {time}, voltage {voltage}")]
    NonFinite {
        index: usize,
        time: f64,
        voltage: f64,
    },

    #[error("sample {index} at {time}s precedes the previous sample at {previous}s")]
    OutOfOrder {
        index: usize,
        time: f64,
        previous: f64,
    },

    #[error("RR interval must be positive and finite, got {0}s")]
    NonPositiveInterval(f64),
}
