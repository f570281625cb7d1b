pub mod batch;
pub mod config;
pub mod detectors;
pub mod error;
pub mod io;
pub mod metrics;
pub mod signal;
pub mod synth;

pub use config::*;
pub use detectors::*;
pub use error::{RhythmError, RhythmResult};
pub use metrics::*;
pub use signal::*;
