pub mod ecg;

pub use ecg::*;
