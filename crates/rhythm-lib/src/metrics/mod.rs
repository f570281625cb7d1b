pub mod rhythm;

pub use rhythm::*;
