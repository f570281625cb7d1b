pub mod combine;
pub mod text;
