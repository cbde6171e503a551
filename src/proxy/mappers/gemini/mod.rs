// Gemini mapper module
// Builds generateContent requests and normalizes the version-ambiguous responses

pub mod models;
pub mod normalizer;
pub mod wrapper;

pub use normalizer::{normalize, parse_structured_output};
pub use wrapper::*;
