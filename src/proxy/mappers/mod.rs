// Mappers module - request builders and response normalization for the Gemini API

pub mod gemini;
