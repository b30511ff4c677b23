pub mod gemini;
pub mod generator;
