pub mod fetcher;
pub mod generator;
pub mod sink;
pub mod transcriber;
