pub mod config;
pub mod error;
pub mod extractor;
pub mod format;
pub mod models;
pub mod normalizer;
pub mod pipeline;
pub mod report;
