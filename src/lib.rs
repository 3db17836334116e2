#![allow(non_snake_case)]

// Declare the modules that form the library's public API.
pub mod config;
pub mod data_model;
pub mod error;
pub mod pipeline;
pub mod utils;

// Re-export the types nearly every caller needs.
pub use config::AnalysisConfig;
pub use data_model::{HateClass, Post, PostTable, NOT_HATE_LABEL};
pub use error::{AnalysisError, Result};
pub use pipeline::load_posts;
