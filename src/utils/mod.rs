// utils/mod.rs
pub mod error;
pub mod config;

// Ré-exports pour faciliter l'import
pub use error::{AppError, Result};
pub use config::{Config, DEFAULT_MAX_MODELS, DEFAULT_MIN_MODELS};
