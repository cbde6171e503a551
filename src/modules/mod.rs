pub mod audit;
pub mod config;
pub mod image_store;
pub mod logger;

// Re-export commonly used functions
pub use config::*;
