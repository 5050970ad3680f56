pub mod config;
pub mod error;
pub mod logger;

// Re-export commonly used types
pub use config::{AppConfig, DEFAULT_TIMEOUT_MS, MAX_TIMEOUT_MS};
pub use error::AssistError;
pub type Result<T> = std::result::Result<T, AssistError>;
