/// Database connection and table creation
pub mod database;

/// Application settings from config.toml and environment variables
pub mod settings;

pub use settings::{EmailSettings, ImageSettings, ServerSettings, Settings};
