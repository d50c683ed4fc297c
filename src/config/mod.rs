/// Database configuration and connection management
pub mod database;

/// Community and dashboard settings loaded from config.toml
pub mod settings;
