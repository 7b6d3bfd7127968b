/// Order API settings from environment variables
pub mod api;

/// Database configuration and connection management
pub mod database;

/// Catalog, FAQ and chat configuration from config.toml
pub mod storefront;
