//! Unified error types and result handling.
//!
//! Conditions the storefront recovers from on its own (corrupt persisted state,
//! failed validation, an unreachable order API, a rejected order) are modelled as
//! ordinary return values in the modules that produce them. This enum is for the
//! failures that genuinely abort an operation.

use thiserror::Error;

/// Crate-wide error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be read or is inconsistent
    #[error("Configuration error: {message}")]
    Config {
        /// Human-readable description of the problem
        message: String,
    },

    /// The durable store failed
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// A record could not be serialized for storage
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The HTTP client could not be built or a request could not be prepared
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// A cart operation referenced a position that does not exist
    #[error("No cart line item at position {index}")]
    LineItemNotFound {
        /// Zero-based position that was requested
        index: usize,
    },

    /// A catalog lookup failed
    #[error("Product not found: {name}")]
    ProductNotFound {
        /// Name or id that was looked up
        name: String,
    },

    /// An order number is not present in the local history
    #[error("Order not found: {order_number}")]
    OrderNotFound {
        /// Order number that was looked up
        order_number: String,
    },

    /// Building a reply message failed
    #[error("Formatting error: {0}")]
    Format(#[from] std::fmt::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// Errors raised by the Discord framework
    #[error("Serenity/Poise framework error: {0}")]
    #[allow(clippy::enum_variant_names)]
    FrameworkError(Box<poise::serenity_prelude::Error>),
}

impl From<poise::serenity_prelude::Error> for Error {
    fn from(value: poise::serenity_prelude::Error) -> Self {
        Self::FrameworkError(Box::new(value))
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
