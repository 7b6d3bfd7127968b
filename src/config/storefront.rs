//! Storefront configuration loading from config.toml
//!
//! The TOML file can override the product catalog (`[[products]]`), the FAQ
//! table (`[[topics]]`) and chat settings (`[chat]`). Every section is
//! optional; an absent section, or an absent file, falls back to the built-in
//! farm defaults.

use crate::{
    core::{
        catalog::{Catalog, Product},
        responder::{Responder, TopicRecord},
    },
    errors::{Error, Result},
};
use serde::Deserialize;
use std::{path::Path, time::Duration};
use tracing::info;

const DEFAULT_CONFIG_PATH: &str = "config.toml";
const DEFAULT_TYPING_DELAY_MS: u64 = 600;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Products to offer instead of the built-in list
    #[serde(default)]
    pub products: Option<Vec<Product>>,
    /// FAQ topics to use instead of the built-in table, in match order
    #[serde(default)]
    pub topics: Option<Vec<TopicRecord>>,
    /// Chat behaviour
    #[serde(default)]
    pub chat: ChatConfig,
}

/// The `[chat]` section
#[derive(Debug, Clone, Deserialize)]
pub struct ChatConfig {
    /// Simulated typing delay before the bot answers, in milliseconds
    #[serde(default = "default_typing_delay_ms")]
    pub typing_delay_ms: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            typing_delay_ms: DEFAULT_TYPING_DELAY_MS,
        }
    }
}

const fn default_typing_delay_ms() -> u64 {
    DEFAULT_TYPING_DELAY_MS
}

impl Config {
    /// The configured catalog, or the built-in one
    #[must_use]
    pub fn catalog(&self) -> Catalog {
        self.products
            .clone()
            .map_or_else(Catalog::builtin, Catalog::new)
    }

    /// Builds the FAQ responder, rejecting duplicate topic keys.
    pub fn responder(&self) -> Result<Responder> {
        match &self.topics {
            Some(topics) => Responder::new(topics.clone()),
            None => Ok(Responder::builtin()),
        }
    }

    /// Typing delay for chat replies
    #[must_use]
    pub const fn typing_delay(&self) -> Duration {
        Duration::from_millis(self.chat.typing_delay_ms)
    }
}

/// Parses configuration from TOML text.
pub fn parse_config(contents: &str) -> Result<Config> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads storefront configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file exists but cannot be read
/// - The TOML syntax is invalid
/// - A product or topic is missing a required field
///
/// A missing file is not an error and yields the defaults.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();
    if !path.exists() {
        info!("No config file at {}, using built-in defaults", path.display());
        return Ok(Config::default());
    }

    let contents = std::fs::read_to_string(path).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path.display()),
    })?;
    parse_config(&contents)
}

/// Loads configuration from `HENHOUSE_CONFIG`, or ./config.toml when unset
pub fn load_default_config() -> Result<Config> {
    let path = std::env::var("HENHOUSE_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    load_config(path)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_parse_storefront_config() {
        let toml_str = r#"
            [chat]
            typing_delay_ms = 250

            [[products]]
            id = "duck-eggs"
            name = "Duck eggs (half dozen)"
            price = "5.25"
            category = "eggs"

            [[topics]]
            key = "ducks"
            title = "Do you sell duck eggs?"
            keywords = ["Duck"]
            response = "Yes, in half dozens."
            suggested_topics = ["pricing"]
        "#;

        let config = parse_config(toml_str).unwrap();
        assert_eq!(config.typing_delay(), Duration::from_millis(250));

        let catalog = config.catalog();
        assert_eq!(catalog.products().len(), 1);
        assert_eq!(catalog.products()[0].price, Decimal::new(525, 2));

        let responder = config.responder().unwrap();
        assert_eq!(responder.topics().len(), 1);
        assert_eq!(responder.topics()[0].keywords, vec!["duck".to_string()]);
    }

    #[test]
    fn test_empty_config_uses_builtins() {
        let config = parse_config("").unwrap();
        assert_eq!(config.typing_delay(), Duration::from_millis(600));
        assert_eq!(
            config.catalog().products().len(),
            Catalog::builtin().products().len()
        );
        assert_eq!(
            config.responder().unwrap().topics(),
            Responder::builtin().topics()
        );
    }

    #[test]
    fn test_duplicate_topic_keys_are_rejected() {
        let toml_str = r#"
            [[topics]]
            key = "hours"
            title = "When are you open?"
            keywords = ["open"]
            response = "Every day."

            [[topics]]
            key = "hours"
            title = "Opening hours"
            keywords = ["hours"]
            response = "Every day."
        "#;

        let config = parse_config(toml_str).unwrap();
        assert!(matches!(config.responder(), Err(Error::Config { .. })));
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = load_config("definitely/not/here/config.toml").unwrap();
        assert!(config.products.is_none());
        assert!(config.topics.is_none());
    }

    #[test]
    fn test_invalid_toml_is_a_config_error() {
        assert!(matches!(
            parse_config("[[products]]\nid = "),
            Err(Error::Config { .. })
        ));
    }
}
