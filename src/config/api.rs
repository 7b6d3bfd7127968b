//! Order API settings from environment variables.

use crate::errors::{Error, Result};
use std::time::Duration;

const DEFAULT_ORDER_API_URL: &str = "http://localhost:5000";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Where and how to reach the order service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderApiConfig {
    /// Base URL; orders are posted to `<base_url>/order`
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for OrderApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_ORDER_API_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Reads `ORDER_API_URL` and `ORDER_API_TIMEOUT_SECS`, with defaults for unset values.
pub fn get_order_api_config() -> Result<OrderApiConfig> {
    from_values(
        std::env::var("ORDER_API_URL").ok(),
        std::env::var("ORDER_API_TIMEOUT_SECS").ok(),
    )
}

fn from_values(url: Option<String>, timeout_secs: Option<String>) -> Result<OrderApiConfig> {
    let defaults = OrderApiConfig::default();
    let timeout = match timeout_secs {
        Some(raw) => {
            let secs = raw.trim().parse::<u64>().map_err(|e| Error::Config {
                message: format!("ORDER_API_TIMEOUT_SECS must be a whole number of seconds: {e}"),
            })?;
            Duration::from_secs(secs)
        }
        None => defaults.timeout,
    };

    Ok(OrderApiConfig {
        base_url: url
            .filter(|u| !u.trim().is_empty())
            .unwrap_or(defaults.base_url),
        timeout,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_unset() -> Result<()> {
        assert_eq!(from_values(None, None)?, OrderApiConfig::default());
        Ok(())
    }

    #[test]
    fn test_explicit_values() -> Result<()> {
        let config = from_values(
            Some("https://orders.example.com/api".to_string()),
            Some(" 3 ".to_string()),
        )?;
        assert_eq!(config.base_url, "https://orders.example.com/api");
        assert_eq!(config.timeout, Duration::from_secs(3));
        Ok(())
    }

    #[test]
    fn test_bad_timeout_is_rejected() {
        assert!(matches!(
            from_values(None, Some("soon".to_string())),
            Err(Error::Config { .. })
        ));
    }
}
