//! Order gateway - sends orders to the farm's order API.
//!
//! The gateway only reports what happened on the wire. It distinguishes "no
//! response at all" ([`GatewayError::Unreachable`], the trigger for local
//! fallback) from "the server answered but did not accept the order"
//! ([`GatewayError::Rejected`]).

use crate::{core::order::Order, errors::Result};
use serde::Deserialize;
use std::{future::Future, time::Duration};
use thiserror::Error;
use tracing::{debug, instrument};

/// Body returned by the order API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayReply {
    /// Whether the server accepted the order
    pub success: bool,
    /// Human-readable message from the server
    #[serde(default)]
    pub message: Option<String>,
    /// Server-assigned order number
    #[serde(default)]
    pub order_number: Option<String>,
}

/// Why an order was not accepted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// No response was received (connection refused, DNS failure, timeout, ...)
    #[error("Order service unreachable: {reason}")]
    Unreachable {
        /// Transport-level description
        reason: String,
    },
    /// The server responded but did not accept the order
    #[error("Order rejected: {message}")]
    Rejected {
        /// HTTP status, when known
        status: Option<u16>,
        /// The server's message, verbatim when it sent one
        message: String,
    },
}

/// Something that can place an order with the farm.
pub trait OrderGateway: Send + Sync {
    /// Submits `order` and returns the server's acceptance.
    fn place_order(
        &self,
        order: &Order,
    ) -> impl Future<Output = std::result::Result<GatewayReply, GatewayError>> + Send;
}

/// Gateway that `POST`s orders as JSON to `<base_url>/order`.
#[derive(Debug, Clone)]
pub struct HttpOrderGateway {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpOrderGateway {
    /// Creates a gateway for the API at `base_url`; requests give up after `timeout`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/order", base_url.trim_end_matches('/')),
        })
    }

    /// Full URL orders are posted to
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl OrderGateway for HttpOrderGateway {
    #[instrument(skip(self, order), fields(endpoint = %self.endpoint))]
    async fn place_order(&self, order: &Order) -> std::result::Result<GatewayReply, GatewayError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(order)
            .send()
            .await
            .map_err(|e| GatewayError::Unreachable {
                reason: e.to_string(),
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| GatewayError::Rejected {
            status: Some(status.as_u16()),
            message: format!("Could not read the order service response: {e}"),
        })?;
        debug!("Order API answered {status}: {body}");

        let reply = serde_json::from_str::<GatewayReply>(&body).ok();
        match reply {
            Some(reply) if status.is_success() && reply.success => Ok(reply),
            Some(GatewayReply {
                message: Some(message),
                ..
            }) => Err(GatewayError::Rejected {
                status: Some(status.as_u16()),
                message,
            }),
            _ => Err(GatewayError::Rejected {
                status: Some(status.as_u16()),
                message: format!("The order service could not accept the order (HTTP {status})"),
            }),
        }
    }
}
