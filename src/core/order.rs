//! Order business logic - validation, submission and the local order history.
//!
//! Submitting an order validates it locally first and never touches the
//! network when validation fails. An accepted order clears the cart and is
//! mirrored into the local history. When the order service cannot be reached
//! at all, the order is kept in the local history instead and the cart is still
//! cleared, so the customer is not asked to start over. When the service
//! answers with a rejection, nothing local changes and the cart stays ready for
//! another attempt.

use crate::{
    core::{
        cart::{self, Cart, CartLineItem, CartStore},
        gateway::{GatewayError, OrderGateway},
    },
    errors::{Error, Result},
    storage::{self, KeyValueStore},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc};
use tracing::{info, warn};
use uuid::Uuid;

/// How the customer receives the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryType {
    /// Delivered to the customer's address
    Delivery,
    /// Collected at the farm shop
    Pickup,
}

/// How the customer pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Cash on delivery or pickup
    Cash,
    /// Card payment
    Card,
    /// Bank transfer
    Transfer,
}

/// Lifecycle of an order. Transitions are driven by the client; no rules are enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Recorded but not yet confirmed by the farm
    Pending,
    /// Accepted by the order service
    Confirmed,
    /// Being prepared
    Processing,
    /// Handed to the customer
    Delivered,
    /// Called off
    Cancelled,
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Processing => "processing",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        };
        f.write_str(label)
    }
}

/// Who is ordering and how they want it handled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInfo {
    /// Customer's name
    pub name: String,
    /// Contact phone number
    pub phone: String,
    /// Optional e-mail address
    #[serde(default)]
    pub email: Option<String>,
    /// Delivery address; required for delivery orders
    #[serde(default)]
    pub address: Option<String>,
    /// Delivery or pickup
    pub delivery_type: DeliveryType,
    /// Payment method
    pub payment_method: PaymentMethod,
    /// Free-form notes for the farm
    #[serde(default)]
    pub notes: Option<String>,
}

/// A problem that stops an order from being submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationIssue {
    /// No customer name
    MissingName,
    /// No phone number
    MissingPhone,
    /// Delivery requested without an address
    MissingAddress,
    /// Nothing to order
    EmptyCart,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            Self::MissingName => "Please enter your name.",
            Self::MissingPhone => "Please enter a phone number so we can confirm your order.",
            Self::MissingAddress => "Please enter a delivery address, or choose pickup.",
            Self::EmptyCart => "Your cart is empty.",
        };
        f.write_str(message)
    }
}

/// A customer order: contact details plus a snapshot of the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Customer details
    #[serde(rename = "customerInfo")]
    pub customer: CustomerInfo,
    /// Cart lines at the time of checkout
    pub items: Vec<CartLineItem>,
    /// Assigned by the order service, or locally when it is unreachable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_number: Option<String>,
    /// When the order was composed
    pub created_at: DateTime<Utc>,
    /// Current status
    pub status: OrderStatus,
}

impl Order {
    /// Composes a pending order from `customer` and the lines of `cart`.
    #[must_use]
    pub fn new(customer: CustomerInfo, cart: &Cart) -> Self {
        Self {
            customer,
            items: cart.items().to_vec(),
            order_number: None,
            created_at: Utc::now(),
            status: OrderStatus::Pending,
        }
    }

    /// Sum of the line totals.
    #[must_use]
    pub fn total(&self) -> Decimal {
        cart::total_of(&self.items)
    }

    /// Every reason this order cannot be submitted; empty when it is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<ValidationIssue> {
        let blank = |value: &str| value.trim().is_empty();
        let mut issues = Vec::new();

        if blank(&self.customer.name) {
            issues.push(ValidationIssue::MissingName);
        }
        if blank(&self.customer.phone) {
            issues.push(ValidationIssue::MissingPhone);
        }
        if self.customer.delivery_type == DeliveryType::Delivery
            && self.customer.address.as_deref().is_none_or(blank)
        {
            issues.push(ValidationIssue::MissingAddress);
        }
        if self.items.is_empty() {
            issues.push(ValidationIssue::EmptyCart);
        }
        issues
    }
}

/// What happened to a submitted order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// The order service accepted the order
    Confirmed {
        /// Server-assigned order number
        order_number: String,
        /// Server message, if any
        message: Option<String>,
    },
    /// The order service was unreachable; the order was kept locally
    SavedLocally {
        /// Locally generated order number
        order_number: String,
    },
    /// The order service refused the order; the cart is untouched
    Rejected {
        /// The server's message
        message: String,
    },
    /// The order failed local validation and was not sent
    Invalid(Vec<ValidationIssue>),
}

/// Locally persisted orders, newest first.
#[derive(Debug)]
pub struct OrderHistory<S> {
    store: Arc<S>,
    key: String,
}

impl<S> Clone for OrderHistory<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            key: self.key.clone(),
        }
    }
}

impl<S: KeyValueStore> OrderHistory<S> {
    /// History stored under `key`.
    pub fn new(store: Arc<S>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// All recorded orders, newest first. A malformed history reads as empty.
    pub async fn list(&self) -> Vec<Order> {
        storage::read_json_or_default(&*self.store, &self.key).await
    }

    /// Adds `order` to the front of the history.
    pub async fn record(&self, order: Order) -> Result<()> {
        let mut orders = self.list().await;
        orders.insert(0, order);
        storage::write_json(&*self.store, &self.key, &orders).await
    }

    /// Finds an order by number.
    pub async fn find(&self, order_number: &str) -> Option<Order> {
        self.list()
            .await
            .into_iter()
            .find(|o| o.order_number.as_deref() == Some(order_number))
    }

    /// Sets the status of a recorded order and returns the updated order.
    pub async fn update_status(&self, order_number: &str, status: OrderStatus) -> Result<Order> {
        let mut orders = self.list().await;
        let order = orders
            .iter_mut()
            .find(|o| o.order_number.as_deref() == Some(order_number))
            .ok_or_else(|| Error::OrderNotFound {
                order_number: order_number.to_string(),
            })?;
        order.status = status;
        let updated = order.clone();

        storage::write_json(&*self.store, &self.key, &orders).await?;
        info!("Order {order_number} is now {status}");
        Ok(updated)
    }
}

/// Submits orders for one cart and keeps that customer's history.
#[derive(Debug)]
pub struct OrderSubmitter<S, G> {
    cart: CartStore<S>,
    history: OrderHistory<S>,
    gateway: G,
}

impl<S: KeyValueStore, G: OrderGateway> OrderSubmitter<S, G> {
    /// Creates a submitter clearing `cart` and recording into `history`.
    pub const fn new(cart: CartStore<S>, history: OrderHistory<S>, gateway: G) -> Self {
        Self {
            cart,
            history,
            gateway,
        }
    }

    /// The order history this submitter records into
    #[must_use]
    pub const fn history(&self) -> &OrderHistory<S> {
        &self.history
    }

    /// Composes an order from the current cart and submits it.
    pub async fn checkout(&self, customer: CustomerInfo) -> Result<SubmissionOutcome> {
        let cart = self.cart.load().await;
        self.submit(Order::new(customer, &cart)).await
    }

    /// Validates and submits `order`.
    ///
    /// Only local storage failures are returned as errors; every other outcome
    /// is a [`SubmissionOutcome`].
    pub async fn submit(&self, mut order: Order) -> Result<SubmissionOutcome> {
        let issues = order.validate();
        if !issues.is_empty() {
            info!("Order not sent, {} validation issue(s)", issues.len());
            return Ok(SubmissionOutcome::Invalid(issues));
        }

        match self.gateway.place_order(&order).await {
            Ok(reply) => {
                let order_number = reply.order_number.unwrap_or_else(local_order_number);
                order.order_number = Some(order_number.clone());
                order.status = OrderStatus::Confirmed;
                info!("Order {order_number} confirmed by the order service");

                // The service owns the order now; local bookkeeping is best effort.
                if let Err(e) = self.history.record(order).await {
                    warn!("Order {order_number} confirmed but not mirrored locally: {e}");
                }
                if let Err(e) = self.cart.clear().await {
                    warn!("Order {order_number} confirmed but the cart was not cleared: {e}");
                }
                Ok(SubmissionOutcome::Confirmed {
                    order_number,
                    message: reply.message,
                })
            }
            Err(GatewayError::Unreachable { reason }) => {
                let order_number = local_order_number();
                warn!("Order service unreachable ({reason}); saving order {order_number} locally");
                order.order_number = Some(order_number.clone());
                order.status = OrderStatus::Pending;

                self.history.record(order).await?;
                self.cart.clear().await?;
                Ok(SubmissionOutcome::SavedLocally { order_number })
            }
            Err(GatewayError::Rejected { status, message }) => {
                info!("Order rejected by the order service (status {status:?}): {message}");
                Ok(SubmissionOutcome::Rejected { message })
            }
        }
    }
}

/// An order number for orders the service has not numbered, e.g. `LOCAL-20261017153000-3FA2C1`.
fn local_order_number() -> String {
    let suffix: String = Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(6)
        .collect();
    format!(
        "LOCAL-{}-{}",
        Utc::now().format("%Y%m%d%H%M%S"),
        suffix.to_ascii_uppercase()
    )
}
