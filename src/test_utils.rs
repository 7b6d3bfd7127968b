//! Shared test utilities.
//!
//! Helpers for setting up stores, carts, products and order gateways with
//! sensible defaults.

use crate::{
    core::{
        cart::CartStore,
        catalog::Product,
        channel::BroadcastChannel,
        gateway::{GatewayError, GatewayReply, OrderGateway},
        order::{CustomerInfo, DeliveryType, Order, PaymentMethod},
    },
    errors::Result,
    storage::MemoryStore,
};
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};
use tracing_subscriber::EnvFilter;

/// Routes `tracing` output through the test harness. Safe to call repeatedly.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Creates an in-memory `SQLite` database with the storage table initialized.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// A product priced at `cents / 100`.
pub fn test_product(id: &str, name: &str, cents: i64) -> Product {
    Product {
        id: id.to_string(),
        name: name.to_string(),
        price: Decimal::new(cents, 2),
        image: None,
        category: Some("test".to_string()),
        description: None,
    }
}

/// A cart store over a fresh in-memory store with its own channel.
/// Returns the store too so tests can inspect or corrupt raw documents.
pub fn cart_store() -> (Arc<MemoryStore>, CartStore<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let channel = Arc::new(BroadcastChannel::new());
    let carts = CartStore::new(Arc::clone(&store), channel, "cart");
    (store, carts)
}

/// Customer details that pass validation for a delivery order.
pub fn test_customer() -> CustomerInfo {
    CustomerInfo {
        name: "Ana Pereira".to_string(),
        phone: "+351 912 345 678".to_string(),
        email: Some("ana@example.com".to_string()),
        address: Some("Rua das Galinhas 12, Lisboa".to_string()),
        delivery_type: DeliveryType::Delivery,
        payment_method: PaymentMethod::Cash,
        notes: None,
    }
}

/// What a [`ScriptedGateway`] should answer.
#[derive(Debug, Clone)]
pub enum Script {
    /// Accept the order under this number
    Accept(&'static str),
    /// Reject with this server message
    Reject(&'static str),
    /// Behave as if the server cannot be reached
    Unreachable,
}

/// An order gateway that answers from a script and counts requests.
#[derive(Debug, Clone)]
pub struct ScriptedGateway {
    script: Script,
    calls: Arc<AtomicUsize>,
    received: Arc<Mutex<Vec<String>>>,
}

impl ScriptedGateway {
    /// A gateway that always answers with `script`.
    pub fn new(script: Script) -> Self {
        Self {
            script,
            calls: Arc::new(AtomicUsize::new(0)),
            received: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Number of orders sent to this gateway.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Customer names of the orders received, in order.
    pub fn received_customers(&self) -> Vec<String> {
        self.received.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl OrderGateway for ScriptedGateway {
    async fn place_order(
        &self,
        order: &Order,
    ) -> std::result::Result<GatewayReply, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut received) = self.received.lock() {
            received.push(order.customer.name.clone());
        }
        match &self.script {
            Script::Accept(number) => Ok(GatewayReply {
                success: true,
                message: Some("Order received".to_string()),
                order_number: Some((*number).to_string()),
            }),
            Script::Reject(message) => Err(GatewayError::Rejected {
                status: Some(422),
                message: (*message).to_string(),
            }),
            Script::Unreachable => Err(GatewayError::Unreachable {
                reason: "connection refused".to_string(),
            }),
        }
    }
}
