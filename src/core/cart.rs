//! Cart business logic - the persisted list of line items and its operations.
//!
//! A [`Cart`] is a plain value: an ordered list of [`CartLineItem`]s with pure
//! helpers for totals and mutation. A [`CartStore`] binds a cart to a storage
//! key. Every mutating store operation loads the cart, applies the change,
//! writes the whole cart back and announces the change on the
//! [`ChangeChannel`] before returning.
//!
//! Persisted carts are treated as untrusted input: malformed documents load as
//! an empty cart, unreadable prices read as zero, unreadable quantities read as
//! 1 and every line total is recomputed from its unit price and quantity.
//! Mutations of one key are serialized through [`KeyLocks`], so two concurrent
//! operations never overwrite each other's changes.

use crate::{
    core::{
        catalog::Product,
        channel::{ChangeChannel, StorageEvent},
    },
    errors::{Error, Result},
    storage::{self, KeyLocks, KeyValueStore, ReadFailure},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::{str::FromStr, sync::Arc};
use tracing::{debug, info, warn};

/// One product entry in a cart.
///
/// Fields are private: quantities only change through the cart operations, and
/// the line total is always derived from them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineItem {
    product_id: String,
    name: String,
    #[serde(
        default,
        deserialize_with = "lenient_price",
        serialize_with = "rust_decimal::serde::float::serialize"
    )]
    unit_price: Decimal,
    #[serde(default = "default_quantity", deserialize_with = "lenient_quantity")]
    quantity: u32,
    #[serde(
        default,
        deserialize_with = "lenient_price",
        serialize_with = "rust_decimal::serde::float::serialize"
    )]
    total_price: Decimal,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    category: Option<String>,
}

const fn default_quantity() -> u32 {
    1
}

impl CartLineItem {
    /// A new line for `product` with quantity 1.
    #[must_use]
    pub fn from_product(product: &Product) -> Self {
        let mut item = Self {
            product_id: product.id.clone(),
            name: product.name.clone(),
            unit_price: product.price,
            quantity: 1,
            total_price: Decimal::ZERO,
            image: product.image.clone(),
            category: product.category.clone(),
        };
        item.recompute_total();
        item
    }

    /// Identifier of the product on this line
    #[must_use]
    pub fn product_id(&self) -> &str {
        &self.product_id
    }

    /// Product display name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Price of a single unit
    #[must_use]
    pub const fn unit_price(&self) -> Decimal {
        self.unit_price
    }

    /// Number of units, always at least 1
    #[must_use]
    pub const fn quantity(&self) -> u32 {
        self.quantity
    }

    /// `unit_price × quantity`
    #[must_use]
    pub const fn total_price(&self) -> Decimal {
        self.total_price
    }

    /// Image reference
    #[must_use]
    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    /// Product category
    #[must_use]
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    /// A line whose total does not fit in a `Decimal` is priced at zero.
    fn recompute_total(&mut self) {
        self.total_price = self
            .unit_price
            .checked_mul(Decimal::from(self.quantity))
            .unwrap_or_else(|| {
                warn!("Line total for '{}' overflows, pricing it at zero", self.product_id);
                Decimal::ZERO
            });
    }

    fn set_quantity(&mut self, quantity: u32) {
        self.quantity = quantity;
        self.recompute_total();
    }
}

/// Reads a price that may be a number, a numeric string, `null` or garbage.
/// Anything that is not a usable number becomes zero.
fn lenient_price<'de, D>(deserializer: D) -> std::result::Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => parse_decimal(&n.to_string()),
        serde_json::Value::String(s) => parse_decimal(s.trim()),
        _ => Decimal::ZERO,
    })
}

/// Reads a quantity that may be a negative, fractional or quoted number.
/// Fractions are truncated, anything below 1 becomes 1 and garbage reads as 1.
#[allow(clippy::cast_possible_truncation)]
fn lenient_quantity<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let whole = match value {
        serde_json::Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        serde_json::Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f as i64))
        }
        _ => None,
    };
    Ok(whole.map_or(1, |q| u32::try_from(q.max(1)).unwrap_or(u32::MAX)))
}

/// Sum of the line totals of `items`, saturating instead of overflowing.
#[must_use]
pub fn total_of(items: &[CartLineItem]) -> Decimal {
    items
        .iter()
        .fold(Decimal::ZERO, |sum, item| sum.saturating_add(item.total_price))
}

fn parse_decimal(text: &str) -> Decimal {
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .unwrap_or(Decimal::ZERO)
}

/// An ordered list of line items, at most one per product.
///
/// Serialized as a bare array of lines. Deserializing goes through
/// [`Cart::from_items`], so a decoded cart is always normalized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<CartLineItem>", into = "Vec<CartLineItem>")]
pub struct Cart {
    items: Vec<CartLineItem>,
}

impl From<Vec<CartLineItem>> for Cart {
    fn from(items: Vec<CartLineItem>) -> Self {
        Self::from_items(items)
    }
}

impl From<Cart> for Vec<CartLineItem> {
    fn from(cart: Cart) -> Self {
        cart.items
    }
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Builds a cart from line items, merging duplicate products and
    /// normalizing quantities and line totals.
    #[must_use]
    pub fn from_items(items: Vec<CartLineItem>) -> Self {
        let mut cart = Self::new();
        for item in items {
            match cart.position(&item.product_id) {
                Some(index) => {
                    if let Some(existing) = cart.items.get_mut(index) {
                        let merged = existing.quantity.saturating_add(item.quantity.max(1));
                        existing.set_quantity(merged);
                    }
                }
                None => cart.items.push(item),
            }
        }
        cart.normalize();
        cart
    }

    /// Line items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartLineItem] {
        &self.items
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0u32, |count, item| count.saturating_add(item.quantity))
    }

    /// Sum of all line totals.
    #[must_use]
    pub fn total(&self) -> Decimal {
        total_of(&self.items)
    }

    /// Position of the line holding `product_id`.
    #[must_use]
    pub fn position(&self, product_id: &str) -> Option<usize> {
        self.items.iter().position(|i| i.product_id == product_id)
    }

    /// Adds one unit of `product`: bumps the existing line or appends a new one.
    /// Returns the position of the affected line.
    pub fn add_product(&mut self, product: &Product) -> usize {
        self.add_units(product, 1)
    }

    /// Adds `units` of `product` (at least one) to a single line.
    /// Returns the position of the affected line.
    pub fn add_units(&mut self, product: &Product, units: u32) -> usize {
        let units = units.max(1);
        if let Some(index) = self.position(&product.id)
            && let Some(item) = self.items.get_mut(index)
        {
            item.set_quantity(item.quantity.saturating_add(units));
            return index;
        }
        let mut item = CartLineItem::from_product(product);
        item.set_quantity(units);
        self.items.push(item);
        self.items.len() - 1
    }

    /// Adds one unit to the line at `index`.
    pub fn increment(&mut self, index: usize) -> Result<&CartLineItem> {
        let item = self
            .items
            .get_mut(index)
            .ok_or(Error::LineItemNotFound { index })?;
        item.set_quantity(item.quantity.saturating_add(1));
        Ok(item)
    }

    /// Removes one unit from the line at `index`.
    ///
    /// Returns `Ok(false)` without changing anything when the line is already at
    /// quantity 1; removing the line is a separate, explicit action.
    pub fn decrement(&mut self, index: usize) -> Result<bool> {
        let item = self
            .items
            .get_mut(index)
            .ok_or(Error::LineItemNotFound { index })?;
        if item.quantity <= 1 {
            return Ok(false);
        }
        item.set_quantity(item.quantity - 1);
        Ok(true)
    }

    /// Deletes the line at `index` and returns it.
    pub fn remove(&mut self, index: usize) -> Result<CartLineItem> {
        if index >= self.items.len() {
            return Err(Error::LineItemNotFound { index });
        }
        Ok(self.items.remove(index))
    }

    fn normalize(&mut self) {
        for item in &mut self.items {
            let quantity = item.quantity.max(1);
            item.set_quantity(quantity);
        }
    }
}

/// Result of [`CartStore::decrement`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecrementOutcome {
    /// The quantity went down by one
    Decremented(Cart),
    /// The line is at quantity 1 and was left alone; use remove to delete it
    AtMinimum {
        /// Name of the product on that line
        name: String,
    },
}

/// A cart bound to a storage key.
///
/// Cloning is cheap; clones share the store, the channel and the lock table.
/// Independently created stores for the same key must share a [`KeyLocks`]
/// (see [`CartStore::with_locks`]) for their mutations to be serialized.
#[derive(Debug)]
pub struct CartStore<S> {
    store: Arc<S>,
    channel: Arc<dyn ChangeChannel>,
    locks: KeyLocks,
    key: String,
}

impl<S> Clone for CartStore<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            channel: Arc::clone(&self.channel),
            locks: self.locks.clone(),
            key: self.key.clone(),
        }
    }
}

impl<S: KeyValueStore> CartStore<S> {
    /// Creates a store for the cart persisted under `key`.
    pub fn new(store: Arc<S>, channel: Arc<dyn ChangeChannel>, key: impl Into<String>) -> Self {
        Self {
            store,
            channel,
            locks: KeyLocks::new(),
            key: key.into(),
        }
    }

    /// Serializes mutations through `locks` instead of a private lock table.
    #[must_use]
    pub fn with_locks(mut self, locks: KeyLocks) -> Self {
        self.locks = locks;
        self
    }

    /// The storage key of this cart
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The channel change notifications are published on
    #[must_use]
    pub fn channel(&self) -> &Arc<dyn ChangeChannel> {
        &self.channel
    }

    /// Loads the current cart. Never fails: a missing, unreadable or malformed
    /// record yields an empty cart.
    pub async fn load(&self) -> Cart {
        match storage::read_json::<S, Cart>(&*self.store, &self.key).await {
            Ok(Some(cart)) => cart,
            Ok(None) => {
                debug!("No cart stored under '{}', starting empty", self.key);
                Cart::new()
            }
            Err(ReadFailure::Malformed(e)) => {
                warn!("Cart '{}' is malformed, starting empty: {}", self.key, e);
                Cart::new()
            }
            Err(ReadFailure::Unavailable(e)) => {
                warn!("Cart '{}' could not be read, starting empty: {}", self.key, e);
                Cart::new()
            }
        }
    }

    /// Writes `cart` under this store's key and notifies subscribers.
    pub async fn save(&self, cart: &Cart) -> Result<()> {
        let _guard = self.locks.lock(&self.key).await;
        self.persist(cart).await
    }

    async fn persist(&self, cart: &Cart) -> Result<()> {
        storage::write_json(&*self.store, &self.key, cart).await?;
        self.channel.publish(StorageEvent::new(self.key.as_str()));
        Ok(())
    }

    /// Adds one unit of `product`, merging with an existing line for the same product.
    pub async fn add(&self, product: &Product) -> Result<Cart> {
        self.add_units(product, 1).await
    }

    /// Adds `units` of `product` (at least one) with a single write.
    pub async fn add_units(&self, product: &Product, units: u32) -> Result<Cart> {
        let _guard = self.locks.lock(&self.key).await;
        let mut cart = self.load().await;
        cart.add_units(product, units);
        self.persist(&cart).await?;
        debug!("Added {} × '{}' to cart '{}'", units.max(1), product.name, self.key);
        Ok(cart)
    }

    /// Adds one unit to the line at `index`.
    pub async fn increment(&self, index: usize) -> Result<Cart> {
        let _guard = self.locks.lock(&self.key).await;
        let mut cart = self.load().await;
        cart.increment(index)?;
        self.persist(&cart).await?;
        Ok(cart)
    }

    /// Removes one unit from the line at `index`, unless it is already at 1.
    pub async fn decrement(&self, index: usize) -> Result<DecrementOutcome> {
        let _guard = self.locks.lock(&self.key).await;
        let mut cart = self.load().await;
        if cart.decrement(index)? {
            self.persist(&cart).await?;
            return Ok(DecrementOutcome::Decremented(cart));
        }

        let name = cart
            .items()
            .get(index)
            .map(|item| item.name().to_string())
            .unwrap_or_default();
        info!("Kept '{name}' at quantity 1 in cart '{}'; remove it instead", self.key);
        Ok(DecrementOutcome::AtMinimum { name })
    }

    /// Deletes the line at `index`.
    pub async fn remove(&self, index: usize) -> Result<Cart> {
        let _guard = self.locks.lock(&self.key).await;
        let mut cart = self.load().await;
        let removed = cart.remove(index)?;
        self.persist(&cart).await?;
        debug!("Removed '{}' from cart '{}'", removed.name(), self.key);
        Ok(cart)
    }

    /// Empties the cart and deletes its persisted record.
    pub async fn clear(&self) -> Result<()> {
        let _guard = self.locks.lock(&self.key).await;
        self.store.remove(&self.key).await?;
        self.channel.publish(StorageEvent::new(self.key.as_str()));
        debug!("Cleared cart '{}'", self.key);
        Ok(())
    }

    /// Sum of the line totals of the stored cart.
    pub async fn total(&self) -> Decimal {
        self.load().await.total()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::channel::BroadcastChannel;
    use crate::storage::MemoryStore;
    use crate::test_utils::{cart_store, test_product};

    fn expected_total(cart: &Cart) -> Decimal {
        cart.items()
            .iter()
            .map(|i| i.unit_price() * Decimal::from(i.quantity()))
            .sum()
    }

    #[tokio::test]
    async fn test_load_empty_when_nothing_stored() {
        let (_store, carts) = cart_store();
        let cart = carts.load().await;
        assert!(cart.is_empty());
        assert_eq!(carts.total().await, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_add_existing_product_increments_instead_of_duplicating() -> Result<()> {
        let (_store, carts) = cart_store();
        let eggs = test_product("eggs", "Eggs", 450);

        carts.add(&eggs).await?;
        let cart = carts.add(&eggs).await?;

        assert_eq!(cart.len(), 1, "Same product must stay on one line");
        assert_eq!(cart.items()[0].quantity(), 2);
        assert_eq!(cart.items()[0].total_price(), Decimal::new(900, 2));
        Ok(())
    }

    #[tokio::test]
    async fn test_total_tracks_every_operation() -> Result<()> {
        let (_store, carts) = cart_store();
        let eggs = test_product("eggs", "Eggs", 450);
        let chicken = test_product("chicken", "Whole chicken", 1299);
        let feed = test_product("feed", "Layer feed", 3200);

        let mut snapshots = vec![
            carts.add(&eggs).await?,
            carts.add(&chicken).await?,
            carts.add(&eggs).await?,
            carts.increment(1).await?,
            carts.add(&feed).await?,
            carts.increment(0).await?,
        ];
        if let DecrementOutcome::Decremented(cart) = carts.decrement(0).await? {
            snapshots.push(cart);
        }
        snapshots.push(carts.remove(2).await?);
        snapshots.push(carts.load().await);

        for cart in &snapshots {
            assert_eq!(cart.total(), expected_total(cart));
        }
        let last = snapshots.last().unwrap();
        // eggs x2 (9.00) + chicken x2 (25.98)
        assert_eq!(last.total(), Decimal::new(3498, 2));
        assert_eq!(carts.total().await, Decimal::new(3498, 2));
        Ok(())
    }

    #[tokio::test]
    async fn test_decrement_at_one_leaves_quantity_unchanged() -> Result<()> {
        let (_store, carts) = cart_store();
        carts.add(&test_product("eggs", "Eggs", 450)).await?;

        let outcome = carts.decrement(0).await?;

        assert_eq!(
            outcome,
            DecrementOutcome::AtMinimum {
                name: "Eggs".to_string()
            }
        );
        let cart = carts.load().await;
        assert_eq!(cart.items()[0].quantity(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_decrement_above_one() -> Result<()> {
        let (_store, carts) = cart_store();
        let eggs = test_product("eggs", "Eggs", 450);
        carts.add(&eggs).await?;
        carts.add(&eggs).await?;

        let DecrementOutcome::Decremented(cart) = carts.decrement(0).await? else {
            panic!("Quantity 2 should decrement");
        };
        assert_eq!(cart.items()[0].quantity(), 1);
        assert_eq!(cart.items()[0].total_price(), Decimal::new(450, 2));
        Ok(())
    }

    #[tokio::test]
    async fn test_out_of_range_index_is_rejected_without_writing() -> Result<()> {
        let (store, carts) = cart_store();

        let result = carts.increment(3).await;
        assert!(matches!(result, Err(Error::LineItemNotFound { index: 3 })));
        assert!(matches!(
            carts.remove(0).await,
            Err(Error::LineItemNotFound { index: 0 })
        ));
        assert!(store.is_empty().await);
        Ok(())
    }

    #[tokio::test]
    async fn test_clear_removes_persisted_record() -> Result<()> {
        let (store, carts) = cart_store();
        carts.add(&test_product("eggs", "Eggs", 450)).await?;

        carts.clear().await?;

        assert!(store.get(carts.key()).await?.is_none());
        assert!(carts.load().await.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_persist_then_load_round_trip() -> Result<()> {
        let (_store, carts) = cart_store();
        carts.add(&test_product("eggs", "Eggs", 450)).await?;
        carts.add(&test_product("feed", "Layer feed", 3200)).await?;
        let saved = carts.increment(1).await?;

        let loaded = carts.load().await;

        assert_eq!(loaded, saved);
        assert_eq!(loaded.total(), saved.total());
        Ok(())
    }

    #[tokio::test]
    async fn test_malformed_record_loads_as_empty_cart() -> Result<()> {
        let (store, carts) = cart_store();
        store.set(carts.key(), "{\"oops\": ").await?;

        assert!(carts.load().await.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_stored_totals_are_recomputed_and_bad_prices_read_as_zero() -> Result<()> {
        let (store, carts) = cart_store();
        let raw = r#"[
            {"productId": "eggs", "name": "Eggs", "unitPrice": "4.50", "quantity": 2, "totalPrice": 999},
            {"productId": "feed", "name": "Feed", "unitPrice": "free", "quantity": 3},
            {"productId": "chick", "name": "Chicks", "unitPrice": null, "quantity": 0, "totalPrice": 12}
        ]"#;
        store.set(carts.key(), raw).await?;

        let cart = carts.load().await;

        assert_eq!(cart.items()[0].total_price(), Decimal::new(900, 2));
        assert_eq!(cart.items()[1].total_price(), Decimal::ZERO);
        assert_eq!(cart.items()[2].quantity(), 1);
        assert_eq!(cart.total(), Decimal::new(900, 2));
        Ok(())
    }

    #[tokio::test]
    async fn test_mutations_publish_change_events() -> Result<()> {
        let store = Arc::new(MemoryStore::new());
        let channel = Arc::new(BroadcastChannel::new());
        let mut events = channel.subscribe();
        let carts = CartStore::new(store, channel, "cart:ana");

        carts.add(&test_product("eggs", "Eggs", 450)).await?;
        carts.clear().await?;

        assert_eq!(events.recv().await.unwrap().key, "cart:ana");
        assert_eq!(events.recv().await.unwrap().key, "cart:ana");
        Ok(())
    }

    #[test]
    fn test_serialized_prices_are_numbers() {
        let mut cart = Cart::new();
        cart.add_product(&test_product("eggs", "Eggs", 450));

        let json = serde_json::to_value(&cart).unwrap();
        assert_eq!(json[0]["unitPrice"], serde_json::json!(4.5));
        assert_eq!(json[0]["productId"], serde_json::json!("eggs"));
    }

    #[tokio::test]
    async fn test_overflowing_prices_do_not_break_loading() -> Result<()> {
        let (store, carts) = cart_store();
        let raw = r#"[
            {"productId": "big", "name": "Big", "unitPrice": "79228162514264337593543950335", "quantity": 2},
            {"productId": "eggs", "name": "Eggs", "unitPrice": 4.5, "quantity": 1}
        ]"#;
        store.set(carts.key(), raw).await?;

        let cart = carts.load().await;

        assert_eq!(cart.len(), 2);
        assert_eq!(cart.items()[0].total_price(), Decimal::ZERO);
        assert_eq!(cart.total(), Decimal::new(450, 2));
        Ok(())
    }

    #[test]
    fn test_total_saturates_instead_of_overflowing() {
        let mut cart = Cart::new();
        let mut huge = test_product("a", "A", 0);
        huge.price = Decimal::MAX;
        cart.add_product(&huge);
        huge.id = "b".to_string();
        cart.add_product(&huge);

        assert_eq!(cart.total(), Decimal::MAX);
    }

    #[tokio::test]
    async fn test_odd_quantities_are_normalized_not_discarded() -> Result<()> {
        let (store, carts) = cart_store();
        let raw = r#"[
            {"productId": "eggs", "name": "Eggs", "unitPrice": 4.5, "quantity": 2},
            {"productId": "feed", "name": "Feed", "unitPrice": 32, "quantity": -1},
            {"productId": "chick", "name": "Chicks", "unitPrice": 25, "quantity": "3"},
            {"productId": "duck", "name": "Duck", "unitPrice": 10, "quantity": 2.7},
            {"productId": "goose", "name": "Goose", "unitPrice": 20, "quantity": "lots"}
        ]"#;
        store.set(carts.key(), raw).await?;

        let cart = carts.load().await;

        let quantities: Vec<u32> = cart.items().iter().map(CartLineItem::quantity).collect();
        assert_eq!(quantities, vec![2, 1, 3, 2, 1]);
        assert_eq!(cart.items()[1].total_price(), Decimal::from(32));
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_adds_are_never_lost() -> Result<()> {
        let store = Arc::new(MemoryStore::new());
        let channel: Arc<dyn ChangeChannel> = Arc::new(BroadcastChannel::new());
        let locks = KeyLocks::new();

        for round in 0..20 {
            let key = format!("cart:round-{round}");
            let mut tasks = Vec::new();
            for i in 0..8 {
                let carts = CartStore::new(Arc::clone(&store), Arc::clone(&channel), key.as_str())
                    .with_locks(locks.clone());
                let product = test_product(&format!("p{i}"), &format!("Product {i}"), 100);
                tasks.push(tokio::spawn(async move { carts.add(&product).await.map(drop) }));
            }
            for task in tasks {
                task.await.unwrap()?;
            }

            let cart = CartStore::new(Arc::clone(&store), Arc::clone(&channel), key).load().await;
            assert_eq!(cart.len(), 8, "Round {round} lost an add");
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_add_units_writes_once() -> Result<()> {
        let store = Arc::new(MemoryStore::new());
        let channel = Arc::new(BroadcastChannel::new());
        let mut events = channel.subscribe();
        let carts = CartStore::new(store, channel, "cart");
        let eggs = test_product("eggs", "Eggs", 450);

        carts.add(&eggs).await?;
        let cart = carts.add_units(&eggs, 5).await?;

        assert_eq!(cart.items()[0].quantity(), 6);
        assert_eq!(cart.total(), Decimal::new(2700, 2));
        assert!(events.try_recv().is_ok());
        assert!(events.try_recv().is_ok());
        assert!(events.try_recv().is_err(), "Five units must be a single write");
        Ok(())
    }

    #[test]
    fn test_decoded_cart_is_normalized() {
        let raw = r#"[
            {"productId": "eggs", "name": "Eggs", "unitPrice": 4.5, "quantity": 1, "totalPrice": 100},
            {"productId": "eggs", "name": "Eggs", "unitPrice": 4.5, "quantity": 0}
        ]"#;

        let cart: Cart = serde_json::from_str(raw).unwrap();

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.items()[0].quantity(), 2);
        assert_eq!(cart.total(), Decimal::new(900, 2));
    }

    #[test]
    fn test_from_items_merges_duplicate_products() {
        let eggs = CartLineItem::from_product(&test_product("eggs", "Eggs", 450));
        let cart = Cart::from_items(vec![eggs.clone(), eggs]);
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.item_count(), 2);
    }
}
