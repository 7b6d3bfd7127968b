//! Cart synchronization - keeps a view's cart summary in step with storage.
//!
//! Several views (bot commands, sessions, processes sharing a database) can
//! look at the same persisted cart. Each view holds a [`CartSync`], which keeps
//! a [`CartSummary`] derived from storage and refreshes it whenever a change to
//! the cart's key is announced on the channel. Notifications are only a hint:
//! the summary is always recomputed by re-reading storage. Convergence is
//! eventual and the last write to storage wins.

use crate::{
    core::cart::{Cart, CartLineItem, CartStore},
    errors::Result,
    storage::KeyValueStore,
};
use rust_decimal::Decimal;
use std::{collections::HashMap, sync::Arc};
use tokio::{
    sync::{
        Mutex,
        broadcast::{self, error::RecvError},
        watch,
    },
    task::JoinHandle,
};
use tracing::{debug, trace};

/// Derived view of a cart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartSummary {
    /// Total number of units
    pub count: u32,
    /// Line items in cart order
    pub items: Vec<CartLineItem>,
    /// Sum of the line totals
    pub total: Decimal,
}

impl CartSummary {
    /// Computes the summary of `cart`.
    #[must_use]
    pub fn from_cart(cart: &Cart) -> Self {
        Self {
            count: cart.item_count(),
            items: cart.items().to_vec(),
            total: cart.total(),
        }
    }
}

/// One view's synchronized summary of a persisted cart.
///
/// Dropping the `CartSync` stops its background listener.
#[derive(Debug)]
pub struct CartSync<S> {
    cart: CartStore<S>,
    summary: Arc<watch::Sender<CartSummary>>,
    listener: JoinHandle<()>,
}

impl<S: KeyValueStore> CartSync<S> {
    /// Computes the initial summary and starts listening for changes to the cart's key.
    ///
    /// Must be called from within a Tokio runtime.
    pub async fn start(cart: CartStore<S>) -> Self {
        // Subscribe before the first read so no write can slip in between.
        let events = cart.channel().subscribe();
        let initial = CartSummary::from_cart(&cart.load().await);
        let summary = Arc::new(watch::Sender::new(initial));

        let listener = tokio::spawn(listen(cart.clone(), events, Arc::clone(&summary)));
        debug!("Cart sync started for '{}'", cart.key());

        Self {
            cart,
            summary,
            listener,
        }
    }

    /// The store this view is bound to
    #[must_use]
    pub const fn store(&self) -> &CartStore<S> {
        &self.cart
    }

    /// The current summary.
    #[must_use]
    pub fn summary(&self) -> CartSummary {
        self.summary.borrow().clone()
    }

    /// A receiver that observes every recomputed summary.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<CartSummary> {
        self.summary.subscribe()
    }

    /// Re-reads storage and replaces the summary.
    pub async fn refresh(&self) -> CartSummary {
        recompute(&self.cart, &self.summary).await
    }

    /// Replaces the stored cart with `cart`, refreshes this view and notifies
    /// every other view of the same key.
    pub async fn update_cart(&self, cart: Cart) -> Result<CartSummary> {
        self.cart.save(&cart).await?;
        Ok(self.refresh().await)
    }
}

impl<S> Drop for CartSync<S> {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

/// Long-lived views keyed by cart key, at most `capacity` of them.
///
/// When full, the least recently used view is evicted. Its listener stops as
/// soon as no caller still holds it.
#[derive(Debug)]
pub struct CartViews<S> {
    capacity: usize,
    table: Mutex<ViewTable<S>>,
}

#[derive(Debug)]
struct ViewTable<S> {
    clock: u64,
    views: HashMap<String, (Arc<CartSync<S>>, u64)>,
}

impl<S: KeyValueStore> CartViews<S> {
    /// An empty cache holding at most `capacity` views (minimum 1).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            table: Mutex::new(ViewTable {
                clock: 0,
                views: HashMap::new(),
            }),
        }
    }

    /// The view of `cart`, started on first use.
    pub async fn view(&self, cart: CartStore<S>) -> Arc<CartSync<S>> {
        let mut table = self.table.lock().await;
        table.clock += 1;
        let now = table.clock;

        if let Some((view, last_used)) = table.views.get_mut(cart.key()) {
            *last_used = now;
            return Arc::clone(view);
        }

        if table.views.len() >= self.capacity
            && let Some(oldest) = table
                .views
                .iter()
                .min_by_key(|(_, (_, last_used))| *last_used)
                .map(|(key, _)| key.clone())
        {
            table.views.remove(&oldest);
            debug!("Evicted idle cart view '{oldest}'");
        }

        let key = cart.key().to_string();
        let view = Arc::new(CartSync::start(cart).await);
        table.views.insert(key, (Arc::clone(&view), now));
        view
    }

    /// Number of cached views.
    pub async fn len(&self) -> usize {
        self.table.lock().await.views.len()
    }

    /// Whether no view is cached.
    pub async fn is_empty(&self) -> bool {
        self.table.lock().await.views.is_empty()
    }
}

async fn recompute<S: KeyValueStore>(
    cart: &CartStore<S>,
    summary: &watch::Sender<CartSummary>,
) -> CartSummary {
    let fresh = CartSummary::from_cart(&cart.load().await);
    summary.send_replace(fresh.clone());
    fresh
}

async fn listen<S: KeyValueStore>(
    cart: CartStore<S>,
    mut events: broadcast::Receiver<crate::core::channel::StorageEvent>,
    summary: Arc<watch::Sender<CartSummary>>,
) {
    loop {
        match events.recv().await {
            Ok(event) if event.key == cart.key() => {
                let fresh = recompute(&cart, &summary).await;
                trace!("Cart '{}' resynced: {} item(s)", cart.key(), fresh.count);
            }
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                debug!("Cart sync for '{}' skipped {skipped} event(s), resyncing", cart.key());
                recompute(&cart, &summary).await;
            }
            Err(RecvError::Closed) => break,
        }
    }
}
