//! Bot layer - Discord-specific interface and command handlers
//!
//! This module provides the Discord interface for the storefront: slash
//! commands for the FAQ chat, the cart and checkout, autocomplete handlers,
//! and the shared context every command reads from.

/// Discord command implementations (general, chat, cart, order)
pub mod commands;
/// Discord interaction handlers (autocomplete, etc.)
pub mod handlers;

use crate::{
    core::{
        cart::CartStore,
        catalog::Catalog,
        channel::{BroadcastChannel, ChangeChannel},
        chat::ChatSession,
        gateway::HttpOrderGateway,
        order::{OrderHistory, OrderSubmitter},
        responder::Responder,
        sync::{CartSync, CartViews},
    },
    errors::{Error, Result},
    storage::{DatabaseStore, KeyLocks, keys},
};
use poise::serenity_prelude as serenity;
use std::{sync::Arc, time::Duration};
use tracing::{error, info, instrument};

/// Shared data available to all bot commands.
///
/// Every customer gets their own cart, chat log and order history, keyed by
/// Discord user id in one shared store.
pub struct BotData {
    /// Durable key-value store
    pub store: Arc<DatabaseStore>,
    /// Change notifications for every cart in `store`
    pub channel: Arc<dyn ChangeChannel>,
    /// Products customers can order
    pub catalog: Catalog,
    /// FAQ responder
    pub responder: Arc<Responder>,
    /// Client for the order service
    pub gateway: HttpOrderGateway,
    /// Simulated typing delay for chat replies
    pub typing_delay: Duration,
    cart_locks: KeyLocks,
    cart_views: CartViews<DatabaseStore>,
}

/// Most cart views kept alive at once
const MAX_CART_VIEWS: usize = 256;

impl BotData {
    /// Creates the shared context for all commands.
    #[must_use]
    pub fn new(
        store: DatabaseStore,
        catalog: Catalog,
        responder: Responder,
        gateway: HttpOrderGateway,
        typing_delay: Duration,
    ) -> Self {
        Self {
            store: Arc::new(store),
            channel: Arc::new(BroadcastChannel::new()),
            catalog,
            responder: Arc::new(responder),
            gateway,
            typing_delay,
            cart_locks: KeyLocks::new(),
            cart_views: CartViews::new(MAX_CART_VIEWS),
        }
    }

    /// The cart belonging to `user_id`.
    #[must_use]
    pub fn cart(&self, user_id: &str) -> CartStore<DatabaseStore> {
        CartStore::new(
            Arc::clone(&self.store),
            Arc::clone(&self.channel),
            keys::scoped(keys::CART, user_id),
        )
        .with_locks(self.cart_locks.clone())
    }

    /// The synchronized view of `user_id`'s cart, started on first use.
    /// The least recently used view is evicted once too many are alive.
    pub async fn cart_view(&self, user_id: &str) -> Arc<CartSync<DatabaseStore>> {
        self.cart_views.view(self.cart(user_id)).await
    }

    /// The local order history of `user_id`.
    #[must_use]
    pub fn order_history(&self, user_id: &str) -> OrderHistory<DatabaseStore> {
        OrderHistory::new(Arc::clone(&self.store), keys::scoped(keys::ORDERS, user_id))
    }

    /// A submitter for `user_id`'s cart.
    #[must_use]
    pub fn submitter(&self, user_id: &str) -> OrderSubmitter<DatabaseStore, HttpOrderGateway> {
        OrderSubmitter::new(
            self.cart(user_id),
            self.order_history(user_id),
            self.gateway.clone(),
        )
    }

    /// Opens `user_id`'s chat with the FAQ bot.
    pub async fn chat(&self, user_id: &str) -> Result<ChatSession<DatabaseStore>> {
        ChatSession::open(
            Arc::clone(&self.store),
            Arc::clone(&self.responder),
            keys::scoped(keys::CHAT, user_id),
            self.typing_delay,
        )
        .await
    }
}

async fn on_error(error: poise::FrameworkError<'_, BotData, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            error!("Failed to start bot: {error:?}");
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            error!("Error in command `{}`: {error:?}", ctx.command().name);
            if let Err(e) = ctx
                .say("❌ Something went wrong on our side. Please try again in a moment.")
                .await
            {
                error!("Failed to send error message: {e}");
            }
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                error!("Error while handling error: {e}");
            }
        }
    }
}

/// Registers every command and runs the bot until the connection ends.
#[instrument(skip(token, data))]
pub async fn run_bot(token: String, data: BotData) -> Result<()> {
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                commands::ping(),
                commands::help(),
                commands::ask(),
                commands::faq(),
                commands::chat_clear(),
                commands::cart(),
                commands::checkout(),
                commands::orders(),
                commands::order_status(),
            ],
            on_error: |error| Box::pin(on_error(error)),
            ..Default::default()
        })
        .setup(|ctx, ready, framework| {
            Box::pin(async move {
                info!("Logged in as {}", ready.user.name);
                info!("Registering commands globally...");
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                Ok(data)
            })
        })
        .build();

    let intents = serenity::GatewayIntents::non_privileged();

    info!("Setting up Serenity client for Poise framework...");
    let mut client = serenity::Client::builder(&token, intents)
        .framework(framework)
        .await
        .inspect_err(|e| error!("Error creating client: {e:?}"))?;

    info!("Starting bot client...");
    client
        .start()
        .await
        .inspect_err(|e| error!("Client error: {e:?}"))?;
    Ok(())
}
