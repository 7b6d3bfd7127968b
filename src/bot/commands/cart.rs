//! Cart Discord commands - `/cart add|show|increment|decrement|remove|clear`.
//!
//! Positions shown to users start at 1; the cart itself is indexed from 0.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{
            BotData,
            commands::{money, render_lines, to_index},
            handlers::autocomplete,
        },
        core::cart::{Cart, DecrementOutcome},
        errors::{Error, Result},
    };

    const MAX_UNITS_PER_ADD: u32 = 99;

    fn position_error(position: u32) -> String {
        format!("❌ There is no line {position} in your cart. Use `/cart show` to see the positions.")
    }

    fn cart_footer(cart: &Cart) -> String {
        format!(
            "🧺 {} item(s) in your cart, total **{}**",
            cart.item_count(),
            money(cart.total())
        )
    }

    /// Parent command for managing your shopping cart.
    #[poise::command(
        slash_command,
        subcommands(
            "cart_add",
            "cart_show",
            "cart_increment",
            "cart_decrement",
            "cart_remove",
            "cart_clear"
        )
    )]
    pub async fn cart(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "Cart command. Available subcommands:\n\
            `/cart add` - Add a product\n\
            `/cart show` - Show your cart\n\
            `/cart increment` - One more of a line\n\
            `/cart decrement` - One fewer of a line\n\
            `/cart remove` - Remove a line\n\
            `/cart clear` - Empty the cart";

        ctx.say(help_text).await?;
        Ok(())
    }

    /// Puts a product in your cart.
    #[poise::command(slash_command, rename = "add")]
    pub async fn cart_add(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Product to add"]
        #[autocomplete = "autocomplete::autocomplete_product_name"]
        product: String,
        #[description = "How many to add. Defaults to 1."]
        #[min = 1]
        #[max = 99]
        quantity: Option<u32>,
    ) -> Result<()> {
        let data = ctx.data();
        let Some(found) = data
            .catalog
            .find_by_name(&product)
            .or_else(|| data.catalog.find_by_id(product.trim()))
        else {
            ctx.say(format!("❌ We don't sell '{product}'. Start typing to see what's available."))
                .await?;
            return Ok(());
        };

        let units = quantity.unwrap_or(1).clamp(1, MAX_UNITS_PER_ADD);
        let cart = data
            .cart(&ctx.author().id.to_string())
            .add_units(found, units)
            .await?;

        ctx.say(format!(
            "✅ Added {units} × **{}** ({} each).\n{}",
            found.name,
            money(found.price),
            cart_footer(&cart)
        ))
        .await?;
        Ok(())
    }

    /// Shows what's in your cart.
    #[poise::command(slash_command, rename = "show")]
    pub async fn cart_show(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let view = ctx.data().cart_view(&ctx.author().id.to_string()).await;
        let summary = view.refresh().await;

        if summary.items.is_empty() {
            ctx.say("🧺 Your cart is empty. Use `/cart add` to pick something.")
                .await?;
            return Ok(());
        }

        let response = format!(
            "🧺 **Your cart**\n\n{}\n{} item(s), total **{}**",
            render_lines(&summary.items)?,
            summary.count,
            money(summary.total)
        );
        ctx.say(response).await?;
        Ok(())
    }

    /// Adds one more of the product on a cart line.
    #[poise::command(slash_command, rename = "increment")]
    pub async fn cart_increment(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Line position from /cart show"] position: u32,
    ) -> Result<()> {
        let carts = ctx.data().cart(&ctx.author().id.to_string());
        let Some(index) = to_index(position) else {
            ctx.say(position_error(position)).await?;
            return Ok(());
        };

        match carts.increment(index).await {
            Ok(cart) => {
                ctx.say(format!("➕ Updated.\n{}", cart_footer(&cart))).await?;
            }
            Err(Error::LineItemNotFound { .. }) => {
                ctx.say(position_error(position)).await?;
            }
            Err(e) => return Err(e),
        }
        Ok(())
    }

    /// Takes one away from a cart line.
    #[poise::command(slash_command, rename = "decrement")]
    pub async fn cart_decrement(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Line position from /cart show"] position: u32,
    ) -> Result<()> {
        let carts = ctx.data().cart(&ctx.author().id.to_string());
        let Some(index) = to_index(position) else {
            ctx.say(position_error(position)).await?;
            return Ok(());
        };

        match carts.decrement(index).await {
            Ok(DecrementOutcome::Decremented(cart)) => {
                ctx.say(format!("➖ Updated.\n{}", cart_footer(&cart))).await?;
            }
            Ok(DecrementOutcome::AtMinimum { name }) => {
                ctx.say(format!(
                    "ℹ️ You have just one **{name}**. Use `/cart remove {position}` to take it out."
                ))
                .await?;
            }
            Err(Error::LineItemNotFound { .. }) => {
                ctx.say(position_error(position)).await?;
            }
            Err(e) => return Err(e),
        }
        Ok(())
    }

    /// Removes a line from your cart.
    #[poise::command(slash_command, rename = "remove")]
    pub async fn cart_remove(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Line position from /cart show"] position: u32,
    ) -> Result<()> {
        let carts = ctx.data().cart(&ctx.author().id.to_string());
        let Some(index) = to_index(position) else {
            ctx.say(position_error(position)).await?;
            return Ok(());
        };

        match carts.remove(index).await {
            Ok(cart) => {
                ctx.say(format!("🗑️ Removed.\n{}", cart_footer(&cart))).await?;
            }
            Err(Error::LineItemNotFound { .. }) => {
                ctx.say(position_error(position)).await?;
            }
            Err(e) => return Err(e),
        }
        Ok(())
    }

    /// Empties your cart.
    #[poise::command(slash_command, rename = "clear")]
    pub async fn cart_clear(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.data()
            .cart(&ctx.author().id.to_string())
            .clear()
            .await?;
        ctx.say("🧹 Your cart is empty.").await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
