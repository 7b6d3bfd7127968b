//! General Discord commands - ping and help.
//! This module contains simple commands that don't touch storage.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::BotData,
        errors::{Error, Result},
    };

    /// Responds with "Pong!" to test bot connectivity.
    #[poise::command(slash_command, prefix_command)]
    pub async fn ping(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.say("Pong!").await?;
        Ok(())
    }

    /// Displays help information about available commands.
    #[poise::command(slash_command, prefix_command)]
    pub async fn help(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "**Henhouse Help**\n\
        Fresh eggs and poultry from the farm, ordered right here.\n\n\
        **Questions**\n\
        • `/ask <question>` - Ask the farm assistant anything.\n\
        • `/faq <topic>` - Jump straight to a common question.\n\
        • `/chat_clear` - Start the conversation over.\n\n\
        **Shopping**\n\
        • `/cart add <product>` - Put a product in your cart.\n\
        • `/cart show` - See what's in your cart.\n\
        • `/cart increment|decrement|remove <position>` - Change a line.\n\
        • `/cart clear` - Empty your cart.\n\
        • `/checkout` - Place your order.\n\n\
        **Orders**\n\
        • `/orders` - Your recent orders.\n\
        • `/order_status <number> <status>` - Update an order's status.\n\n\
        **Utility**\n\
        • `/ping` - Checks if the bot is responsive.\n\
        • `/help` - Shows this help message.";

        ctx.say(help_text).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
